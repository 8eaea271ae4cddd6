//! Route table: route name → session operation + throttle window

use crate::config::PantiltConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Session operation a route triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Stop,
    MoveTo,
    GetPosition,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::MoveUp => "move_up",
            Action::MoveDown => "move_down",
            Action::MoveLeft => "move_left",
            Action::MoveRight => "move_right",
            Action::Stop => "stop",
            Action::MoveTo => "move_to",
            Action::GetPosition => "get_position",
        };
        f.write_str(name)
    }
}

/// Resolved route
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    pub action: Action,
    /// Zero disables throttling
    pub window: Duration,
}

/// Lookup table built once from configuration
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Build from `[[routes]]`, falling back to `throttle.window_ms`
    pub fn from_config(config: &PantiltConfig) -> Result<Self> {
        let mut table = Self::default();
        for route in &config.routes {
            let window_ms = route.window_ms.unwrap_or(config.throttle.window_ms);
            table.insert(Route {
                name: route.name.clone(),
                action: route.action,
                window: Duration::from_millis(window_ms),
            })?;
        }
        Ok(table)
    }

    /// Add a route; names must be unique
    pub fn insert(&mut self, route: Route) -> Result<()> {
        if self.index.contains_key(&route.name) {
            return Err(Error::Config(format!("duplicate route '{}'", route.name)));
        }
        self.index.insert(route.name.clone(), self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.index.get(name).map(|&i| &self.routes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;

    #[test]
    fn test_default_table() {
        let table = RouteTable::from_config(&PantiltConfig::default()).unwrap();
        assert_eq!(table.len(), 7);
        let left = table.get("camera_left").unwrap();
        assert_eq!(left.action, Action::MoveLeft);
        assert_eq!(left.window, Duration::from_millis(500));
        assert!(table.get("camera_home").is_none());
    }

    #[test]
    fn test_per_route_window_override() {
        let mut config = PantiltConfig::default();
        config.throttle.window_ms = 800;
        config.routes = vec![
            RouteConfig {
                name: "fast".to_string(),
                action: Action::GetPosition,
                window_ms: Some(0),
            },
            RouteConfig {
                name: "slow".to_string(),
                action: Action::MoveLeft,
                window_ms: None,
            },
        ];
        let table = RouteTable::from_config(&config).unwrap();
        assert_eq!(table.get("fast").unwrap().window, Duration::ZERO);
        assert_eq!(table.get("slow").unwrap().window, Duration::from_millis(800));
    }

    #[test]
    fn test_action_names_match_serde() {
        for action in [Action::MoveTo, Action::GetPosition, Action::Stop] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action));
        }
    }
}

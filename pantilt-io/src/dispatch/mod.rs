//! Command dispatcher with per-route throttling
//!
//! The dispatcher owns the device session, the route table and the
//! throttle. It is shared by reference (`Arc`) between client handlers;
//! no process-wide state is involved.
//!
//! # Request Flow
//!
//! ```text
//! dispatch(route, payload)
//!   1. Route lookup           → UnknownRoute
//!   2. Payload validation     → InvalidParameter
//!   3. Throttle check+update  → RateLimitExceeded   (lock held here only)
//!   4. Session call           → device errors propagate unchanged
//! ```
//!
//! Invalid requests are rejected before the throttle, so they never burn
//! a window slot.

mod route;
mod throttle;

pub use route::{Action, Route, RouteTable};
pub use throttle::Throttle;

use crate::config::PantiltConfig;
use crate::error::{Error, Result};
use crate::protocol::{Command, Position, parse_hex_byte};
use crate::session::DeviceSession;
use crate::transport::{Transport, UdpTransport};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Optional request arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payload {
    /// Speed code as hex, used by `move_right`
    #[serde(default)]
    pub speed: Option<String>,
    /// Position high byte as hex, required by `move_to`
    #[serde(default)]
    pub high: Option<String>,
    /// Position low byte as hex, required by `move_to`
    #[serde(default)]
    pub low: Option<String>,
}

impl Payload {
    pub fn with_speed(speed: impl Into<String>) -> Self {
        Self {
            speed: Some(speed.into()),
            ..Self::default()
        }
    }

    pub fn with_position(high: impl Into<String>, low: impl Into<String>) -> Self {
        Self {
            high: Some(high.into()),
            low: Some(low.into()),
            ..Self::default()
        }
    }
}

/// Result of an accepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Command sent
    Done,
    /// Position reported by the head
    Position(Position),
}

/// Throttled front door to a device session
pub struct Dispatcher<T: Transport> {
    session: DeviceSession<T>,
    routes: RouteTable,
    throttle: Throttle,
}

impl Dispatcher<UdpTransport> {
    /// Dispatcher over UDP with the configured route table
    pub fn from_config(config: &PantiltConfig) -> Result<Self> {
        let session = DeviceSession::connect(config)?;
        let routes = RouteTable::from_config(config)?;
        Ok(Self::new(session, routes))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(session: DeviceSession<T>, routes: RouteTable) -> Self {
        for route in routes.iter() {
            log::debug!(
                "Route '{}' -> {} (window {:?})",
                route.name,
                route.action,
                route.window
            );
        }
        Self {
            session,
            routes,
            throttle: Throttle::new(),
        }
    }

    pub fn session(&self) -> &DeviceSession<T> {
        &self.session
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn dispatch(&self, route: &str, payload: &Payload) -> Result<Outcome> {
        self.dispatch_at(route, payload, Instant::now())
    }

    /// Dispatch as if the request arrived at `now`
    pub fn dispatch_at(&self, route: &str, payload: &Payload, now: Instant) -> Result<Outcome> {
        let entry = self
            .routes
            .get(route)
            .ok_or_else(|| Error::UnknownRoute(route.to_string()))?;
        let command = self.prepare(entry.action, payload)?;

        if let Err(e) = self.throttle.try_acquire_at(&entry.name, entry.window, now) {
            log::warn!("{}", e);
            return Err(e);
        }

        log::info!("Route '{}' accepted: {:?}", entry.name, command);
        let result = self.execute(command);
        if let Err(ref e) = result {
            log::error!("Route '{}' failed: {}", entry.name, e);
        }
        result
    }

    /// Turn an action and its payload into a concrete command
    fn prepare(&self, action: Action, payload: &Payload) -> Result<Command> {
        let command = match action {
            Action::MoveUp => Command::MoveUp {
                speed: self.session.default_tilt_speed(),
            },
            Action::MoveDown => Command::MoveDown {
                speed: self.session.default_tilt_speed(),
            },
            Action::MoveLeft => Command::MoveLeft {
                speed: self.session.default_pan_speed(),
            },
            Action::MoveRight => Command::MoveRight {
                speed: match payload.speed.as_deref() {
                    Some(speed) => parse_hex_byte(speed)?,
                    None => self.session.default_pan_speed(),
                },
            },
            Action::Stop => Command::Stop,
            Action::MoveTo => {
                let (Some(high), Some(low)) = (payload.high.as_deref(), payload.low.as_deref())
                else {
                    return Err(Error::InvalidParameter(
                        "move_to requires 'high' and 'low'".to_string(),
                    ));
                };
                Command::MoveTo(Position::from_hex(high, low)?)
            }
            Action::GetPosition => Command::GetPosition,
        };
        Ok(command)
    }

    fn execute(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::MoveUp { .. } => self.session.move_up().map(|_| Outcome::Done),
            Command::MoveDown { .. } => self.session.move_down().map(|_| Outcome::Done),
            Command::MoveLeft { .. } => self.session.move_left().map(|_| Outcome::Done),
            Command::MoveRight { speed } => self.session.move_right(speed).map(|_| Outcome::Done),
            Command::Stop => self.session.stop().map(|_| Outcome::Done),
            Command::MoveTo(position) => self.session.move_to(position).map(|_| Outcome::Done),
            Command::GetPosition => self.session.get_current_position().map(Outcome::Position),
        }
    }
}

//! Configuration for PantiltIO
//!
//! Loaded from a TOML file. Every section and field has a default, so an
//! empty file yields the rig's stock setup.
//!
//! ```toml
//! [device]
//! host = "192.168.0.93"
//! port = 6000
//! address = 1
//! checksum_span = "header"   # or "pelco"
//!
//! [transport]
//! timeout_ms = 1000
//!
//! [throttle]
//! window_ms = 500
//!
//! [[routes]]
//! name = "camera_left"
//! action = "move_left"
//! window_ms = 250            # optional per-route override
//!
//! [server]
//! bind_address = "0.0.0.0:5555"
//! wire_format = "json"
//!
//! [logging]
//! level = "info"
//! ```

use crate::dispatch::Action;
use crate::error::{Error, Result};
use crate::protocol::{self, ChecksumSpan};
use crate::server::WireFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PantiltConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub emulator: EmulatorConfig,
}

/// Scanner head location and frame parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Head IP or hostname
    #[serde(default = "default_device_host")]
    pub host: String,

    /// Head UDP port
    #[serde(default = "default_device_port")]
    pub port: u16,

    /// Pelco device address
    #[serde(default = "default_device_address")]
    pub address: u8,

    /// Bytes covered by the frame checksum
    #[serde(default)]
    pub checksum_span: ChecksumSpan,

    /// Pan speed code for move_left / move_right
    #[serde(default = "default_pan_speed")]
    pub pan_speed: u8,

    /// Tilt speed code for move_up / move_down
    #[serde(default = "default_tilt_speed")]
    pub tilt_speed: u8,
}

/// UDP transport settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// How long a position query waits for the reply
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Receive buffer size for query replies
    #[serde(default = "default_max_reply_bytes")]
    pub max_reply_bytes: usize,
}

/// Dispatcher throttle
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleConfig {
    /// Minimum time between two accepted requests on one route
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

/// One entry of the route table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route name used by clients
    pub name: String,

    /// Session operation the route triggers
    pub action: Action,

    /// Overrides `throttle.window_ms` for this route; 0 disables throttling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_ms: Option<u64>,
}

/// Command server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// TCP bind address for client commands
    ///
    /// - `0.0.0.0:5555` - all interfaces
    /// - `127.0.0.1:5555` - localhost only
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Payload encoding inside the length-prefixed frames
    #[serde(default)]
    pub wire_format: WireFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Device emulator settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmulatorConfig {
    /// UDP bind address of the emulated head
    #[serde(default = "default_emulator_bind")]
    pub bind_address: String,

    /// Initial pan position in hundredths of a degree
    #[serde(default)]
    pub start_pan: u16,

    /// Initial tilt position in hundredths of a degree
    #[serde(default)]
    pub start_tilt: u16,

    /// Most recent frames kept for inspection; older ones are dropped
    #[serde(default = "default_frame_history")]
    pub frame_history: usize,
}

// Default value functions
fn default_device_host() -> String {
    protocol::DEFAULT_DEVICE_HOST.to_string()
}
fn default_device_port() -> u16 {
    protocol::DEFAULT_DEVICE_PORT
}
fn default_device_address() -> u8 {
    protocol::DEFAULT_DEVICE_ADDRESS
}
fn default_pan_speed() -> u8 {
    protocol::DEFAULT_PAN_SPEED
}
fn default_tilt_speed() -> u8 {
    protocol::DEFAULT_TILT_SPEED
}
fn default_timeout_ms() -> u64 {
    1000
}
fn default_max_reply_bytes() -> usize {
    protocol::DEFAULT_MAX_REPLY_BYTES
}
fn default_window_ms() -> u64 {
    500
}
fn default_bind_address() -> String {
    "0.0.0.0:5555".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_emulator_bind() -> String {
    "127.0.0.1:6000".to_string()
}
fn default_frame_history() -> usize {
    1024
}

/// Routes served by the rig's web backend
pub fn default_routes() -> Vec<RouteConfig> {
    [
        ("camera_up", Action::MoveUp),
        ("camera_down", Action::MoveDown),
        ("camera_left", Action::MoveLeft),
        ("camera_right", Action::MoveRight),
        ("camera_stop", Action::Stop),
        ("camera_move_to", Action::MoveTo),
        ("camera_position", Action::GetPosition),
    ]
    .into_iter()
    .map(|(name, action)| RouteConfig {
        name: name.to_string(),
        action,
        window_ms: None,
    })
    .collect()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_device_host(),
            port: default_device_port(),
            address: default_device_address(),
            checksum_span: ChecksumSpan::default(),
            pan_speed: default_pan_speed(),
            tilt_speed: default_tilt_speed(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_reply_bytes: default_max_reply_bytes(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            wire_format: WireFormat::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bind_address: default_emulator_bind(),
            start_pan: 0,
            start_tilt: 0,
            frame_history: default_frame_history(),
        }
    }
}

impl Default for PantiltConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            transport: TransportConfig::default(),
            throttle: ThrottleConfig::default(),
            routes: default_routes(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            emulator: EmulatorConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// `host:port` of the head
    pub fn address_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ThrottleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl PantiltConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PantiltConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject route tables the dispatcher cannot serve
    pub fn validate(&self) -> Result<()> {
        if self.transport.timeout_ms == 0 {
            return Err(Error::Config(
                "transport.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.transport.max_reply_bytes < protocol::REPLY_MIN_LEN {
            return Err(Error::Config(format!(
                "transport.max_reply_bytes must be at least {}",
                protocol::REPLY_MIN_LEN
            )));
        }
        for (i, route) in self.routes.iter().enumerate() {
            if route.name.is_empty() {
                return Err(Error::Config(format!("routes[{}] has an empty name", i)));
            }
            if self.routes[..i].iter().any(|r| r.name == route.name) {
                return Err(Error::Config(format!("duplicate route '{}'", route.name)));
            }
        }
        Ok(())
    }
}

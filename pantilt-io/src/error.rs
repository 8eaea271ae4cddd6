//! Error types for PantiltIO

use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// PantiltIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Device reply too short to carry a position
    #[error("Malformed reply: expected at least {expected} bytes, got {actual}")]
    MalformedReply {
        /// Minimum reply length
        expected: usize,
        /// Bytes actually received
        actual: usize,
    },

    /// No reply within the transport timeout
    #[error("Transport timeout: no reply after {0:?}")]
    TransportTimeout(Duration),

    /// Request rejected by the throttle before any device I/O
    #[error("Rate limit exceeded on route '{route}', retry after {retry_after:?}")]
    RateLimitExceeded {
        /// Route that was throttled
        route: String,
        /// Time left in the current window
        retry_after: Duration,
    },

    /// Datagram could not be sent to the device
    #[error("Device unreachable at {addr}: {source}")]
    DeviceUnreachable {
        /// Device address as configured
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter (bad hex byte, missing payload field)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Route is not in the route table
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Frame text or datagram could not be parsed
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Checksum mismatch
    #[error("Checksum error: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumError {
        /// Checksum computed over the frame
        expected: u8,
        /// Checksum carried by the frame
        actual: u8,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wire serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// True when the request never reached the device and may be re-issued later
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }

    /// True for failures of the device round-trip itself
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            Error::MalformedReply { .. }
                | Error::TransportTimeout(_)
                | Error::DeviceUnreachable { .. }
        )
    }
}

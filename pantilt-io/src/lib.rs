//! PantiltIO - Control library for a networked pan/tilt scanner head
//!
//! The head speaks a Pelco-D style 7-byte frame protocol over UDP. This
//! library provides the frame codec, the UDP transport, a semantic device
//! session, and a rate-limited dispatcher that maps named routes onto
//! device operations.
//!
//! ## Layers
//!
//! ```text
//! CommandServer (TCP, one thread per client)
//!        │
//!   Dispatcher ── Throttle (per-route window)
//!        │
//!  DeviceSession
//!        │
//!   Transport (UDP / mock)
//!        │
//!   scanner head (or Emulator)
//! ```

pub mod config;
pub mod dispatch;
pub mod emulator;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::PantiltConfig;
pub use dispatch::{Dispatcher, Outcome, Payload};
pub use error::{Error, Result};
pub use protocol::{ChecksumSpan, Command, Frame, Position};
pub use session::DeviceSession;

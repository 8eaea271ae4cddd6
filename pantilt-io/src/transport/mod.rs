//! Transport layer for device communication
//!
//! Transports hold no per-call state: each call acquires whatever socket it
//! needs and releases it before returning, so one transport can be shared
//! by concurrent callers without a lock.

use crate::error::Result;
use crate::protocol::Frame;

mod mock;
mod udp;

pub use mock::MockTransport;
pub use udp::UdpTransport;

/// Transport trait for device communication
pub trait Transport: Send + Sync {
    /// Send a frame, fire-and-forget
    fn send(&self, frame: &Frame) -> Result<()>;

    /// Send a frame and wait for one reply of at most `max_bytes`
    ///
    /// Fails with `TransportTimeout` if nothing arrives in time. Never retries.
    fn send_and_receive(&self, frame: &Frame, max_bytes: usize) -> Result<Vec<u8>>;
}

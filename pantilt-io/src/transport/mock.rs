//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use crate::protocol::Frame;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Mock transport for unit testing
///
/// Records every frame sent. Query replies come from the injected queue;
/// in loopback mode an empty queue echoes the query frame back.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    replies: VecDeque<Vec<u8>>,
    sent: Vec<Frame>,
    loopback: bool,
    unreachable: bool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                replies: VecDeque::new(),
                sent: Vec::new(),
                loopback: false,
                unreachable: false,
            })),
        }
    }

    /// Mock that answers every query with the query frame itself
    pub fn loopback() -> Self {
        let mock = Self::new();
        mock.inner.lock().loopback = true;
        mock
    }

    /// Queue a reply for the next query
    pub fn inject_reply(&self, data: &[u8]) {
        self.inner.lock().replies.push_back(data.to_vec());
    }

    /// Make every following call fail as if the network were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unreachable = unreachable;
    }

    /// Get all sent frames
    pub fn sent(&self) -> Vec<Frame> {
        self.inner.lock().sent.clone()
    }

    /// Clear sent frames
    pub fn clear_sent(&self) {
        self.inner.lock().sent.clear();
    }

    fn record(&self, frame: &Frame) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.unreachable {
            return Err(Error::DeviceUnreachable {
                addr: "mock".to_string(),
                source: io::Error::new(io::ErrorKind::NetworkUnreachable, "mock unreachable"),
            });
        }
        inner.sent.push(*frame);
        Ok(())
    }
}

impl Transport for MockTransport {
    fn send(&self, frame: &Frame) -> Result<()> {
        self.record(frame)
    }

    fn send_and_receive(&self, frame: &Frame, max_bytes: usize) -> Result<Vec<u8>> {
        self.record(frame)?;

        let mut inner = self.inner.lock();
        let mut reply = match inner.replies.pop_front() {
            Some(reply) => reply,
            None if inner.loopback => frame.as_bytes().to_vec(),
            None => return Err(Error::TransportTimeout(Duration::ZERO)),
        };
        reply.truncate(max_bytes);
        Ok(reply)
    }
}

//! Wire format for the command server
//!
//! # TCP Protocol
//!
//! Every message in both directions is length-prefixed:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ JSON or Postcard binary  │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - **Maximum message size**: 64 KiB; larger lengths close the connection
//! - **Partial reads**: [`MessageReader`] keeps split prefixes and bodies
//!   across read timeouts
//! - **Request**: `{"route": "camera_right", "payload": {"speed": "32", "high": null, "low": null}}`
//! - **Response**: `"ok"`, `{"position": {"high": "3f", "low": "00"}}` or
//!   `{"error": {"kind": "rate_limited", "message": "...", "retry_after_ms": 120}}`
//!
//! Every request gets exactly one response, in order.

use crate::dispatch::{Outcome, Payload};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind as IoErrorKind, Read, Write};

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Binary format using postcard - compact
    Postcard,
    /// JSON format - human-readable for debugging
    #[default]
    Json,
}

/// Client request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Request {
    pub route: String,
    #[serde(default)]
    pub payload: Payload,
}

impl Request {
    pub fn new(route: impl Into<String>, payload: Payload) -> Self {
        Self {
            route: route.into(),
            payload,
        }
    }
}

/// Failure class reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Throttled; safe to retry after `retry_after_ms`
    RateLimited,
    /// Head did not answer in time
    Timeout,
    /// Head answered with a short reply
    MalformedReply,
    /// Datagram could not be sent
    Unreachable,
    /// Unknown route or bad payload
    InvalidRequest,
    /// Anything else
    Internal,
}

/// Server response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok,
    Position {
        high: String,
        low: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
        retry_after_ms: Option<u64>,
    },
}

impl Response {
    pub fn from_result(result: &Result<Outcome>) -> Self {
        match result {
            Ok(Outcome::Done) => Response::Ok,
            Ok(Outcome::Position(position)) => {
                let (high, low) = position.to_hex();
                Response::Position { high, low }
            }
            Err(e) => Self::from_error(e),
        }
    }

    pub fn from_error(error: &Error) -> Self {
        let (kind, retry_after_ms) = match error {
            Error::RateLimitExceeded { retry_after, .. } => {
                (ErrorKind::RateLimited, Some(retry_after.as_millis() as u64))
            }
            Error::TransportTimeout(_) => (ErrorKind::Timeout, None),
            Error::MalformedReply { .. } => (ErrorKind::MalformedReply, None),
            Error::DeviceUnreachable { .. } => (ErrorKind::Unreachable, None),
            Error::UnknownRoute(_) | Error::InvalidParameter(_) | Error::Serialization(_) => {
                (ErrorKind::InvalidRequest, None)
            }
            _ => (ErrorKind::Internal, None),
        };
        Response::Error {
            kind,
            message: error.to_string(),
            retry_after_ms,
        }
    }

    pub fn is_ok(&self) -> bool {
        !matches!(self, Response::Error { .. })
    }
}

/// Serializer that can handle both formats
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn serialize<M: Serialize>(&self, msg: &M) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    pub fn deserialize<M: DeserializeOwned>(&self, bytes: &[u8]) -> Result<M> {
        match self.format {
            WireFormat::Postcard => {
                postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }
}

/// Write one length-prefixed message
pub fn write_message<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    if body.len() > MAX_MESSAGE_LEN {
        return Err(Error::Other(format!(
            "Message too large: {} bytes",
            body.len()
        )));
    }
    writer.write_all(&(body.len() as u32).to_be_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

/// Incremental reader for length-prefixed messages
///
/// Bytes are kept across read timeouts, so a prefix or body split over
/// several polls is reassembled instead of desynchronizing the stream.
#[derive(Debug, Default)]
pub struct MessageReader {
    header: [u8; 4],
    header_filled: usize,
    body: Vec<u8>,
    body_filled: usize,
    body_len: Option<usize>,
}

impl MessageReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read until a full message is buffered
    ///
    /// Returns `Ok(false)` when the reader timed out first; partial data is
    /// kept for the next call. EOF surfaces as `UnexpectedEof`.
    pub fn poll<R: Read>(&mut self, reader: &mut R) -> Result<bool> {
        loop {
            let len = match self.body_len {
                Some(len) => len,
                None => {
                    let Some(n) = read_some(reader, &mut self.header[self.header_filled..])?
                    else {
                        return Ok(false);
                    };
                    self.header_filled += n;
                    if self.header_filled < self.header.len() {
                        continue;
                    }
                    let len = u32::from_be_bytes(self.header) as usize;
                    if len > MAX_MESSAGE_LEN {
                        return Err(Error::Other(format!("Message too large: {} bytes", len)));
                    }
                    self.body.clear();
                    self.body.resize(len, 0);
                    self.body_filled = 0;
                    self.body_len = Some(len);
                    len
                }
            };

            if self.body_filled == len {
                self.header_filled = 0;
                self.body_len = None;
                return Ok(true);
            }
            let Some(n) = read_some(reader, &mut self.body[self.body_filled..])? else {
                return Ok(false);
            };
            self.body_filled += n;
        }
    }

    /// Last complete message returned by [`poll`](Self::poll)
    pub fn message(&self) -> &[u8] {
        &self.body
    }

    /// True while part of a message is buffered
    pub fn is_partial(&self) -> bool {
        self.header_filled > 0
    }
}

/// One `read` call; `None` on timeout
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<Option<usize>> {
    loop {
        match reader.read(buf) {
            Ok(0) => return Err(Error::Io(std::io::Error::from(IoErrorKind::UnexpectedEof))),
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == IoErrorKind::Interrupted => {}
            Err(e) if e.kind() == IoErrorKind::WouldBlock || e.kind() == IoErrorKind::TimedOut => {
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

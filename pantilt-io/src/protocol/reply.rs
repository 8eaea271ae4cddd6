//! Position replies from the scanner head
//!
//! Only position queries get an answer. The head replies with a short blob;
//! the two bytes at offsets 4 and 5 are the pan position high and low bytes.
//! Anything else in the reply is ignored.

use super::constants::*;
use super::frame::{ChecksumSpan, Frame};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute head position as sent and reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub struct Position {
    pub high: u8,
    pub low: u8,
}

impl Position {
    pub const fn new(high: u8, low: u8) -> Self {
        Self { high, low }
    }

    /// Split a 16-bit position into its halves
    pub const fn from_raw(raw: u16) -> Self {
        Self {
            high: (raw >> 8) as u8,
            low: (raw & 0xFF) as u8,
        }
    }

    /// Combined 16-bit position (high byte first)
    pub const fn raw(&self) -> u16 {
        ((self.high as u16) << 8) | self.low as u16
    }

    /// Parse both halves from hex text, zero-padding single digits
    pub fn from_hex(high: &str, low: &str) -> Result<Self> {
        Ok(Self {
            high: super::parse_hex_byte(high)?,
            low: super::parse_hex_byte(low)?,
        })
    }

    /// Lowercase 2-digit hex halves, e.g. `("3f", "00")`
    pub fn to_hex(&self) -> (String, String) {
        (format!("{:02x}", self.high), format!("{:02x}", self.low))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}", self.high, self.low)
    }
}

/// Extract the position from a query reply
///
/// Fails with [`Error::MalformedReply`] if the reply ends before offset 5.
pub fn decode_position(reply: &[u8]) -> Result<Position> {
    if reply.len() < REPLY_MIN_LEN {
        return Err(Error::MalformedReply {
            expected: REPLY_MIN_LEN,
            actual: reply.len(),
        });
    }
    Ok(Position {
        high: reply[REPLY_HIGH_OFFSET],
        low: reply[REPLY_LOW_OFFSET],
    })
}

/// Build the reply frame a head sends for a position query
pub fn encode_position_reply(address: u8, position: Position, span: ChecksumSpan) -> Frame {
    Frame::encode(
        address,
        COMMAND_GROUP,
        RESP_POSITION,
        position.high,
        position.low,
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sixteen_byte_reply() {
        let mut reply = [0u8; 16];
        reply[0] = 0xFF;
        reply[4] = 0x3F;
        reply[5] = 0x12;
        let pos = decode_position(&reply).unwrap();
        assert_eq!(pos, Position::new(0x3F, 0x12));
        assert_eq!(pos.to_hex(), ("3f".to_string(), "12".to_string()));
    }

    #[test]
    fn test_decode_short_reply() {
        let err = decode_position(&[0xFF, 0x01, 0x00, 0x59, 0x3F]).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedReply {
                expected: 6,
                actual: 5
            }
        ));
        assert!(decode_position(&[]).is_err());
    }

    #[test]
    fn test_decode_exact_minimum() {
        let pos = decode_position(&[0, 0, 0, 0, 0xAB, 0xCD]).unwrap();
        assert_eq!(pos.raw(), 0xABCD);
    }

    #[test]
    fn test_position_reply_frame() {
        let reply = encode_position_reply(0x01, Position::new(0x3F, 0x00), ChecksumSpan::Header);
        assert_eq!(reply.opcode(), RESP_POSITION);
        assert_eq!(decode_position(reply.as_bytes()).unwrap(), Position::new(0x3F, 0x00));
    }

    #[test]
    fn test_position_raw_split() {
        let pos = Position::from_raw(18_000);
        assert_eq!(pos.high, 0x46);
        assert_eq!(pos.low, 0x50);
        assert_eq!(pos.raw(), 18_000);
        assert_eq!(pos.to_string(), "4650");
        assert_eq!(Position::from_hex("46", "5").unwrap(), Position::new(0x46, 0x05));
    }
}

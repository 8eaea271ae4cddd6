//! Fixed-layout command frames for the scanner head
//!
//! Every command is 7 bytes:
//!
//! ```text
//! ┌──────┬─────────┬───────┬────────┬────────┬────────┬──────────┐
//! │ sync │ address │ group │ opcode │ param1 │ param2 │ checksum │
//! │ 0xFF │  u8     │ 0x00  │  u8    │  u8    │  u8    │  u8      │
//! └──────┴─────────┴───────┴────────┴────────┴────────┴──────────┘
//! ```
//!
//! The checksum is an additive sum over five bytes with a single
//! wrap-around (see [`checksum256`]). Which five bytes are summed is the
//! [`ChecksumSpan`]; the default is the first five bytes of the frame.

use super::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes covered by the frame checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumSpan {
    /// sync, address, group, opcode, param1
    #[default]
    Header,
    /// address, group, opcode, param1, param2 (standard Pelco-D)
    Pelco,
}

impl ChecksumSpan {
    /// Select the five checksummed bytes out of a frame header
    #[inline]
    pub fn select(self, header: &[u8; HEADER_LEN]) -> [u8; 5] {
        match self {
            ChecksumSpan::Header => [header[0], header[1], header[2], header[3], header[4]],
            ChecksumSpan::Pelco => [header[1], header[2], header[3], header[4], header[5]],
        }
    }
}

/// Additive checksum with a single wrap-around
///
/// Sums the bytes and subtracts 256 once if the sum exceeds 256. Sums of
/// 512 and above are therefore not reduced below 256; the frame only ever
/// stores the low byte of the returned value.
///
/// ```
/// use pantilt_io::protocol::checksum256;
///
/// // FF + 01 + 00 + 02 + 32 = 308 → 52
/// assert_eq!(checksum256(&[0xFF, 0x01, 0x00, 0x02, 0x32]), 0x34);
/// ```
#[inline]
pub fn checksum256(bytes: &[u8]) -> u16 {
    let sum: u16 = bytes.iter().map(|&b| b as u16).sum();
    if sum > 256 { sum - 256 } else { sum }
}

/// Parse a one- or two-digit hex byte, zero-padding single digits
///
/// `"3"` and `"03"` both parse to `0x03`. Case-insensitive. Anything but
/// hex digits (signs, whitespace) is rejected.
pub fn parse_hex_byte(text: &str) -> Result<u8> {
    if text.is_empty() || text.len() > 2 || !is_hex_digits(text) {
        return Err(Error::InvalidParameter(format!(
            "expected 1 or 2 hex digits, got '{}'",
            text
        )));
    }
    u8::from_str_radix(text, 16)
        .map_err(|_| Error::InvalidParameter(format!("not a hex byte: '{}'", text)))
}

fn is_hex_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encoded command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Build a frame and compute its checksum
    pub fn encode(
        address: u8,
        group: u8,
        opcode: u8,
        param1: u8,
        param2: u8,
        span: ChecksumSpan,
    ) -> Self {
        let header = [SYNC_BYTE, address, group, opcode, param1, param2];
        let checksum = checksum256(&span.select(&header)) as u8;

        let mut bytes = [0u8; FRAME_LEN];
        bytes[..HEADER_LEN].copy_from_slice(&header);
        bytes[HEADER_LEN] = checksum;
        Self { bytes }
    }

    /// Parse a raw datagram and verify its checksum
    pub fn from_bytes(data: &[u8], span: ChecksumSpan) -> Result<Self> {
        if data.len() != FRAME_LEN {
            return Err(Error::InvalidFrame(format!(
                "expected {} bytes, got {}",
                FRAME_LEN,
                data.len()
            )));
        }
        if data[0] != SYNC_BYTE {
            return Err(Error::InvalidFrame(format!(
                "bad sync byte {:#04x}",
                data[0]
            )));
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&data[..HEADER_LEN]);
        let expected = checksum256(&span.select(&header)) as u8;
        let actual = data[HEADER_LEN];
        if expected != actual {
            return Err(Error::ChecksumError { expected, actual });
        }

        let mut bytes = [0u8; FRAME_LEN];
        bytes.copy_from_slice(data);
        Ok(Self { bytes })
    }

    /// Parse whitespace-separated hex groups, e.g. `"FF 01 00 02 32 00 34"`
    pub fn parse_hex(text: &str, span: ChecksumSpan) -> Result<Self> {
        let bytes = text
            .split_whitespace()
            .map(|group| {
                if group.len() != 2 || !is_hex_digits(group) {
                    return Err(Error::InvalidFrame(format!("bad hex group '{}'", group)));
                }
                u8::from_str_radix(group, 16)
                    .map_err(|_| Error::InvalidFrame(format!("bad hex group '{}'", group)))
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::from_bytes(&bytes, span)
    }

    /// Raw frame bytes for sending
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn address(&self) -> u8 {
        self.bytes[1]
    }

    #[inline]
    pub fn opcode(&self) -> u8 {
        self.bytes[3]
    }

    #[inline]
    pub fn param1(&self) -> u8 {
        self.bytes[PARAM1_OFFSET]
    }

    #[inline]
    pub fn param2(&self) -> u8 {
        self.bytes[PARAM2_OFFSET]
    }

    #[inline]
    pub fn checksum(&self) -> u8 {
        self.bytes[HEADER_LEN]
    }

    /// Text rendering, uppercase 2-digit groups separated by spaces
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_right_scenario() {
        let frame = Frame::encode(0x01, 0x00, CMD_PAN_RIGHT, 0x32, 0x00, ChecksumSpan::Header);
        // (FF + 01 + 00 + 02 + 32) = 308, minus 256 once = 52
        assert_eq!(frame.checksum(), 0x34);
        assert_eq!(frame.to_hex(), "FF 01 00 02 32 00 34");
    }

    #[test]
    fn test_pelco_span() {
        let frame = Frame::encode(0x01, 0x00, CMD_PAN_RIGHT, 0x32, 0x00, ChecksumSpan::Pelco);
        // 01 + 00 + 02 + 32 + 00 = 0x35, no wrap
        assert_eq!(frame.checksum(), 0x35);
        assert_eq!(frame.to_hex(), "FF 01 00 02 32 00 35");
    }

    #[test]
    fn test_checksum_single_wrap() {
        // Below and at 256: untouched
        assert_eq!(checksum256(&[0x10, 0x20]), 0x30);
        assert_eq!(checksum256(&[0xFF, 0x01]), 256);
        // Just above 256: one subtraction
        assert_eq!(checksum256(&[0xFF, 0x02]), 1);
    }

    #[test]
    fn test_checksum_quirk_above_512() {
        // 255 + 255 + 0 + 90 + 0 = 600 → 344, not reduced to 88
        let raw = checksum256(&[0xFF, 0xFF, 0x00, 0x5A, 0x00]);
        assert_eq!(raw, 344);

        // The frame keeps the low byte of the raw value
        let frame = Frame::encode(0xFF, 0x00, 0x5A, 0x00, 0x00, ChecksumSpan::Header);
        assert_eq!(frame.checksum(), (raw & 0xFF) as u8);
        assert_eq!(frame.checksum(), 0x58);
        assert!(Frame::from_bytes(frame.as_bytes(), ChecksumSpan::Header).is_ok());
    }

    #[test]
    fn test_checksum_invariant_over_params() {
        for p1 in [0x00u8, 0x01, 0x32, 0x7F, 0xFE, 0xFF] {
            for p2 in [0x00u8, 0x30, 0xFF] {
                let frame = Frame::encode(0x01, 0x00, CMD_MOVE_TO, p1, p2, ChecksumSpan::Header);
                let sum = 0xFFu16 + 0x01 + 0x00 + CMD_MOVE_TO as u16 + p1 as u16;
                let expected = if sum > 256 { sum - 256 } else { sum };
                assert_eq!(frame.checksum(), expected as u8);
            }
        }
    }

    #[test]
    fn test_parse_hex_byte_pads_single_digit() {
        assert_eq!(parse_hex_byte("3").unwrap(), 0x03);
        assert_eq!(parse_hex_byte("03").unwrap(), 0x03);
        assert_eq!(parse_hex_byte("3f").unwrap(), 0x3F);
        assert_eq!(parse_hex_byte("3F").unwrap(), 0x3F);
        assert!(parse_hex_byte("").is_err());
        assert!(parse_hex_byte("123").is_err());
        assert!(parse_hex_byte("zz").is_err());
    }

    #[test]
    fn test_parse_hex_byte_rejects_sign_and_whitespace() {
        assert!(parse_hex_byte("+3").is_err());
        assert!(parse_hex_byte(" 3").is_err());
        assert!(parse_hex_byte("3 ").is_err());
        assert!(parse_hex_byte("-1").is_err());
        assert!(Frame::parse_hex("FF 01 00 02 +2 00 34", ChecksumSpan::Header).is_err());
    }

    #[test]
    fn test_parse_hex_frame() {
        let frame = Frame::parse_hex("FF 01 00 02 32 00 34", ChecksumSpan::Header).unwrap();
        assert_eq!(frame.opcode(), CMD_PAN_RIGHT);
        assert_eq!(frame.param1(), 0x32);

        let err = Frame::parse_hex("FF 01 00 02 32 00 35", ChecksumSpan::Header).unwrap_err();
        assert!(matches!(
            err,
            Error::ChecksumError {
                expected: 0x34,
                actual: 0x35
            }
        ));

        assert!(Frame::parse_hex("FF 01 00", ChecksumSpan::Header).is_err());
        assert!(Frame::parse_hex("FF 1 00 02 32 00 34", ChecksumSpan::Header).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_bad_sync() {
        let frame = Frame::encode(0x01, 0x00, CMD_STOP, 0, 0, ChecksumSpan::Header);
        let mut bytes = [0u8; FRAME_LEN];
        bytes.copy_from_slice(frame.as_bytes());
        bytes[0] = 0xFE;
        assert!(matches!(
            Frame::from_bytes(&bytes, ChecksumSpan::Header),
            Err(Error::InvalidFrame(_))
        ));
    }
}

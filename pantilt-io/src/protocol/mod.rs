//! Pan/tilt command codec
//!
//! Maps logical [`Command`]s onto 7-byte [`Frame`]s and decodes position
//! replies. Stateless: frames are built per call and discarded after send.

pub mod constants;
pub mod frame;
pub mod reply;
pub mod speed;

pub use constants::*;
pub use frame::{ChecksumSpan, Frame, checksum256, parse_hex_byte};
pub use reply::{Position, decode_position, encode_position_reply};
pub use speed::degrees_per_second;

/// Logical operation on the scanner head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Pan left at the given speed code
    MoveLeft { speed: u8 },
    /// Pan right at the given speed code
    MoveRight { speed: u8 },
    /// Tilt up, both speed bytes set to `speed`
    MoveUp { speed: u8 },
    /// Tilt down, both speed bytes set to `speed`
    MoveDown { speed: u8 },
    /// Halt all motion
    Stop,
    /// Go to an absolute pan position
    MoveTo(Position),
    /// Ask the head for its current position
    GetPosition,
}

impl Command {
    /// Opcode and parameter bytes for this command
    pub fn opcode_and_params(&self) -> (u8, u8, u8) {
        match *self {
            Command::MoveLeft { speed } => (CMD_PAN_LEFT, speed, 0x00),
            Command::MoveRight { speed } => (CMD_PAN_RIGHT, speed, 0x00),
            Command::MoveUp { speed } => (CMD_TILT_UP, speed, speed),
            Command::MoveDown { speed } => (CMD_TILT_DOWN, speed, speed),
            Command::Stop => (CMD_STOP, 0x00, 0x00),
            Command::MoveTo(pos) => (CMD_MOVE_TO, pos.high, pos.low),
            Command::GetPosition => (CMD_QUERY_POSITION, 0x00, 0x00),
        }
    }

    /// Whether the head answers this command
    pub fn expects_reply(&self) -> bool {
        matches!(self, Command::GetPosition)
    }

    /// Encode for the device at `address`
    pub fn to_frame(&self, address: u8, span: ChecksumSpan) -> Frame {
        let (opcode, param1, param2) = self.opcode_and_params();
        Frame::encode(address, COMMAND_GROUP, opcode, param1, param2, span)
    }

    /// Recover a command from a received frame
    ///
    /// Returns `None` for opcodes this head does not understand.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let (p1, p2) = (frame.param1(), frame.param2());
        match frame.opcode() {
            CMD_PAN_RIGHT if p1 == 0 && p2 == 0 => Some(Command::Stop),
            CMD_PAN_RIGHT => Some(Command::MoveRight { speed: p1 }),
            CMD_PAN_LEFT => Some(Command::MoveLeft { speed: p1 }),
            CMD_TILT_UP => Some(Command::MoveUp { speed: p2 }),
            CMD_TILT_DOWN => Some(Command::MoveDown { speed: p2 }),
            CMD_MOVE_TO => Some(Command::MoveTo(Position::new(p1, p2))),
            CMD_QUERY_POSITION => Some(Command::GetPosition),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_frames() {
        let span = ChecksumSpan::Header;
        let hex = |cmd: Command| cmd.to_frame(0x01, span).to_hex();

        assert!(hex(Command::MoveLeft { speed: 0x32 }).starts_with("FF 01 00 04 32 00"));
        assert!(hex(Command::MoveUp { speed: 0x30 }).starts_with("FF 01 00 08 30 30"));
        assert!(hex(Command::MoveDown { speed: 0x30 }).starts_with("FF 01 00 10 30 30"));
        assert!(hex(Command::Stop).starts_with("FF 01 00 02 00 00"));
        assert!(hex(Command::GetPosition).starts_with("FF 01 00 51 00 00"));
        assert!(hex(Command::MoveTo(Position::new(0x12, 0x34))).starts_with("FF 01 00 71 12 34"));
    }

    #[test]
    fn test_only_query_expects_reply() {
        assert!(Command::GetPosition.expects_reply());
        assert!(!Command::Stop.expects_reply());
        assert!(!Command::MoveTo(Position::default()).expects_reply());
    }

    #[test]
    fn test_from_frame() {
        let span = ChecksumSpan::Header;
        for cmd in [
            Command::MoveLeft { speed: 0x20 },
            Command::MoveRight { speed: 0x3F },
            Command::MoveUp { speed: 0x30 },
            Command::MoveDown { speed: 0x10 },
            Command::Stop,
            Command::MoveTo(Position::new(0x46, 0x50)),
            Command::GetPosition,
        ] {
            assert_eq!(Command::from_frame(&cmd.to_frame(0x01, span)), Some(cmd));
        }

        let unknown = Frame::encode(0x01, 0x00, 0x99, 0, 0, span);
        assert_eq!(Command::from_frame(&unknown), None);
    }
}

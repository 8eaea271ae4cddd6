//! Protocol constants for the pan/tilt scanner head
//!
//! Opcodes and default speed bytes as observed on the rig's scanner head
//! (Pelco-D derived command set over UDP).

// ============================================================================
// Frame Layout
// ============================================================================

/// First byte of every frame
pub const SYNC_BYTE: u8 = 0xFF;

/// Command-group byte (Pelco "command 1"), always zero on this head
pub const COMMAND_GROUP: u8 = 0x00;

/// Header + opcode + two parameters
pub const HEADER_LEN: usize = 6;

/// Header plus trailing checksum byte
pub const FRAME_LEN: usize = HEADER_LEN + 1;

/// Offset of param1 inside a frame
pub const PARAM1_OFFSET: usize = 4;

/// Offset of param2 inside a frame
pub const PARAM2_OFFSET: usize = 5;

// ============================================================================
// Opcodes
// ============================================================================

/// Pan right at param1 speed
pub const CMD_PAN_RIGHT: u8 = 0x02;

/// Pan left at param1 speed
pub const CMD_PAN_LEFT: u8 = 0x04;

/// Tilt up at param2 speed
pub const CMD_TILT_UP: u8 = 0x08;

/// Tilt down at param2 speed
pub const CMD_TILT_DOWN: u8 = 0x10;

/// Stop: the head halts on "pan right" with both speeds zero
pub const CMD_STOP: u8 = CMD_PAN_RIGHT;

/// Query pan position
pub const CMD_QUERY_POSITION: u8 = 0x51;

/// Absolute pan position (param1 = high byte, param2 = low byte)
pub const CMD_MOVE_TO: u8 = 0x71;

/// Opcode the head uses in its position reply
pub const RESP_POSITION: u8 = 0x59;

// ============================================================================
// Reply Layout
// ============================================================================

/// Offset of the position high byte in a query reply
pub const REPLY_HIGH_OFFSET: usize = 4;

/// Offset of the position low byte in a query reply
pub const REPLY_LOW_OFFSET: usize = 5;

/// Shortest reply that still carries a position
pub const REPLY_MIN_LEN: usize = REPLY_LOW_OFFSET + 1;

/// Receive buffer size for position queries
pub const DEFAULT_MAX_REPLY_BYTES: usize = 8192;

// ============================================================================
// Default Speeds
// ============================================================================

/// Pan speed used by move_left / move_right when none is given
pub const DEFAULT_PAN_SPEED: u8 = 0x32;

/// Tilt speed used by move_up / move_down (sent in both speed bytes)
pub const DEFAULT_TILT_SPEED: u8 = 0x30;

// ============================================================================
// Network
// ============================================================================

/// Scanner head address on the rig network
pub const DEFAULT_DEVICE_HOST: &str = "192.168.0.93";

/// Scanner head UDP port
pub const DEFAULT_DEVICE_PORT: u16 = 6000;

/// Pelco device address of the head
pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x01;

//! Device session: semantic pan/tilt operations
//!
//! Each operation builds one frame and hands it to the transport. The
//! session keeps no state beyond the device parameters; the head does not
//! stop on its own, so callers must follow continuous motion with `stop()`.

use crate::config::{DeviceConfig, PantiltConfig};
use crate::error::Result;
use crate::protocol::{ChecksumSpan, Command, Position, decode_position, speed};
use crate::transport::{Transport, UdpTransport};

/// Semantic API over one scanner head
pub struct DeviceSession<T: Transport> {
    transport: T,
    address: u8,
    span: ChecksumSpan,
    pan_speed: u8,
    tilt_speed: u8,
    max_reply_bytes: usize,
}

impl DeviceSession<UdpTransport> {
    /// Session over UDP to the configured head
    pub fn connect(config: &PantiltConfig) -> Result<Self> {
        let transport = UdpTransport::new(
            &config.device.address_string(),
            config.transport.timeout(),
        )?;
        log::info!(
            "Scanner head at {} (address {:#04x}, checksum span {:?})",
            transport.device_addr(),
            config.device.address,
            config.device.checksum_span
        );
        Ok(Self::new(
            transport,
            &config.device,
            config.transport.max_reply_bytes,
        ))
    }
}

impl<T: Transport> DeviceSession<T> {
    pub fn new(transport: T, device: &DeviceConfig, max_reply_bytes: usize) -> Self {
        Self {
            transport,
            address: device.address,
            span: device.checksum_span,
            pan_speed: device.pan_speed,
            tilt_speed: device.tilt_speed,
            max_reply_bytes,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Pan speed used when no speed is given
    pub fn default_pan_speed(&self) -> u8 {
        self.pan_speed
    }

    /// Tilt speed used by move_up / move_down
    pub fn default_tilt_speed(&self) -> u8 {
        self.tilt_speed
    }

    fn send(&self, command: Command) -> Result<()> {
        let frame = command.to_frame(self.address, self.span);
        log::debug!("{:?} -> {}", command, frame);
        self.transport.send(&frame)
    }

    pub fn move_left(&self) -> Result<()> {
        self.send(Command::MoveLeft {
            speed: self.pan_speed,
        })
    }

    /// Pan right at `speed` (speed code, see [`speed::degrees_per_second`])
    pub fn move_right(&self, speed: u8) -> Result<()> {
        if speed::degrees_per_second(speed).is_none() {
            log::warn!("Speed code {:#04x} is outside the head's speed table", speed);
        }
        self.send(Command::MoveRight { speed })
    }

    pub fn move_up(&self) -> Result<()> {
        self.send(Command::MoveUp {
            speed: self.tilt_speed,
        })
    }

    pub fn move_down(&self) -> Result<()> {
        self.send(Command::MoveDown {
            speed: self.tilt_speed,
        })
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Absolute move; `position` halves go out as param1/param2
    pub fn move_to(&self, position: Position) -> Result<()> {
        self.send(Command::MoveTo(position))
    }

    /// Query the head and decode the position from its reply
    pub fn get_current_position(&self) -> Result<Position> {
        let frame = Command::GetPosition.to_frame(self.address, self.span);
        log::debug!("GetPosition -> {}", frame);
        let reply = self.transport.send_and_receive(&frame, self.max_reply_bytes)?;
        let position = decode_position(&reply).inspect_err(|e| {
            log::error!("Position reply rejected: {}", e);
        })?;
        log::debug!("Position <- {}", position);
        Ok(position)
    }

    /// Angular speed for a speed code, `None` if unmapped
    pub fn degrees_per_second(&self, speed: u8) -> Option<f64> {
        speed::degrees_per_second(speed)
    }
}

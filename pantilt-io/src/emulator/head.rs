//! Motion model of the emulated head
//!
//! Positions are kept in hundredths of a degree. Pan wraps at 360°, tilt
//! is clamped to `0..=TILT_LIMIT`. Motion is integrated lazily: every
//! command or query first advances the state to `now`.

use crate::protocol::{Command, Position, speed};
use std::time::Instant;

/// Full pan turn in hundredths of a degree
pub const PAN_FULL_TURN: f64 = 36_000.0;

/// Upper tilt stop in hundredths of a degree
pub const TILT_LIMIT: f64 = 9_000.0;

/// Current motion of the head
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Idle,
    /// Pan motion; positive rate pans right (hundredths/sec)
    Pan { rate: f64 },
    /// Tilt motion; positive rate tilts up (hundredths/sec)
    Tilt { rate: f64 },
}

/// Emulated head state
#[derive(Debug, Clone)]
pub struct HeadState {
    pan: f64,
    tilt: f64,
    motion: Motion,
    updated: Instant,
}

impl HeadState {
    pub fn new(start_pan: u16, start_tilt: u16, now: Instant) -> Self {
        Self {
            pan: wrap_pan(start_pan as f64),
            tilt: (start_tilt as f64).clamp(0.0, TILT_LIMIT),
            motion: Motion::Idle,
            updated: now,
        }
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    /// Pan position at `now`, hundredths of a degree
    pub fn pan_at(&mut self, now: Instant) -> u16 {
        self.advance(now);
        self.pan.round() as u16 % PAN_FULL_TURN as u16
    }

    /// Tilt position at `now`, hundredths of a degree
    pub fn tilt_at(&mut self, now: Instant) -> u16 {
        self.advance(now);
        self.tilt.round() as u16
    }

    /// Position reported to GET_POSITION queries (the pan axis)
    pub fn position_at(&mut self, now: Instant) -> Position {
        Position::from_raw(self.pan_at(now))
    }

    /// Apply a received command at `now`
    pub fn apply(&mut self, command: Command, now: Instant) {
        self.advance(now);
        match command {
            Command::MoveRight { speed } => self.motion = Motion::Pan { rate: rate(speed) },
            Command::MoveLeft { speed } => self.motion = Motion::Pan { rate: -rate(speed) },
            Command::MoveUp { speed } => self.motion = Motion::Tilt { rate: rate(speed) },
            Command::MoveDown { speed } => self.motion = Motion::Tilt { rate: -rate(speed) },
            Command::Stop => self.motion = Motion::Idle,
            Command::MoveTo(position) => {
                self.motion = Motion::Idle;
                self.pan = wrap_pan(position.raw() as f64);
            }
            Command::GetPosition => {}
        }
    }

    fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.updated).as_secs_f64();
        self.updated = now.max(self.updated);
        match self.motion {
            Motion::Idle => {}
            Motion::Pan { rate } => self.pan = wrap_pan(self.pan + rate * dt),
            Motion::Tilt { rate } => {
                self.tilt = (self.tilt + rate * dt).clamp(0.0, TILT_LIMIT);
            }
        }
    }
}

/// Speed code to hundredths of a degree per second; unmapped codes don't move
fn rate(code: u8) -> f64 {
    match speed::degrees_per_second(code) {
        Some(dps) => dps * 100.0,
        None => {
            log::warn!("Emulated head ignoring unmapped speed code {:#04x}", code);
            0.0
        }
    }
}

fn wrap_pan(pan: f64) -> f64 {
    pan.rem_euclid(PAN_FULL_TURN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pan_right_integrates_speed() {
        let t0 = Instant::now();
        let mut head = HeadState::new(0, 0, t0);
        head.apply(Command::MoveRight { speed: 0x3F }, t0);

        // 0x3F is ~43.01°/s, so one second moves ~4301 hundredths
        let pan = head.pan_at(t0 + Duration::from_secs(1));
        assert!((4300..=4302).contains(&pan), "pan = {}", pan);
    }

    #[test]
    fn test_pan_left_wraps_below_zero() {
        let t0 = Instant::now();
        let mut head = HeadState::new(100, 0, t0);
        head.apply(Command::MoveLeft { speed: 0x3F }, t0);
        let pan = head.pan_at(t0 + Duration::from_secs(1));
        assert!(pan > 30_000, "pan = {}", pan);
    }

    #[test]
    fn test_stop_freezes_position() {
        let t0 = Instant::now();
        let mut head = HeadState::new(0, 0, t0);
        head.apply(Command::MoveRight { speed: 0x32 }, t0);
        head.apply(Command::Stop, t0 + Duration::from_millis(500));
        let stopped = head.pan_at(t0 + Duration::from_millis(500));
        assert_eq!(head.pan_at(t0 + Duration::from_secs(5)), stopped);
        assert_eq!(head.motion(), Motion::Idle);
    }

    #[test]
    fn test_move_to_sets_pan() {
        let t0 = Instant::now();
        let mut head = HeadState::new(0, 0, t0);
        head.apply(Command::MoveTo(Position::new(0x46, 0x50)), t0);
        assert_eq!(head.position_at(t0), Position::new(0x46, 0x50));
    }

    #[test]
    fn test_tilt_clamps() {
        let t0 = Instant::now();
        let mut head = HeadState::new(0, 8_900, t0);
        head.apply(Command::MoveUp { speed: 0x3F }, t0);
        assert_eq!(head.tilt_at(t0 + Duration::from_secs(10)), TILT_LIMIT as u16);

        head.apply(Command::MoveDown { speed: 0x3F }, t0 + Duration::from_secs(10));
        assert_eq!(head.tilt_at(t0 + Duration::from_secs(60)), 0);
    }

    #[test]
    fn test_unmapped_speed_does_not_move() {
        let t0 = Instant::now();
        let mut head = HeadState::new(1_000, 0, t0);
        head.apply(Command::MoveRight { speed: 0x01 }, t0);
        assert_eq!(head.pan_at(t0 + Duration::from_secs(3)), 1_000);
    }
}

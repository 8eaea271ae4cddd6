//! Emulated scanner head for hardware-free testing
//!
//! Speaks the same UDP frame protocol as the real head:
//!
//! | Frame | Effect |
//! |-------|--------|
//! | `02 ss 00` / `04 ss 00` | Pan right / left at speed `ss` |
//! | `08 ss ss` / `10 ss ss` | Tilt up / down at speed `ss` |
//! | `02 00 00` | Stop |
//! | `71 hh ll` | Pan to `hh << 8 \| ll` hundredths of a degree |
//! | `51 00 00` | Reply `FF addr 00 59 hh ll cs` with the pan position |
//!
//! Datagrams with a bad length, sync byte or checksum are logged and
//! dropped. The most recent accepted frames are kept for inspection
//! (`frame_history` in `[emulator]`), along with a running total.
//!
//! # Usage
//!
//! ```no_run
//! use pantilt_io::config::EmulatorConfig;
//! use pantilt_io::emulator::Emulator;
//! use pantilt_io::protocol::ChecksumSpan;
//!
//! let handle = Emulator::spawn(&EmulatorConfig::default(), 0x01, ChecksumSpan::Header)?;
//! println!("emulated head on {}", handle.local_addr());
//! handle.stop();
//! # Ok::<(), pantilt_io::Error>(())
//! ```

mod head;

pub use head::{HeadState, Motion, PAN_FULL_TURN, TILT_LIMIT};

use crate::config::EmulatorConfig;
use crate::error::{Error, Result};
use crate::protocol::{ChecksumSpan, Command, Frame, encode_position_reply};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval for the running flag
const RECV_TIMEOUT: Duration = Duration::from_millis(50);

/// Receive buffer; anything larger than a frame is rejected anyway
const RECV_BUFFER_LEN: usize = 64;

/// Bounded history of accepted frames
#[derive(Debug)]
struct FrameLog {
    recent: VecDeque<Frame>,
    capacity: usize,
    total: u64,
}

impl FrameLog {
    fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total: 0,
        }
    }

    fn push(&mut self, frame: Frame) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(frame);
    }
}

/// UDP server loop for one emulated head
pub struct Emulator {
    socket: UdpSocket,
    address: u8,
    span: ChecksumSpan,
    state: Arc<Mutex<HeadState>>,
    frames: Arc<Mutex<FrameLog>>,
    running: Arc<AtomicBool>,
}

impl Emulator {
    /// Bind the configured address and serve on a background thread
    pub fn spawn(config: &EmulatorConfig, address: u8, span: ChecksumSpan) -> Result<EmulatorHandle> {
        let socket = UdpSocket::bind(&config.bind_address).map_err(|e| {
            Error::Other(format!(
                "Failed to bind emulator to {}: {}",
                config.bind_address, e
            ))
        })?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let state = Arc::new(Mutex::new(HeadState::new(
            config.start_pan,
            config.start_tilt,
            Instant::now(),
        )));
        let frames = Arc::new(Mutex::new(FrameLog::new(config.frame_history)));
        let running = Arc::new(AtomicBool::new(true));

        let emulator = Emulator {
            socket,
            address,
            span,
            state: Arc::clone(&state),
            frames: Arc::clone(&frames),
            running: Arc::clone(&running),
        };

        let thread = thread::Builder::new()
            .name("pantilt-emulator".to_string())
            .spawn(move || emulator.run())
            .map_err(|e| Error::Other(format!("Failed to spawn emulator thread: {}", e)))?;

        log::info!(
            "Emulated head (address {:#04x}) listening on {}",
            address,
            local_addr
        );

        Ok(EmulatorHandle {
            local_addr,
            state,
            frames,
            running,
            thread: Some(thread),
        })
    }

    fn run(&self) {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        while self.running.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, peer)) => self.handle_datagram(&buf[..len], peer),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => {
                    log::error!("Emulator receive error: {}", e);
                    thread::sleep(RECV_TIMEOUT);
                }
            }
        }
        log::debug!("Emulator stopped");
    }

    fn handle_datagram(&self, data: &[u8], peer: SocketAddr) {
        let frame = match Frame::from_bytes(data, self.span) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Dropping datagram from {}: {}", peer, e);
                return;
            }
        };
        if frame.address() != self.address {
            log::debug!(
                "Ignoring frame for address {:#04x} from {}",
                frame.address(),
                peer
            );
            return;
        }
        self.frames.lock().push(frame);

        let Some(command) = Command::from_frame(&frame) else {
            log::warn!("Unknown opcode {:#04x} from {}", frame.opcode(), peer);
            return;
        };
        log::debug!("{} <- {:?}", peer, command);

        let now = Instant::now();
        let mut state = self.state.lock();
        state.apply(command, now);
        if command.expects_reply() {
            let reply = encode_position_reply(self.address, state.position_at(now), self.span);
            drop(state);
            if let Err(e) = self.socket.send_to(reply.as_bytes(), peer) {
                log::error!("Failed to reply to {}: {}", peer, e);
            }
        }
    }
}

/// Handle to a running emulator; stops it on drop
pub struct EmulatorHandle {
    local_addr: SocketAddr,
    state: Arc<Mutex<HeadState>>,
    frames: Arc<Mutex<FrameLog>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EmulatorHandle {
    /// Address the emulated head listens on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Most recently accepted frames, oldest first
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().recent.iter().copied().collect()
    }

    /// Frames accepted since start, including ones dropped from history
    pub fn frame_count(&self) -> u64 {
        self.frames.lock().total
    }

    /// Forget the recorded history; the total is kept
    pub fn clear_frames(&self) {
        self.frames.lock().recent.clear();
    }

    /// Current pan position in hundredths of a degree
    pub fn pan(&self) -> u16 {
        self.state.lock().pan_at(Instant::now())
    }

    /// Current tilt position in hundredths of a degree
    pub fn tilt(&self) -> u16 {
        self.state.lock().tilt_at(Instant::now())
    }

    pub fn motion(&self) -> Motion {
        self.state.lock().motion()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the server thread and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for EmulatorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

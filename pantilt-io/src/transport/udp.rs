//! UDP transport to the scanner head

use super::Transport;
use crate::error::{Error, Result};
use crate::protocol::Frame;
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

/// Connectionless transport, one ephemeral socket per call
#[derive(Debug, Clone)]
pub struct UdpTransport {
    device: SocketAddr,
    timeout: Duration,
}

impl UdpTransport {
    /// Resolve the device address once at construction
    pub fn new(device: &str, timeout: Duration) -> Result<Self> {
        let device = device
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("Cannot resolve device {}: {}", device, e)))?
            .next()
            .ok_or_else(|| Error::Config(format!("No address for device {}", device)))?;

        if timeout.is_zero() {
            return Err(Error::Config("transport timeout must be non-zero".to_string()));
        }

        Ok(Self { device, timeout })
    }

    pub fn device_addr(&self) -> SocketAddr {
        self.device
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn unreachable(&self, source: std::io::Error) -> Error {
        Error::DeviceUnreachable {
            addr: self.device.to_string(),
            source,
        }
    }

    /// Bind an ephemeral socket on the matching address family
    fn open_socket(&self) -> Result<UdpSocket> {
        let bind_addr = if self.device.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        UdpSocket::bind(bind_addr).map_err(|e| self.unreachable(e))
    }

    fn send_on(&self, socket: &UdpSocket, frame: &Frame) -> Result<()> {
        let sent = socket
            .send_to(frame.as_bytes(), self.device)
            .map_err(|e| self.unreachable(e))?;
        if sent != frame.as_bytes().len() {
            return Err(Error::Other(format!(
                "Short datagram: sent {} of {} bytes",
                sent,
                frame.as_bytes().len()
            )));
        }
        log::trace!("UDP -> {}: {}", self.device, frame);
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn send(&self, frame: &Frame) -> Result<()> {
        let socket = self.open_socket()?;
        self.send_on(&socket, frame)
    }

    fn send_and_receive(&self, frame: &Frame, max_bytes: usize) -> Result<Vec<u8>> {
        let socket = self.open_socket()?;
        self.send_on(&socket, frame)?;

        // Foreign datagrams must not extend the wait
        let deadline = Instant::now() + self.timeout;
        let mut buffer = vec![0u8; max_bytes];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::TransportTimeout(self.timeout));
            }
            socket.set_read_timeout(Some(remaining))?;
            match socket.recv_from(&mut buffer) {
                Ok((len, from)) if from == self.device => {
                    buffer.truncate(len);
                    log::trace!("UDP <- {}: {} bytes", from, len);
                    return Ok(buffer);
                }
                Ok((_, from)) => {
                    log::warn!("Ignoring datagram from unexpected peer {}", from);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Err(Error::TransportTimeout(self.timeout));
                }
                Err(e) => return Err(self.unreachable(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChecksumSpan, Command};

    fn stop_frame() -> Frame {
        Command::Stop.to_frame(0x01, ChecksumSpan::Header)
    }

    #[test]
    fn test_send_reaches_peer() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = peer.local_addr().unwrap().to_string();

        let transport = UdpTransport::new(&addr, Duration::from_millis(200)).unwrap();
        transport.send(&stop_frame()).unwrap();

        let mut buf = [0u8; 16];
        let (len, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], stop_frame().as_bytes());
    }

    #[test]
    fn test_receive_times_out() {
        // Bound but silent peer
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = peer.local_addr().unwrap().to_string();

        let transport = UdpTransport::new(&addr, Duration::from_millis(50)).unwrap();
        let err = transport.send_and_receive(&stop_frame(), 64).unwrap_err();
        assert!(matches!(err, Error::TransportTimeout(_)));
    }

    #[test]
    fn test_reply_truncated_to_max_bytes() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = peer.local_addr().unwrap().to_string();
        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            let (_, from) = peer.recv_from(&mut buf).unwrap();
            peer.send_to(&[0xAA; 32], from).unwrap();
        });

        let transport = UdpTransport::new(&addr, Duration::from_secs(2)).unwrap();
        let reply = transport.send_and_receive(&stop_frame(), 8).unwrap();
        assert!(reply.len() <= 8);
        handle.join().unwrap();
    }

    #[test]
    fn test_foreign_datagrams_do_not_extend_timeout() {
        let device = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = device.local_addr().unwrap().to_string();
        let chatter = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            let (_, from) = device.recv_from(&mut buf).unwrap();
            // Never answer; a third party keeps talking to the caller instead
            let stranger = UdpSocket::bind("127.0.0.1:0").unwrap();
            for _ in 0..40 {
                let _ = stranger.send_to(&[0x00; 7], from);
                std::thread::sleep(Duration::from_millis(25));
            }
        });

        let transport = UdpTransport::new(&addr, Duration::from_millis(200)).unwrap();
        let started = Instant::now();
        let err = transport.send_and_receive(&stop_frame(), 64).unwrap_err();
        let elapsed = started.elapsed();
        assert!(matches!(err, Error::TransportTimeout(_)));
        assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
        chatter.join().unwrap();
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(UdpTransport::new("127.0.0.1:6000", Duration::ZERO).is_err());
    }
}

//! Command server over loopback TCP, driving an emulated head.

use pantilt_io::config::{EmulatorConfig, PantiltConfig};
use pantilt_io::dispatch::{Dispatcher, Payload};
use pantilt_io::emulator::{Emulator, EmulatorHandle};
use pantilt_io::protocol::ChecksumSpan;
use pantilt_io::server::{CommandClient, CommandServer, ErrorKind, Response, WireFormat};
use pantilt_io::transport::UdpTransport;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Harness {
    head: EmulatorHandle,
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    server: Option<JoinHandle<()>>,
}

impl Harness {
    fn start(format: WireFormat) -> Self {
        let head = Emulator::spawn(
            &EmulatorConfig {
                bind_address: "127.0.0.1:0".to_string(),
                ..EmulatorConfig::default()
            },
            0x01,
            ChecksumSpan::Header,
        )
        .unwrap();

        let mut config = PantiltConfig::default();
        config.device.host = "127.0.0.1".to_string();
        config.device.port = head.local_addr().port();
        config.transport.timeout_ms = 500;

        let dispatcher: Arc<Dispatcher<UdpTransport>> =
            Arc::new(Dispatcher::from_config(&config).unwrap());
        let running = Arc::new(AtomicBool::new(true));
        let server =
            CommandServer::bind("127.0.0.1:0", dispatcher, format, Arc::clone(&running)).unwrap();
        let addr = server.local_addr().unwrap();
        let server = thread::spawn(move || server.run().unwrap());

        Self {
            head,
            addr,
            running,
            server: Some(server),
        }
    }

    fn client(&self, format: WireFormat) -> CommandClient {
        let client = CommandClient::connect_with_format(self.addr, format).unwrap();
        client.set_timeout(Some(Duration::from_secs(2))).unwrap();
        client
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(server) = self.server.take() {
            let _ = server.join();
        }
    }
}

#[test]
fn test_json_requests() {
    let harness = Harness::start(WireFormat::Json);
    let mut client = harness.client(WireFormat::Json);

    let response = client
        .request("camera_move_to", Payload::with_position("3f", "0"))
        .unwrap();
    assert_eq!(response, Response::Ok);

    let response = client.request("camera_position", Payload::default()).unwrap();
    assert_eq!(
        response,
        Response::Position {
            high: "3f".to_string(),
            low: "00".to_string()
        }
    );
    assert_eq!(harness.head.frames().len(), 2);
}

#[test]
fn test_postcard_requests() {
    let harness = Harness::start(WireFormat::Postcard);
    let mut client = harness.client(WireFormat::Postcard);

    let response = client.request("camera_right", Payload::with_speed("3f")).unwrap();
    assert!(response.is_ok());
    let response = client.request("camera_stop", Payload::default()).unwrap();
    assert!(response.is_ok());
}

#[test]
fn test_rate_limited_across_clients() {
    let harness = Harness::start(WireFormat::Json);
    let mut first = harness.client(WireFormat::Json);
    let mut second = harness.client(WireFormat::Json);

    assert!(first.request("camera_up", Payload::default()).unwrap().is_ok());
    match second.request("camera_up", Payload::default()).unwrap() {
        Response::Error {
            kind: ErrorKind::RateLimited,
            retry_after_ms: Some(ms),
            ..
        } => assert!(ms <= 500),
        other => panic!("expected rate_limited, got {:?}", other),
    }
}

#[test]
fn test_invalid_request_keeps_connection() {
    let harness = Harness::start(WireFormat::Json);
    let mut client = harness.client(WireFormat::Json);

    let response = client.request("camera_sideways", Payload::default()).unwrap();
    assert!(matches!(
        response,
        Response::Error {
            kind: ErrorKind::InvalidRequest,
            ..
        }
    ));

    let response = client.request("camera_move_to", Payload::default()).unwrap();
    assert!(matches!(
        response,
        Response::Error {
            kind: ErrorKind::InvalidRequest,
            ..
        }
    ));

    assert!(client.request("camera_stop", Payload::default()).unwrap().is_ok());
}

#[test]
fn test_malformed_body_answered() {
    let harness = Harness::start(WireFormat::Json);
    let mut stream = TcpStream::connect(harness.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    let body = b"{not json";
    stream.write_all(&(body.len() as u32).to_be_bytes()).unwrap();
    stream.write_all(body).unwrap();

    let mut len = [0u8; 4];
    stream.read_exact(&mut len).unwrap();
    let mut reply = vec![0u8; u32::from_be_bytes(len) as usize];
    stream.read_exact(&mut reply).unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(reply["error"]["kind"], "invalid_request");
}

#[test]
fn test_slow_sender_stays_in_sync() {
    let harness = Harness::start(WireFormat::Json);
    let mut stream = TcpStream::connect(harness.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(3)))
        .unwrap();

    let body = br#"{"route": "camera_stop"}"#;
    let prefix = (body.len() as u32).to_be_bytes();

    // Split the prefix and the body across the server's read timeout
    stream.write_all(&prefix[..2]).unwrap();
    thread::sleep(Duration::from_millis(700));
    stream.write_all(&prefix[2..]).unwrap();
    stream.write_all(&body[..5]).unwrap();
    thread::sleep(Duration::from_millis(700));
    stream.write_all(&body[5..]).unwrap();

    let mut len = [0u8; 4];
    stream.read_exact(&mut len).unwrap();
    let mut reply = vec![0u8; u32::from_be_bytes(len) as usize];
    stream.read_exact(&mut reply).unwrap();
    assert_eq!(reply, br#""ok""#);
}

#[test]
fn test_oversized_message_closes_connection() {
    let harness = Harness::start(WireFormat::Json);
    let mut stream = TcpStream::connect(harness.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    stream.write_all(&(1u32 << 20).to_be_bytes()).unwrap();

    let mut buf = [0u8; 4];
    // Server closes without answering
    assert!(matches!(stream.read(&mut buf), Ok(0) | Err(_)));
}

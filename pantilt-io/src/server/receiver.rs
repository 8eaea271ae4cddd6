//! Per-client request handler
//!
//! One handler thread per connected client. Requests are read,
//! dispatched, and answered in order on the same connection.
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Client connects to the command port
//! 2. Server spawns a ClientHandler thread for it
//! 3. Handler loops: read request → dispatch → write response
//! 4. On EOF, reset, framing error, or daemon shutdown the socket is closed
//! ```
//!
//! - **Read timeout**: 500ms so the shutdown flag is polled; partial
//!   messages are kept across polls
//! - **Bad payload**: answered with `invalid_request`, connection kept
//! - **Oversized length**: connection closed

use super::wire::{MessageReader, Request, Response, Serializer, write_message};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Poll interval for the shutdown flag while idle
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Serves one client connection
pub struct ClientHandler<T: Transport> {
    serializer: Serializer,
    dispatcher: Arc<Dispatcher<T>>,
    /// Global running flag (daemon shutdown)
    running: Arc<AtomicBool>,
    reader: MessageReader,
}

impl<T: Transport> ClientHandler<T> {
    pub fn new(
        serializer: Serializer,
        dispatcher: Arc<Dispatcher<T>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            serializer,
            dispatcher,
            running,
            reader: MessageReader::new(),
        }
    }

    /// Run the request loop until the client leaves or the daemon stops
    pub fn run(&mut self, mut stream: TcpStream) -> Result<()> {
        let peer = stream.peer_addr().ok();
        log::debug!("Client handler started for {:?}", peer);

        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log::warn!("Failed to set read timeout: {}", e);
        }

        let result = self.serve(&mut stream);
        let _ = stream.shutdown(Shutdown::Both);

        match result {
            Err(Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof
                    || e.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                log::info!("Client {:?} disconnected", peer);
                Ok(())
            }
            other => other,
        }
    }

    fn serve(&mut self, stream: &mut TcpStream) -> Result<()> {
        while self.running.load(Ordering::Relaxed) {
            if !self.reader.poll(stream)? {
                continue;
            }

            let response = match self.serializer.deserialize::<Request>(self.reader.message()) {
                Ok(request) => {
                    log::debug!("Request: {:?}", request);
                    let result = self.dispatcher.dispatch(&request.route, &request.payload);
                    Response::from_result(&result)
                }
                Err(e) => {
                    log::warn!("Discarding malformed request: {}", e);
                    Response::from_error(&e)
                }
            };

            let body = self.serializer.serialize(&response)?;
            write_message(stream, &body)?;
        }

        log::debug!("Running flag cleared, closing client connection");
        Ok(())
    }
}

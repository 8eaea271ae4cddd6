//! TCP command server
//!
//! Accepts any number of clients; each gets its own handler thread and all
//! of them share one [`Dispatcher`], whose throttle arbitrates between them.

mod client;
mod receiver;
pub mod wire;

pub use client::CommandClient;
pub use receiver::ClientHandler;
pub use wire::{ErrorKind, MessageReader, Request, Response, Serializer, WireFormat};

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Sleep between accept polls when no client is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Listening command server
pub struct CommandServer<T: Transport + 'static> {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<T>>,
    serializer: Serializer,
    running: Arc<AtomicBool>,
}

impl<T: Transport + 'static> CommandServer<T> {
    /// Bind the listener; clients are served once [`run`](Self::run) is called
    pub fn bind(
        bind_address: &str,
        dispatcher: Arc<Dispatcher<T>>,
        format: WireFormat,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_address)
            .map_err(|e| Error::Other(format!("Failed to bind to {}: {}", bind_address, e)))?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            dispatcher,
            serializer: Serializer::new(format),
            running,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop; returns once the running flag is cleared
    pub fn run(&self) -> Result<()> {
        log::info!(
            "Command server listening on {} ({:?})",
            self.local_addr()?,
            self.serializer.format()
        );

        let mut handles = Vec::new();
        while self.running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    // Accepted sockets may inherit non-blocking mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        log::error!("Failed to set blocking mode for {}: {}", addr, e);
                        continue;
                    }
                    log::info!("Client connected: {}", addr);

                    let mut handler = ClientHandler::new(
                        self.serializer,
                        Arc::clone(&self.dispatcher),
                        Arc::clone(&self.running),
                    );
                    let spawned = thread::Builder::new()
                        .name("pantilt-client".to_string())
                        .spawn(move || {
                            if let Err(e) = handler.run(stream) {
                                log::error!("Client {} error: {}", addr, e);
                            }
                        });
                    match spawned {
                        Ok(handle) => handles.push(handle),
                        Err(e) => log::error!("Failed to spawn client handler: {}", e),
                    }
                    handles.retain(|h: &thread::JoinHandle<()>| !h.is_finished());
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                }
            }
        }

        log::info!("Command server stopping, waiting for {} clients", handles.len());
        for handle in handles {
            let _ = handle.join();
        }
        Ok(())
    }
}

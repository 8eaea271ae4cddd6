//! Blocking client for the command server

use super::wire::{MessageReader, Request, Response, Serializer, WireFormat, write_message};
use crate::dispatch::Payload;
use crate::error::{Error, Result};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// One TCP connection to a PantiltIO daemon
pub struct CommandClient {
    stream: TcpStream,
    serializer: Serializer,
    reader: MessageReader,
}

impl CommandClient {
    /// Connect with the JSON wire format
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Self::connect_with_format(addr, WireFormat::Json)
    }

    pub fn connect_with_format<A: ToSocketAddrs>(addr: A, format: WireFormat) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            serializer: Serializer::new(format),
            reader: MessageReader::new(),
        })
    }

    /// Bound how long a request waits for its response
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }

    /// Send one request and wait for its response
    pub fn request(&mut self, route: &str, payload: Payload) -> Result<Response> {
        let body = self.serializer.serialize(&Request::new(route, payload))?;
        write_message(&mut self.stream, &body)?;

        if !self.reader.poll(&mut self.stream)? {
            return Err(Error::Other(format!(
                "No response to '{}' before timeout",
                route
            )));
        }
        self.serializer.deserialize(self.reader.message())
    }
}

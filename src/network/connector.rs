//! Transport seam
//!
//! A connector produces the reader/writer pair a connection runs over. The
//! production transport is TCP; tests plug in in-memory streams.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::config::Config;

/// Opens the byte streams a [`Connection`](super::Connection) talks over
pub trait Connector {
    type Reader: Read;
    type Writer: Write;

    /// Establish a new stream pair
    fn connect(&mut self) -> io::Result<(Self::Reader, Self::Writer)>;

    /// Whether the transport reports a live peer for a fresh stream
    fn is_live(&self, _writer: &Self::Writer) -> bool {
        true
    }

    /// Best-effort shutdown of a stream that is being discarded
    fn shutdown(&self, _writer: &Self::Writer) {}

    /// Human-readable peer description for logging
    fn describe(&self) -> String;
}

/// TCP transport configured from a [`Config`]
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: Config,
}

impl TcpConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn connect_stream(&self) -> io::Result<TcpStream> {
        let timeout = match self.config.connect_timeout {
            Some(timeout) => timeout,
            None => return TcpStream::connect(self.config.addr()),
        };

        let mut last_err = None;
        for addr in self.config.addr().to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("could not resolve {}", self.config.addr()),
            )
        }))
    }
}

impl Connector for TcpConnector {
    type Reader = TcpStream;
    type Writer = TcpStream;

    fn connect(&mut self) -> io::Result<(TcpStream, TcpStream)> {
        let stream = self.connect_stream()?;

        stream.set_nodelay(self.config.nodelay)?;
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_write_timeout(self.config.write_timeout)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        Ok((read_stream, stream))
    }

    fn is_live(&self, writer: &TcpStream) -> bool {
        writer.peer_addr().is_ok()
    }

    fn shutdown(&self, writer: &TcpStream) {
        let _ = writer.shutdown(Shutdown::Both);
    }

    fn describe(&self) -> String {
        self.config.addr()
    }
}

//! Connection Manager
//!
//! Owns one stream pair to the server and moves request batches and replies
//! across it in strict order.
//!
//! ## Lifecycle
//! ```text
//! Opening ──ok──▶ Ready ──close()──▶ Closed (terminal)
//!    │              │
//!    └──error──▶ Failed ◀──I/O or framing error
//!                   │
//!                   └──next send() reopens──▶ Opening
//! ```
//!
//! ## Write failure policy
//! When writing a batch fails, the connection is torn down, reopened, and the
//! same batch is written once more. The original error is returned to the
//! caller whether or not the resend worked: the retry only heals the
//! connection for the next call, it never hides a failure.

use std::io::{self, BufReader, BufWriter, Write};

use crate::config::Config;
use crate::error::{RedwireError, Result};
use crate::protocol::{read_reply, write_requests, Reply, Request};
use super::{Connector, TcpConnector};

/// Lifecycle state of a [`Connection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Stream being established and database being selected
    Opening,
    /// Open and aligned on a reply boundary
    Ready,
    /// Torn down after an error, reopened by the next send
    Failed,
    /// Explicitly closed
    Closed,
}

/// A single blocking connection to the server
///
/// Not safe for concurrent use; callers that share one must lock around it.
pub struct Connection<C: Connector = TcpConnector> {
    /// Produces fresh stream pairs on (re)open
    connector: C,

    /// Database selected on every (re)open
    db_index: i64,

    /// Stream reader (buffered for efficiency)
    reader: Option<BufReader<C::Reader>>,

    /// Stream writer (buffered so a batch leaves in one flush)
    writer: Option<BufWriter<C::Writer>>,

    state: ConnectionState,

    /// Whether the transport reported a live peer at open
    reusable: bool,

    /// Peer description for logging
    peer: String,
}

impl<C: Connector> std::fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("db_index", &self.db_index)
            .field("state", &self.state)
            .field("reusable", &self.reusable)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

impl Connection<TcpConnector> {
    /// Open a TCP connection and select the configured database
    pub fn open(config: &Config) -> Result<Self> {
        Self::with_connector(TcpConnector::new(config.clone()), config.db_index)
    }
}

impl<C: Connector> Connection<C> {
    /// Open a connection over a custom transport
    pub fn with_connector(connector: C, db_index: i64) -> Result<Self> {
        let peer = connector.describe();
        let mut connection = Self {
            connector,
            db_index,
            reader: None,
            writer: None,
            state: ConnectionState::Opening,
            reusable: false,
            peer,
        };

        connection.open_stream()?;
        Ok(connection)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True when the last open reached a live peer and nothing failed since
    pub fn is_reusable(&self) -> bool {
        self.reusable && self.state == ConnectionState::Ready
    }

    pub fn db_index(&self) -> i64 {
        self.db_index
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Send one request and read its reply
    ///
    /// The reply is returned as-is, error replies included.
    pub fn send_one(&mut self, request: &Request) -> Result<Reply> {
        self.send(std::slice::from_ref(request))?;
        self.receive_one()
    }

    /// Send one request and turn an error reply into a server error
    pub fn run(&mut self, request: &Request) -> Result<Reply> {
        self.send_one(request)?.into_result()
    }

    /// Send a batch in one write and read one reply per request
    ///
    /// An empty batch performs no I/O.
    pub fn send_batch(&mut self, requests: &[Request]) -> Result<Vec<Reply>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        self.send(requests)?;
        self.receive_all(requests.len())
    }

    /// Write a batch with a single flush
    ///
    /// On a write error the connection is reopened and the batch resent once;
    /// the original error is returned either way.
    pub fn send(&mut self, requests: &[Request]) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(RedwireError::ConnectionClosed);
        }
        if requests.is_empty() {
            return Ok(());
        }
        if self.state != ConnectionState::Ready {
            tracing::debug!("Reopening connection to {} before send", self.peer);
            self.open_stream()?;
        }

        tracing::trace!("Writing {} request(s) to {}", requests.len(), self.peer);

        let original = match self.write_batch(requests) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        tracing::warn!(
            "Write to {} failed, reconnecting and resending {} request(s): {}",
            self.peer,
            requests.len(),
            original
        );
        self.mark_failed();

        match self.resend(requests) {
            Ok(()) => tracing::debug!("Connection to {} restored after write failure", self.peer),
            Err(e) => {
                self.mark_failed();
                tracing::warn!("Recovery of connection to {} failed: {}", self.peer, e);
            }
        }

        Err(original)
    }

    /// Read exactly `count` replies in send order
    pub fn receive_all(&mut self, count: usize) -> Result<Vec<Reply>> {
        let mut replies = Vec::with_capacity(count);
        for _ in 0..count {
            replies.push(self.receive_one()?);
        }
        Ok(replies)
    }

    /// Close the connection
    ///
    /// Best-effort: errors while flushing or shutting down are swallowed.
    /// Closing is terminal; later sends fail with `ConnectionClosed`.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        self.teardown(true);
        self.reusable = false;
        self.state = ConnectionState::Closed;
        tracing::debug!("Connection to {} closed", self.peer);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn open_stream(&mut self) -> Result<()> {
        self.teardown(false);
        self.state = ConnectionState::Opening;

        match self.try_open() {
            Ok(()) => {
                self.state = ConnectionState::Ready;
                tracing::debug!(
                    "Connection established to {} (db {})",
                    self.peer,
                    self.db_index
                );
                Ok(())
            }
            Err(e) => {
                tracing::debug!("Opening connection to {} failed: {}", self.peer, e);
                self.mark_failed();
                Err(e)
            }
        }
    }

    fn try_open(&mut self) -> Result<()> {
        let (reader, writer) = self.connector.connect()?;

        self.reusable = self.connector.is_live(&writer);
        self.reader = Some(BufReader::new(reader));
        self.writer = Some(BufWriter::new(writer));

        let select = Request::command("SELECT").arg(self.db_index);
        self.write_batch(std::slice::from_ref(&select))?;
        self.read_reply()?.into_result()?;

        Ok(())
    }

    /// Reopen, resend, and drain the resent batch's replies so the next call
    /// starts on a reply boundary
    fn resend(&mut self, requests: &[Request]) -> Result<()> {
        self.open_stream()?;
        self.write_batch(requests)?;
        self.receive_all(requests.len())?;
        Ok(())
    }

    fn receive_one(&mut self) -> Result<Reply> {
        if self.state == ConnectionState::Closed {
            return Err(RedwireError::ConnectionClosed);
        }

        match self.read_reply() {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::warn!("Reading reply from {} failed: {}", self.peer, e);
                self.mark_failed();
                Err(e)
            }
        }
    }

    fn write_batch(&mut self, requests: &[Request]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(not_connected)?;
        write_requests(writer, requests)
    }

    fn read_reply(&mut self) -> Result<Reply> {
        let reader = self.reader.as_mut().ok_or_else(not_connected)?;
        read_reply(reader)
    }

    fn mark_failed(&mut self) {
        self.teardown(false);
        self.reusable = false;
        self.state = ConnectionState::Failed;
    }

    /// Drop the current streams. Buffered bytes are flushed only on an
    /// orderly close; after a failure they are discarded.
    fn teardown(&mut self, flush: bool) {
        if let Some(mut writer) = self.writer.take() {
            if flush {
                let _ = writer.flush();
            }
            let (inner, _unflushed) = writer.into_parts();
            self.connector.shutdown(&inner);
        }
        self.reader = None;
    }
}

impl<C: Connector> Drop for Connection<C> {
    fn drop(&mut self) {
        self.close();
    }
}

fn not_connected() -> RedwireError {
    RedwireError::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "connection has no open stream",
    ))
}

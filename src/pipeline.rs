//! Batch/Transaction Executor
//!
//! Queues requests without sending them and sends the whole queue in one
//! round trip on commit, optionally inside a `MULTI`/`EXEC` envelope.
//! Replies are applied to caller-held [`ResultCell`]s in FIFO order.
//!
//! ## Commit outcomes
//! - empty queue: `Ok(true)`, no I/O
//! - plain batch: reply `i` binds to cell `i`, `Ok(true)`
//! - transaction: the real replies are nested in the `EXEC` reply; a nil
//!   `EXEC` reply means the server aborted (e.g. a watched key changed) and
//!   yields `Ok(false)` with every cell left unset
//! - error reply at index `i`: raised as a server error; cells before `i`
//!   hold their values, cells from `i` on stay unset

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::binder::{FromReply, ResultKind};
use crate::commands::Commands;
use crate::error::{RedwireError, Result};
use crate::network::{Connection, Connector, TcpConnector};
use crate::protocol::{Reply, Request};

/// Caller-held handle to a pipelined result
///
/// Unset until a commit applies a reply to it. Handles are cheap to clone and
/// may be read from another thread once the commit has returned.
pub struct ResultCell<T> {
    value: Arc<Mutex<Option<T>>>,
}

impl<T> ResultCell<T> {
    fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// True once a commit has bound a value
    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }

    /// Move the bound value out, leaving the cell unset
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    /// Inspect the bound value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.value.lock().as_ref())
    }

    fn set(&self, value: T) {
        *self.value.lock() = Some(value);
    }
}

impl<T: Clone> ResultCell<T> {
    /// A copy of the bound value, `None` while unset
    pub fn value(&self) -> Option<T> {
        self.value.lock().clone()
    }
}

impl<T> Clone for ResultCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResultCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCell")
            .field("value", &*self.value.lock())
            .finish()
    }
}

/// Type-erased write side of a result cell
trait Slot: Send {
    fn apply(&self, reply: Reply) -> Result<()>;
}

impl<T: FromReply> Slot for ResultCell<T> {
    fn apply(&self, reply: Reply) -> Result<()> {
        self.set(T::from_reply(reply)?);
        Ok(())
    }
}

/// One pending command: request, expected kind, and the cell to fill
struct QueuedCommand {
    request: Request,
    kind: ResultKind,
    cell: Box<dyn Slot>,
}

/// Batched executor borrowing a connection
///
/// The mutable borrow guarantees no other executor or direct call can
/// interleave with the queue between enqueue and commit.
pub struct Pipeline<'a, C: Connector = TcpConnector> {
    connection: &'a mut Connection<C>,
    transactional: bool,
    queue: Vec<QueuedCommand>,
}

impl<'a, C: Connector> Pipeline<'a, C> {
    /// Create an executor; `transactional` wraps commits in `MULTI`/`EXEC`
    pub fn new(connection: &'a mut Connection<C>, transactional: bool) -> Self {
        Self {
            connection,
            transactional,
            queue: Vec::new(),
        }
    }

    /// Register a request without performing I/O
    pub fn enqueue<T: FromReply>(&mut self, request: Request) -> ResultCell<T> {
        let cell = ResultCell::<T>::new();
        self.queue.push(QueuedCommand {
            request,
            kind: T::KIND,
            cell: Box::new(cell.clone()),
        });
        cell
    }

    /// Send the queue in one round trip and bind the replies
    ///
    /// Returns `Ok(false)` only when a transaction was aborted by the server.
    /// The queue is cleared whatever the outcome.
    pub fn commit(&mut self) -> Result<bool> {
        if self.queue.is_empty() {
            return Ok(true);
        }

        let queue = std::mem::take(&mut self.queue);
        let count = queue.len();
        let (requests, cells): (Vec<Request>, Vec<Box<dyn Slot>>) = queue
            .into_iter()
            .map(|command| (command.request, command.cell))
            .unzip();

        let replies = if self.transactional {
            match self.exchange_transaction(requests)? {
                Some(replies) => replies,
                None => {
                    tracing::debug!("Transaction of {} command(s) aborted by server", count);
                    return Ok(false);
                }
            }
        } else {
            tracing::trace!("Committing pipeline of {} command(s)", count);
            self.connection.send_batch(&requests)?
        };

        if replies.len() != count {
            return Err(RedwireError::Protocol(format!(
                "expected {} replies, got {}",
                count,
                replies.len()
            )));
        }

        for (index, (cell, reply)) in cells.iter().zip(replies).enumerate() {
            if let Err(e) = cell.apply(reply) {
                tracing::debug!(
                    "Reply {} of {} failed to apply, remaining cells left unset: {}",
                    index,
                    count,
                    e
                );
                return Err(e);
            }
        }

        Ok(true)
    }

    /// Drop every queued command without sending anything
    pub fn discard(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Command names and expected result kinds, in queue order
    pub fn queued(&self) -> impl Iterator<Item = (String, ResultKind)> + '_ {
        self.queue
            .iter()
            .map(|command| (command.request.name(), command.kind))
    }

    /// Send `MULTI`, the requests, `EXEC` as one batch
    ///
    /// Returns the replies nested in the `EXEC` reply, or `None` when the
    /// server aborted the transaction.
    fn exchange_transaction(&mut self, requests: Vec<Request>) -> Result<Option<Vec<Reply>>> {
        let count = requests.len();
        tracing::trace!("Committing transaction of {} command(s)", count);

        let mut batch = Vec::with_capacity(count + 2);
        batch.push(Request::command("MULTI"));
        batch.extend(requests);
        batch.push(Request::command("EXEC"));

        let mut replies = self.connection.send_batch(&batch)?;
        let exec = replies.pop().ok_or_else(|| {
            RedwireError::Protocol("missing reply to EXEC".to_string())
        })?;

        // MULTI acknowledgement and one QUEUED per request; a rejected
        // request is reported ahead of the EXECABORT it causes
        for ack in replies {
            ack.into_result()?;
        }

        match exec.into_result()? {
            Reply::Multi(None) => Ok(None),
            Reply::Multi(Some(nested)) => Ok(Some(nested)),
            other => Err(RedwireError::Protocol(format!(
                "expected multi reply to EXEC, got {}",
                other.kind_name()
            ))),
        }
    }
}

impl<'a, C: Connector> Commands for Pipeline<'a, C> {
    type Output<T: FromReply> = ResultCell<T>;

    fn dispatch<T: FromReply>(&mut self, request: Request) -> ResultCell<T> {
        self.enqueue(request)
    }
}

//! Direct client
//!
//! Executes each command as its own round trip and binds the reply
//! immediately. Batched execution is obtained from [`Client::pipeline`] and
//! [`Client::transaction`].

use crate::binder::FromReply;
use crate::commands::Commands;
use crate::config::Config;
use crate::error::Result;
use crate::network::{Connection, Connector, TcpConnector};
use crate::pipeline::Pipeline;
use crate::protocol::{Reply, Request};

/// Direct command engine over one connection
pub struct Client<C: Connector = TcpConnector> {
    connection: Connection<C>,
}

impl Client<TcpConnector> {
    /// Open a TCP connection from a config
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(Connection::open(config)?))
    }

    /// Open a TCP connection from a `redis://host:port/db` URL
    pub fn connect(url: &str) -> Result<Self> {
        Self::open(&Config::from_url(url)?)
    }
}

impl<C: Connector> Client<C> {
    /// Wrap an already open connection
    pub fn new(connection: Connection<C>) -> Self {
        Self { connection }
    }

    /// Start a plain pipeline on this client's connection
    pub fn pipeline(&mut self) -> Pipeline<'_, C> {
        Pipeline::new(&mut self.connection, false)
    }

    /// Start a `MULTI`/`EXEC` transaction on this client's connection
    pub fn transaction(&mut self) -> Pipeline<'_, C> {
        Pipeline::new(&mut self.connection, true)
    }

    /// Send one request and bind its reply
    pub fn execute<T: FromReply>(&mut self, request: Request) -> Result<T> {
        let reply = self.connection.send_one(&request)?;
        T::from_reply(reply)
    }

    /// Send one request and return the raw reply, error replies included
    pub fn send_one(&mut self, request: &Request) -> Result<Reply> {
        self.connection.send_one(request)
    }

    pub fn connection(&self) -> &Connection<C> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection<C> {
        &mut self.connection
    }

    pub fn into_connection(self) -> Connection<C> {
        self.connection
    }

    /// Close the underlying connection
    pub fn close(&mut self) {
        self.connection.close();
    }
}

impl<C: Connector> Commands for Client<C> {
    type Output<T: FromReply> = Result<T>;

    fn dispatch<T: FromReply>(&mut self, request: Request) -> Result<T> {
        self.execute(request)
    }
}

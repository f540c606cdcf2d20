//! Network Module
//!
//! Blocking client connections.
//!
//! ## Architecture
//! - One connection owns one stream pair
//! - Requests and replies move in strict send order, no multiplexing
//! - The transport is pluggable through [`Connector`]

mod connection;
mod connector;

pub use connection::{Connection, ConnectionState};
pub use connector::{Connector, TcpConnector};

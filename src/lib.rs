//! # redwire
//!
//! A blocking client engine for the RESP wire protocol with:
//! - Request framing with one flush per batch
//! - Streaming reply decoding
//! - Typed result binding
//! - Pipelining and `MULTI`/`EXEC` transactions
//! - Reconnect-on-write-failure that heals the connection but never hides
//!   the failure
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Commands (declarative table)                 │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!        ┌──────────────┐                ┌──────────────┐
//!        │    Client    │                │   Pipeline   │
//!        │   (direct)   │                │  (batched)   │
//!        └──────┬───────┘                └──────┬───────┘
//!               │                               │
//!               └───────────────┬───────────────┘
//!                               ▼
//!                       ┌──────────────┐      ┌──────────────┐
//!                       │  Connection  │─────▶│    Binder    │
//!                       │  (one TCP)   │      │ (FromReply)  │
//!                       └──────┬───────┘      └──────────────┘
//!                              ▼
//!                       ┌──────────────┐
//!                       │    Codec     │
//!                       │    (RESP)    │
//!                       └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use redwire::{Client, Commands, Config};
//!
//! fn example() -> redwire::Result<()> {
//!     let mut client = Client::open(&Config::default())?;
//!     client.hset("hashkey", "field", "human")?;
//!     assert_eq!(client.hget("hashkey", "field")?.as_deref(), Some("human"));
//!
//!     let mut pipe = client.pipeline();
//!     let set = pipe.set("key1", "human");
//!     let get = pipe.get("key1");
//!     pipe.commit()?;
//!     assert_eq!(set.value(), Some(Some("OK".to_string())));
//!     assert_eq!(get.value(), Some(Some("human".to_string())));
//!     Ok(())
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod binder;
pub mod pipeline;
pub mod commands;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RedwireError, Result};
pub use config::{Config, ConfigBuilder};
pub use protocol::{Reply, Request, ToArg};
pub use network::{Connection, ConnectionState, Connector, TcpConnector};
pub use binder::{FromReply, List, Mapping, ResultKind, Text};
pub use pipeline::{Pipeline, ResultCell};
pub use commands::{Aggregate, Commands, InsertPosition, SortOptions, SortOrder, StoreOptions};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of redwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error types for redwire
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RedwireError
pub type Result<T> = std::result::Result<T, RedwireError>;

/// Unified error type for redwire operations
#[derive(Debug, Error)]
pub enum RedwireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed framing, bad integers, truncated stream, or a reply whose
    /// shape does not fit the requested result type.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A `-` reply. Carries the server's message verbatim.
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid request: {0}")]
    Argument(String),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection closed")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RedwireError {
    /// Returns the server message if this is a server error reply
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RedwireError::Server(msg) => Some(msg),
            _ => None,
        }
    }
}

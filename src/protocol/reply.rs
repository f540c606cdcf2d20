//! Reply definitions
//!
//! Represents one decoded server reply.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

use crate::error::{RedwireError, Result};

/// One server reply
///
/// The protocol's nil has two spellings, `$-1` and `*-1`. They stay distinct
/// here (`Bulk(None)` and `Multi(None)`); the binder maps both to absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+` simple acknowledgement
    Status(String),

    /// `-` server-reported failure
    Error(String),

    /// `:` signed 64-bit integer
    Integer(i64),

    /// `$` length-prefixed payload, `None` for `$-1`
    Bulk(Option<Bytes>),

    /// `*` array of replies, `None` for `*-1`
    Multi(Option<Vec<Reply>>),
}

impl Reply {
    /// Build a present bulk reply from anything byte-like
    pub fn bulk(payload: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(payload.into()))
    }

    /// Build a status reply
    pub fn status(text: impl Into<String>) -> Self {
        Reply::Status(text.into())
    }

    /// True for `$-1` and `*-1`
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::Multi(None))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Text form of a scalar reply
    ///
    /// Integers are rendered as decimal text so that every scalar can be
    /// handled uniformly. Returns `None` for nil and for arrays.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Reply::Status(s) | Reply::Error(s) => Some(Cow::Borrowed(s)),
            Reply::Integer(i) => Some(Cow::Owned(i.to_string())),
            Reply::Bulk(Some(b)) => Some(String::from_utf8_lossy(b)),
            Reply::Bulk(None) | Reply::Multi(_) => None,
        }
    }

    /// Turn an error reply into a server error, pass everything else through
    pub fn into_result(self) -> Result<Reply> {
        match self {
            Reply::Error(msg) => Err(RedwireError::Server(msg)),
            other => Ok(other),
        }
    }

    /// Short name of the variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(Some(_)) => "bulk",
            Reply::Bulk(None) => "nil bulk",
            Reply::Multi(Some(_)) => "multi",
            Reply::Multi(None) => "nil multi",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Error(msg) => write!(f, "(error) {}", msg),
            Reply::Bulk(None) | Reply::Multi(None) => write!(f, "nil"),
            Reply::Multi(Some(items)) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match item {
                        Reply::Multi(_) | Reply::Bulk(None) | Reply::Error(_) => {
                            write!(f, "{}", item)?
                        }
                        scalar => write!(f, "\"{}\"", scalar.text().unwrap_or_default())?,
                    }
                }
                write!(f, "]")
            }
            scalar => write!(f, "{}", scalar.text().unwrap_or_default()),
        }
    }
}

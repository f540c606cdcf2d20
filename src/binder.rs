//! Result binding
//!
//! Conversion of raw replies into typed values. The same conversions are used
//! for direct calls and for pipelined result cells.
//!
//! ## Rules
//! - an error reply always becomes [`RedwireError::Server`], never a value
//! - `$-1` and `*-1` both bind to the absence value of the target type
//! - integers parse base-10 text; a required integer defaults to `0` on nil
//! - lists are shallow: nested arrays are a protocol error
//! - mappings need an even element count; last write wins on repeated keys

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::error::{RedwireError, Result};
use crate::protocol::Reply;

/// Text result; `None` is the missing value
pub type Text = Option<String>;

/// Ordered list result; `None` is a missing array, distinct from an empty one
pub type List = Option<Vec<Option<String>>>;

/// Key/value result; `None` is a missing array
pub type Mapping = Option<HashMap<String, String>>;

/// The result kinds a reply can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// Optional text (`Option<String>`)
    Text,
    /// Optional binary-safe payload (`Option<Bytes>`)
    Bytes,
    /// Required integer (`i64`, `i32`)
    Integer,
    /// Optional integer (`Option<i64>`, `Option<i32>`)
    OptionalInteger,
    /// Optional ordered list of optional text
    List,
    /// Optional key/value mapping
    Mapping,
    /// The reply itself
    Raw,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultKind::Text => "text",
            ResultKind::Bytes => "bytes",
            ResultKind::Integer => "integer",
            ResultKind::OptionalInteger => "optional integer",
            ResultKind::List => "list",
            ResultKind::Mapping => "mapping",
            ResultKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// A type a reply can be bound to
///
/// Only the types implementing this trait can be enqueued on a pipeline, so
/// an unsupported result kind is rejected at compile time.
pub trait FromReply: Sized + Send + 'static {
    /// The kind this type binds as
    const KIND: ResultKind;

    fn from_reply(reply: Reply) -> Result<Self>;
}

impl FromReply for Option<String> {
    const KIND: ResultKind = ResultKind::Text;

    fn from_reply(reply: Reply) -> Result<Self> {
        match reply.into_result()? {
            Reply::Bulk(None) | Reply::Multi(None) => Ok(None),
            Reply::Multi(Some(_)) => Err(mismatch("text", "multi")),
            scalar => Ok(scalar.text().map(Cow::into_owned)),
        }
    }
}

impl FromReply for Option<Bytes> {
    const KIND: ResultKind = ResultKind::Bytes;

    fn from_reply(reply: Reply) -> Result<Self> {
        match reply {
            Reply::Error(msg) => Err(RedwireError::Server(msg)),
            Reply::Bulk(payload) => Ok(payload),
            Reply::Multi(None) => Ok(None),
            Reply::Multi(Some(_)) => Err(mismatch("bytes", "multi")),
            Reply::Status(text) => Ok(Some(Bytes::from(text))),
            Reply::Integer(value) => Ok(Some(Bytes::from(value.to_string()))),
        }
    }
}

impl FromReply for i64 {
    const KIND: ResultKind = ResultKind::Integer;

    fn from_reply(reply: Reply) -> Result<Self> {
        match reply.into_result()? {
            Reply::Integer(value) => Ok(value),
            // Only used for commands guaranteed to answer with an integer
            Reply::Bulk(None) | Reply::Multi(None) => Ok(0),
            Reply::Multi(Some(_)) => Err(mismatch("integer", "multi")),
            scalar => {
                let text = scalar.text().unwrap_or_default();
                parse_integer(&text)
            }
        }
    }
}

impl FromReply for i32 {
    const KIND: ResultKind = ResultKind::Integer;

    fn from_reply(reply: Reply) -> Result<Self> {
        let value = i64::from_reply(reply)?;
        i32::try_from(value).map_err(|_| {
            RedwireError::Protocol(format!("integer {} out of range for i32", value))
        })
    }
}

impl FromReply for Option<i64> {
    const KIND: ResultKind = ResultKind::OptionalInteger;

    fn from_reply(reply: Reply) -> Result<Self> {
        match reply.into_result()? {
            Reply::Integer(value) => Ok(Some(value)),
            other => Ok(other.text().and_then(|text| text.parse::<i64>().ok())),
        }
    }
}

impl FromReply for Option<i32> {
    const KIND: ResultKind = ResultKind::OptionalInteger;

    fn from_reply(reply: Reply) -> Result<Self> {
        Ok(Option::<i64>::from_reply(reply)?.and_then(|value| i32::try_from(value).ok()))
    }
}

impl FromReply for Option<Vec<Option<String>>> {
    const KIND: ResultKind = ResultKind::List;

    fn from_reply(reply: Reply) -> Result<Self> {
        match reply.into_result()? {
            Reply::Multi(None) | Reply::Bulk(None) => Ok(None),
            Reply::Multi(Some(items)) => items
                .into_iter()
                .map(element_text)
                .collect::<Result<Vec<_>>>()
                .map(Some),
            other => Err(mismatch("multi", other.kind_name())),
        }
    }
}

impl FromReply for Option<HashMap<String, String>> {
    const KIND: ResultKind = ResultKind::Mapping;

    fn from_reply(reply: Reply) -> Result<Self> {
        let items = match reply.into_result()? {
            Reply::Multi(None) | Reply::Bulk(None) => return Ok(None),
            Reply::Multi(Some(items)) => items,
            other => return Err(mismatch("multi", other.kind_name())),
        };

        if items.len() % 2 != 0 {
            return Err(RedwireError::Protocol(format!(
                "key/value reply has odd element count {}",
                items.len()
            )));
        }

        let mut map = HashMap::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            let key = element_text(key)?
                .ok_or_else(|| RedwireError::Protocol("nil key in key/value reply".to_string()))?;
            let value = element_text(value)?.ok_or_else(|| {
                RedwireError::Protocol(format!("nil value for key {:?} in key/value reply", key))
            })?;
            map.insert(key, value);
        }

        Ok(Some(map))
    }
}

impl FromReply for Reply {
    const KIND: ResultKind = ResultKind::Raw;

    fn from_reply(reply: Reply) -> Result<Self> {
        reply.into_result()
    }
}

/// Text value of one element of an array reply
fn element_text(reply: Reply) -> Result<Option<String>> {
    match reply.into_result()? {
        Reply::Bulk(None) => Ok(None),
        Reply::Multi(_) => Err(RedwireError::Protocol(
            "nested multi reply where a scalar was expected".to_string(),
        )),
        scalar => Ok(scalar.text().map(Cow::into_owned)),
    }
}

fn parse_integer(text: &str) -> Result<i64> {
    text.parse::<i64>()
        .map_err(|_| RedwireError::Protocol(format!("unexpected integer value {:?}", text)))
}

fn mismatch(expected: &str, got: &str) -> RedwireError {
    RedwireError::Protocol(format!("expected {} reply, got {}", expected, got))
}

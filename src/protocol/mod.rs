//! Protocol Module
//!
//! RESP framing for requests and replies.
//!
//! ## Request Format
//! ```text
//! *3\r\n
//! $3\r\nSET\r\n
//! $3\r\nkey\r\n
//! $5\r\nvalue\r\n
//! ```
//!
//! ## Reply Tags
//! - `+`: status
//! - `-`: error
//! - `:`: integer
//! - `$`: bulk (`$-1` is nil)
//! - `*`: multi (`*-1` is nil)

mod request;
mod reply;
mod codec;

pub use request::{Request, ToArg};
pub use reply::Reply;
pub use codec::{
    decode_reply, encode_reply, encode_reply_to_vec, encode_request, encode_requests,
    read_reply, write_requests, MAX_BULK_LEN, MAX_LINE_LEN, MAX_NESTING_DEPTH,
};

//! Protocol codec
//!
//! Encoding of requests and decoding of replies for the RESP wire format.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! *<argc>\r\n
//! $<byte_len>\r\n<arg bytes>\r\n      (repeated argc times)
//! ```
//!
//! ### Reply
//! ```text
//! +<text>\r\n                 status
//! -<text>\r\n                 error
//! :<int>\r\n                  integer
//! $<len>\r\n<bytes>\r\n       bulk      ($-1\r\n is nil)
//! *<count>\r\n<replies>       multi     (*-1\r\n is nil)
//! ```

use std::io::{BufRead, Cursor, ErrorKind, Read, Write};

use crate::error::{RedwireError, Result};
use super::{Reply, Request};

/// Largest bulk payload accepted (512 MB, the server's default limit)
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Deepest array nesting accepted in one reply
pub const MAX_NESTING_DEPTH: usize = 512;

/// Longest status, error, integer or length line accepted
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Upper bound on speculative allocation for array replies
const MULTI_PREALLOC_LIMIT: usize = 1024;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Request Encoding
// =============================================================================

/// Append one request in wire format to `buf`
pub fn encode_request(request: &Request, buf: &mut Vec<u8>) {
    let mut num = itoa::Buffer::new();

    buf.push(b'*');
    buf.extend_from_slice(num.format(request.argc()).as_bytes());
    buf.extend_from_slice(CRLF);

    for arg in request.as_args() {
        // Byte length, not character count
        buf.push(b'$');
        buf.extend_from_slice(num.format(arg.len()).as_bytes());
        buf.extend_from_slice(CRLF);
        buf.extend_from_slice(arg);
        buf.extend_from_slice(CRLF);
    }
}

/// Encode a batch of requests into one contiguous buffer
pub fn encode_requests(requests: &[Request]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(requests.len() * 32);
    for request in requests {
        encode_request(request, &mut buf);
    }
    buf
}

/// Write a batch of requests to a stream
///
/// The whole batch is framed into one buffer and handed to the writer before
/// a single flush, so a pipeline leaves as one network write.
pub fn write_requests<W: Write>(writer: &mut W, requests: &[Request]) -> Result<()> {
    writer.write_all(&encode_requests(requests))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Append one reply in wire format to `buf`
pub fn encode_reply(reply: &Reply, buf: &mut Vec<u8>) {
    let mut num = itoa::Buffer::new();

    match reply {
        Reply::Status(text) => {
            buf.push(b'+');
            buf.extend_from_slice(text.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        Reply::Error(text) => {
            buf.push(b'-');
            buf.extend_from_slice(text.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        Reply::Integer(value) => {
            buf.push(b':');
            buf.extend_from_slice(num.format(*value).as_bytes());
            buf.extend_from_slice(CRLF);
        }
        Reply::Bulk(None) => buf.extend_from_slice(b"$-1\r\n"),
        Reply::Bulk(Some(payload)) => {
            buf.push(b'$');
            buf.extend_from_slice(num.format(payload.len()).as_bytes());
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(payload);
            buf.extend_from_slice(CRLF);
        }
        Reply::Multi(None) => buf.extend_from_slice(b"*-1\r\n"),
        Reply::Multi(Some(items)) => {
            buf.push(b'*');
            buf.extend_from_slice(num.format(items.len()).as_bytes());
            buf.extend_from_slice(CRLF);
            for item in items {
                encode_reply(item, buf);
            }
        }
    }
}

/// Encode one reply into a fresh buffer
pub fn encode_reply_to_vec(reply: &Reply) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_reply(reply, &mut buf);
    buf
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Read one complete reply from a buffered stream
///
/// Blocks until the reply is fully framed. A stream that ends mid-reply is a
/// protocol error; other read failures surface as I/O errors.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    read_nested(reader, 0)
}

fn read_nested<R: BufRead>(reader: &mut R, depth: usize) -> Result<Reply> {
    let tag = read_byte(reader)?;

    match tag {
        b'+' => Ok(Reply::Status(read_text_line(reader)?)),
        b'-' => Ok(Reply::Error(read_text_line(reader)?)),
        b':' => Ok(Reply::Integer(read_integer_line(reader)?)),
        b'$' => read_bulk(reader),
        b'*' => read_multi(reader, depth),
        other => Err(RedwireError::Protocol(format!(
            "unexpected leading byte 0x{:02x} in reply",
            other
        ))),
    }
}

/// Decode one reply from a byte slice
///
/// Returns the reply and the number of bytes consumed.
pub fn decode_reply(bytes: &[u8]) -> Result<(Reply, usize)> {
    let mut cursor = Cursor::new(bytes);
    let reply = read_reply(&mut cursor)?;
    Ok((reply, cursor.position() as usize))
}

fn read_bulk<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let len = read_integer_line(reader)?;

    if len == -1 {
        return Ok(Reply::Bulk(None));
    }
    if len < 0 {
        return Err(RedwireError::Protocol(format!(
            "invalid bulk length {}",
            len
        )));
    }
    if len > MAX_BULK_LEN {
        return Err(RedwireError::Protocol(format!(
            "bulk payload too large: {} bytes (max {})",
            len, MAX_BULK_LEN
        )));
    }

    let mut payload = vec![0u8; len as usize];
    read_exact(reader, &mut payload)?;

    let mut trailer = [0u8; 2];
    read_exact(reader, &mut trailer)?;
    if trailer != *b"\r\n" {
        return Err(RedwireError::Protocol(
            "bulk payload not terminated by CRLF".to_string(),
        ));
    }

    Ok(Reply::Bulk(Some(payload.into())))
}

fn read_multi<R: BufRead>(reader: &mut R, depth: usize) -> Result<Reply> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(RedwireError::Protocol("reply nesting too deep".to_string()));
    }

    let count = read_integer_line(reader)?;

    if count == -1 {
        return Ok(Reply::Multi(None));
    }
    if count < 0 {
        return Err(RedwireError::Protocol(format!(
            "invalid multi count {}",
            count
        )));
    }

    let count = count as usize;
    let mut items = Vec::with_capacity(count.min(MULTI_PREALLOC_LIMIT));
    for _ in 0..count {
        items.push(read_nested(reader, depth + 1)?);
    }

    Ok(Reply::Multi(Some(items)))
}

fn read_integer_line<R: BufRead>(reader: &mut R) -> Result<i64> {
    let line = read_line(reader)?;
    std::str::from_utf8(&line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            RedwireError::Protocol(format!(
                "unexpected integer value {:?}",
                String::from_utf8_lossy(&line)
            ))
        })
}

fn read_text_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let line = read_line(reader)?;
    Ok(match String::from_utf8(line) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Read up to CRLF, returning the line without its terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let limit = (MAX_LINE_LEN + CRLF.len()) as u64;
    let mut line = Vec::new();
    reader.by_ref().take(limit).read_until(b'\n', &mut line)?;

    if !line.ends_with(b"\n") {
        if line.len() as u64 >= limit {
            return Err(RedwireError::Protocol(format!(
                "reply line longer than {} bytes",
                MAX_LINE_LEN
            )));
        }
        return Err(unexpected_eof());
    }
    if !line.ends_with(CRLF) {
        return Err(RedwireError::Protocol(
            "line not terminated by CRLF".to_string(),
        ));
    }

    line.truncate(line.len() - 2);
    Ok(line)
}

fn read_byte<R: BufRead>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    read_exact(reader, &mut byte)?;
    Ok(byte[0])
}

fn read_exact<R: BufRead>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            unexpected_eof()
        } else {
            RedwireError::Io(e)
        }
    })
}

fn unexpected_eof() -> RedwireError {
    RedwireError::Protocol("unexpected end of stream".to_string())
}

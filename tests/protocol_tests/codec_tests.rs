//! Codec Tests
//!
//! Tests for request framing and reply decoding.

use std::io::{BufReader, Cursor};

use bytes::Bytes;
use redwire::protocol::{
    decode_reply, encode_reply_to_vec, encode_request, encode_requests, read_reply,
    write_requests, MAX_LINE_LEN, MAX_NESTING_DEPTH,
};
use redwire::{RedwireError, Reply, Request};

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_encode_set_request() {
    let request = Request::command("SET").arg("key1").arg("human");
    let mut buf = Vec::new();
    encode_request(&request, &mut buf);

    assert_eq!(
        buf,
        b"*3\r\n$3\r\nSET\r\n$4\r\nkey1\r\n$5\r\nhuman\r\n".to_vec()
    );
}

#[test]
fn test_encode_uses_byte_length() {
    // Two bytes in UTF-8, one character
    let request = Request::command("ECHO").arg("é");
    let encoded = encode_requests(std::slice::from_ref(&request));

    assert_eq!(encoded, "*2\r\n$4\r\nECHO\r\n$2\r\né\r\n".as_bytes().to_vec());
}

#[test]
fn test_encode_integer_and_binary_args() {
    let payload: &[u8] = &[0x00, b'\r', b'\n', 0xFF];
    let request = Request::command("SETRANGE").arg("k").arg(-7i64).arg(payload);
    let encoded = encode_requests(&[request]);

    let mut expected = b"*4\r\n$8\r\nSETRANGE\r\n$1\r\nk\r\n$2\r\n-7\r\n$4\r\n".to_vec();
    expected.extend_from_slice(payload);
    expected.extend_from_slice(b"\r\n");
    assert_eq!(encoded, expected);
}

#[test]
fn test_encode_batch_is_concatenation() {
    let first = Request::command("PING");
    let second = Request::command("GET").arg("k");

    let mut separate = Vec::new();
    encode_request(&first, &mut separate);
    encode_request(&second, &mut separate);

    assert_eq!(encode_requests(&[first, second]), separate);
}

#[test]
fn test_write_requests_matches_encoding() {
    let requests = vec![
        Request::command("SET").arg("key1").arg("é"),
        Request::command("MGET").arg("a").arg("b"),
    ];
    let mut written = Vec::new();
    write_requests(&mut written, &requests).unwrap();

    assert_eq!(written, encode_requests(&requests));
}

// =============================================================================
// Reply Decoding Tests
// =============================================================================

#[test]
fn test_decode_status() {
    let (reply, used) = decode_reply(b"+OK\r\n").unwrap();
    assert_eq!(reply, Reply::status("OK"));
    assert_eq!(used, 5);
}

#[test]
fn test_decode_error() {
    let (reply, _) = decode_reply(b"-ERR unknown command 'foo'\r\n").unwrap();
    assert_eq!(reply, Reply::Error("ERR unknown command 'foo'".to_string()));
}

#[test]
fn test_decode_integer() {
    let (reply, _) = decode_reply(b":-42\r\n").unwrap();
    assert_eq!(reply, Reply::Integer(-42));
}

#[test]
fn test_decode_bulk_and_nil_bulk() {
    let (reply, _) = decode_reply(b"$5\r\nhuman\r\n").unwrap();
    assert_eq!(reply, Reply::bulk("human"));

    let (reply, _) = decode_reply(b"$0\r\n\r\n").unwrap();
    assert_eq!(reply, Reply::Bulk(Some(Bytes::new())));

    let (reply, _) = decode_reply(b"$-1\r\n").unwrap();
    assert_eq!(reply, Reply::Bulk(None));
}

#[test]
fn test_decode_bulk_containing_crlf() {
    let (reply, _) = decode_reply(b"$4\r\na\r\nb\r\n").unwrap();
    assert_eq!(reply, Reply::bulk(&b"a\r\nb"[..]));
}

#[test]
fn test_decode_multi_mixed() {
    let bytes = b"*4\r\n$1\r\na\r\n$-1\r\n:3\r\n*1\r\n+x\r\n";
    let (reply, used) = decode_reply(bytes).unwrap();

    assert_eq!(
        reply,
        Reply::Multi(Some(vec![
            Reply::bulk("a"),
            Reply::Bulk(None),
            Reply::Integer(3),
            Reply::Multi(Some(vec![Reply::status("x")])),
        ]))
    );
    assert_eq!(used, bytes.len());
}

#[test]
fn test_decode_nil_and_empty_multi_differ() {
    let (nil, _) = decode_reply(b"*-1\r\n").unwrap();
    let (empty, _) = decode_reply(b"*0\r\n").unwrap();

    assert_eq!(nil, Reply::Multi(None));
    assert_eq!(empty, Reply::Multi(Some(vec![])));
}

#[test]
fn test_encode_decode_reply() {
    let reply = Reply::Multi(Some(vec![
        Reply::status("OK"),
        Reply::Error("ERR x".to_string()),
        Reply::Integer(i64::MIN),
        Reply::bulk("é"),
        Reply::Bulk(None),
        Reply::Multi(None),
    ]));

    let encoded = encode_reply_to_vec(&reply);
    let (decoded, used) = decode_reply(&encoded).unwrap();

    assert_eq!(decoded, reply);
    assert_eq!(used, encoded.len());
}

#[test]
fn test_read_consecutive_replies_from_stream() {
    let mut reader = BufReader::new(Cursor::new(b"+OK\r\n:1\r\n$3\r\nfoo\r\n".to_vec()));

    assert_eq!(read_reply(&mut reader).unwrap(), Reply::status("OK"));
    assert_eq!(read_reply(&mut reader).unwrap(), Reply::Integer(1));
    assert_eq!(read_reply(&mut reader).unwrap(), Reply::bulk("foo"));
}

#[test]
fn test_invalid_utf8_status_is_lossy() {
    let (reply, _) = decode_reply(b"+a\xFFb\r\n").unwrap();
    assert_eq!(reply, Reply::status("a\u{FFFD}b"));
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_unknown_leading_byte() {
    let err = decode_reply(b"?what\r\n").unwrap_err();
    assert!(matches!(err, RedwireError::Protocol(_)));
}

#[test]
fn test_truncated_stream() {
    let cases: [&[u8]; 4] = [b"", b"+OK", b"$5\r\nhum", b"*2\r\n:1\r\n"];
    for bytes in cases {
        let err = decode_reply(bytes).unwrap_err();
        assert!(
            matches!(err, RedwireError::Protocol(ref msg) if msg.contains("end of stream")),
            "unexpected error for {:?}: {}",
            bytes,
            err
        );
    }
}

#[test]
fn test_bad_integer() {
    let err = decode_reply(b":12x\r\n").unwrap_err();
    assert!(matches!(err, RedwireError::Protocol(_)));

    let err = decode_reply(b"$abc\r\n").unwrap_err();
    assert!(matches!(err, RedwireError::Protocol(_)));
}

#[test]
fn test_negative_lengths_other_than_nil() {
    assert!(matches!(
        decode_reply(b"$-2\r\n"),
        Err(RedwireError::Protocol(_))
    ));
    assert!(matches!(
        decode_reply(b"*-5\r\n"),
        Err(RedwireError::Protocol(_))
    ));
}

#[test]
fn test_bulk_missing_trailer() {
    let err = decode_reply(b"$3\r\nfooXY").unwrap_err();
    assert!(matches!(err, RedwireError::Protocol(_)));
}

#[test]
fn test_deep_nesting_is_rejected() {
    let mut bytes = b"*1\r\n".repeat(100_000);
    bytes.extend_from_slice(b":1\r\n");

    let err = decode_reply(&bytes).unwrap_err();
    assert!(matches!(err, RedwireError::Protocol(ref msg) if msg.contains("nesting")));
}

#[test]
fn test_nesting_up_to_limit_is_accepted() {
    let mut bytes = b"*1\r\n".repeat(MAX_NESTING_DEPTH);
    bytes.extend_from_slice(b":1\r\n");

    let (mut reply, used) = decode_reply(&bytes).unwrap();
    assert_eq!(used, bytes.len());

    let mut depth = 0;
    while let Reply::Multi(Some(mut items)) = reply {
        depth += 1;
        reply = items.remove(0);
    }
    assert_eq!(depth, MAX_NESTING_DEPTH);
    assert_eq!(reply, Reply::Integer(1));
}

#[test]
fn test_overlong_line_is_rejected() {
    let mut bytes = vec![b'+'];
    bytes.extend(std::iter::repeat(b'a').take(MAX_LINE_LEN * 2));

    let err = decode_reply(&bytes).unwrap_err();
    assert!(matches!(err, RedwireError::Protocol(ref msg) if msg.contains("longer than")));
}

#[test]
fn test_line_at_limit_is_accepted() {
    let mut bytes = vec![b'+'];
    bytes.extend(std::iter::repeat(b'a').take(MAX_LINE_LEN));
    bytes.extend_from_slice(b"\r\n");

    let (reply, _) = decode_reply(&bytes).unwrap();
    assert_eq!(reply.text().map(|t| t.len()), Some(MAX_LINE_LEN));
}

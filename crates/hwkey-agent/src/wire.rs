//! The OpenSSH agent wire protocol: 4-byte big-endian length prefix
//! followed by a message body whose first byte is the message code.
//! This is the server side — decoding what a client sends and
//! encoding what this agent sends back.

use std::io::{self, Read, Write};

/// Message codes from the agent protocol draft, as implemented by
/// OpenSSH's `ssh-agent(1)`.
pub mod msg {
    pub const FAILURE: u8 = 5;
    pub const SUCCESS: u8 = 6;
    pub const REQUEST_IDENTITIES: u8 = 11;
    pub const IDENTITIES_ANSWER: u8 = 12;
    pub const SIGN_REQUEST: u8 = 13;
    pub const SIGN_RESPONSE: u8 = 14;
    pub const ADD_IDENTITY: u8 = 17;
    pub const REMOVE_IDENTITY: u8 = 18;
    pub const REMOVE_ALL_IDENTITIES: u8 = 19;
    pub const ADD_SMARTCARD_KEY: u8 = 20;
    pub const REMOVE_SMARTCARD_KEY: u8 = 21;
    pub const LOCK: u8 = 22;
    pub const UNLOCK: u8 = 23;
    pub const ADD_ID_CONSTRAINED: u8 = 25;
    pub const ADD_SMARTCARD_KEY_CONSTRAINED: u8 = 26;
    pub const EXTENSION: u8 = 27;
    pub const EXTENSION_FAILURE: u8 = 28;
}

#[derive(Debug)]
pub enum Request {
    RequestIdentities,
    SignRequest {
        key_blob: Vec<u8>,
        data: Vec<u8>,
        #[allow(dead_code)]
        flags: u32,
    },
    Unsupported,
}

/// Largest message body this agent will allocate a buffer for. Well
/// above any legitimate request (a sign request tops out around 4KB of
/// payload plus framing overhead) and far below the point where a
/// client-controlled length prefix could be used to force a huge
/// allocation before the message type is even known.
const MAX_MESSAGE_LEN: usize = 256 * 1024;

/// Read one length-prefixed message body off `stream`.
pub fn read_message(stream: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message length {len} exceeds the {MAX_MESSAGE_LEN}-byte limit"),
        ));
    }
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;
    Ok(body)
}

/// Write `body` as a length-prefixed message.
pub fn write_message(stream: &mut impl Write, body: &[u8]) -> io::Result<()> {
    stream.write_all(&(body.len() as u32).to_be_bytes())?;
    stream.write_all(body)?;
    stream.flush()
}

pub fn parse_request(body: &[u8]) -> Request {
    match body.first() {
        Some(&msg::REQUEST_IDENTITIES) => Request::RequestIdentities,
        Some(&msg::SIGN_REQUEST) => {
            parse_sign_request(&body[1..]).unwrap_or(Request::Unsupported)
        }
        _ => Request::Unsupported,
    }
}

fn read_string(cursor: &mut &[u8]) -> Option<Vec<u8>> {
    if cursor.len() < 4 {
        return None;
    }
    let len = u32::from_be_bytes(cursor[0..4].try_into().unwrap()) as usize;
    if cursor.len() < 4 + len {
        return None;
    }
    let value = cursor[4..4 + len].to_vec();
    *cursor = &cursor[4 + len..];
    Some(value)
}

fn parse_sign_request(mut body: &[u8]) -> Option<Request> {
    let key_blob = read_string(&mut body)?;
    let data = read_string(&mut body)?;
    let flags = u32::from_be_bytes(body.get(0..4)?.try_into().unwrap());
    Some(Request::SignRequest {
        key_blob,
        data,
        flags,
    })
}

pub(crate) fn write_string(out: &mut Vec<u8>, value: &[u8]) {
    out.extend_from_slice(&(value.len() as u32).to_be_bytes());
    out.extend_from_slice(value);
}

pub fn failure() -> Vec<u8> {
    vec![msg::FAILURE]
}

pub fn identities_answer(key_blob: &[u8], comment: &str) -> Vec<u8> {
    let mut out = vec![msg::IDENTITIES_ANSWER];
    out.extend_from_slice(&1u32.to_be_bytes());
    write_string(&mut out, key_blob);
    write_string(&mut out, comment.as_bytes());
    out
}

pub fn empty_identities_answer() -> Vec<u8> {
    let mut out = vec![msg::IDENTITIES_ANSWER];
    out.extend_from_slice(&0u32.to_be_bytes());
    out
}

pub fn sign_response(signature_blob: &[u8]) -> Vec<u8> {
    let mut out = vec![msg::SIGN_RESPONSE];
    write_string(&mut out, signature_blob);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_identities_round_trips_through_a_stream() {
        let mut buf = Vec::new();
        write_message(&mut buf, &[msg::REQUEST_IDENTITIES]).unwrap();
        let mut cursor = &buf[..];
        let body = read_message(&mut cursor).unwrap();
        assert!(matches!(parse_request(&body), Request::RequestIdentities));
    }

    #[test]
    fn oversized_length_prefix_is_rejected_before_allocating() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_MESSAGE_LEN + 1) as u32).to_be_bytes());
        let mut cursor = &buf[..];
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn sign_request_parses_key_blob_data_and_flags() {
        let mut body = vec![msg::SIGN_REQUEST];
        write_string(&mut body, b"key-blob");
        write_string(&mut body, b"the data to sign");
        body.extend_from_slice(&0u32.to_be_bytes());

        match parse_request(&body) {
            Request::SignRequest {
                key_blob,
                data,
                flags,
            } => {
                assert_eq!(key_blob, b"key-blob");
                assert_eq!(data, b"the data to sign");
                assert_eq!(flags, 0);
            }
            other => panic!("expected SignRequest, got {other:?}"),
        }
    }

    #[test]
    fn truncated_sign_request_is_unsupported() {
        let body = vec![msg::SIGN_REQUEST, 0, 0, 0, 5];
        assert!(matches!(parse_request(&body), Request::Unsupported));
    }

    #[test]
    fn unknown_code_is_unsupported() {
        assert!(matches!(parse_request(&[msg::LOCK]), Request::Unsupported));
    }

    #[test]
    fn identities_answer_has_golden_bytes_for_one_key() {
        let got = identities_answer(b"AB", "hwkey");
        let mut want = vec![msg::IDENTITIES_ANSWER];
        want.extend_from_slice(&1u32.to_be_bytes());
        want.extend_from_slice(&2u32.to_be_bytes());
        want.extend_from_slice(b"AB");
        want.extend_from_slice(&5u32.to_be_bytes());
        want.extend_from_slice(b"hwkey");
        assert_eq!(got, want);
    }

    #[test]
    fn empty_identities_answer_reports_zero_keys() {
        let got = empty_identities_answer();
        assert_eq!(got, vec![msg::IDENTITIES_ANSWER, 0, 0, 0, 0]);
    }

    #[test]
    fn sign_response_wraps_the_blob_in_a_string() {
        let got = sign_response(b"sig-blob");
        let mut want = vec![msg::SIGN_RESPONSE];
        want.extend_from_slice(&8u32.to_be_bytes());
        want.extend_from_slice(b"sig-blob");
        assert_eq!(got, want);
    }
}

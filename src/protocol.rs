//! Line protocol messages and payload formatting.
//!
//! Newline-delimited plain text:
//!
//! ```text
//! client -> server:  LINE\n          request the next file line
//! server -> client:  <CONTENTS>\n    next line, uppercased
//! client -> server:  quit now!!\n    end the session
//! ```
//!
//! Requests are matched byte for byte. Anything else is not an error, the
//! server simply ignores it.

use bytes::BytesMut;

/// Request for the next line
pub const LINE_REQUEST: &[u8] = b"LINE\n";

/// Session termination token
pub const QUIT_REQUEST: &[u8] = b"quit now!!\n";

/// Maximum bytes the client accepts per reply
pub const RECV_SIZE: usize = 100;

/// A single framed client message, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Serve the next line
    Line,
    /// Close the session without replying
    Quit,
    /// Anything else; ignored
    Unknown,
}

impl Request {
    /// Classify one newline-framed message, terminator included.
    pub fn parse(message: &[u8]) -> Request {
        if message == LINE_REQUEST {
            Request::Line
        } else if message == QUIT_REQUEST {
            Request::Quit
        } else {
            Request::Unknown
        }
    }
}

/// Payload formatting for both directions
pub struct Response;

impl Response {
    /// Server reply: line contents uppercased, newline terminated.
    pub fn line(contents: &[u8]) -> BytesMut {
        let mut out = BytesMut::with_capacity(contents.len() + 1);
        out.extend(contents.iter().map(u8::to_ascii_uppercase));
        out.extend_from_slice(b"\n");
        out
    }

    /// Client side: fold a received reply back to lowercase for comparison.
    pub fn normalize(reply: &[u8]) -> BytesMut {
        let mut out = BytesMut::with_capacity(reply.len());
        out.extend(reply.iter().map(u8::to_ascii_lowercase));
        out
    }
}

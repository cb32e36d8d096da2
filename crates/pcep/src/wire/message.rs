// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Common message header codec (RFC 5440 Sec.6.1).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | Ver |  Flags  |  Message-Type |       Message-Length          |
//! +---------------+---------------+-------------------------------+
//! ```
//!
//! Ver is always 1, Flags are unused and zero. Message-Length is the total
//! message size including this 4-byte header.

use crate::codes::PCEP_VERSION;
use crate::error::{CodecError, ParseResult};

/// Size of the common message header in bytes.
pub const MESSAGE_HEADER_SIZE: usize = 4;

/// Decoded common message header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    /// Message-Type field.
    pub msg_type: u8,
    /// Total message length including the 4-byte header.
    pub length: u16,
}

impl MessageHeader {
    /// Length of the object sequence following the header.
    pub fn body_length(&self) -> usize {
        self.length as usize - MESSAGE_HEADER_SIZE
    }
}

/// Decode a message header from the first 4 bytes of `buf`.
///
/// Rejects versions other than 1; the flags field is ignored on receive.
pub fn decode_message_header(buf: &[u8]) -> ParseResult<MessageHeader> {
    if buf.len() < MESSAGE_HEADER_SIZE {
        return Err(CodecError::Truncated { expected: MESSAGE_HEADER_SIZE, available: buf.len() }.into());
    }
    let version = buf[0] >> 5;
    if version != PCEP_VERSION {
        return Err(CodecError::BadVersion(version).into());
    }
    let length = u16::from_be_bytes([buf[2], buf[3]]);
    if (length as usize) < MESSAGE_HEADER_SIZE {
        return Err(CodecError::BadLength(length as usize).into());
    }
    Ok(MessageHeader { msg_type: buf[1], length })
}

/// Encode a message header into 4 bytes; version 1, flags zero.
pub fn encode_message_header(header: &MessageHeader) -> ParseResult<[u8; MESSAGE_HEADER_SIZE]> {
    if (header.length as usize) < MESSAGE_HEADER_SIZE {
        return Err(CodecError::BadLength(header.length as usize).into());
    }
    let len = header.length.to_be_bytes();
    Ok([PCEP_VERSION << 5, header.msg_type, len[0], len[1]])
}

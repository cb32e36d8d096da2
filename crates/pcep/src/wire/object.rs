// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Common object header codec (RFC 5440 Sec.7.2).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | Object-Class  |   OT  |Res|P|I|        Object Length          |
//! +---------------+-------+---+-+-+-------------------------------+
//! |                        (Object body)                          |
//! +---------------------------------------------------------------+
//! ```
//!
//! Object-Type occupies the top 4 bits of the second byte; the P flag is
//! bit 6 and the I flag bit 7, 0-indexed from the MSB. Object Length is the
//! total size including this 4-byte header.

use crate::error::{CodecError, ParseResult};

/// Size of the common object header in bytes.
pub const OBJECT_HEADER_SIZE: usize = 4;

/// Bit mask of the P (processing-rule) flag within the second header byte.
const P_FLAG: u8 = 0b0000_0010;
/// Bit mask of the I (ignore) flag within the second header byte.
const I_FLAG: u8 = 0b0000_0001;

/// Decoded common object header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Object-Class field.
    pub object_class: u8,
    /// Object-Type field (4 bits on the wire).
    pub object_type: u8,
    /// P flag: the object must be taken into account by the recipient.
    pub processing: bool,
    /// I flag: the object was ignored by the sender of a response.
    pub ignore: bool,
    /// Total object length including the 4-byte header.
    pub length: u16,
}

impl ObjectHeader {
    /// Length of the body following the header.
    pub fn body_length(&self) -> usize {
        self.length as usize - OBJECT_HEADER_SIZE
    }
}

/// Decode a common object header from the first 4 bytes of `buf`.
pub fn decode_object_header(buf: &[u8]) -> ParseResult<ObjectHeader> {
    if buf.len() < OBJECT_HEADER_SIZE {
        return Err(CodecError::Truncated { expected: OBJECT_HEADER_SIZE, available: buf.len() }.into());
    }
    let length = u16::from_be_bytes([buf[2], buf[3]]);
    if (length as usize) < OBJECT_HEADER_SIZE {
        return Err(CodecError::BadLength(length as usize).into());
    }
    Ok(ObjectHeader {
        object_class: buf[0],
        object_type: buf[1] >> 4,
        processing: buf[1] & P_FLAG != 0,
        ignore: buf[1] & I_FLAG != 0,
        length,
    })
}

/// Encode a common object header into 4 bytes.
///
/// Fails with `FieldOverflow` if the object type does not fit 4 bits or the
/// length is below the header size.
pub fn encode_object_header(header: &ObjectHeader) -> ParseResult<[u8; OBJECT_HEADER_SIZE]> {
    if header.object_type > 0x0F {
        return Err(CodecError::FieldOverflow("object-type").into());
    }
    if (header.length as usize) < OBJECT_HEADER_SIZE {
        return Err(CodecError::BadLength(header.length as usize).into());
    }
    let mut flags = header.object_type << 4;
    if header.processing {
        flags |= P_FLAG;
    }
    if header.ignore {
        flags |= I_FLAG;
    }
    let len = header.length.to_be_bytes();
    Ok([header.object_class, flags, len[0], len[1]])
}

/// Split a message body into its sequence of `(header, body)` pairs.
///
/// Validates at every step that the declared length does not run past the
/// remaining bytes. The bodies borrow from `buf`.
pub fn decode_objects(buf: &[u8]) -> ParseResult<Vec<(ObjectHeader, &[u8])>> {
    let mut objects = Vec::new();
    let mut rest = buf;
    while !rest.is_empty() {
        let header = decode_object_header(rest)?;
        let total = header.length as usize;
        if total > rest.len() {
            return Err(CodecError::Truncated { expected: total, available: rest.len() }.into());
        }
        objects.push((header, &rest[OBJECT_HEADER_SIZE..total]));
        rest = &rest[total..];
    }
    Ok(objects)
}

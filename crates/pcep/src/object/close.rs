// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! CLOSE object codec (RFC 5440 Sec.7.17).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Reserved             |      Flags    |    Reason     |
//! +-------------------------------+---------------+---------------+
//! |                     Optional TLVs                             |
//! +---------------------------------------------------------------+
//! ```

use crate::codes::{TerminationReason, CLASS_CLOSE, TYPE_CLOSE};
use crate::error::{CodecError, ParseResult};
use crate::object::{Object, ObjectParser, ObjectSerializer};
use crate::wire::{self, ObjectHeader, OBJECT_HEADER_SIZE};

/// Fixed size of the CLOSE object body.
const CLOSE_BODY_FIXED: usize = 4;

/// CLOSE object: the reason a speaker is tearing the session down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseObject {
    /// Close reason.
    pub reason: TerminationReason,
}

/// Parser/serializer pair for the CLOSE object.
pub struct CloseObjectCodec;

impl ObjectParser for CloseObjectCodec {
    fn parse(&self, _header: &ObjectHeader, body: &[u8]) -> ParseResult<Object> {
        if body.len() < CLOSE_BODY_FIXED {
            return Err(CodecError::Truncated { expected: CLOSE_BODY_FIXED, available: body.len() }.into());
        }
        wire::decode_tlvs(&body[CLOSE_BODY_FIXED..])?;
        Ok(Object::Close(CloseObject { reason: TerminationReason::from_wire(body[3]) }))
    }
}

impl ObjectSerializer for CloseObjectCodec {
    fn serialize(&self, object: &Object, out: &mut Vec<u8>) -> ParseResult<()> {
        let close = match object {
            Object::Close(close) => close,
            _ => return Err(CodecError::NoSerializer("non-CLOSE object in CLOSE codec").into()),
        };
        let header = ObjectHeader {
            object_class: CLASS_CLOSE,
            object_type: TYPE_CLOSE,
            processing: false,
            ignore: false,
            length: (OBJECT_HEADER_SIZE + CLOSE_BODY_FIXED) as u16,
        };
        out.extend_from_slice(&wire::encode_object_header(&header)?);
        out.extend_from_slice(&[0, 0, 0, close.reason.wire_value()]);
        Ok(())
    }
}

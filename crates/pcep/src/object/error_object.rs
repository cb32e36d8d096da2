// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! PCEP-ERROR object codec (RFC 5440 Sec.7.15).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   Reserved    |     Flags     |  Error-Type   |  Error-value  |
//! +---------------+---------------+---------------+---------------+
//! |                     Optional TLVs                             |
//! +---------------------------------------------------------------+
//! ```

use crate::codes::{CLASS_ERROR, TYPE_ERROR};
use crate::error::{CodecError, ParseResult};
use crate::object::{Object, ObjectParser, ObjectSerializer};
use crate::wire::{self, ObjectHeader, OBJECT_HEADER_SIZE};

/// Fixed size of the ERROR object body.
const ERROR_BODY_FIXED: usize = 4;

/// PCEP-ERROR object: one `(error-type, error-value)` report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorObject {
    /// Error-Type field.
    pub error_type: u8,
    /// Error-value field.
    pub error_value: u8,
}

impl ErrorObject {
    /// ERROR object for a documented code.
    pub fn from_code(code: crate::codes::ErrorCode) -> Self {
        let (error_type, error_value) = code.type_value();
        Self { error_type, error_value }
    }

    /// The documented code, if this pair is one we know.
    pub fn code(&self) -> Option<crate::codes::ErrorCode> {
        crate::codes::ErrorCode::from_type_value(self.error_type, self.error_value)
    }
}

/// Parser/serializer pair for the PCEP-ERROR object. Optional TLVs are
/// tolerated and dropped; no standard TLV is defined for the session layer.
pub struct ErrorObjectCodec;

impl ObjectParser for ErrorObjectCodec {
    fn parse(&self, _header: &ObjectHeader, body: &[u8]) -> ParseResult<Object> {
        if body.len() < ERROR_BODY_FIXED {
            return Err(CodecError::Truncated { expected: ERROR_BODY_FIXED, available: body.len() }.into());
        }
        // Validate TLV framing even though the values are not interpreted.
        wire::decode_tlvs(&body[ERROR_BODY_FIXED..])?;
        Ok(Object::Error(ErrorObject { error_type: body[2], error_value: body[3] }))
    }
}

impl ObjectSerializer for ErrorObjectCodec {
    fn serialize(&self, object: &Object, out: &mut Vec<u8>) -> ParseResult<()> {
        let error = match object {
            Object::Error(error) => error,
            _ => return Err(CodecError::NoSerializer("non-ERROR object in ERROR codec").into()),
        };
        let header = ObjectHeader {
            object_class: CLASS_ERROR,
            object_type: TYPE_ERROR,
            processing: false,
            ignore: false,
            length: (OBJECT_HEADER_SIZE + ERROR_BODY_FIXED) as u16,
        };
        out.extend_from_slice(&wire::encode_object_header(&header)?);
        out.extend_from_slice(&[0, 0, error.error_type, error.error_value]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::ErrorCode;

    #[test]
    fn test_roundtrip() {
        let error = ErrorObject::from_code(ErrorCode::SecondOpenMsg);
        let mut out = Vec::new();
        ErrorObjectCodec.serialize(&Object::Error(error), &mut out).unwrap();

        let header = wire::decode_object_header(&out).unwrap();
        assert_eq!(header.object_class, 13);
        let parsed = ErrorObjectCodec.parse(&header, &out[OBJECT_HEADER_SIZE..]).unwrap();
        assert_eq!(parsed, Object::Error(error));
    }

    #[test]
    fn test_code_mapping() {
        let error = ErrorObject { error_type: 1, error_value: 5 };
        assert_eq!(error.code(), Some(ErrorCode::SecondOpenMsg));

        let error = ErrorObject { error_type: 200, error_value: 1 };
        assert_eq!(error.code(), None);
    }

    #[test]
    fn test_truncated() {
        let header = ObjectHeader {
            object_class: 13,
            object_type: 1,
            processing: false,
            ignore: false,
            length: 6,
        };
        assert!(ErrorObjectCodec.parse(&header, &[0, 0]).is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! OPEN object codec (RFC 5440 Sec.7.3).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | Ver |  Flags  |   Keepalive   |   DeadTimer   |      SID      |
//! +---------------+---------------+---------------+---------------+
//! |                     Optional TLVs                             |
//! +---------------------------------------------------------------+
//! ```
//!
//! Convention is `DeadTimer == 4 x Keepalive`; a value of 0 disables the
//! corresponding timer. Deviation from the convention is logged by the
//! proposal policy, never rejected here.

use crate::codes::{ErrorCode, PCEP_VERSION};
use crate::error::{CodecError, ParseResult};
use crate::object::{Object, ObjectParser, ObjectSerializer, Tlv};
use crate::registry::TlvRegistry;
use crate::wire::{self, decode_tlvs, ObjectHeader, OBJECT_HEADER_SIZE};
use std::sync::Arc;

/// Fixed part of the OPEN object body (version/flags, keepalive, deadtimer, SID).
const OPEN_BODY_FIXED: usize = 4;

/// OPEN object: the session proposal exchanged during the handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenObject {
    /// Proposed keepalive interval, seconds. 0 disables the keepalive timer.
    pub keepalive: u8,
    /// Proposed dead timer, seconds. 0 disables the dead timer.
    pub dead_timer: u8,
    /// Session ID assigned by the speaker.
    pub session_id: u8,
    /// Capability TLVs.
    pub tlvs: Vec<Tlv>,
}

impl OpenObject {
    /// New proposal without capability TLVs.
    pub fn new(keepalive: u8, dead_timer: u8, session_id: u8) -> Self {
        Self { keepalive, dead_timer, session_id, tlvs: Vec::new() }
    }

    /// Same proposal with the given capability TLVs.
    pub fn with_tlvs(mut self, tlvs: Vec<Tlv>) -> Self {
        self.tlvs = tlvs;
        self
    }

    /// The stateful capability TLV, if the proposal carries one.
    pub fn stateful_capability(&self) -> Option<&crate::object::StatefulCapability> {
        self.tlvs.iter().find_map(|tlv| match tlv {
            Tlv::StatefulCapability(cap) => Some(cap),
            Tlv::Raw(_) => None,
        })
    }
}

/// Parser/serializer pair for the OPEN object. Consults the TLV registry for
/// capability TLVs; unrecognized TLV types are skipped and logged.
pub struct OpenObjectCodec {
    tlv_registry: Arc<TlvRegistry>,
}

impl OpenObjectCodec {
    /// Codec backed by the given TLV registry.
    pub fn new(tlv_registry: Arc<TlvRegistry>) -> Self {
        Self { tlv_registry }
    }
}

impl ObjectParser for OpenObjectCodec {
    fn parse(&self, _header: &ObjectHeader, body: &[u8]) -> ParseResult<Object> {
        if body.len() < OPEN_BODY_FIXED {
            return Err(CodecError::Truncated { expected: OPEN_BODY_FIXED, available: body.len() }.into());
        }
        let version = body[0] >> 5;
        if version != PCEP_VERSION {
            return Err(ErrorCode::NonOrInvalidOpenMsg.into());
        }
        let mut tlvs = Vec::new();
        for raw in decode_tlvs(&body[OPEN_BODY_FIXED..])? {
            match self.tlv_registry.parser(raw.tlv_type) {
                Some(parser) => tlvs.push(parser.parse(&raw.value)?),
                None => {
                    log::debug!("skipping unrecognized TLV type {} in OPEN object", raw.tlv_type);
                }
            }
        }
        Ok(Object::Open(OpenObject {
            keepalive: body[1],
            dead_timer: body[2],
            session_id: body[3],
            tlvs,
        }))
    }
}

impl ObjectSerializer for OpenObjectCodec {
    fn serialize(&self, object: &Object, out: &mut Vec<u8>) -> ParseResult<()> {
        let open = match object {
            Object::Open(open) => open,
            _ => return Err(CodecError::NoSerializer("non-OPEN object in OPEN codec").into()),
        };
        let mut body = vec![PCEP_VERSION << 5, open.keepalive, open.dead_timer, open.session_id];
        for tlv in &open.tlvs {
            match self.tlv_registry.serializer(tlv.kind()) {
                Some(serializer) => serializer.serialize(tlv, &mut body)?,
                None => return Err(CodecError::NoSerializer("OPEN capability TLV").into()),
            }
        }
        let header = ObjectHeader {
            object_class: crate::codes::CLASS_OPEN,
            object_type: crate::codes::TYPE_OPEN,
            processing: false,
            ignore: false,
            length: (OBJECT_HEADER_SIZE + body.len()) as u16,
        };
        out.extend_from_slice(&wire::encode_object_header(&header)?);
        out.extend_from_slice(&body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::StatefulCapability;
    use crate::registry::standard_tlv_registry;

    fn codec() -> OpenObjectCodec {
        OpenObjectCodec::new(Arc::new(standard_tlv_registry()))
    }

    #[test]
    fn test_roundtrip_plain() {
        let open = OpenObject::new(30, 120, 7);
        let mut out = Vec::new();
        codec().serialize(&Object::Open(open.clone()), &mut out).unwrap();

        let header = wire::decode_object_header(&out).unwrap();
        assert_eq!(header.object_class, 1);
        assert_eq!(header.object_type, 1);
        let parsed = codec().parse(&header, &out[OBJECT_HEADER_SIZE..]).unwrap();
        assert_eq!(parsed, Object::Open(open));
    }

    #[test]
    fn test_roundtrip_with_stateful_capability() {
        let cap = StatefulCapability::new(true, true, false, false, false);
        let open = OpenObject::new(30, 120, 0).with_tlvs(vec![Tlv::StatefulCapability(cap)]);
        let mut out = Vec::new();
        codec().serialize(&Object::Open(open.clone()), &mut out).unwrap();

        let header = wire::decode_object_header(&out).unwrap();
        let parsed = codec().parse(&header, &out[OBJECT_HEADER_SIZE..]).unwrap();
        assert_eq!(parsed, Object::Open(open));
    }

    #[test]
    fn test_unrecognized_tlv_skipped() {
        let mut body = vec![PCEP_VERSION << 5, 30, 120, 0];
        wire::encode_tlv(0xFFEE, &[1, 2, 3], &mut body).unwrap();
        let header = ObjectHeader {
            object_class: 1,
            object_type: 1,
            processing: false,
            ignore: false,
            length: (OBJECT_HEADER_SIZE + body.len()) as u16,
        };
        let parsed = codec().parse(&header, &body).unwrap();
        match parsed {
            Object::Open(open) => assert!(open.tlvs.is_empty()),
            other => panic!("expected Open, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_version_is_documented_error() {
        let body = [0x40, 30, 120, 0]; // version 2
        let header = ObjectHeader {
            object_class: 1,
            object_type: 1,
            processing: false,
            ignore: false,
            length: 8,
        };
        let err = codec().parse(&header, &body).unwrap_err();
        assert_eq!(err.documented(), Some(ErrorCode::NonOrInvalidOpenMsg));
    }

    #[test]
    fn test_truncated_body() {
        let header = ObjectHeader {
            object_class: 1,
            object_type: 1,
            processing: false,
            ignore: false,
            length: 6,
        };
        assert!(codec().parse(&header, &[0x20, 30]).is_err());
    }
}

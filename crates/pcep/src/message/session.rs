// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Built-in parsers/serializers for the five session-layer messages
//! (RFC 5440 Sec.6.2-6.8, RFC 8253 Sec.3.1).
//!
//! Everything here works on the decoded object sequence; the bit-level work
//! happens in [`crate::wire`] and the object codecs.

use crate::codes::{ErrorCode, MSG_CLOSE, MSG_KEEPALIVE, MSG_OPEN, MSG_PCERR, MSG_STARTTLS};
use crate::error::{CodecError, ParseResult};
use crate::message::codec::{decode_object_sequence, encode_object_sequence, frame_message};
use crate::message::{Message, MessageParser, MessageSerializer, PcerrMessage};
use crate::object::Object;
use crate::registry::context::CodecContext;

// =======================================================================
// Open (type 1): exactly one OPEN object
// =======================================================================

/// Open message codec.
pub struct OpenMessageCodec;

impl MessageParser for OpenMessageCodec {
    fn parse(&self, body: &[u8], ctx: &CodecContext) -> ParseResult<Message> {
        let mut objects = decode_object_sequence(body, ctx)?;
        match (objects.len(), objects.pop()) {
            (1, Some(Object::Open(open))) => Ok(Message::Open(open)),
            _ => Err(ErrorCode::NonOrInvalidOpenMsg.into()),
        }
    }
}

impl MessageSerializer for OpenMessageCodec {
    fn serialize(&self, msg: &Message, ctx: &CodecContext, out: &mut Vec<u8>) -> ParseResult<()> {
        let open = match msg {
            Message::Open(open) => open,
            _ => return Err(CodecError::NoSerializer("non-Open in Open codec").into()),
        };
        let mut body = Vec::new();
        encode_object_sequence(&[Object::Open(open.clone())], ctx, &mut body)?;
        frame_message(MSG_OPEN, &body, out)
    }
}

// =======================================================================
// Keepalive (type 2) and StartTLS (type 13): empty bodies
// =======================================================================

/// Keepalive message codec.
pub struct KeepaliveMessageCodec;

impl MessageParser for KeepaliveMessageCodec {
    fn parse(&self, body: &[u8], _ctx: &CodecContext) -> ParseResult<Message> {
        if !body.is_empty() {
            return Err(CodecError::BadLength(body.len()).into());
        }
        Ok(Message::Keepalive)
    }
}

impl MessageSerializer for KeepaliveMessageCodec {
    fn serialize(&self, _msg: &Message, _ctx: &CodecContext, out: &mut Vec<u8>) -> ParseResult<()> {
        frame_message(MSG_KEEPALIVE, &[], out)
    }
}

/// StartTLS message codec (RFC 8253).
pub struct StartTlsMessageCodec;

impl MessageParser for StartTlsMessageCodec {
    fn parse(&self, body: &[u8], _ctx: &CodecContext) -> ParseResult<Message> {
        if !body.is_empty() {
            return Err(CodecError::BadLength(body.len()).into());
        }
        Ok(Message::StartTls)
    }
}

impl MessageSerializer for StartTlsMessageCodec {
    fn serialize(&self, _msg: &Message, _ctx: &CodecContext, out: &mut Vec<u8>) -> ParseResult<()> {
        frame_message(MSG_STARTTLS, &[], out)
    }
}

// =======================================================================
// PCErr (type 6): ERROR objects, optionally a counter-proposal OPEN
// =======================================================================

/// PCErr message codec.
pub struct PcerrMessageCodec;

impl MessageParser for PcerrMessageCodec {
    fn parse(&self, body: &[u8], ctx: &CodecContext) -> ParseResult<Message> {
        let mut errors = Vec::new();
        let mut open = None;
        for object in decode_object_sequence(body, ctx)? {
            match object {
                Object::Error(error) => errors.push(error),
                Object::Open(o) if open.is_none() => open = Some(o),
                other => {
                    log::debug!("ignoring {:?} object inside PCErr", other.kind());
                }
            }
        }
        if errors.is_empty() {
            return Err(ErrorCode::MalformedObject.into());
        }
        Ok(Message::Pcerr(PcerrMessage { errors, open }))
    }
}

impl MessageSerializer for PcerrMessageCodec {
    fn serialize(&self, msg: &Message, ctx: &CodecContext, out: &mut Vec<u8>) -> ParseResult<()> {
        let pcerr = match msg {
            Message::Pcerr(pcerr) => pcerr,
            _ => return Err(CodecError::NoSerializer("non-PCErr in PCErr codec").into()),
        };
        let mut objects: Vec<Object> = pcerr.errors.iter().map(|e| Object::Error(*e)).collect();
        if let Some(open) = &pcerr.open {
            objects.push(Object::Open(open.clone()));
        }
        let mut body = Vec::new();
        encode_object_sequence(&objects, ctx, &mut body)?;
        frame_message(MSG_PCERR, &body, out)
    }
}

// =======================================================================
// Close (type 7): exactly one CLOSE object
// =======================================================================

/// Close message codec.
pub struct CloseMessageCodec;

impl MessageParser for CloseMessageCodec {
    fn parse(&self, body: &[u8], ctx: &CodecContext) -> ParseResult<Message> {
        let mut objects = decode_object_sequence(body, ctx)?;
        match (objects.len(), objects.pop()) {
            (1, Some(Object::Close(close))) => Ok(Message::Close(close.reason)),
            _ => Err(ErrorCode::MalformedObject.into()),
        }
    }
}

impl MessageSerializer for CloseMessageCodec {
    fn serialize(&self, msg: &Message, ctx: &CodecContext, out: &mut Vec<u8>) -> ParseResult<()> {
        let reason = match msg {
            Message::Close(reason) => *reason,
            _ => return Err(CodecError::NoSerializer("non-Close in Close codec").into()),
        };
        let mut body = Vec::new();
        encode_object_sequence(
            &[Object::Close(crate::object::CloseObject { reason })],
            ctx,
            &mut body,
        )?;
        frame_message(MSG_CLOSE, &body, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::TerminationReason;
    use crate::message::MessageCodec;
    use crate::object::OpenObject;
    use crate::registry::standard_context;
    use std::sync::Arc;

    fn codec() -> MessageCodec {
        MessageCodec::new(Arc::new(standard_context()))
    }

    #[test]
    fn test_pcerr_roundtrip_plain() {
        let codec = codec();
        let msg = Message::error(ErrorCode::NoMsgBeforeExpKeepWait);
        let mut out = Vec::new();
        codec.encode(&msg, &mut out).unwrap();
        assert_eq!(codec.decode(&out).unwrap(), msg);
    }

    #[test]
    fn test_pcerr_roundtrip_with_counter_proposal() {
        let codec = codec();
        let msg = Message::error_with_open(
            ErrorCode::NonAccNegSessionChar,
            OpenObject::new(30, 120, 0),
        );
        let mut out = Vec::new();
        codec.encode(&msg, &mut out).unwrap();
        assert_eq!(codec.decode(&out).unwrap(), msg);
    }

    #[test]
    fn test_close_roundtrip() {
        let codec = codec();
        let msg = Message::Close(TerminationReason::ExpDeadTimer);
        let mut out = Vec::new();
        codec.encode(&msg, &mut out).unwrap();
        assert_eq!(codec.decode(&out).unwrap(), msg);
    }

    #[test]
    fn test_starttls_roundtrip() {
        let codec = codec();
        let mut out = Vec::new();
        codec.encode(&Message::StartTls, &mut out).unwrap();
        assert_eq!(out, vec![0x20, 13, 0x00, 0x04]);
        assert_eq!(codec.decode(&out).unwrap(), Message::StartTls);
    }

    #[test]
    fn test_keepalive_with_body_rejected() {
        let codec = codec();
        let frame = [0x20, 0x02, 0x00, 0x08, 0, 0, 0, 0];
        assert!(codec.decode(&frame).is_err());
    }

    #[test]
    fn test_open_message_without_open_object() {
        let codec = codec();
        // Open message framing an empty body
        let frame = [0x20, 0x01, 0x00, 0x04];
        let err = codec.decode(&frame).unwrap_err();
        assert_eq!(err.documented(), Some(ErrorCode::NonOrInvalidOpenMsg));
    }

    #[test]
    fn test_pcerr_without_error_object() {
        let codec = codec();
        let frame = [0x20, 0x06, 0x00, 0x04];
        let err = codec.decode(&frame).unwrap_err();
        assert_eq!(err.documented(), Some(ErrorCode::MalformedObject));
    }
}

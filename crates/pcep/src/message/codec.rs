// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Message decoder/encoder over the wire codec and the handler registries.
//!
//! Decoding turns one length-framed buffer into a typed [`Message`];
//! encoding is the reverse. Both directions dispatch through the
//! [`CodecContext`] registries, so extension catalogues participate without
//! this file knowing about them.

use crate::codes::ErrorCode;
use crate::error::{CodecError, ParseResult};
use crate::message::Message;
use crate::object::{Object, UnknownObject};
use crate::registry::context::CodecContext;
use crate::wire::{self, MESSAGE_HEADER_SIZE};
use std::sync::Arc;

/// Decoder/encoder bound to a codec context.
#[derive(Clone)]
pub struct MessageCodec {
    ctx: Arc<CodecContext>,
}

impl MessageCodec {
    /// Codec over the given context.
    pub fn new(ctx: Arc<CodecContext>) -> Self {
        Self { ctx }
    }

    /// The underlying context.
    pub fn context(&self) -> &Arc<CodecContext> {
        &self.ctx
    }

    /// Decode one complete framed message.
    ///
    /// `frame` must hold exactly the bytes the header declares; the
    /// transport framer guarantees that. An unregistered message type is the
    /// documented error CAPABILITY_NOT_SUPPORTED, which the session layer
    /// counts against the unknown-message quota.
    pub fn decode(&self, frame: &[u8]) -> ParseResult<Message> {
        let header = wire::decode_message_header(frame)?;
        let declared = header.length as usize;
        if declared > frame.len() {
            return Err(CodecError::Truncated { expected: declared, available: frame.len() }.into());
        }
        if declared < frame.len() {
            return Err(CodecError::BadLength(declared).into());
        }
        let body = &frame[MESSAGE_HEADER_SIZE..];
        match self.ctx.messages().parser(header.msg_type) {
            Some(parser) => parser.parse(body, &self.ctx),
            None => {
                log::debug!("no parser registered for message type {}", header.msg_type);
                Err(ErrorCode::CapabilityNotSupported.into())
            }
        }
    }

    /// Encode one message, common header included, appending to `out`.
    pub fn encode(&self, msg: &Message, out: &mut Vec<u8>) -> ParseResult<()> {
        match self.ctx.messages().serializer(msg.msg_type()) {
            Some(serializer) => serializer.serialize(msg, &self.ctx, out),
            None => Err(CodecError::NoSerializer("message").into()),
        }
    }
}

/// Frame a message body: prepend the common header once the body length is
/// known. Used by every message serializer.
pub fn frame_message(msg_type: u8, body: &[u8], out: &mut Vec<u8>) -> ParseResult<()> {
    let total = MESSAGE_HEADER_SIZE + body.len();
    if total > u16::MAX as usize {
        return Err(CodecError::FieldOverflow("message length").into());
    }
    let header = wire::MessageHeader { msg_type, length: total as u16 };
    out.extend_from_slice(&wire::encode_message_header(&header)?);
    out.extend_from_slice(body);
    Ok(())
}

/// Decode a message body into its object sequence, consulting the object
/// registry and applying the unrecognized-object policy:
///
/// - no parser and P flag set: substitute [`Object::Unknown`] with
///   UNRECOGNIZED_OBJ_CLASS (no type of the class is known) or
///   UNRECOGNIZED_OBJ_TYPE (the class exists, this type does not);
/// - no parser and P flag clear: drop the object and log;
/// - a parser returning one of the four unrecognized/unsupported codes on a
///   P-flagged object: substitute the placeholder;
/// - any other documented error, or any codec error: abort the message.
pub fn decode_object_sequence(body: &[u8], ctx: &CodecContext) -> ParseResult<Vec<Object>> {
    let mut objects = Vec::new();
    for (header, obj_body) in wire::decode_objects(body)? {
        let parser = ctx.objects().parser(header.object_class, header.object_type);
        let parsed = match parser {
            Some(parser) => parser.parse(&header, obj_body),
            None => {
                let code = if class_is_known(ctx, header.object_class) {
                    ErrorCode::UnrecognizedObjType
                } else {
                    ErrorCode::UnrecognizedObjClass
                };
                Err(code.into())
            }
        };
        match parsed {
            Ok(object) => objects.push(object),
            Err(err) => match err.documented() {
                Some(code) if code.is_unrecognized_object() => {
                    if header.processing {
                        objects.push(Object::Unknown(UnknownObject { header, code }));
                    } else {
                        log::debug!(
                            "ignoring unrecognized object class {} type {} without P flag",
                            header.object_class,
                            header.object_type
                        );
                    }
                }
                _ => return Err(err),
            },
        }
    }
    Ok(objects)
}

/// Serialize an object sequence through the registry.
pub fn encode_object_sequence(
    objects: &[Object],
    ctx: &CodecContext,
    out: &mut Vec<u8>,
) -> ParseResult<()> {
    for object in objects {
        match ctx.objects().serializer(object.kind()) {
            Some(serializer) => serializer.serialize(object, out)?,
            None => return Err(CodecError::NoSerializer("object").into()),
        }
    }
    Ok(())
}

fn class_is_known(ctx: &CodecContext, object_class: u8) -> bool {
    (0..=0x0F).any(|object_type| ctx.objects().parser(object_class, object_type).is_some())
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # Typed PCEP messages
//!
//! A message is an ordered sequence of objects under a common header. The
//! session layer understands five of them (Open, Keepalive, PCErr, Close,
//! StartTLS); everything else flows through [`Message::Other`] so extension
//! catalogues (PCReq/PCRep, stateful report/update, ...) can register their
//! own parsers without touching this crate.

pub mod codec;
pub mod session;

pub use codec::MessageCodec;

use crate::codes::{self, TerminationReason};
use crate::error::ParseResult;
use crate::object::{ErrorObject, Object, OpenObject};
use crate::registry::context::CodecContext;

/// A decoded PCEP message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Open message: exactly one OPEN object.
    Open(OpenObject),
    /// Keepalive message: empty body.
    Keepalive,
    /// Error message: one or more ERROR objects, optionally a session
    /// counter-proposal OPEN object.
    Pcerr(PcerrMessage),
    /// Close message: one CLOSE object.
    Close(TerminationReason),
    /// StartTLS message: empty body (RFC 8253).
    StartTls,
    /// A message decoded by an externally registered parser.
    Other(RawMessage),
}

impl Message {
    /// Wire message type.
    pub fn msg_type(&self) -> u8 {
        match self {
            Message::Open(_) => codes::MSG_OPEN,
            Message::Keepalive => codes::MSG_KEEPALIVE,
            Message::Pcerr(_) => codes::MSG_PCERR,
            Message::Close(_) => codes::MSG_CLOSE,
            Message::StartTls => codes::MSG_STARTTLS,
            Message::Other(raw) => raw.msg_type,
        }
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Open(_) => "Open",
            Message::Keepalive => "Keepalive",
            Message::Pcerr(_) => "PCErr",
            Message::Close(_) => "Close",
            Message::StartTls => "StartTLS",
            Message::Other(_) => "extension",
        }
    }

    /// PCErr carrying one documented code, no counter-proposal.
    pub fn error(code: crate::codes::ErrorCode) -> Self {
        Message::Pcerr(PcerrMessage { errors: vec![ErrorObject::from_code(code)], open: None })
    }

    /// PCErr carrying a documented code plus a session counter-proposal.
    pub fn error_with_open(code: crate::codes::ErrorCode, open: OpenObject) -> Self {
        Message::Pcerr(PcerrMessage {
            errors: vec![ErrorObject::from_code(code)],
            open: Some(open),
        })
    }
}

/// Body of a PCErr message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcerrMessage {
    /// Reported errors, at least one.
    pub errors: Vec<ErrorObject>,
    /// Session-negotiation counter-proposal, when the error-type is the
    /// session establishment one.
    pub open: Option<OpenObject>,
}

impl PcerrMessage {
    /// The first error's documented code, if recognized.
    pub fn code(&self) -> Option<crate::codes::ErrorCode> {
        self.errors.first().and_then(ErrorObject::code)
    }
}

/// A message kept as its decoded object sequence, for types registered by
/// external catalogues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    /// Wire message type.
    pub msg_type: u8,
    /// Decoded object sequence, placeholders included.
    pub objects: Vec<Object>,
}

/// Parses one message body (the object sequence after the common header).
pub trait MessageParser: Send + Sync {
    /// Parse `body` using the context's object/TLV registries.
    fn parse(&self, body: &[u8], ctx: &CodecContext) -> ParseResult<Message>;
}

/// Serializes one message, common header included, appending to `out`.
pub trait MessageSerializer: Send + Sync {
    /// Append the framed message to `out`.
    fn serialize(&self, msg: &Message, ctx: &CodecContext, out: &mut Vec<u8>) -> ParseResult<()>;
}

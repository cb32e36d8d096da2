// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # PCEP wire codec (RFC 5440 Sec.6 and Sec.7)
//!
//! Pure, stateless big-endian encoding and decoding of the three framing
//! primitives every PCEP message is built from:
//!
//! - common message header ([`message`])
//! - common object header ([`object`])
//! - TLV header with 4-byte padding ([`tlv`])
//!
//! The codec is synchronous over an already-framed buffer; waiting for more
//! bytes is the transport layer's job (see [`crate::transport::framer`]).
//! Higher layers (registries, message parsers) import from here - never the
//! reverse.

pub mod message;
pub mod object;
pub mod tlv;

pub use message::{decode_message_header, encode_message_header, MessageHeader, MESSAGE_HEADER_SIZE};
pub use object::{decode_object_header, decode_objects, encode_object_header, ObjectHeader, OBJECT_HEADER_SIZE};
pub use tlv::{decode_tlvs, encode_tlv, padded_length, RawTlv, TLV_HEADER_SIZE};

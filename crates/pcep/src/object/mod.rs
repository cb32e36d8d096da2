// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # Typed PCEP objects and TLVs
//!
//! The decoded form of the wire protocol: a tagged union of the object kinds
//! the session layer understands (OPEN, PCEP-ERROR, CLOSE), a placeholder
//! for unrecognized-but-tolerated objects, and a raw passthrough for kinds
//! registered by external parser catalogues.
//!
//! Serializer dispatch is by [`ObjectKind`] / [`TlvKind`] - the discriminant
//! of the tagged union - so no runtime type inspection is involved anywhere.

pub mod close;
pub mod error_object;
pub mod open;
pub mod stateful;

pub use close::CloseObject;
pub use error_object::ErrorObject;
pub use open::OpenObject;
pub use stateful::StatefulCapability;

use crate::codes::ErrorCode;
use crate::error::ParseResult;
use crate::wire::{ObjectHeader, RawTlv};

/// A decoded PCEP object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    /// OPEN object (class 1).
    Open(OpenObject),
    /// PCEP-ERROR object (class 13).
    Error(ErrorObject),
    /// CLOSE object (class 15).
    Close(CloseObject),
    /// Placeholder substituted for an unrecognized object whose P flag was
    /// set. Carries the documented code the caller must report.
    Unknown(UnknownObject),
    /// An object produced by an externally registered parser, kept in its
    /// wire shape.
    Raw(RawObject),
}

impl Object {
    /// Discriminant used for serializer lookup.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Open(_) => ObjectKind::Open,
            Object::Error(_) => ObjectKind::Error,
            Object::Close(_) => ObjectKind::Close,
            Object::Unknown(_) => ObjectKind::Unknown,
            Object::Raw(raw) => ObjectKind::Raw(raw.object_class, raw.object_type),
        }
    }
}

/// Identity of an object kind, the serializer registry key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// OPEN object.
    Open,
    /// PCEP-ERROR object.
    Error,
    /// CLOSE object.
    Close,
    /// Unrecognized-object placeholder (never serialized).
    Unknown,
    /// Externally registered `(class, type)`.
    Raw(u8, u8),
}

/// Placeholder for an object the decoder could not interpret but must not
/// abort on (P flag set, one of the four unrecognized/unsupported codes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownObject {
    /// Header of the offending object.
    pub header: ObjectHeader,
    /// The documented code to answer with.
    pub code: ErrorCode,
}

/// An object kept in wire form, body uninterpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawObject {
    /// Object-Class.
    pub object_class: u8,
    /// Object-Type.
    pub object_type: u8,
    /// P flag.
    pub processing: bool,
    /// I flag.
    pub ignore: bool,
    /// Object body, header excluded.
    pub body: Vec<u8>,
}

/// A decoded TLV.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tlv {
    /// STATEFUL-PCE-CAPABILITY (type 16).
    StatefulCapability(StatefulCapability),
    /// A TLV produced by an externally registered parser, kept raw.
    Raw(RawTlv),
}

impl Tlv {
    /// Discriminant used for serializer lookup.
    pub fn kind(&self) -> TlvKind {
        match self {
            Tlv::StatefulCapability(_) => TlvKind::StatefulCapability,
            Tlv::Raw(raw) => TlvKind::Raw(raw.tlv_type),
        }
    }
}

/// Identity of a TLV kind, the serializer registry key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TlvKind {
    /// STATEFUL-PCE-CAPABILITY.
    StatefulCapability,
    /// Externally registered TLV type.
    Raw(u16),
}

// =======================================================================
// Handler traits (implemented by the built-in parsers here and by the
// external object catalogues via the registries)
// =======================================================================

/// Parses one object body into its typed form.
pub trait ObjectParser: Send + Sync {
    /// Parse the body following `header`. The TLV loop inside an object is
    /// the parser's responsibility (via [`crate::wire::decode_tlvs`]).
    fn parse(&self, header: &ObjectHeader, body: &[u8]) -> ParseResult<Object>;
}

/// Serializes one typed object, header included, appending to `out`.
pub trait ObjectSerializer: Send + Sync {
    /// Append the full object (header + body + TLVs) to `out`.
    fn serialize(&self, object: &Object, out: &mut Vec<u8>) -> ParseResult<()>;
}

/// Parses one TLV value into its typed form.
pub trait TlvParser: Send + Sync {
    /// Parse the unpadded value of a TLV.
    fn parse(&self, value: &[u8]) -> ParseResult<Tlv>;
}

/// Serializes one typed TLV, header and padding included.
pub trait TlvSerializer: Send + Sync {
    /// Append the full TLV to `out`.
    fn serialize(&self, tlv: &Tlv, out: &mut Vec<u8>) -> ParseResult<()>;
}

/// Parses one ERO/RRO/XRO subobject or label. The session layer never
/// interprets these; the trait exists so route-object catalogues can hang
/// off the same registry shape.
pub trait SubobjectParser: Send + Sync {
    /// Parse a subobject body into a raw object representation.
    fn parse(&self, subobject_type: u8, body: &[u8]) -> ParseResult<RawObject>;
}

/// Serializes one subobject or label.
pub trait SubobjectSerializer: Send + Sync {
    /// Append the subobject to `out`.
    fn serialize(&self, subobject: &RawObject, out: &mut Vec<u8>) -> ParseResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_dispatch() {
        let raw = Object::Raw(RawObject {
            object_class: 5,
            object_type: 1,
            processing: false,
            ignore: false,
            body: vec![],
        });
        assert_eq!(raw.kind(), ObjectKind::Raw(5, 1));

        let open = Object::Open(OpenObject::new(30, 120, 0));
        assert_eq!(open.kind(), ObjectKind::Open);
    }

    #[test]
    fn test_tlv_kind_dispatch() {
        let tlv = Tlv::Raw(RawTlv { tlv_type: 77, value: vec![] });
        assert_eq!(tlv.kind(), TlvKind::Raw(77));
    }
}

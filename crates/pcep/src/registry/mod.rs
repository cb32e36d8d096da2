// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # Handler registries
//!
//! Dispatch tables from wire-level identifiers to parser implementations and
//! from decoded-value kinds to serializer implementations. Objects, TLVs,
//! ERO/RRO/XRO subobjects and labels all share the same shape:
//!
//! - `register_*` fails on a duplicate key and returns a [`Registration`]
//!   token; dropping the token unregisters the handler.
//! - lookups are safe while registration happens on another thread
//!   (`DashMap`); registration is rare, lookups are the hot path.
//!
//! There is no process-wide singleton: a [`context::CodecContext`] is built
//! explicitly and handed by reference into the codec and the negotiator
//! factories, so multiple independent protocol stacks can coexist in one
//! process.

pub mod context;

pub use context::{standard_context, standard_tlv_registry, CodecContext};

use crate::error::CodecError;
use crate::message::{MessageParser, MessageSerializer};
use crate::object::{
    ObjectKind, ObjectParser, ObjectSerializer, SubobjectParser, SubobjectSerializer, TlvKind,
    TlvParser, TlvSerializer,
};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

/// Deregistration capability returned by every `register_*` call. Dropping
/// it removes the handler; [`Registration::persist`] keeps the handler for
/// the registry's lifetime.
pub struct Registration<K: Eq + Hash, H: ?Sized> {
    map: Weak<DashMap<K, Arc<H>>>,
    key: Option<K>,
}

impl<K: Eq + Hash, H: ?Sized> Registration<K, H> {
    /// Disarm the token: the handler stays registered forever.
    pub fn persist(mut self) {
        self.key = None;
    }
}

impl<K: Eq + Hash, H: ?Sized> Drop for Registration<K, H> {
    fn drop(&mut self) {
        if let (Some(key), Some(map)) = (self.key.take(), self.map.upgrade()) {
            map.remove(&key);
        }
    }
}

/// One direction of a registry: key to handler.
struct HandlerTable<K: Eq + Hash, H: ?Sized> {
    handlers: Arc<DashMap<K, Arc<H>>>,
}

impl<K: Eq + Hash + Clone, H: ?Sized> HandlerTable<K, H> {
    fn new() -> Self {
        Self { handlers: Arc::new(DashMap::new()) }
    }

    fn register(
        &self,
        key: K,
        handler: Arc<H>,
        what: &'static str,
    ) -> Result<Registration<K, H>, CodecError> {
        match self.handlers.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(CodecError::DuplicateRegistration(what))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(handler);
                Ok(Registration { map: Arc::downgrade(&self.handlers), key: Some(key) })
            }
        }
    }

    fn lookup(&self, key: &K) -> Option<Arc<H>> {
        self.handlers.get(key).map(|entry| Arc::clone(entry.value()))
    }
}

// =======================================================================
// Object registry
// =======================================================================

/// Registry mapping `(object-class, object-type)` to parsers and
/// [`ObjectKind`] to serializers.
pub struct ObjectRegistry {
    parsers: HandlerTable<(u8, u8), dyn ObjectParser>,
    serializers: HandlerTable<ObjectKind, dyn ObjectSerializer>,
}

impl ObjectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { parsers: HandlerTable::new(), serializers: HandlerTable::new() }
    }

    /// Register a parser for `(object_class, object_type)`. The type must
    /// fit the 4-bit wire field.
    pub fn register_parser(
        &self,
        object_class: u8,
        object_type: u8,
        parser: Arc<dyn ObjectParser>,
    ) -> Result<Registration<(u8, u8), dyn ObjectParser>, CodecError> {
        if object_type > 0x0F {
            return Err(CodecError::FieldOverflow("object-type"));
        }
        self.parsers.register((object_class, object_type), parser, "object parser")
    }

    /// Register a serializer for an object kind.
    pub fn register_serializer(
        &self,
        kind: ObjectKind,
        serializer: Arc<dyn ObjectSerializer>,
    ) -> Result<Registration<ObjectKind, dyn ObjectSerializer>, CodecError> {
        self.serializers.register(kind, serializer, "object serializer")
    }

    /// Parser lookup by wire identifiers.
    pub fn parser(&self, object_class: u8, object_type: u8) -> Option<Arc<dyn ObjectParser>> {
        self.parsers.lookup(&(object_class, object_type))
    }

    /// Serializer lookup by value kind.
    pub fn serializer(&self, kind: ObjectKind) -> Option<Arc<dyn ObjectSerializer>> {
        self.serializers.lookup(&kind)
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =======================================================================
// TLV registry
// =======================================================================

/// Registry mapping TLV types to parsers and [`TlvKind`] to serializers.
pub struct TlvRegistry {
    parsers: HandlerTable<u16, dyn TlvParser>,
    serializers: HandlerTable<TlvKind, dyn TlvSerializer>,
}

impl TlvRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { parsers: HandlerTable::new(), serializers: HandlerTable::new() }
    }

    /// Register a parser for a TLV type.
    pub fn register_parser(
        &self,
        tlv_type: u16,
        parser: Arc<dyn TlvParser>,
    ) -> Result<Registration<u16, dyn TlvParser>, CodecError> {
        self.parsers.register(tlv_type, parser, "TLV parser")
    }

    /// Register a serializer for a TLV kind.
    pub fn register_serializer(
        &self,
        kind: TlvKind,
        serializer: Arc<dyn TlvSerializer>,
    ) -> Result<Registration<TlvKind, dyn TlvSerializer>, CodecError> {
        self.serializers.register(kind, serializer, "TLV serializer")
    }

    /// Parser lookup by TLV type.
    pub fn parser(&self, tlv_type: u16) -> Option<Arc<dyn TlvParser>> {
        self.parsers.lookup(&tlv_type)
    }

    /// Serializer lookup by TLV kind.
    pub fn serializer(&self, kind: TlvKind) -> Option<Arc<dyn TlvSerializer>> {
        self.serializers.lookup(&kind)
    }
}

impl Default for TlvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =======================================================================
// Subobject / label registries
// =======================================================================

/// Registry for route-object subobjects (ERO, RRO, XRO) and labels, keyed by
/// the one-byte subobject/label type in both directions. One instance per
/// route-object family.
pub struct SubobjectRegistry {
    parsers: HandlerTable<u8, dyn SubobjectParser>,
    serializers: HandlerTable<u8, dyn SubobjectSerializer>,
}

impl SubobjectRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { parsers: HandlerTable::new(), serializers: HandlerTable::new() }
    }

    /// Register a parser for a subobject type.
    pub fn register_parser(
        &self,
        subobject_type: u8,
        parser: Arc<dyn SubobjectParser>,
    ) -> Result<Registration<u8, dyn SubobjectParser>, CodecError> {
        self.parsers.register(subobject_type, parser, "subobject parser")
    }

    /// Register a serializer for a subobject type.
    pub fn register_serializer(
        &self,
        subobject_type: u8,
        serializer: Arc<dyn SubobjectSerializer>,
    ) -> Result<Registration<u8, dyn SubobjectSerializer>, CodecError> {
        self.serializers.register(subobject_type, serializer, "subobject serializer")
    }

    /// Parser lookup by subobject type.
    pub fn parser(&self, subobject_type: u8) -> Option<Arc<dyn SubobjectParser>> {
        self.parsers.lookup(&subobject_type)
    }

    /// Serializer lookup by subobject type.
    pub fn serializer(&self, subobject_type: u8) -> Option<Arc<dyn SubobjectSerializer>> {
        self.serializers.lookup(&subobject_type)
    }
}

impl Default for SubobjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =======================================================================
// Message registry
// =======================================================================

/// Registry mapping wire message types to message parsers/serializers.
pub struct MessageRegistry {
    parsers: HandlerTable<u8, dyn MessageParser>,
    serializers: HandlerTable<u8, dyn MessageSerializer>,
}

impl MessageRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self { parsers: HandlerTable::new(), serializers: HandlerTable::new() }
    }

    /// Register a parser for a message type.
    pub fn register_parser(
        &self,
        msg_type: u8,
        parser: Arc<dyn MessageParser>,
    ) -> Result<Registration<u8, dyn MessageParser>, CodecError> {
        self.parsers.register(msg_type, parser, "message parser")
    }

    /// Register a serializer for a message type.
    pub fn register_serializer(
        &self,
        msg_type: u8,
        serializer: Arc<dyn MessageSerializer>,
    ) -> Result<Registration<u8, dyn MessageSerializer>, CodecError> {
        self.serializers.register(msg_type, serializer, "message serializer")
    }

    /// Parser lookup by message type.
    pub fn parser(&self, msg_type: u8) -> Option<Arc<dyn MessageParser>> {
        self.parsers.lookup(&msg_type)
    }

    /// Serializer lookup by message type.
    pub fn serializer(&self, msg_type: u8) -> Option<Arc<dyn MessageSerializer>> {
        self.serializers.lookup(&msg_type)
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseResult;
    use crate::object::Object;
    use crate::wire::ObjectHeader;

    struct NopParser;
    impl ObjectParser for NopParser {
        fn parse(&self, header: &ObjectHeader, _body: &[u8]) -> ParseResult<Object> {
            Ok(Object::Raw(crate::object::RawObject {
                object_class: header.object_class,
                object_type: header.object_type,
                processing: header.processing,
                ignore: header.ignore,
                body: vec![],
            }))
        }
    }

    #[test]
    fn test_register_lookup() {
        let registry = ObjectRegistry::new();
        let token = registry.register_parser(5, 1, Arc::new(NopParser)).unwrap();
        assert!(registry.parser(5, 1).is_some());
        assert!(registry.parser(5, 2).is_none());
        drop(token);
        assert!(registry.parser(5, 1).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = ObjectRegistry::new();
        let token = registry.register_parser(5, 1, Arc::new(NopParser)).unwrap();
        assert!(matches!(
            registry.register_parser(5, 1, Arc::new(NopParser)),
            Err(CodecError::DuplicateRegistration(_))
        ));
        // Slot is free again after deregistration
        drop(token);
        assert!(registry.register_parser(5, 1, Arc::new(NopParser)).is_ok());
    }

    #[test]
    fn test_object_type_range_check() {
        let registry = ObjectRegistry::new();
        assert!(matches!(
            registry.register_parser(5, 16, Arc::new(NopParser)),
            Err(CodecError::FieldOverflow(_))
        ));
    }

    #[test]
    fn test_persist_outlives_token() {
        let registry = ObjectRegistry::new();
        registry.register_parser(5, 1, Arc::new(NopParser)).unwrap().persist();
        assert!(registry.parser(5, 1).is_some());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Codec context: the bundle of registries one protocol stack dispatches
//! through.
//!
//! Built explicitly and passed by `Arc` into the codec, negotiator factory
//! and dispatcher - never a process-wide singleton, so tests (and embedders)
//! can run several independent stacks side by side.

use crate::codes::{
    CLASS_CLOSE, CLASS_ERROR, CLASS_OPEN, MSG_CLOSE, MSG_KEEPALIVE, MSG_OPEN, MSG_PCERR,
    MSG_STARTTLS, TLV_STATEFUL_CAPABILITY, TYPE_CLOSE, TYPE_ERROR, TYPE_OPEN,
};
use crate::message::session::{
    CloseMessageCodec, KeepaliveMessageCodec, OpenMessageCodec, PcerrMessageCodec,
    StartTlsMessageCodec,
};
use crate::object::close::CloseObjectCodec;
use crate::object::error_object::ErrorObjectCodec;
use crate::object::open::OpenObjectCodec;
use crate::object::stateful::StatefulCapabilityCodec;
use crate::object::{ObjectKind, TlvKind};
use crate::registry::{MessageRegistry, ObjectRegistry, SubobjectRegistry, TlvRegistry};
use std::sync::Arc;

/// The registries of one protocol stack.
pub struct CodecContext {
    objects: ObjectRegistry,
    tlvs: Arc<TlvRegistry>,
    ero_subobjects: SubobjectRegistry,
    rro_subobjects: SubobjectRegistry,
    xro_subobjects: SubobjectRegistry,
    labels: SubobjectRegistry,
    messages: MessageRegistry,
}

impl CodecContext {
    /// Empty context: no handlers at all. Use [`standard_context`] for a
    /// context that can speak the session layer.
    pub fn empty() -> Self {
        Self {
            objects: ObjectRegistry::new(),
            tlvs: Arc::new(TlvRegistry::new()),
            ero_subobjects: SubobjectRegistry::new(),
            rro_subobjects: SubobjectRegistry::new(),
            xro_subobjects: SubobjectRegistry::new(),
            labels: SubobjectRegistry::new(),
            messages: MessageRegistry::new(),
        }
    }

    /// Object registry.
    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// TLV registry.
    pub fn tlvs(&self) -> &Arc<TlvRegistry> {
        &self.tlvs
    }

    /// ERO subobject registry.
    pub fn ero_subobjects(&self) -> &SubobjectRegistry {
        &self.ero_subobjects
    }

    /// RRO subobject registry.
    pub fn rro_subobjects(&self) -> &SubobjectRegistry {
        &self.rro_subobjects
    }

    /// XRO subobject registry.
    pub fn xro_subobjects(&self) -> &SubobjectRegistry {
        &self.xro_subobjects
    }

    /// Label registry.
    pub fn labels(&self) -> &SubobjectRegistry {
        &self.labels
    }

    /// Message registry.
    pub fn messages(&self) -> &MessageRegistry {
        &self.messages
    }
}

/// TLV registry with the session-layer capability TLVs registered.
pub fn standard_tlv_registry() -> TlvRegistry {
    let registry = TlvRegistry::new();
    registry
        .register_parser(TLV_STATEFUL_CAPABILITY, Arc::new(StatefulCapabilityCodec))
        .expect("empty registry")
        .persist();
    registry
        .register_serializer(TlvKind::StatefulCapability, Arc::new(StatefulCapabilityCodec))
        .expect("empty registry")
        .persist();
    registry
}

/// Context with the session-layer handlers registered: OPEN/ERROR/CLOSE
/// objects, the stateful capability TLV, and the five session messages.
/// Extension catalogues register on top of this.
pub fn standard_context() -> CodecContext {
    let mut ctx = CodecContext::empty();
    ctx.tlvs = Arc::new(standard_tlv_registry());

    let open_codec = Arc::new(OpenObjectCodec::new(Arc::clone(&ctx.tlvs)));
    ctx.objects
        .register_parser(CLASS_OPEN, TYPE_OPEN, Arc::clone(&open_codec) as _)
        .expect("empty registry")
        .persist();
    ctx.objects
        .register_serializer(ObjectKind::Open, open_codec as _)
        .expect("empty registry")
        .persist();

    ctx.objects
        .register_parser(CLASS_ERROR, TYPE_ERROR, Arc::new(ErrorObjectCodec))
        .expect("empty registry")
        .persist();
    ctx.objects
        .register_serializer(ObjectKind::Error, Arc::new(ErrorObjectCodec))
        .expect("empty registry")
        .persist();

    ctx.objects
        .register_parser(CLASS_CLOSE, TYPE_CLOSE, Arc::new(CloseObjectCodec))
        .expect("empty registry")
        .persist();
    ctx.objects
        .register_serializer(ObjectKind::Close, Arc::new(CloseObjectCodec))
        .expect("empty registry")
        .persist();

    for (msg_type, parser, serializer) in [
        (
            MSG_OPEN,
            Arc::new(OpenMessageCodec) as Arc<dyn crate::message::MessageParser>,
            Arc::new(OpenMessageCodec) as Arc<dyn crate::message::MessageSerializer>,
        ),
        (MSG_KEEPALIVE, Arc::new(KeepaliveMessageCodec) as _, Arc::new(KeepaliveMessageCodec) as _),
        (MSG_PCERR, Arc::new(PcerrMessageCodec) as _, Arc::new(PcerrMessageCodec) as _),
        (MSG_CLOSE, Arc::new(CloseMessageCodec) as _, Arc::new(CloseMessageCodec) as _),
        (MSG_STARTTLS, Arc::new(StartTlsMessageCodec) as _, Arc::new(StartTlsMessageCodec) as _),
    ] {
        ctx.messages.register_parser(msg_type, parser).expect("empty registry").persist();
        ctx.messages.register_serializer(msg_type, serializer).expect("empty registry").persist();
    }

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_context_has_session_handlers() {
        let ctx = standard_context();
        assert!(ctx.objects().parser(CLASS_OPEN, TYPE_OPEN).is_some());
        assert!(ctx.objects().parser(CLASS_ERROR, TYPE_ERROR).is_some());
        assert!(ctx.objects().parser(CLASS_CLOSE, TYPE_CLOSE).is_some());
        assert!(ctx.tlvs().parser(TLV_STATEFUL_CAPABILITY).is_some());
        for msg_type in [MSG_OPEN, MSG_KEEPALIVE, MSG_PCERR, MSG_CLOSE, MSG_STARTTLS] {
            assert!(ctx.messages().parser(msg_type).is_some(), "type {}", msg_type);
            assert!(ctx.messages().serializer(msg_type).is_some(), "type {}", msg_type);
        }
    }

    #[test]
    fn test_empty_context_knows_nothing() {
        let ctx = CodecContext::empty();
        assert!(ctx.objects().parser(CLASS_OPEN, TYPE_OPEN).is_none());
        assert!(ctx.messages().parser(MSG_OPEN).is_none());
        assert!(ctx.ero_subobjects().parser(1).is_none());
        assert!(ctx.labels().serializer(2).is_none());
        assert!(ctx.rro_subobjects().parser(1).is_none());
        assert!(ctx.xro_subobjects().parser(1).is_none());
    }

    #[test]
    fn test_two_independent_stacks() {
        // Registration in one context must not leak into the other
        let a = standard_context();
        let b = CodecContext::empty();
        assert!(a.objects().parser(CLASS_OPEN, TYPE_OPEN).is_some());
        assert!(b.objects().parser(CLASS_OPEN, TYPE_OPEN).is_none());
    }
}

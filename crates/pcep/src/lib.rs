// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # pcep - Path Computation Element Protocol session layer
//!
//! A Rust implementation of the PCEP session layer (RFC 5440), with the
//! RFC 8253 StartTLS prologue: wire codec, extensible handler registries,
//! the negotiation state machine, the keepalive/dead-timer session
//! runtime, peer tracking, and a poll-based TCP driver.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pcep::config::DispatcherConfig;
//! use pcep::registry::standard_context;
//! use pcep::session::NullListener;
//! use pcep::transport::PcepDispatcher;
//! use std::sync::Arc;
//!
//! fn main() -> std::io::Result<()> {
//!     let ctx = Arc::new(standard_context());
//!     let mut dispatcher = PcepDispatcher::bind(
//!         "0.0.0.0:4189".parse().unwrap(),
//!         DispatcherConfig::default(),
//!         ctx,
//!         Box::new(|_peer| Box::new(NullListener)),
//!     )?;
//!     let handle = dispatcher.handle();
//!     std::thread::spawn(move || dispatcher.run());
//!     // ... drive sessions through `handle`
//!     handle.shutdown()
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                      Application Layer                       |
//! |        SessionListener callbacks | DispatcherHandle          |
//! +--------------------------------------------------------------+
//! |                       Session Layer                          |
//! |  SessionNegotiator (RFC 5440 handshake) | Session (timers,   |
//! |  unknown-message throttle) | PeerRegistry (IDs, duplicates)  |
//! +--------------------------------------------------------------+
//! |                        Codec Layer                           |
//! |  MessageCodec | CodecContext registries | object/TLV codecs  |
//! +--------------------------------------------------------------+
//! |                      Transport Layer                         |
//! |       MessageFramer | Connection | PcepDispatcher (mio)      |
//! +--------------------------------------------------------------+
//! ```
//!
//! The session layer is sans-io: the negotiator and the session runtime
//! consume decoded messages plus monotonic clock readings and return
//! ordered step lists, so the whole RFC 5440 handshake table is unit
//! testable without sockets or sleeps. Extension message catalogues
//! (PCReq/PCRep, stateful) plug in through the [`registry`] tokens
//! without touching this crate.

pub mod codes;
pub mod config;
pub mod error;
pub mod message;
pub mod object;
pub mod peers;
pub mod registry;
pub mod session;
pub mod transport;
pub mod wire;

pub use codes::{ErrorCode, TerminationReason};
pub use config::{DispatcherConfig, PeerRegistryConfig, SessionConfig};
pub use error::{CodecError, NegotiationError, ParseError, ParseResult};
pub use message::{Message, MessageCodec};
pub use object::{CloseObject, ErrorObject, Object, OpenObject, StatefulCapability, Tlv};
pub use peers::PeerRegistry;
pub use registry::{standard_context, CodecContext};
pub use session::{
    Session, SessionInfo, SessionListener, SessionNegotiator, SessionStats,
};
pub use transport::{DispatcherHandle, PcepDispatcher};

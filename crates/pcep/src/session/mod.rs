// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # Session layer
//!
//! The RFC 5440 handshake and the post-handshake session runtime, both
//! written as plain state machines: they consume decoded messages and
//! monotonic clock readings, and emit ordered lists of steps for the
//! transport driver to execute. No I/O, no timers, no locks live here,
//! which is what makes the handshake table testable without sockets.
//!
//! ```text
//!            +----------------------+   Established   +-----------------+
//!  frames -> |  SessionNegotiator   | --------------> |     Session     | -> listener
//!            |  (handshake machine) |                 | (keepalive/dead |
//!            +----------------------+                 |  timer runtime) |
//!                 |         ^                         +-----------------+
//!                 v         |                              |        ^
//!               steps    handle_timeout                 events   poll_timers
//! ```

pub mod listener;
pub mod negotiator;
pub mod proposal;
pub mod runtime;

pub use listener::{NullListener, SessionInfo, SessionListener};
pub use negotiator::{NegotiationState, NegotiationStep, SessionNegotiator};
pub use proposal::{DefaultProposalPolicy, ProposalPolicy};
pub use runtime::{Session, SessionEvent, SessionStats};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! # TCP transport
//!
//! Everything that touches a socket: incremental framing of the byte
//! stream, per-connection phase dispatch, and the poll-based driver that
//! owns all of it on one thread. The codec and the session state machines
//! are purely synchronous; this module is the only place where I/O
//! readiness, timers and threads exist.

pub mod connection;
pub mod dispatcher;
pub mod framer;

pub use connection::Connection;
pub use dispatcher::{DispatcherHandle, ListenerFactory, PcepDispatcher};
pub use framer::MessageFramer;

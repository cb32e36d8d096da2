// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Listener surface the transport driver calls into.
//!
//! All callbacks for one session run on that session's connection context,
//! in arrival order, so implementations need no internal locking for
//! per-session state.

use crate::codes::TerminationReason;
use crate::message::Message;
use crate::object::OpenObject;
use std::net::SocketAddr;

/// Identity and agreed parameters of an established session.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    /// The peer's address.
    pub peer: SocketAddr,
    /// Parameters proposed by us and acked by the peer.
    pub local_open: OpenObject,
    /// Parameters proposed by the peer and accepted by us.
    pub remote_open: OpenObject,
}

impl SessionInfo {
    /// Session ID we assigned during the handshake.
    pub fn session_id(&self) -> u8 {
        self.local_open.session_id
    }
}

/// Receives session lifecycle and message events. Keepalives and the
/// handshake itself are internal and never surface here.
///
/// Replies pushed into the `replies` buffer of [`on_message`] are sent on
/// the session's channel after the callback returns.
///
/// [`on_message`]: SessionListener::on_message
pub trait SessionListener: Send {
    /// The handshake completed and the session is live.
    fn on_session_up(&mut self, info: &SessionInfo) {
        let _ = info;
    }

    /// A post-handshake message arrived.
    fn on_message(&mut self, msg: Message, replies: &mut Vec<Message>) {
        let _ = (msg, replies);
    }

    /// The session ended, locally or by the peer, with a protocol reason.
    fn on_session_terminated(&mut self, reason: TerminationReason) {
        let _ = reason;
    }

    /// The channel died without a Close exchange.
    fn on_session_down(&mut self) {}
}

/// Listener that drops everything. Useful for tools that only exercise the
/// handshake.
pub struct NullListener;

impl SessionListener for NullListener {}

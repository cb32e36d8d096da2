// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Configuration for sessions, the peer registry and the dispatcher.
//!
//! Everything has a sensible RFC 5440 default; builders follow the
//! `with_*` consuming style so a config reads as one expression:
//!
//! ```
//! use pcep::config::SessionConfig;
//!
//! let config = SessionConfig::default()
//!     .with_keepalive(10)
//!     .with_dead_timer(40);
//! assert_eq!(config.keepalive, 10);
//! ```

use crate::object::Tlv;
use std::time::Duration;

/// Unified OpenWait/KeepWait timeout, seconds.
pub const DEFAULT_FAIL_TIMER_SECS: u64 = 60;

/// Default keepalive proposal, seconds.
pub const DEFAULT_KEEPALIVE: u8 = 30;

/// Default dead-timer proposal, four times the keepalive.
pub const DEFAULT_DEAD_TIMER: u8 = 120;

/// Default cap on unrecognized messages inside the sliding window.
pub const DEFAULT_MAX_UNKNOWN_MESSAGES: usize = 5;

/// Default bound on tracked peers.
pub const DEFAULT_MAX_PEERS: usize = 1024;

/// Default access-based expiry for a tracked peer.
pub const DEFAULT_PEER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default quarantine for a released session ID.
pub const DEFAULT_ID_REUSE_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Per-session parameters: what we propose, what we tolerate, and the
/// handshake/runtime timeouts.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Keepalive interval we propose, seconds. 0 disables our keepalive
    /// timer.
    pub keepalive: u8,
    /// Dead timer we propose, seconds. 0 disables the peer-side dead timer.
    pub dead_timer: u8,
    /// Smallest peer keepalive we accept. 0 accepts anything, including a
    /// disabled timer.
    pub min_keepalive: u8,
    /// Smallest peer dead timer we accept. 0 accepts anything.
    pub min_dead_timer: u8,
    /// Unrecognized messages tolerated inside the trailing one-minute
    /// window before the session is torn down.
    pub max_unknown_messages: usize,
    /// Unified OpenWait/KeepWait timeout.
    pub fail_timer: Duration,
    /// Whether to run the RFC 8253 StartTLS exchange before the Open
    /// exchange.
    pub tls: bool,
    /// Capability TLVs carried in our OPEN object.
    pub capabilities: Vec<Tlv>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive: DEFAULT_KEEPALIVE,
            dead_timer: DEFAULT_DEAD_TIMER,
            min_keepalive: 0,
            min_dead_timer: 0,
            max_unknown_messages: DEFAULT_MAX_UNKNOWN_MESSAGES,
            fail_timer: Duration::from_secs(DEFAULT_FAIL_TIMER_SECS),
            tls: false,
            capabilities: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Set the proposed keepalive interval.
    pub fn with_keepalive(mut self, keepalive: u8) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Set the proposed dead timer.
    pub fn with_dead_timer(mut self, dead_timer: u8) -> Self {
        self.dead_timer = dead_timer;
        self
    }

    /// Set the smallest peer keepalive we accept.
    pub fn with_min_keepalive(mut self, min_keepalive: u8) -> Self {
        self.min_keepalive = min_keepalive;
        self
    }

    /// Set the smallest peer dead timer we accept.
    pub fn with_min_dead_timer(mut self, min_dead_timer: u8) -> Self {
        self.min_dead_timer = min_dead_timer;
        self
    }

    /// Set the unknown-message tolerance.
    pub fn with_max_unknown_messages(mut self, max: usize) -> Self {
        self.max_unknown_messages = max;
        self
    }

    /// Set the handshake fail timer.
    pub fn with_fail_timer(mut self, fail_timer: Duration) -> Self {
        self.fail_timer = fail_timer;
        self
    }

    /// Enable the StartTLS exchange.
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Add a capability TLV to our OPEN proposal.
    pub fn with_capability(mut self, tlv: Tlv) -> Self {
        self.capabilities.push(tlv);
        self
    }
}

/// Bounds and expiry policy for the peer registry.
#[derive(Clone, Copy, Debug)]
pub struct PeerRegistryConfig {
    /// Most peers tracked at once; least recently seen peers are evicted
    /// beyond this.
    pub max_peers: usize,
    /// A peer not seen for this long is forgotten even if capacity allows.
    pub peer_ttl: Duration,
    /// How long a released session ID stays ineligible for reassignment.
    pub id_reuse_ttl: Duration,
}

impl Default for PeerRegistryConfig {
    fn default() -> Self {
        Self {
            max_peers: DEFAULT_MAX_PEERS,
            peer_ttl: DEFAULT_PEER_TTL,
            id_reuse_ttl: DEFAULT_ID_REUSE_TTL,
        }
    }
}

impl PeerRegistryConfig {
    /// Set the tracked-peer bound.
    pub fn with_max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = max_peers;
        self
    }

    /// Set the peer access expiry.
    pub fn with_peer_ttl(mut self, peer_ttl: Duration) -> Self {
        self.peer_ttl = peer_ttl;
        self
    }

    /// Set the session-ID quarantine.
    pub fn with_id_reuse_ttl(mut self, id_reuse_ttl: Duration) -> Self {
        self.id_reuse_ttl = id_reuse_ttl;
        self
    }
}

/// Dispatcher-level settings: session defaults for every accepted
/// connection plus the peer registry policy.
#[derive(Clone, Debug, Default)]
pub struct DispatcherConfig {
    /// Session parameters applied to every connection.
    pub session: SessionConfig,
    /// Peer registry bounds.
    pub peers: PeerRegistryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_rfc_ratio() {
        let config = SessionConfig::default();
        assert_eq!(config.keepalive, 30);
        assert_eq!(config.dead_timer, 120);
        assert_eq!(config.dead_timer, config.keepalive * 4);
        assert_eq!(config.fail_timer, Duration::from_secs(60));
        assert!(!config.tls);
    }

    #[test]
    fn test_builder_chain() {
        let config = SessionConfig::default()
            .with_keepalive(10)
            .with_dead_timer(40)
            .with_min_dead_timer(20)
            .with_max_unknown_messages(2)
            .with_tls(true);
        assert_eq!(config.keepalive, 10);
        assert_eq!(config.dead_timer, 40);
        assert_eq!(config.min_dead_timer, 20);
        assert_eq!(config.max_unknown_messages, 2);
        assert!(config.tls);
    }

    #[test]
    fn test_peer_registry_defaults() {
        let config = PeerRegistryConfig::default();
        assert_eq!(config.max_peers, 1024);
        assert_eq!(config.peer_ttl, Duration::from_secs(86_400));
        assert_eq!(config.id_reuse_ttl, Duration::from_secs(10_800));
    }
}

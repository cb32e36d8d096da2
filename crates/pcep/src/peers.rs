// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Peer registry: session-ID allocation and duplicate-connection
//! arbitration, shared across all connections.
//!
//! Session IDs are one byte and scoped per peer. Allocation prefers the ID
//! after the last one handed out, skips IDs released recently enough to
//! still be quarantined (so a flapping peer does not see its old ID reused
//! while stale state may linger), and wraps modulo 256. The registry
//! itself is bounded: peers expire on access age and the least recently
//! seen peer is evicted at capacity, so transient or hostile peers cannot
//! grow it without limit.
//!
//! One mutex covers the whole registry. Churn is connect/disconnect rate,
//! which is low compared to message rate, and no lookup happens on the
//! per-message path.

use crate::config::PeerRegistryConfig;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::time::Instant;

/// What to do with a second connection from a peer that already has one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateDecision {
    /// Close the existing session; the new connection proceeds.
    CloseExisting,
    /// Reject the new connection; the existing session stays.
    RejectNew,
}

/// Resolve a duplicate connection from the raw address bytes alone: the
/// side with the lexicographically greater address keeps the new
/// connection. Both ends of a peer pair compute the same answer in either
/// direction, so no coordination is needed. IPv4 addresses compare in
/// their IPv6-mapped form so mixed-family pairs stay consistent.
pub fn resolve_duplicate(local: IpAddr, remote: IpAddr) -> DuplicateDecision {
    if raw_octets(local) > raw_octets(remote) {
        DuplicateDecision::CloseExisting
    } else {
        DuplicateDecision::RejectNew
    }
}

fn raw_octets(addr: IpAddr) -> [u8; 16] {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    }
}

struct PeerRecord {
    /// Last ID handed out, the allocation cursor.
    last_id: Option<u8>,
    /// Released IDs still quarantined, with release time.
    quarantined: HashMap<u8, Instant>,
    /// Connection token of the active session, if one exists.
    active: Option<u64>,
    /// Last time this peer was touched, for access-based expiry.
    last_access: Instant,
}

impl PeerRecord {
    fn fresh(now: Instant) -> Self {
        Self { last_id: None, quarantined: HashMap::new(), active: None, last_access: now }
    }
}

/// Process-wide registry of known peers.
pub struct PeerRegistry {
    config: PeerRegistryConfig,
    peers: Mutex<LruCache<IpAddr, PeerRecord>>,
}

impl PeerRegistry {
    /// Registry with the given bounds.
    pub fn new(config: PeerRegistryConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_peers.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self { config, peers: Mutex::new(LruCache::new(capacity)) }
    }

    /// Allocate the next session ID for `peer`.
    pub fn next_session_id(&self, peer: IpAddr, now: Instant) -> u8 {
        let mut peers = self.peers.lock();
        let record = Self::record(&mut peers, peer, now, &self.config);
        record.quarantined.retain(|_, released| {
            now.duration_since(*released) < self.config.id_reuse_ttl
        });

        let start = record.last_id.map_or(0, |id| id.wrapping_add(1));
        for offset in 0..=u8::MAX {
            let id = start.wrapping_add(offset);
            if !record.quarantined.contains_key(&id) {
                record.last_id = Some(id);
                return id;
            }
        }
        // Every ID is quarantined; reclaim the one released longest ago
        let id = record
            .quarantined
            .iter()
            .min_by_key(|(_, released)| **released)
            .map(|(id, _)| *id)
            .unwrap_or(start);
        record.quarantined.remove(&id);
        record.last_id = Some(id);
        log::warn!("session ID space for {} exhausted, reclaiming {}", peer, id);
        id
    }

    /// Quarantine `id` on session teardown so it is not reassigned right
    /// away.
    pub fn release_session_id(&self, peer: IpAddr, id: u8, now: Instant) {
        let mut peers = self.peers.lock();
        let record = Self::record(&mut peers, peer, now, &self.config);
        record.quarantined.insert(id, now);
    }

    /// The connection token of the peer's active session, if any.
    pub fn active_connection(&self, peer: IpAddr) -> Option<u64> {
        let mut peers = self.peers.lock();
        peers.get(&peer).and_then(|record| record.active)
    }

    /// Mark `token` as the peer's active connection.
    pub fn claim_active(&self, peer: IpAddr, token: u64, now: Instant) {
        let mut peers = self.peers.lock();
        let record = Self::record(&mut peers, peer, now, &self.config);
        record.active = Some(token);
    }

    /// Clear the active marker, but only if `token` still owns it.
    pub fn release_active(&self, peer: IpAddr, token: u64) {
        let mut peers = self.peers.lock();
        if let Some(record) = peers.get_mut(&peer) {
            if record.active == Some(token) {
                record.active = None;
            }
        }
    }

    /// Tracked peers, for diagnostics.
    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    /// Whether no peer is tracked.
    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }

    fn record<'a>(
        peers: &'a mut LruCache<IpAddr, PeerRecord>,
        peer: IpAddr,
        now: Instant,
        config: &PeerRegistryConfig,
    ) -> &'a mut PeerRecord {
        let record = peers.get_or_insert_mut(peer, || PeerRecord::fresh(now));
        if now.duration_since(record.last_access) > config.peer_ttl {
            // Stale peer: forget its history entirely
            *record = PeerRecord::fresh(now);
        }
        record.last_access = now;
        record
    }
}

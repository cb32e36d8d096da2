// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Session-parameter policy: what we propose, what we tolerate, and how we
//! react to a peer's counter-proposal.
//!
//! The negotiator is policy-free; everything opinionated about keepalive
//! and dead-timer values lives behind [`ProposalPolicy`].

use crate::config::SessionConfig;
use crate::object::OpenObject;

/// Session-parameter policy consulted by the negotiator.
///
/// Contract: a proposal returned by [`counter_proposal`] or
/// [`revised_proposal`] must itself satisfy [`is_acceptable`], otherwise
/// the handshake can loop through proposals the policy keeps rejecting.
///
/// [`counter_proposal`]: ProposalPolicy::counter_proposal
/// [`revised_proposal`]: ProposalPolicy::revised_proposal
/// [`is_acceptable`]: ProposalPolicy::is_acceptable
pub trait ProposalPolicy: Send {
    /// Our opening proposal.
    fn initial_proposal(&self) -> OpenObject;

    /// Whether a peer-proposed OPEN is acceptable as-is.
    fn is_acceptable(&self, proposal: &OpenObject) -> bool;

    /// A suggestion for a peer whose proposal we rejected, or `None` when
    /// nothing we could suggest would help.
    fn counter_proposal(&self, proposal: &OpenObject) -> Option<OpenObject>;

    /// Our next proposal after the peer rejected ours and suggested
    /// `suggestion`, or `None` when the suggestion is unacceptable to us.
    fn revised_proposal(&self, suggestion: &OpenObject) -> Option<OpenObject>;
}

/// Policy driven by a [`SessionConfig`]: proposes the configured timers,
/// accepts anything at or above the configured minima, and counter-proposes
/// its own values. The conventional keepalive:deadtimer ratio of 1:4 is
/// only logged when violated, never rejected.
pub struct DefaultProposalPolicy {
    config: SessionConfig,
    session_id: u8,
}

impl DefaultProposalPolicy {
    /// Policy over the given config, stamping `session_id` into every
    /// proposal.
    pub fn new(config: SessionConfig, session_id: u8) -> Self {
        Self { config, session_id }
    }

    fn note_ratio(open: &OpenObject) {
        if open.keepalive != 0 && u32::from(open.dead_timer) != u32::from(open.keepalive) * 4 {
            log::debug!(
                "keepalive {} / dead timer {} deviates from the conventional 1:4 ratio",
                open.keepalive,
                open.dead_timer
            );
        }
    }
}

impl ProposalPolicy for DefaultProposalPolicy {
    fn initial_proposal(&self) -> OpenObject {
        let open = OpenObject::new(self.config.keepalive, self.config.dead_timer, self.session_id)
            .with_tlvs(self.config.capabilities.clone());
        Self::note_ratio(&open);
        open
    }

    fn is_acceptable(&self, proposal: &OpenObject) -> bool {
        Self::note_ratio(proposal);
        let keepalive_ok =
            self.config.min_keepalive == 0 || proposal.keepalive >= self.config.min_keepalive;
        let dead_timer_ok =
            self.config.min_dead_timer == 0 || proposal.dead_timer >= self.config.min_dead_timer;
        keepalive_ok && dead_timer_ok
    }

    fn counter_proposal(&self, proposal: &OpenObject) -> Option<OpenObject> {
        // Suggest our own timers under the peer's session ID
        let counter = OpenObject::new(
            self.config.keepalive,
            self.config.dead_timer,
            proposal.session_id,
        );
        self.is_acceptable(&counter).then_some(counter)
    }

    fn revised_proposal(&self, suggestion: &OpenObject) -> Option<OpenObject> {
        if !self.is_acceptable(suggestion) {
            return None;
        }
        Some(
            OpenObject::new(suggestion.keepalive, suggestion.dead_timer, self.session_id)
                .with_tlvs(self.config.capabilities.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min_keepalive: u8, min_dead_timer: u8) -> DefaultProposalPolicy {
        let config = SessionConfig::default()
            .with_min_keepalive(min_keepalive)
            .with_min_dead_timer(min_dead_timer);
        DefaultProposalPolicy::new(config, 7)
    }

    #[test]
    fn test_initial_proposal_carries_session_id() {
        let open = policy(0, 0).initial_proposal();
        assert_eq!(open.keepalive, 30);
        assert_eq!(open.dead_timer, 120);
        assert_eq!(open.session_id, 7);
    }

    #[test]
    fn test_default_accepts_everything() {
        let policy = policy(0, 0);
        assert!(policy.is_acceptable(&OpenObject::new(1, 5, 0)));
        assert!(policy.is_acceptable(&OpenObject::new(0, 0, 0)));
    }

    #[test]
    fn test_minima_reject_low_values() {
        let policy = policy(10, 40);
        assert!(!policy.is_acceptable(&OpenObject::new(30, 5, 0)));
        assert!(!policy.is_acceptable(&OpenObject::new(5, 120, 0)));
        assert!(policy.is_acceptable(&OpenObject::new(10, 40, 0)));
    }

    #[test]
    fn test_counter_proposal_is_acceptable_to_self() {
        let policy = policy(10, 40);
        let counter = policy.counter_proposal(&OpenObject::new(30, 5, 3)).unwrap();
        assert!(policy.is_acceptable(&counter));
        // Counter keeps the peer's session ID
        assert_eq!(counter.session_id, 3);
    }

    #[test]
    fn test_revised_proposal_adopts_suggestion() {
        let policy = policy(0, 0);
        let revised = policy.revised_proposal(&OpenObject::new(15, 60, 99)).unwrap();
        assert_eq!(revised.keepalive, 15);
        assert_eq!(revised.dead_timer, 60);
        // Revision keeps our session ID, not the suggestion's
        assert_eq!(revised.session_id, 7);
    }

    #[test]
    fn test_revised_proposal_rejects_bad_suggestion() {
        let policy = policy(10, 40);
        assert!(policy.revised_proposal(&OpenObject::new(1, 4, 0)).is_none());
    }
}

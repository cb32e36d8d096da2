// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! RFC 5440 session negotiation state machine, with the RFC 8253 StartTLS
//! prologue.
//!
//! # State diagram
//!
//! ```text
//!                  start (tls)                start (no tls)
//!       IDLE ----------------------+----------------------------+
//!                                  v                            v
//!                          START_TLS_WAIT --- StartTLS ---> OPEN_WAIT <---+
//!                                                               |         |
//!                             acceptable Open / send Keepalive  |         | Keepalive
//!                                  +----------------------------+         | (remote not
//!                                  v                                      |  yet acked)
//!                              KEEP_WAIT -------------------------------- +
//!                                  |
//!                   Keepalive, remote already acked
//!                                  v
//!                              FINISHED
//! ```
//!
//! The protocol's OpenWait and KeepWait timers are mutually exclusive,
//! share the 60 second timeout and share the action (kill the handshake),
//! so they are one unified fail timer here: a single deadline rearmed on
//! every transition and cleared on entry to FINISHED. `open_retry` is a
//! one-shot flag; a peer gets exactly one counter-proposal. The handshake
//! succeeds only once both acknowledgement flags are up, whichever order
//! the peer's Open and Keepalive arrive in.
//!
//! The machine performs no I/O: callers feed it decoded messages and clock
//! readings, and execute the [`NegotiationStep`]s it returns in order.

use crate::codes::ErrorCode;
use crate::error::NegotiationError;
use crate::message::Message;
use crate::object::OpenObject;
use crate::session::proposal::ProposalPolicy;
use std::time::{Duration, Instant};

/// Handshake states. Initial is `Idle`, terminal is `Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegotiationState {
    /// Not started yet.
    Idle,
    /// StartTLS sent, waiting for the peer's StartTLS.
    StartTlsWait,
    /// Waiting for the peer's OPEN message.
    OpenWait,
    /// Waiting for the peer's Keepalive acking our OPEN.
    KeepWait,
    /// Handshake over, successfully or not.
    Finished,
}

/// One step for the driver to execute, in order.
#[derive(Debug)]
pub enum NegotiationStep {
    /// Transmit a message.
    Send(Message),
    /// Wrap the channel in TLS before any further byte is exchanged.
    InstallTls,
    /// Handshake succeeded: build the session from the agreed parameters.
    Established {
        /// Parameters proposed by us and acked by the peer.
        local_open: OpenObject,
        /// Parameters proposed by the peer and accepted by us.
        remote_open: OpenObject,
    },
    /// Handshake failed; the driver closes the channel.
    Failed(NegotiationError),
}

/// The handshake machine. One per connection, driven by the connection's
/// execution context; policy decisions are delegated to `P`.
pub struct SessionNegotiator<P> {
    policy: P,
    use_tls: bool,
    fail_timer: Duration,
    state: NegotiationState,
    local_ok: bool,
    remote_ok: bool,
    open_retry: bool,
    local_open: Option<OpenObject>,
    remote_open: Option<OpenObject>,
    deadline: Option<Instant>,
}

impl<P: ProposalPolicy> SessionNegotiator<P> {
    /// Machine in the `Idle` state; nothing happens until [`start`].
    ///
    /// [`start`]: SessionNegotiator::start
    pub fn new(policy: P, use_tls: bool, fail_timer: Duration) -> Self {
        Self {
            policy,
            use_tls,
            fail_timer,
            state: NegotiationState::Idle,
            local_ok: false,
            remote_ok: false,
            open_retry: false,
            local_open: None,
            remote_open: None,
            deadline: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Whether the machine reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.state == NegotiationState::Finished
    }

    /// When the fail timer fires, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Kick off the handshake.
    pub fn start(&mut self, now: Instant) -> Vec<NegotiationStep> {
        let mut steps = Vec::new();
        if self.state != NegotiationState::Idle {
            log::warn!("negotiation started twice, ignoring");
            return steps;
        }
        if self.use_tls {
            log::info!("starting TLS negotiation prologue");
            steps.push(NegotiationStep::Send(Message::StartTls));
            self.state = NegotiationState::StartTlsWait;
            self.arm(now);
        } else {
            self.send_open(&mut steps, now);
        }
        steps
    }

    /// Feed one decoded inbound message.
    pub fn handle_message(&mut self, msg: &Message, now: Instant) -> Vec<NegotiationStep> {
        let mut steps = Vec::new();
        self.deadline = None;
        log::debug!("handling {} in state {:?}", msg.name(), self.state);

        let handled = match self.state {
            NegotiationState::Idle | NegotiationState::Finished => {
                log::warn!("message {} after negotiation ended, dropping", msg.name());
                return steps;
            }
            NegotiationState::StartTlsWait => self.on_start_tls_wait(msg, &mut steps, now),
            NegotiationState::OpenWait => self.on_open_wait(msg, &mut steps, now),
            NegotiationState::KeepWait => self.on_keep_wait(msg, &mut steps, now),
        };
        if !handled {
            log::warn!("unexpected {} in state {:?}", msg.name(), self.state);
            self.fail(
                &mut steps,
                Some(ErrorCode::NonOrInvalidOpenMsg),
                NegotiationError::ProtocolError(ErrorCode::NonOrInvalidOpenMsg),
            );
        }
        steps
    }

    /// Fire the fail timer if its deadline has passed. A no-op otherwise,
    /// so spurious wakeups are harmless.
    pub fn handle_timeout(&mut self, now: Instant) -> Vec<NegotiationStep> {
        let mut steps = Vec::new();
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return steps,
        }
        let code = match self.state {
            NegotiationState::StartTlsWait => ErrorCode::StartTlsTimerExp,
            NegotiationState::OpenWait => ErrorCode::NoOpenBeforeExpOpenWait,
            NegotiationState::KeepWait => ErrorCode::NoMsgBeforeExpKeepWait,
            NegotiationState::Idle | NegotiationState::Finished => return steps,
        };
        log::warn!("fail timer expired in state {:?}", self.state);
        self.fail(&mut steps, Some(code), NegotiationError::Timeout(code));
        steps
    }

    /// The channel died mid-handshake.
    pub fn handle_channel_closed(&mut self) -> Vec<NegotiationStep> {
        let mut steps = Vec::new();
        if self.state != NegotiationState::Finished {
            self.state = NegotiationState::Finished;
            self.deadline = None;
            steps.push(NegotiationStep::Failed(NegotiationError::ChannelClosed));
        }
        steps
    }

    // ====================================================================
    // Per-state handlers; returning false defers to the generic
    // unexpected-message rule
    // ====================================================================

    fn on_start_tls_wait(
        &mut self,
        msg: &Message,
        steps: &mut Vec<NegotiationStep>,
        now: Instant,
    ) -> bool {
        match msg {
            Message::StartTls => {
                log::info!("peer agreed to TLS, securing the channel");
                steps.push(NegotiationStep::InstallTls);
                self.send_open(steps, now);
                true
            }
            // A PCErr here falls through to the generic rule
            Message::Pcerr(_) => false,
            _ => {
                self.fail(
                    steps,
                    Some(ErrorCode::NonStartTlsMsgRcvd),
                    NegotiationError::ProtocolError(ErrorCode::NonStartTlsMsgRcvd),
                );
                true
            }
        }
    }

    fn on_open_wait(
        &mut self,
        msg: &Message,
        steps: &mut Vec<NegotiationStep>,
        now: Instant,
    ) -> bool {
        let open = match msg {
            Message::Open(open) => open,
            _ => return false,
        };
        if self.policy.is_acceptable(open) {
            steps.push(NegotiationStep::Send(Message::Keepalive));
            self.remote_open = Some(open.clone());
            self.remote_ok = true;
            if self.local_ok {
                self.establish(steps);
            } else {
                self.arm(now);
                self.state = NegotiationState::KeepWait;
                log::debug!("moved to KeepWait with remote side acked");
            }
            return true;
        }
        if self.open_retry {
            self.fail(
                steps,
                Some(ErrorCode::SecondOpenMsg),
                NegotiationError::ProtocolError(ErrorCode::SecondOpenMsg),
            );
            return true;
        }
        match self.policy.counter_proposal(open) {
            None => {
                self.fail(
                    steps,
                    Some(ErrorCode::NonAccNonNegSessionChar),
                    NegotiationError::ProtocolError(ErrorCode::NonAccNonNegSessionChar),
                );
            }
            Some(counter) => {
                log::info!(
                    "peer proposal keepalive={} dead_timer={} rejected, counter-proposing",
                    open.keepalive,
                    open.dead_timer
                );
                steps.push(NegotiationStep::Send(Message::error_with_open(
                    ErrorCode::NonAccNegSessionChar,
                    counter,
                )));
                self.open_retry = true;
                self.state = if self.local_ok {
                    NegotiationState::OpenWait
                } else {
                    NegotiationState::KeepWait
                };
                self.arm(now);
            }
        }
        true
    }

    fn on_keep_wait(
        &mut self,
        msg: &Message,
        steps: &mut Vec<NegotiationStep>,
        now: Instant,
    ) -> bool {
        match msg {
            Message::Keepalive => {
                self.local_ok = true;
                if self.remote_ok {
                    self.establish(steps);
                } else {
                    self.arm(now);
                    self.state = NegotiationState::OpenWait;
                    log::debug!("moved to OpenWait with local side acked");
                }
                true
            }
            Message::Pcerr(err) => {
                let Some(suggestion) = &err.open else {
                    let (error_type, error_value) = err
                        .errors
                        .first()
                        .map(|e| (e.error_type, e.error_value))
                        .unwrap_or((0, 0));
                    log::warn!(
                        "peer rejected negotiation with error type {} value {}",
                        error_type,
                        error_value
                    );
                    self.fail(
                        steps,
                        None,
                        NegotiationError::PeerError { error_type, error_value },
                    );
                    return true;
                };
                match self.policy.revised_proposal(suggestion) {
                    None => {
                        self.fail(
                            steps,
                            Some(ErrorCode::PcerrNonAccSessionChar),
                            NegotiationError::ProtocolError(ErrorCode::PcerrNonAccSessionChar),
                        );
                    }
                    Some(revised) => {
                        log::info!(
                            "resending revised proposal keepalive={} dead_timer={}",
                            revised.keepalive,
                            revised.dead_timer
                        );
                        steps.push(NegotiationStep::Send(Message::Open(revised.clone())));
                        self.local_open = Some(revised);
                        if !self.remote_ok {
                            self.state = NegotiationState::OpenWait;
                        }
                        self.arm(now);
                    }
                }
                true
            }
            _ => false,
        }
    }

    // ====================================================================
    // Shared transitions
    // ====================================================================

    fn send_open(&mut self, steps: &mut Vec<NegotiationStep>, now: Instant) {
        let proposal = self.policy.initial_proposal();
        log::info!(
            "proposing keepalive={} dead_timer={} session_id={}",
            proposal.keepalive,
            proposal.dead_timer,
            proposal.session_id
        );
        steps.push(NegotiationStep::Send(Message::Open(proposal.clone())));
        self.local_open = Some(proposal);
        self.state = NegotiationState::OpenWait;
        self.arm(now);
    }

    fn establish(&mut self, steps: &mut Vec<NegotiationStep>) {
        // The ack flags are only set together with the corresponding prefs
        let (Some(local_open), Some(remote_open)) =
            (self.local_open.take(), self.remote_open.take())
        else {
            self.fail(
                steps,
                None,
                NegotiationError::ProtocolError(ErrorCode::NonOrInvalidOpenMsg),
            );
            return;
        };
        log::info!(
            "negotiation complete: local keepalive={} remote dead_timer={}",
            local_open.keepalive,
            remote_open.dead_timer
        );
        steps.push(NegotiationStep::Established { local_open, remote_open });
        self.state = NegotiationState::Finished;
        self.deadline = None;
    }

    fn fail(
        &mut self,
        steps: &mut Vec<NegotiationStep>,
        code: Option<ErrorCode>,
        cause: NegotiationError,
    ) {
        if let Some(code) = code {
            steps.push(NegotiationStep::Send(Message::error(code)));
        }
        steps.push(NegotiationStep::Failed(cause));
        self.state = NegotiationState::Finished;
        self.deadline = None;
    }

    fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.fail_timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::TerminationReason;
    use crate::config::SessionConfig;
    use crate::session::proposal::DefaultProposalPolicy;
    use std::time::Duration;

    fn negotiator(config: SessionConfig) -> SessionNegotiator<DefaultProposalPolicy> {
        let tls = config.tls;
        let fail_timer = config.fail_timer;
        SessionNegotiator::new(DefaultProposalPolicy::new(config, 0), tls, fail_timer)
    }

    fn sent(steps: &[NegotiationStep]) -> Vec<&Message> {
        steps
            .iter()
            .filter_map(|s| match s {
                NegotiationStep::Send(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn failure(steps: &[NegotiationStep]) -> Option<&NegotiationError> {
        steps.iter().find_map(|s| match s {
            NegotiationStep::Failed(err) => Some(err),
            _ => None,
        })
    }

    fn error_code_sent(steps: &[NegotiationStep]) -> Option<ErrorCode> {
        sent(steps).iter().find_map(|msg| match msg {
            Message::Pcerr(err) => err.code(),
            _ => None,
        })
    }

    #[test]
    fn test_immediate_accept_open_then_keepalive() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();

        let steps = n.start(now);
        assert!(matches!(sent(&steps)[..], [Message::Open(_)]));
        assert_eq!(n.state(), NegotiationState::OpenWait);

        let steps = n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);
        assert!(matches!(sent(&steps)[..], [Message::Keepalive]));
        assert_eq!(n.state(), NegotiationState::KeepWait);

        let steps = n.handle_message(&Message::Keepalive, now);
        match &steps[..] {
            [NegotiationStep::Established { local_open, remote_open }] => {
                assert_eq!(local_open.keepalive, 30);
                assert_eq!(remote_open.session_id, 5);
            }
            other => panic!("expected Established, got {:?}", other),
        }
        assert!(n.is_finished());
        assert_eq!(n.deadline(), None);
    }

    #[test]
    fn test_keepalive_before_open() {
        // Acks may arrive in either order
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);

        // Peer acks our Open first
        let steps = n.handle_message(&Message::Keepalive, now);
        assert!(failure(&steps).is_none());

        let steps = n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);
        assert!(steps.iter().any(|s| matches!(s, NegotiationStep::Established { .. })));
        assert!(n.is_finished());
    }

    #[test]
    fn test_counter_proposal_then_success() {
        let config = SessionConfig::default().with_min_dead_timer(40);
        let mut n = negotiator(config);
        let now = Instant::now();
        n.start(now);

        // Unacceptable dead timer draws exactly one counter-proposal
        let steps = n.handle_message(&Message::Open(OpenObject::new(30, 5, 5)), now);
        assert_eq!(error_code_sent(&steps), Some(ErrorCode::NonAccNegSessionChar));
        assert!(failure(&steps).is_none());

        // Peer acks our Open, then resends an acceptable one
        n.handle_message(&Message::Keepalive, now);
        let steps = n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);
        assert!(steps.iter().any(|s| matches!(s, NegotiationStep::Established { .. })));
    }

    #[test]
    fn test_second_unacceptable_open_fails() {
        let config = SessionConfig::default().with_min_dead_timer(40);
        let mut n = negotiator(config);
        let now = Instant::now();
        n.start(now);

        n.handle_message(&Message::Open(OpenObject::new(30, 5, 5)), now);
        n.handle_message(&Message::Keepalive, now);
        let steps = n.handle_message(&Message::Open(OpenObject::new(30, 6, 5)), now);
        assert_eq!(error_code_sent(&steps), Some(ErrorCode::SecondOpenMsg));
        assert!(matches!(
            failure(&steps),
            Some(NegotiationError::ProtocolError(ErrorCode::SecondOpenMsg))
        ));
        assert!(n.is_finished());
    }

    #[test]
    fn test_peer_counter_proposal_revises_ours() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);

        // Peer accepts our Open
        n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);
        // ... but rejects our parameters with a suggestion
        let steps = n.handle_message(
            &Message::error_with_open(
                ErrorCode::NonAccNegSessionChar,
                OpenObject::new(15, 60, 0),
            ),
            now,
        );
        match sent(&steps)[..] {
            [Message::Open(revised)] => {
                assert_eq!(revised.keepalive, 15);
                assert_eq!(revised.dead_timer, 60);
            }
            ref other => panic!("expected revised Open, got {:?}", other),
        }
        // Remote already acked, so we stay waiting for their Keepalive
        assert_eq!(n.state(), NegotiationState::KeepWait);

        let steps = n.handle_message(&Message::Keepalive, now);
        match &steps[..] {
            [NegotiationStep::Established { local_open, .. }] => {
                assert_eq!(local_open.keepalive, 15);
            }
            other => panic!("expected Established, got {:?}", other),
        }
    }

    #[test]
    fn test_peer_error_without_proposal_fails() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);
        n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);

        let steps = n.handle_message(&Message::error(ErrorCode::NonOrInvalidOpenMsg), now);
        assert!(matches!(failure(&steps), Some(NegotiationError::PeerError { .. })));
        // Peer-reported failures are not answered with another error
        assert!(sent(&steps).is_empty());
    }

    #[test]
    fn test_fail_timer_open_wait() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);

        // Before the deadline nothing happens
        assert!(n.handle_timeout(now + Duration::from_secs(59)).is_empty());

        let steps = n.handle_timeout(now + Duration::from_secs(60));
        assert_eq!(error_code_sent(&steps), Some(ErrorCode::NoOpenBeforeExpOpenWait));
        assert!(matches!(
            failure(&steps),
            Some(NegotiationError::Timeout(ErrorCode::NoOpenBeforeExpOpenWait))
        ));
        assert!(n.is_finished());
    }

    #[test]
    fn test_fail_timer_keep_wait() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);
        n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);
        assert_eq!(n.state(), NegotiationState::KeepWait);

        let steps = n.handle_timeout(now + Duration::from_secs(61));
        assert_eq!(error_code_sent(&steps), Some(ErrorCode::NoMsgBeforeExpKeepWait));
    }

    #[test]
    fn test_starttls_exchange() {
        let mut n = negotiator(SessionConfig::default().with_tls(true));
        let now = Instant::now();

        let steps = n.start(now);
        assert!(matches!(sent(&steps)[..], [Message::StartTls]));
        assert_eq!(n.state(), NegotiationState::StartTlsWait);

        let steps = n.handle_message(&Message::StartTls, now);
        assert!(matches!(steps[0], NegotiationStep::InstallTls));
        assert!(matches!(sent(&steps)[..], [Message::Open(_)]));
        assert_eq!(n.state(), NegotiationState::OpenWait);
    }

    #[test]
    fn test_non_starttls_message_fails_tls_wait() {
        let mut n = negotiator(SessionConfig::default().with_tls(true));
        let now = Instant::now();
        n.start(now);

        let steps = n.handle_message(&Message::Open(OpenObject::new(30, 120, 0)), now);
        assert_eq!(error_code_sent(&steps), Some(ErrorCode::NonStartTlsMsgRcvd));
        assert!(n.is_finished());
    }

    #[test]
    fn test_starttls_timeout_code() {
        let mut n = negotiator(SessionConfig::default().with_tls(true));
        let now = Instant::now();
        n.start(now);
        let steps = n.handle_timeout(now + Duration::from_secs(60));
        assert_eq!(error_code_sent(&steps), Some(ErrorCode::StartTlsTimerExp));
    }

    #[test]
    fn test_transition_table_is_total() {
        // Every (state, message) pair outside the table must reach
        // FINISHED via the generic unexpected-message rule
        let now = Instant::now();
        let unexpected: &[(bool, &[Message])] = &[
            // StartTlsWait: anything but StartTLS terminates; PCErr takes
            // the generic rule
            (true, &[Message::Keepalive, Message::Close(TerminationReason::Unknown)]),
            // OpenWait: anything but Open
            (false, &[Message::Keepalive, Message::StartTls, Message::Close(TerminationReason::Unknown)]),
        ];
        for (tls, messages) in unexpected {
            for msg in *messages {
                let mut n = negotiator(SessionConfig::default().with_tls(*tls));
                n.start(now);
                let steps = n.handle_message(msg, now);
                assert!(failure(&steps).is_some(), "{} must fail", msg.name());
                assert!(n.is_finished(), "{} must finish", msg.name());
            }
        }

        // KeepWait: Open and Close are unexpected there
        for msg in [
            Message::Open(OpenObject::new(30, 120, 1)),
            Message::Close(TerminationReason::Unknown),
            Message::StartTls,
        ] {
            let mut n = negotiator(SessionConfig::default());
            n.start(now);
            n.handle_message(&Message::Open(OpenObject::new(30, 120, 5)), now);
            assert_eq!(n.state(), NegotiationState::KeepWait);
            let steps = n.handle_message(&msg, now);
            assert_eq!(error_code_sent(&steps), Some(ErrorCode::NonOrInvalidOpenMsg));
            assert!(n.is_finished());
        }
    }

    #[test]
    fn test_messages_after_finish_are_dropped() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);
        n.handle_timeout(now + Duration::from_secs(60));
        assert!(n.is_finished());

        // The outcome must not be reported twice
        assert!(n.handle_message(&Message::Keepalive, now).is_empty());
        assert!(n.handle_timeout(now + Duration::from_secs(120)).is_empty());
        assert!(n.handle_channel_closed().is_empty());
    }

    #[test]
    fn test_channel_close_fails_once() {
        let mut n = negotiator(SessionConfig::default());
        let now = Instant::now();
        n.start(now);
        let steps = n.handle_channel_closed();
        assert!(matches!(failure(&steps), Some(NegotiationError::ChannelClosed)));
        assert!(n.handle_channel_closed().is_empty());
    }
}

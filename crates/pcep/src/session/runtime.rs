// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Post-handshake session runtime.
//!
//! Owns the two liveliness timers and the unknown-message throttle:
//!
//! - the dead timer fires `remote_open.dead_timer` seconds after the last
//!   received message and terminates the session with EXP_DEADTIMER;
//! - the keepalive timer sends a Keepalive `local_open.keepalive` seconds
//!   after the last sent message.
//!
//! Both deadlines are recomputed from the last-activity timestamp on every
//! poll, so a late wakeup after scheduler jitter does not terminate a
//! session whose peer was in fact on time. A timer value of 0 disables
//! that timer. All timekeeping is monotonic `Instant`s handed in by the
//! driver; wall-clock adjustments cannot touch it.
//!
//! Like the negotiator, this is a plain state machine: inputs are decoded
//! messages and clock readings, outputs are ordered [`SessionEvent`]s.

use crate::codes::{ErrorCode, TerminationReason};
use crate::message::Message;
use crate::object::OpenObject;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Width of the sliding window for unknown-message counting.
pub const UNKNOWN_MESSAGE_WINDOW: Duration = Duration::from_secs(60);

/// One step for the driver to execute, in order.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Transmit a message.
    Send(Message),
    /// Hand a message to the session listener.
    Deliver(Message),
    /// The session ended for the given reason. Emitted exactly once,
    /// whether the close was local or peer-initiated.
    Terminated(TerminationReason),
    /// Close the underlying channel.
    CloseChannel,
}

/// Session counters, exposed for diagnostics.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionStats {
    /// Messages received, malformed ones included.
    pub messages_received: u64,
    /// Messages sent, keepalives included.
    pub messages_sent: u64,
    /// Unrecognized messages received over the session's lifetime.
    pub unknown_messages: u64,
    /// Last error code received in a PCErr, as raw type/value.
    pub last_received_error: Option<(u8, u8)>,
    /// Last error code we sent, as raw type/value.
    pub last_sent_error: Option<(u8, u8)>,
}

/// An established PCEP session.
pub struct Session {
    local_open: OpenObject,
    remote_open: OpenObject,
    max_unknown_messages: usize,
    last_received: Instant,
    last_sent: Instant,
    unknown_window: VecDeque<Instant>,
    closed: bool,
    stats: SessionStats,
}

impl Session {
    /// Session over freshly agreed parameters; both timers start at `now`.
    pub fn new(
        local_open: OpenObject,
        remote_open: OpenObject,
        max_unknown_messages: usize,
        now: Instant,
    ) -> Self {
        Self {
            local_open,
            remote_open,
            max_unknown_messages,
            last_received: now,
            last_sent: now,
            unknown_window: VecDeque::new(),
            closed: false,
            stats: SessionStats::default(),
        }
    }

    /// Parameters proposed by us and acked by the peer.
    pub fn local_open(&self) -> &OpenObject {
        &self.local_open
    }

    /// Parameters proposed by the peer and accepted by us.
    pub fn remote_open(&self) -> &OpenObject {
        &self.remote_open
    }

    /// Session ID we assigned.
    pub fn session_id(&self) -> u8 {
        self.local_open.session_id
    }

    /// Whether the session has ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Counter snapshot.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Feed one decoded inbound message.
    pub fn handle_message(&mut self, msg: Message, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }
        self.last_received = now;
        self.stats.messages_received += 1;

        match msg {
            // Keepalives only feed the dead timer
            Message::Keepalive => {}
            Message::Open(_) => {
                // A second Open is bogus but not fatal to the session
                log::warn!("Open received on an established session");
                self.send(Message::error(ErrorCode::Attempt2ndSession), now, &mut events);
            }
            Message::Close(reason) => {
                log::info!("peer closed the session: {}", reason);
                self.closed = true;
                events.push(SessionEvent::Terminated(reason));
                events.push(SessionEvent::CloseChannel);
            }
            Message::Pcerr(ref err) => {
                if let Some(error) = err.errors.first() {
                    self.stats.last_received_error = Some((error.error_type, error.error_value));
                }
                events.push(SessionEvent::Deliver(msg));
            }
            Message::StartTls | Message::Other(_) => {
                events.push(SessionEvent::Deliver(msg));
            }
        }
        events
    }

    /// React to an inbound message that failed to parse with a documented
    /// code: reply with a PCErr, and count genuinely unrecognized messages
    /// (CAPABILITY_NOT_SUPPORTED) against the sliding-window quota.
    pub fn handle_malformed(&mut self, code: ErrorCode, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }
        self.last_received = now;
        self.stats.messages_received += 1;
        self.send(Message::error(code), now, &mut events);

        if code == ErrorCode::CapabilityNotSupported {
            self.stats.unknown_messages += 1;
            self.unknown_window.push_back(now);
            while let Some(&oldest) = self.unknown_window.front() {
                if now.duration_since(oldest) > UNKNOWN_MESSAGE_WINDOW {
                    self.unknown_window.pop_front();
                } else {
                    break;
                }
            }
            if self.unknown_window.len() > self.max_unknown_messages {
                log::warn!(
                    "{} unknown messages inside the last minute, terminating",
                    self.unknown_window.len()
                );
                self.terminate(TerminationReason::TooManyUnknownMsgs, now, &mut events);
            }
        }
        events
    }

    /// Record an application message going out and append the Send event.
    /// The reply path for listeners.
    pub fn send(&mut self, msg: Message, now: Instant, events: &mut Vec<SessionEvent>) {
        if self.closed {
            return;
        }
        if let Message::Pcerr(err) = &msg {
            if let Some(error) = err.errors.first() {
                self.stats.last_sent_error = Some((error.error_type, error.error_value));
            }
        }
        self.last_sent = now;
        self.stats.messages_sent += 1;
        events.push(SessionEvent::Send(msg));
    }

    /// Locally initiated close: send a Close with `reason`, notify, drop
    /// the channel.
    pub fn close(&mut self, reason: TerminationReason, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.closed {
            self.terminate(reason, now, &mut events);
        }
        events
    }

    /// The channel died under the session.
    pub fn handle_channel_closed(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.closed {
            self.closed = true;
            events.push(SessionEvent::Terminated(TerminationReason::Unknown));
        }
        events
    }

    /// Run both timers against `now`.
    pub fn poll_timers(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }

        if let Some(deadline) = self.dead_deadline() {
            if now >= deadline {
                log::warn!(
                    "no message from peer for {} seconds, session is dead",
                    self.remote_open.dead_timer
                );
                self.terminate(TerminationReason::ExpDeadTimer, now, &mut events);
                return events;
            }
        }

        if let Some(deadline) = self.keepalive_deadline() {
            if now >= deadline {
                self.send(Message::Keepalive, now, &mut events);
            }
        }
        events
    }

    /// Earliest instant at which [`poll_timers`] has work to do, if any
    /// timer is enabled.
    ///
    /// [`poll_timers`]: Session::poll_timers
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.closed {
            return None;
        }
        match (self.dead_deadline(), self.keepalive_deadline()) {
            (Some(dead), Some(keepalive)) => Some(dead.min(keepalive)),
            (deadline, None) | (None, deadline) => deadline,
        }
    }

    fn dead_deadline(&self) -> Option<Instant> {
        match self.remote_open.dead_timer {
            0 => None,
            secs => Some(self.last_received + Duration::from_secs(u64::from(secs))),
        }
    }

    fn keepalive_deadline(&self) -> Option<Instant> {
        match self.local_open.keepalive {
            0 => None,
            secs => Some(self.last_sent + Duration::from_secs(u64::from(secs))),
        }
    }

    fn terminate(
        &mut self,
        reason: TerminationReason,
        now: Instant,
        events: &mut Vec<SessionEvent>,
    ) {
        self.send(Message::Close(reason), now, events);
        self.closed = true;
        events.push(SessionEvent::Terminated(reason));
        events.push(SessionEvent::CloseChannel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RawMessage;

    fn session(keepalive: u8, dead_timer: u8, now: Instant) -> Session {
        Session::new(
            OpenObject::new(keepalive, 120, 0),
            OpenObject::new(30, dead_timer, 1),
            5,
            now,
        )
    }

    fn terminated_with(events: &[SessionEvent]) -> Option<TerminationReason> {
        events.iter().find_map(|e| match e {
            SessionEvent::Terminated(reason) => Some(*reason),
            _ => None,
        })
    }

    #[test]
    fn test_keepalive_sent_when_idle() {
        let now = Instant::now();
        let mut s = session(30, 120, now);

        assert!(s.poll_timers(now + Duration::from_secs(29)).is_empty());
        let events = s.poll_timers(now + Duration::from_secs(30));
        assert_eq!(events, vec![SessionEvent::Send(Message::Keepalive)]);

        // The send reset the timer
        assert!(s.poll_timers(now + Duration::from_secs(31)).is_empty());
    }

    #[test]
    fn test_keepalive_timer_resets_on_any_send() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        let mut events = Vec::new();
        s.send(Message::Keepalive, now + Duration::from_secs(20), &mut events);

        assert!(s.poll_timers(now + Duration::from_secs(49)).is_empty());
        assert!(!s.poll_timers(now + Duration::from_secs(50)).is_empty());
    }

    #[test]
    fn test_dead_timer_terminates() {
        let now = Instant::now();
        let mut s = session(0, 60, now);

        assert!(s.poll_timers(now + Duration::from_secs(59)).is_empty());
        let events = s.poll_timers(now + Duration::from_secs(60));
        assert_eq!(terminated_with(&events), Some(TerminationReason::ExpDeadTimer));
        assert_eq!(
            events[0],
            SessionEvent::Send(Message::Close(TerminationReason::ExpDeadTimer))
        );
        assert!(events.contains(&SessionEvent::CloseChannel));
        assert!(s.is_closed());
    }

    #[test]
    fn test_dead_timer_tolerates_late_wakeup() {
        let now = Instant::now();
        let mut s = session(0, 60, now);

        // Peer activity at t+50; a poll at t+65 is late relative to the
        // original deadline but the peer was on time
        s.handle_message(Message::Keepalive, now + Duration::from_secs(50));
        assert!(s.poll_timers(now + Duration::from_secs(65)).is_empty());
        assert!(!s.poll_timers(now + Duration::from_secs(110)).is_empty());
    }

    #[test]
    fn test_zero_disables_timers() {
        let now = Instant::now();
        let mut s = session(0, 0, now);
        assert_eq!(s.next_deadline(), None);
        assert!(s.poll_timers(now + Duration::from_secs(100_000)).is_empty());
    }

    #[test]
    fn test_next_deadline_is_earliest() {
        let now = Instant::now();
        let s = session(30, 120, now);
        assert_eq!(s.next_deadline(), Some(now + Duration::from_secs(30)));
    }

    #[test]
    fn test_second_open_draws_error_without_teardown() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        let events = s.handle_message(Message::Open(OpenObject::new(30, 120, 9)), now);
        assert_eq!(
            events,
            vec![SessionEvent::Send(Message::error(ErrorCode::Attempt2ndSession))]
        );
        assert!(!s.is_closed());
    }

    #[test]
    fn test_peer_close_notifies_without_reply() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        let events = s.handle_message(Message::Close(TerminationReason::TooManyUnknownMsgs), now);
        // No Close is sent back
        assert_eq!(
            events,
            vec![
                SessionEvent::Terminated(TerminationReason::TooManyUnknownMsgs),
                SessionEvent::CloseChannel,
            ]
        );
        assert!(s.is_closed());
    }

    #[test]
    fn test_local_close_sends_close_message() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        let events = s.close(TerminationReason::Unknown, now);
        assert_eq!(
            events[0],
            SessionEvent::Send(Message::Close(TerminationReason::Unknown))
        );
        assert_eq!(terminated_with(&events), Some(TerminationReason::Unknown));
        // A second close is a no-op
        assert!(s.close(TerminationReason::Unknown, now).is_empty());
    }

    #[test]
    fn test_keepalive_not_delivered_to_listener() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        assert!(s.handle_message(Message::Keepalive, now).is_empty());
    }

    #[test]
    fn test_extension_message_delivered() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        let msg = Message::Other(RawMessage { msg_type: 10, objects: vec![] });
        let events = s.handle_message(msg.clone(), now);
        assert_eq!(events, vec![SessionEvent::Deliver(msg)]);
    }

    #[test]
    fn test_unknown_messages_inside_window_terminate() {
        let now = Instant::now();
        let mut s = session(30, 120, now);

        for i in 0..5 {
            let events =
                s.handle_malformed(ErrorCode::CapabilityNotSupported, now + Duration::from_secs(i));
            assert!(terminated_with(&events).is_none(), "terminated after {} messages", i + 1);
        }
        let events =
            s.handle_malformed(ErrorCode::CapabilityNotSupported, now + Duration::from_secs(5));
        assert_eq!(terminated_with(&events), Some(TerminationReason::TooManyUnknownMsgs));
        assert!(s.is_closed());
    }

    #[test]
    fn test_unknown_messages_spread_out_survive() {
        let now = Instant::now();
        let mut s = session(30, 120, now);

        // Same total count but spaced beyond the window
        for i in 0..10 {
            let at = now + Duration::from_secs(i * 61);
            let events = s.handle_malformed(ErrorCode::CapabilityNotSupported, at);
            assert!(terminated_with(&events).is_none());
        }
        assert!(!s.is_closed());
        assert_eq!(s.stats().unknown_messages, 10);
    }

    #[test]
    fn test_other_malformed_codes_not_counted() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        for _ in 0..20 {
            let events = s.handle_malformed(ErrorCode::MalformedObject, now);
            assert_eq!(events, vec![SessionEvent::Send(Message::error(ErrorCode::MalformedObject))]);
        }
        assert!(!s.is_closed());
        assert_eq!(s.stats().unknown_messages, 0);
        assert_eq!(s.stats().last_sent_error, Some((10, 1)));
    }

    #[test]
    fn test_stats_track_errors() {
        let now = Instant::now();
        let mut s = session(30, 120, now);
        s.handle_message(Message::error(ErrorCode::RpMissing), now);
        assert_eq!(s.stats().last_received_error, Some((6, 1)));
        assert_eq!(s.stats().messages_received, 1);
    }
}

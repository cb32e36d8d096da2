// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! One PCEP connection: socket, framer, and the current phase.
//!
//! The phase is an explicit enum, not a mutable handler chain: a
//! connection is either still negotiating or it carries an established
//! session, and exactly one dispatch function matches on that.
//!
//! ```text
//!   bytes ---> MessageFramer ---> MessageCodec ---> phase dispatch
//!                                                      |
//!                                 +--------------------+--------+
//!                                 v                             v
//!                          SessionNegotiator  --established-->  Session
//! ```
//!
//! All mutation happens on the dispatcher thread that owns the
//! connection, so there is no locking here.

use crate::codes::{ErrorCode, TerminationReason};
use crate::config::SessionConfig;
use crate::error::ParseError;
use crate::message::{Message, MessageCodec};
use crate::session::{
    DefaultProposalPolicy, NegotiationStep, Session, SessionEvent, SessionInfo, SessionListener,
    SessionNegotiator,
};
use crate::transport::framer::MessageFramer;
use mio::net::TcpStream;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::Instant;

/// What a connection is currently doing.
enum Phase {
    Negotiating(SessionNegotiator<DefaultProposalPolicy>),
    Established(Session),
    Closed,
}

/// Work produced by one phase dispatch, executed after the phase borrow
/// ends.
enum Dispatched {
    Steps(Vec<NegotiationStep>),
    Events(Vec<SessionEvent>),
    Nothing,
}

/// One accepted or dialed PCEP connection.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    token_id: u64,
    session_id: u8,
    max_unknown_messages: usize,
    framer: MessageFramer,
    codec: MessageCodec,
    phase: Phase,
    listener: Box<dyn SessionListener>,
    out_buf: Vec<u8>,
}

impl Connection {
    /// Wrap an already-connected stream and start the handshake.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        stream: TcpStream,
        peer: SocketAddr,
        token_id: u64,
        session_id: u8,
        codec: MessageCodec,
        config: &SessionConfig,
        listener: Box<dyn SessionListener>,
        now: Instant,
    ) -> Self {
        let policy = DefaultProposalPolicy::new(config.clone(), session_id);
        let mut negotiator = SessionNegotiator::new(policy, config.tls, config.fail_timer);
        let steps = negotiator.start(now);
        let mut conn = Self {
            stream,
            peer,
            token_id,
            session_id,
            max_unknown_messages: config.max_unknown_messages,
            framer: MessageFramer::new(),
            codec,
            phase: Phase::Negotiating(negotiator),
            listener,
            out_buf: Vec::new(),
        };
        conn.run_negotiation_steps(steps, now);
        conn
    }

    /// Peer address.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Dispatcher token for this connection.
    pub fn token_id(&self) -> u64 {
        self.token_id
    }

    /// Session ID allocated for this connection.
    pub fn session_id(&self) -> u8 {
        self.session_id
    }

    /// The socket, for poll registration.
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Whether the connection is done and should be dropped.
    pub fn is_closed(&self) -> bool {
        matches!(self.phase, Phase::Closed)
    }

    /// Whether unflushed output is pending.
    pub fn wants_write(&self) -> bool {
        !self.out_buf.is_empty()
    }

    /// Earliest instant the connection's timers need a wakeup.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Negotiating(negotiator) => negotiator.deadline(),
            Phase::Established(session) => session.next_deadline(),
            Phase::Closed => None,
        }
    }

    /// Drain the socket and dispatch every complete frame.
    pub fn on_readable(&mut self, now: Instant) {
        let mut chunk = [0u8; 4096];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    log::debug!("{} closed the connection", self.peer);
                    self.on_channel_closed();
                    return;
                }
                Ok(n) => self.framer.push_bytes(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("read error from {}: {}", self.peer, e);
                    self.on_channel_closed();
                    return;
                }
            }
        }
        loop {
            match self.framer.next_frame() {
                Ok(Some(frame)) => self.handle_frame(&frame, now),
                Ok(None) => break,
                Err(e) => {
                    // The stream can no longer be delimited
                    log::warn!("unframeable stream from {}: {}", self.peer, e);
                    self.drop_channel();
                    return;
                }
            }
            if self.is_closed() {
                return;
            }
        }
    }

    /// Flush pending output.
    pub fn on_writable(&mut self) {
        while !self.out_buf.is_empty() {
            match self.stream.write(&self.out_buf) {
                Ok(0) => {
                    self.on_channel_closed();
                    return;
                }
                Ok(n) => {
                    self.out_buf.drain(..n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("write error to {}: {}", self.peer, e);
                    self.on_channel_closed();
                    return;
                }
            }
        }
    }

    /// Run whichever timer the current phase owns.
    pub fn poll_timers(&mut self, now: Instant) {
        let dispatched = match &mut self.phase {
            Phase::Negotiating(negotiator) => Dispatched::Steps(negotiator.handle_timeout(now)),
            Phase::Established(session) => Dispatched::Events(session.poll_timers(now)),
            Phase::Closed => Dispatched::Nothing,
        };
        self.run(dispatched, now);
        self.on_writable();
    }

    /// Send an application message on the established session. Dropped
    /// with a log line while still negotiating.
    pub fn send_message(&mut self, msg: Message, now: Instant) {
        let dispatched = match &mut self.phase {
            Phase::Established(session) => {
                let mut events = Vec::new();
                session.send(msg, now, &mut events);
                Dispatched::Events(events)
            }
            _ => {
                log::warn!("dropping outbound message to {}: session not up", self.peer);
                Dispatched::Nothing
            }
        };
        self.run(dispatched, now);
        self.on_writable();
    }

    /// Locally close the session (or abandon the handshake) with a
    /// protocol reason. Used for shutdown and duplicate-connection
    /// eviction.
    pub fn close(&mut self, reason: TerminationReason, now: Instant) {
        let dispatched = match &mut self.phase {
            Phase::Negotiating(_) => {
                log::debug!("abandoning handshake with {}", self.peer);
                self.phase = Phase::Closed;
                Dispatched::Nothing
            }
            Phase::Established(session) => Dispatched::Events(session.close(reason, now)),
            Phase::Closed => Dispatched::Nothing,
        };
        self.run(dispatched, now);
        self.on_writable();
    }

    fn handle_frame(&mut self, frame: &[u8], now: Instant) {
        match self.codec.decode(frame) {
            Ok(msg) => {
                let dispatched = match &mut self.phase {
                    Phase::Negotiating(negotiator) => {
                        Dispatched::Steps(negotiator.handle_message(&msg, now))
                    }
                    Phase::Established(session) => {
                        Dispatched::Events(session.handle_message(msg, now))
                    }
                    Phase::Closed => Dispatched::Nothing,
                };
                self.run(dispatched, now);
            }
            Err(err) => self.handle_parse_error(err, now),
        }
        self.on_writable();
    }

    fn handle_parse_error(&mut self, err: ParseError, now: Instant) {
        let Some(code) = err.documented() else {
            // Not even well-formed enough to answer
            log::warn!("undecodable message from {}: {}", self.peer, err);
            self.drop_channel();
            return;
        };
        log::debug!("malformed message from {}: {}", self.peer, err);
        let dispatched = match &mut self.phase {
            Phase::Negotiating(_) => {
                // Answer and keep waiting; the fail timer bounds how long
                Dispatched::Steps(vec![NegotiationStep::Send(Message::error(code))])
            }
            Phase::Established(session) => Dispatched::Events(session.handle_malformed(code, now)),
            Phase::Closed => Dispatched::Nothing,
        };
        self.run(dispatched, now);
    }

    fn run(&mut self, dispatched: Dispatched, now: Instant) {
        match dispatched {
            Dispatched::Steps(steps) => self.run_negotiation_steps(steps, now),
            Dispatched::Events(events) => self.run_session_events(events, now),
            Dispatched::Nothing => {}
        }
    }

    fn run_negotiation_steps(&mut self, steps: Vec<NegotiationStep>, now: Instant) {
        for step in steps {
            match step {
                NegotiationStep::Send(msg) => self.queue(&msg),
                NegotiationStep::InstallTls => {
                    // No TLS provider is wired into this driver; mirror
                    // the missing-context failure path
                    log::error!("peer {} agreed to TLS but no provider is available", self.peer);
                    self.queue(&Message::error(ErrorCode::NotPossibleWithoutTls));
                    self.drop_channel();
                    return;
                }
                NegotiationStep::Established { local_open, remote_open } => {
                    log::info!(
                        "session {} with {} established",
                        local_open.session_id,
                        self.peer
                    );
                    let info = SessionInfo {
                        peer: self.peer,
                        local_open: local_open.clone(),
                        remote_open: remote_open.clone(),
                    };
                    self.phase = Phase::Established(Session::new(
                        local_open,
                        remote_open,
                        self.max_unknown_messages,
                        now,
                    ));
                    self.listener.on_session_up(&info);
                }
                NegotiationStep::Failed(err) => {
                    log::warn!("negotiation with {} failed: {}", self.peer, err);
                    self.drop_channel();
                    return;
                }
            }
        }
    }

    fn run_session_events(&mut self, events: Vec<SessionEvent>, now: Instant) {
        let mut replies = Vec::new();
        for event in events {
            match event {
                SessionEvent::Send(msg) => self.queue(&msg),
                SessionEvent::Deliver(msg) => self.listener.on_message(msg, &mut replies),
                SessionEvent::Terminated(reason) => self.listener.on_session_terminated(reason),
                SessionEvent::CloseChannel => {
                    self.phase = Phase::Closed;
                }
            }
        }
        if replies.is_empty() {
            return;
        }
        let dispatched = match &mut self.phase {
            Phase::Established(session) => {
                let mut events = Vec::new();
                for reply in replies {
                    session.send(reply, now, &mut events);
                }
                Dispatched::Events(events)
            }
            _ => Dispatched::Nothing,
        };
        // Listener replies only ever produce Send events, so this
        // recursion is one level deep
        self.run(dispatched, now);
    }

    fn on_channel_closed(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Negotiating(mut negotiator) => {
                for step in negotiator.handle_channel_closed() {
                    if let NegotiationStep::Failed(err) = step {
                        log::warn!("negotiation with {} failed: {}", self.peer, err);
                    }
                }
            }
            Phase::Established(mut session) => {
                if !session.handle_channel_closed().is_empty() {
                    self.listener.on_session_down();
                }
            }
            Phase::Closed => {}
        }
    }

    fn drop_channel(&mut self) {
        self.phase = Phase::Closed;
    }

    fn queue(&mut self, msg: &Message) {
        if let Err(e) = self.codec.encode(msg, &mut self.out_buf) {
            log::error!("cannot encode {} message: {}", msg.name(), e);
        }
    }
}

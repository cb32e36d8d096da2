// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pcep-rs contributors

//! Poll-based transport driver.
//!
//! One thread owns the mio poll, the TCP listener and every connection;
//! all per-connection state machines run here sequentially, so they need
//! no locking. Other threads talk to the driver through a command channel
//! paired with a waker.
//!
//! ```text
//! +------------------------------------------------------------+
//! |                      PcepDispatcher                        |
//! |  +------------------------------------------------------+  |
//! |  |                      mio::Poll                       |  |
//! |  |  - TCP listener (accept + peer bootstrap)            |  |
//! |  |  - one TcpStream per connection                      |  |
//! |  |  - Waker (command channel from other threads)        |  |
//! |  +------------------------------------------------------+  |
//! |         |                  |                   |            |
//! |         v                  v                   v            |
//! |     bootstrap         Connection           timer pass       |
//! |   (PeerRegistry:     (framer, codec,    (earliest deadline  |
//! |    duplicate check,   phase dispatch)    drives the poll    |
//! |    session ID)                           timeout)           |
//! +------------------------------------------------------------+
//! ```
//!
//! The bootstrap step on accept is deliberately thin: consult the peer
//! registry for an existing session from that address, arbitrate the
//! duplicate, allocate a session ID, and hand the stream to a
//! [`Connection`] that runs the actual handshake.

use crate::codes::TerminationReason;
use crate::config::DispatcherConfig;
use crate::message::{Message, MessageCodec};
use crate::peers::{resolve_duplicate, DuplicateDecision, PeerRegistry};
use crate::registry::CodecContext;
use crate::session::SessionListener;
use crate::transport::connection::Connection;
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

const LISTENER_TOKEN: Token = Token(0);
const WAKER_TOKEN: Token = Token(1);
const CONNECTION_TOKEN_START: u64 = 2;

/// Poll timeout when no connection has a pending deadline.
const IDLE_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Events processed per poll.
const MAX_EVENTS: usize = 128;

/// Command channel depth.
const COMMAND_QUEUE_DEPTH: usize = 256;

/// Builds a listener for each established session.
pub type ListenerFactory = Box<dyn Fn(SocketAddr) -> Box<dyn SessionListener> + Send>;

/// Commands other threads can hand to the dispatcher.
enum Command {
    /// Send a message on the session with the given peer.
    Send(SocketAddr, Message),
    /// Close the session with the given peer.
    Close(SocketAddr, TerminationReason),
    /// Dial a peer and negotiate a session.
    Connect(SocketAddr),
    /// Stop the event loop.
    Shutdown,
}

/// Cloneable handle for talking to a running dispatcher.
#[derive(Clone)]
pub struct DispatcherHandle {
    commands: Sender<Command>,
    waker: Arc<Waker>,
}

impl DispatcherHandle {
    /// Queue a message for the session with `peer`.
    pub fn send_message(&self, peer: SocketAddr, msg: Message) -> io::Result<()> {
        self.command(Command::Send(peer, msg))
    }

    /// Close the session with `peer`.
    pub fn close_session(&self, peer: SocketAddr, reason: TerminationReason) -> io::Result<()> {
        self.command(Command::Close(peer, reason))
    }

    /// Dial `peer` and negotiate a session.
    pub fn connect(&self, peer: SocketAddr) -> io::Result<()> {
        self.command(Command::Connect(peer))
    }

    /// Stop the dispatcher.
    pub fn shutdown(&self) -> io::Result<()> {
        self.command(Command::Shutdown)
    }

    fn command(&self, command: Command) -> io::Result<()> {
        self.commands
            .send(command)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "dispatcher stopped"))?;
        self.waker.wake()
    }
}

/// The transport driver. Bind it, then [`run`] it on a dedicated thread.
///
/// [`run`]: PcepDispatcher::run
pub struct PcepDispatcher {
    poll: Poll,
    listener: TcpListener,
    local_addr: SocketAddr,
    codec: MessageCodec,
    config: DispatcherConfig,
    peers: Arc<PeerRegistry>,
    listener_factory: ListenerFactory,
    connections: HashMap<Token, Connection>,
    next_token: u64,
    commands: Receiver<Command>,
    handle: DispatcherHandle,
    shutdown: bool,
}

impl PcepDispatcher {
    /// Bind `addr` and set up the poll. Accepted and dialed connections
    /// share `ctx`, `config` and the peer registry.
    pub fn bind(
        addr: SocketAddr,
        config: DispatcherConfig,
        ctx: Arc<CodecContext>,
        listener_factory: ListenerFactory,
    ) -> io::Result<Self> {
        let std_listener = bind_reusable(addr)?;
        let mut listener = TcpListener::from_std(std_listener);
        let local_addr = listener.local_addr()?;

        let poll = Poll::new()?;
        poll.registry().register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER_TOKEN)?);
        let (tx, rx) = bounded(COMMAND_QUEUE_DEPTH);

        let peers = Arc::new(PeerRegistry::new(config.peers));
        log::info!("PCEP dispatcher listening on {}", local_addr);
        Ok(Self {
            poll,
            listener,
            local_addr,
            codec: MessageCodec::new(ctx),
            config,
            peers,
            listener_factory,
            connections: HashMap::new(),
            next_token: CONNECTION_TOKEN_START,
            commands: rx,
            handle: DispatcherHandle { commands: tx, waker },
            shutdown: false,
        })
    }

    /// Address the listener actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for other threads.
    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    /// The shared peer registry.
    pub fn peer_registry(&self) -> Arc<PeerRegistry> {
        Arc::clone(&self.peers)
    }

    /// Run the event loop until [`DispatcherHandle::shutdown`].
    pub fn run(&mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(MAX_EVENTS);
        while !self.shutdown {
            let timeout = self.poll_timeout(Instant::now());
            if let Err(e) = self.poll.poll(&mut events, timeout) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }
            let now = Instant::now();

            for event in events.iter() {
                match event.token() {
                    LISTENER_TOKEN => self.accept_pending(now),
                    WAKER_TOKEN => self.drain_commands(now),
                    token => {
                        if let Some(conn) = self.connections.get_mut(&token) {
                            if event.is_readable() {
                                conn.on_readable(now);
                            }
                            if event.is_writable() {
                                conn.on_writable();
                            }
                        }
                    }
                }
            }

            self.run_timers(now);
            self.reap_closed(now);
        }
        log::info!("PCEP dispatcher on {} stopped", self.local_addr);
        Ok(())
    }

    fn poll_timeout(&self, now: Instant) -> Option<Duration> {
        let earliest = self
            .connections
            .values()
            .filter_map(Connection::next_deadline)
            .min()?;
        Some(earliest.saturating_duration_since(now).min(IDLE_POLL_TIMEOUT))
    }

    fn accept_pending(&mut self, now: Instant) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => self.bootstrap(stream, peer, now),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    log::warn!("accept failed: {}", e);
                    return;
                }
            }
        }
    }

    /// Peer bootstrap on accept: duplicate arbitration, session ID, then
    /// the real negotiator.
    fn bootstrap(&mut self, stream: TcpStream, peer: SocketAddr, now: Instant) {
        let peer_ip = peer.ip();
        if let Some(existing) = self.peers.active_connection(peer_ip) {
            // The listener may be wildcard-bound; the tiebreak needs the
            // interface address the kernel chose for this connection
            let local_ip = connection_local_ip(&stream, self.local_addr);
            match resolve_duplicate(local_ip, peer_ip) {
                DuplicateDecision::CloseExisting => {
                    log::info!("{} reconnected, closing its older session", peer);
                    if let Some(conn) = self.connections.get_mut(&Token(existing as usize)) {
                        conn.close(TerminationReason::Unknown, now);
                    }
                }
                DuplicateDecision::RejectNew => {
                    log::info!("rejecting duplicate connection from {}", peer);
                    drop(stream);
                    return;
                }
            }
        }

        let token_id = self.next_token;
        self.next_token += 1;
        let session_id = self.peers.next_session_id(peer_ip, now);
        self.peers.claim_active(peer_ip, token_id, now);

        let mut stream = stream;
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("cannot set TCP_NODELAY for {}: {}", peer, e);
        }
        let token = Token(token_id as usize);
        if let Err(e) = self.poll.registry().register(
            &mut stream,
            token,
            Interest::READABLE | Interest::WRITABLE,
        ) {
            log::warn!("cannot register {}: {}", peer, e);
            self.peers.release_active(peer_ip, token_id);
            self.peers.release_session_id(peer_ip, session_id, now);
            return;
        }

        let conn = Connection::start(
            stream,
            peer,
            token_id,
            session_id,
            self.codec.clone(),
            &self.config.session,
            (self.listener_factory)(peer),
            now,
        );
        self.connections.insert(token, conn);
    }

    fn drain_commands(&mut self, now: Instant) {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Send(peer, msg)) => {
                    if let Some(conn) = self.connection_for(peer) {
                        conn.send_message(msg, now);
                    } else {
                        log::warn!("no session with {}, dropping outbound message", peer);
                    }
                }
                Ok(Command::Close(peer, reason)) => {
                    if let Some(conn) = self.connection_for(peer) {
                        conn.close(reason, now);
                    }
                }
                Ok(Command::Connect(peer)) => self.dial(peer, now),
                Ok(Command::Shutdown) => {
                    self.shutdown = true;
                    for conn in self.connections.values_mut() {
                        conn.close(TerminationReason::Unknown, now);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    fn dial(&mut self, peer: SocketAddr, now: Instant) {
        match TcpStream::connect(peer) {
            // The handshake's first frames sit in the out buffer until the
            // socket reports writable
            Ok(stream) => self.bootstrap(stream, peer, now),
            Err(e) => log::warn!("cannot dial {}: {}", peer, e),
        }
    }

    fn run_timers(&mut self, now: Instant) {
        for conn in self.connections.values_mut() {
            conn.poll_timers(now);
        }
    }

    fn reap_closed(&mut self, now: Instant) {
        let dead: Vec<Token> = self
            .connections
            .iter()
            .filter(|(_, conn)| conn.is_closed() && !conn.wants_write())
            .map(|(token, _)| *token)
            .collect();
        for token in dead {
            if let Some(mut conn) = self.connections.remove(&token) {
                let peer_ip = conn.peer().ip();
                let _ = self.poll.registry().deregister(conn.stream_mut());
                self.peers.release_active(peer_ip, conn.token_id());
                self.peers.release_session_id(peer_ip, conn.session_id(), now);
                log::debug!("connection to {} reaped", conn.peer());
            }
        }
    }

    fn connection_for(&mut self, peer: SocketAddr) -> Option<&mut Connection> {
        self.connections.values_mut().find(|conn| conn.peer() == peer)
    }
}

/// Local address of one accepted or dialed connection. An unspecified
/// address sorts below every peer address, so the bind address is only a
/// fallback for sockets that cannot report their own.
fn connection_local_ip(stream: &TcpStream, fallback: SocketAddr) -> IpAddr {
    stream.local_addr().map_or(fallback.ip(), |addr| addr.ip())
}

/// Listener socket with SO_REUSEADDR, handed to mio non-blocking.
fn bind_reusable(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() { socket2::Domain::IPV4 } else { socket2::Domain::IPV6 };
    let socket =
        socket2::Socket::new(domain, socket2::Type::STREAM, Some(socket2::Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;
    let listener: std::net::TcpListener = socket.into();
    listener.set_nonblocking(true)?;
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::standard_context;
    use crate::session::NullListener;

    #[test]
    fn test_bind_ephemeral_port() {
        let dispatcher = PcepDispatcher::bind(
            "127.0.0.1:0".parse().unwrap(),
            DispatcherConfig::default(),
            Arc::new(standard_context()),
            Box::new(|_| Box::new(NullListener)),
        )
        .unwrap();
        assert_ne!(dispatcher.local_addr().port(), 0);
    }

    #[test]
    fn test_arbitration_address_comes_from_the_stream() {
        // A wildcard-bound listener still arbitrates duplicates with the
        // interface address of the accepted socket
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = std::net::TcpStream::connect(addr).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        accepted.set_nonblocking(true).unwrap();
        let stream = TcpStream::from_std(accepted);

        let wildcard: SocketAddr = "0.0.0.0:4189".parse().unwrap();
        assert_eq!(
            connection_local_ip(&stream, wildcard),
            "127.0.0.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_handle_survives_clone() {
        let dispatcher = PcepDispatcher::bind(
            "127.0.0.1:0".parse().unwrap(),
            DispatcherConfig::default(),
            Arc::new(standard_context()),
            Box::new(|_| Box::new(NullListener)),
        )
        .unwrap();
        let handle = dispatcher.handle();
        let clone = handle.clone();
        clone.shutdown().unwrap();
    }
}

//! Unix-socket control server using mio for non-blocking I/O.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use mio::event::Event;
use mio::net::UnixListener;
use mio::{Events, Interest, Poll, Token};
use peerwatch_wire::{Frame, SubscriptionMask};
use tracing::{debug, error, info, trace, warn};

use crate::config::ControlConfig;
use crate::connection::Connection;
use crate::dispatch::{self, ConfigBackend};
use crate::error::{ControlError, ControlResult};
use crate::framer::{ReadProgress, WriteProgress};
use crate::registry::ConnectionRegistry;

/// Token for the listener socket.
const LISTENER_TOKEN: Token = Token(0);

/// Maximum events to process per poll iteration.
const MAX_EVENTS: usize = 1024;

/// Control channel server for `peerwatch`.
///
/// Uses mio's poll-based event loop for handling multiple clients without
/// async runtimes. Each connection carries one in-flight message per
/// direction: while a response drains, the connection is registered for
/// write interest only, and reads resume the moment the flush completes.
pub struct ControlServer<B: ConfigBackend> {
    config: ControlConfig,
    poll: Poll,
    listener: UnixListener,
    registry: ConnectionRegistry,
    backend: B,
}

impl<B: ConfigBackend> ControlServer<B> {
    /// Creates a new server bound to the configured socket path.
    ///
    /// A stale socket file left behind by an earlier run is removed before
    /// binding.
    pub fn new(config: ControlConfig, backend: B) -> ControlResult<Self> {
        let poll = Poll::new()?;

        remove_stale_socket(&config.socket_path)?;

        let mut listener =
            UnixListener::bind(&config.socket_path).map_err(|e| ControlError::BindFailed {
                path: config.socket_path.clone(),
                source: e,
            })?;

        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        info!(
            "Control socket listening on {}",
            config.socket_path.display()
        );

        Ok(Self {
            config,
            poll,
            listener,
            registry: ConnectionRegistry::new(),
            backend,
        })
    }

    /// Returns the socket path the server is bound to.
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Returns the number of live control connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Runs the server event loop.
    ///
    /// This method blocks until the process is shut down.
    pub fn run(&mut self) -> ControlResult<()> {
        let mut events = Events::with_capacity(MAX_EVENTS);

        info!("Control event loop started");

        loop {
            // Wait for events
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for event in &events {
                self.handle_event(event);
            }

            // Clean up closed connections
            self.cleanup_closed();
        }
    }

    /// Runs a single iteration of the event loop.
    ///
    /// Useful for testing or custom event loops.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> ControlResult<()> {
        let mut events = Events::with_capacity(MAX_EVENTS);

        self.poll.poll(&mut events, timeout)?;

        for event in &events {
            self.handle_event(event);
        }

        self.cleanup_closed();
        Ok(())
    }

    /// Lists live connections with their subscription masks, in accept
    /// order.
    ///
    /// The daemon picks notification targets from this list when a
    /// monitored peer changes state.
    pub fn subscriptions(&self) -> Vec<(Token, SubscriptionMask)> {
        self.registry
            .iter()
            .filter(|(_, c)| !c.closing)
            .map(|(t, c)| (t, c.subscription))
            .collect()
    }

    /// Queues an asynchronous frame (typically a notification) for one
    /// client.
    ///
    /// Fails with [`ControlError::WriteBusy`] while another message is
    /// still draining and with [`ControlError::UnknownConnection`] for
    /// tokens that no longer address a live connection.
    pub fn push_frame(&mut self, token: Token, frame: &Frame) -> ControlResult<()> {
        let Some(conn) = self.registry.get_mut(token) else {
            return Err(ControlError::UnknownConnection(token));
        };
        if conn.closing {
            return Err(ControlError::UnknownConnection(token));
        }

        conn.enqueue(frame)?;

        // Same discipline as responses: write interest until the flush ends
        let interest = conn.interest();
        self.poll
            .registry()
            .reregister(&mut conn.stream, token, interest)?;

        Ok(())
    }

    /// Dispatches one poll event.
    fn handle_event(&mut self, event: &Event) {
        match event.token() {
            LISTENER_TOKEN => self.accept_clients(),
            token => {
                if event.is_readable() {
                    self.handle_readable(token);
                }
                if event.is_writable() {
                    self.handle_writable(token);
                }
            }
        }
    }

    /// Accepts new clients from the listener.
    fn accept_clients(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, _addr)) => {
                    // Check connection limit
                    if self.registry.len() >= self.config.max_clients {
                        warn!("Max control clients reached, rejecting connection");
                        // Just drop the stream to reject
                        continue;
                    }

                    let token = self.registry.next_token();

                    // Register the stream; on failure the descriptor is
                    // closed by the drop and nothing is inserted
                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        error!("Error registering control client: {}", e);
                        continue;
                    }

                    self.registry.insert(Connection::new(token, stream));
                    debug!("Accepted control client (token {:?})", token);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // No more connections to accept
                    break;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Error accepting control client: {}", e);
                    break;
                }
            }
        }
    }

    /// Handles readable events on a connection.
    fn handle_readable(&mut self, token: Token) {
        let Some(conn) = self.registry.get_mut(token) else {
            warn!("Readable event for unknown token {:?}", token);
            return;
        };
        if conn.closing {
            return;
        }
        // A response is still draining; reads stay paused until the flush
        // completes
        if conn.has_pending_write() {
            return;
        }

        self.drive_read(token);
    }

    /// Handles writable events on a connection.
    fn handle_writable(&mut self, token: Token) {
        let Some(conn) = self.registry.get_mut(token) else {
            warn!("Writable event for unknown token {:?}", token);
            return;
        };
        if conn.closing {
            return;
        }

        match conn.flush() {
            Ok(WriteProgress::Flushed) => {
                trace!("Outbound frame flushed to {:?}", token);
                // Bytes the client sent behind its request are already
                // buffered; resume reading in this pass instead of waiting
                // for a new readiness event
                self.drive_read(token);
                return;
            }
            Ok(WriteProgress::Pending) => {
                trace!("More data to write to {:?}", token);
            }
            Ok(WriteProgress::Closed) => {
                debug!("Connection {:?} closed by peer during flush", token);
                conn.closing = true;
            }
            Err(e) => {
                error!("Error writing to {:?}: {}", token, e);
                conn.closing = true;
            }
        }

        self.update_interest(token);
    }

    /// Drains completed frames from a connection until it runs dry, closes,
    /// or queues a response (reads pause until the response is flushed).
    fn drive_read(&mut self, token: Token) {
        loop {
            let Some(conn) = self.registry.get_mut(token) else {
                return;
            };

            match conn.read_frame() {
                Ok(ReadProgress::Frame(frame)) => {
                    trace!(
                        "Received {} byte frame from {:?}",
                        frame.total_size(),
                        token
                    );

                    if let Err(e) = dispatch::dispatch(conn, &frame, &mut self.backend) {
                        error!("Error dispatching frame from {:?}: {}", token, e);
                        conn.closing = true;
                        break;
                    }

                    if conn.has_pending_write() {
                        break;
                    }
                }
                Ok(ReadProgress::Pending) => break,
                Ok(ReadProgress::Closed) => {
                    debug!("Connection {:?} closed by peer", token);
                    conn.closing = true;
                    break;
                }
                Err(ControlError::Wire(e)) => {
                    debug!("Protocol violation from {:?}: {}", token, e);
                    conn.closing = true;
                    break;
                }
                Err(e) => {
                    error!("Error reading from {:?}: {}", token, e);
                    conn.closing = true;
                    break;
                }
            }
        }

        self.update_interest(token);
    }

    /// Re-registers a connection with the interest for its current
    /// direction.
    fn update_interest(&mut self, token: Token) {
        let Some(conn) = self.registry.get_mut(token) else {
            return;
        };
        if conn.closing {
            return;
        }

        let interest = conn.interest();
        if let Err(e) = self
            .poll
            .registry()
            .reregister(&mut conn.stream, token, interest)
        {
            error!("Error updating interest for {:?}: {}", token, e);
            conn.closing = true;
        }
    }

    /// Cleans up connections that have been marked as closing.
    ///
    /// Teardown is deferred to this pass so that a connection marked
    /// closing from within dispatch, or by several events in one batch,
    /// is removed exactly once.
    fn cleanup_closed(&mut self) {
        let to_close: Vec<Token> = self
            .registry
            .iter()
            .filter(|(_, c)| c.closing)
            .map(|(t, _)| t)
            .collect();

        for token in to_close {
            if let Some(mut conn) = self.registry.remove(token) {
                debug!("Closing control connection {:?}", token);
                let _ = self.poll.registry().deregister(&mut conn.stream);
            }
        }
    }
}

impl<B: ConfigBackend> Drop for ControlServer<B> {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.config.socket_path);
    }
}

/// Removes a leftover socket file so rebinding succeeds after a crash.
fn remove_stale_socket(path: &Path) -> ControlResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale control socket {}", path.display());
            Ok(())
        }
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

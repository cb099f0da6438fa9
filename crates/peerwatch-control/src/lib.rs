//! # peerwatch-control: Control channel engine for `peerwatch`
//!
//! Management clients talk to the daemon over a Unix stream socket using
//! the framing defined in `peerwatch-wire`. This crate owns everything
//! between the socket and the daemon's monitored-item store: listener
//! setup, per-connection read/write state machines, request dispatch, and
//! connection teardown.
//!
//! ## Architecture
//!
//! The engine uses `mio` for non-blocking I/O with a poll-based event loop.
//! This follows the project's design principle of explicit control flow
//! without async runtimes.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     peerwatch-control                     │
//! │  ┌──────────┐   ┌───────────────┐   ┌─────────────────┐   │
//! │  │ Listener │ → │  Connections  │ → │   Dispatcher    │   │
//! │  │  (Unix)  │   │  (mio poll)   │   │  (→ backend)    │   │
//! │  └──────────┘   └───────────────┘   └─────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The event loop is single threaded. Each connection carries one in-flight
//! message per direction: reads pause while a response drains and resume
//! as soon as the flush completes.
//!
//! ## Usage
//!
//! ```ignore
//! use peerwatch_control::{ControlConfig, ControlServer};
//!
//! let config = ControlConfig::new("/var/run/peerwatchd.sock");
//! let mut server = ControlServer::new(config, store)?;
//! server.run()?;
//! ```

mod config;
mod connection;
mod dispatch;
mod error;
mod framer;
mod registry;
mod server;

pub use config::{ControlConfig, DEFAULT_SOCKET_PATH};
pub use dispatch::{BackendError, ConfigBackend, REQUEST_ADD_FAILED, REQUEST_DEL_FAILED};
pub use error::{ControlError, ControlResult};
pub use server::ControlServer;

pub use mio::Token;

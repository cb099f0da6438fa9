//! # peerwatch-client: control-channel client for `peerwatchd`
//!
//! This crate provides a synchronous client for talking to a `peerwatchd`
//! daemon over its Unix control socket, using the frame protocol defined
//! in `peerwatch-wire`.
//!
//! ## Usage
//!
//! ```ignore
//! use peerwatch_client::{Client, ClientConfig, SubscriptionMask};
//!
//! // Connect to the daemon
//! let mut client = Client::connect(
//!     "/var/run/peerwatchd.sock",
//!     ClientConfig::default(),
//! )?;
//!
//! // Register and unregister monitored peers
//! client.request_add(r#"{"peer":"192.0.2.1"}"#)?;
//! client.request_del(r#"{"peer":"192.0.2.1"}"#)?;
//!
//! // Subscribe to state-change notifications
//! client.subscribe(SubscriptionMask::new(1))?;
//! let notification = client.read_notification()?;
//! ```
//!
//! ## Configuration
//!
//! The client can be configured with timeouts:
//!
//! ```ignore
//! use peerwatch_client::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig {
//!     read_timeout: Some(Duration::from_secs(60)),
//!     write_timeout: Some(Duration::from_secs(30)),
//! };
//! ```

mod client;
mod error;

pub use client::{Client, ClientConfig};
pub use error::{ClientError, ClientResult};

// Re-export useful types from dependencies
pub use peerwatch_wire::{Frame, MessageType, SubscriptionMask};

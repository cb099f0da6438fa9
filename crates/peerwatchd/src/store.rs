//! In-memory table of monitored peers.

use std::collections::HashMap;

use peerwatch_control::{BackendError, ConfigBackend};
use serde::Deserialize;
use tracing::info;

fn default_interval_ms() -> u64 {
    300
}

/// A monitored peer described by a control request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PeerSpec {
    /// Peer address to probe.
    pub peer: String,
    /// Optional operator label.
    #[serde(default)]
    pub label: Option<String>,
    /// Probe interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// In-memory table of monitored peers, keyed by address.
///
/// Control requests land here: `request-add` registers a peer and
/// `request-del` forgets it again.
#[derive(Debug, Default)]
pub struct MonitorStore {
    peers: HashMap<String, PeerSpec>,
}

impl MonitorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigBackend for MonitorStore {
    fn request_add(&mut self, request: &str) -> Result<(), BackendError> {
        let spec: PeerSpec = serde_json::from_str(request)
            .map_err(|e| BackendError::new(format!("invalid peer spec: {e}")))?;

        if self.peers.contains_key(&spec.peer) {
            return Err(BackendError::new(format!(
                "peer {} already monitored",
                spec.peer
            )));
        }

        info!("Monitoring peer {} every {}ms", spec.peer, spec.interval_ms);
        self.peers.insert(spec.peer.clone(), spec);
        Ok(())
    }

    fn request_del(&mut self, request: &str) -> Result<(), BackendError> {
        let spec: PeerSpec = serde_json::from_str(request)
            .map_err(|e| BackendError::new(format!("invalid peer spec: {e}")))?;

        if self.peers.remove(&spec.peer).is_none() {
            return Err(BackendError::new(format!(
                "peer {} is not monitored",
                spec.peer
            )));
        }

        info!("Stopped monitoring peer {}", spec.peer);
        Ok(())
    }
}

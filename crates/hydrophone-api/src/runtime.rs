//! Process-wide resources shared by every handler.

use std::sync::Arc;

use tracing::info;

use hydrophone_core::{DocumentRepository, ServiceState, ServiceStateGate, UrlProbe, UserLocks};

/// Everything a request needs beyond its own body: the readiness gate, the
/// per-owner lock registry, the document store and the URL probe.
///
/// Built once at startup and handed to handlers through axum state, so tests
/// can assemble one from in-memory parts.
pub struct Runtime {
    pub gate: ServiceStateGate,
    pub locks: UserLocks,
    pub repo: Arc<dyn DocumentRepository>,
    pub probe: Arc<dyn UrlProbe>,
}

impl Runtime {
    /// A runtime whose gate starts closed.
    pub fn new(repo: Arc<dyn DocumentRepository>, probe: Arc<dyn UrlProbe>) -> Self {
        Self {
            gate: ServiceStateGate::new(ServiceState::Unavailable),
            locks: UserLocks::new(),
            repo,
            probe,
        }
    }

    /// Open the gate once startup has finished.
    pub fn start(&self) {
        self.gate.set(ServiceState::Available);
    }

    /// Close the gate and release the store's connections.
    pub async fn shutdown(&self) {
        self.gate.set(ServiceState::Unavailable);
        self.repo.close().await;
        info!(subsystem = "api", component = "runtime", "Runtime shut down");
    }
}

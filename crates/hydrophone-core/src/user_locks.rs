//! Per-owner serialization of mutating operations.
//!
//! Each owner uuid gets its own async mutex, created on first use and kept for
//! the life of the process. Mutations for one owner run one at a time in the
//! order tokio's FIFO mutex grants them; different owners never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Guard held for the duration of one owner-scoped mutation.
pub type UserGuard = OwnedMutexGuard<()>;

/// Concurrent registry from owner uuid to mutex.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `uuid`'s documents.
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn lock(&self, uuid: &str) -> UserGuard {
        // Clone the Arc out so the shard lock is released before awaiting.
        let entry = self
            .locks
            .entry(uuid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        trace!(subsystem = "api", component = "user_locks", uuid, "Acquiring owner lock");
        entry.lock_owned().await
    }

    /// Number of owners seen so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

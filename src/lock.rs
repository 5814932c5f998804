//! Per-collection write serialization
//!
//! Mutating operations against the same collection run one at a time.
//! Without this, two concurrent read-modify-write cycles could each read
//! the pre-mutation state and the second write would silently discard the
//! first's effect. Locks are per collection, not global, so mutations
//! against unrelated collections proceed in parallel.
//!
//! Readers never take these locks. Writes land via temp-file-then-rename,
//! so a reader only ever observes fully-prior or fully-new file content.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-collection write locks, lazily created on first access.
///
/// Holding the returned guard admits exactly one in-flight mutation for that
/// collection. The guard releases on drop, including on error paths, so a
/// failed write never wedges its collection.
#[derive(Debug, Default)]
pub struct CollectionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CollectionLocks {
    /// Create an empty lock registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the write lock for `collection`, waiting if a mutation is
    /// already in flight.
    pub async fn acquire(&self, collection: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock registry poisoned");
            locks
                .entry(collection.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

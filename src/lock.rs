use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::UserId;

/// Handle guarding the mutations of a single user
pub type LockHandle = Arc<Mutex<()>>;

/// Registry of per-user mutual-exclusion handles
///
/// Handles are created lazily on first use and kept for the life of the registry, so memory
/// grows with the number of distinct users ever seen. Operations on different users never
/// share a handle and run in parallel.
#[derive(Clone, Debug, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<UserId, LockHandle>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `user_id`, created if absent
    ///
    /// Concurrent first-time callers for the same user always get the same handle: the
    /// shard lock of the map is held while the entry is created.
    pub fn acquire(&self, user_id: UserId) -> LockHandle {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Run `operation` while holding the handle of `user_id`
    ///
    /// Waits until no other operation holds the handle. The handle is released when the
    /// operation returns, fails, panics or is dropped before completion.
    pub async fn run_exclusive<F, Fut, T>(&self, user_id: UserId, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let handle = self.acquire(user_id);
        let _guard = handle.lock().await;
        operation().await
    }

    /// Number of users that have a handle
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

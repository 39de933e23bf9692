//! Shared server state.

use crate::config::SyncConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes work per webhook subject. Deliveries for the same subject
/// (component name, story slug) could otherwise interleave their file
/// writes; distinct subjects touch distinct paths and run in parallel.
#[derive(Debug, Default)]
pub struct SubjectLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SubjectLocks {
    pub async fn acquire(&self, subject: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock();
            map.entry(subject.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Debug)]
pub struct AppState {
    pub config: SyncConfig,
    pub subject_locks: SubjectLocks,
}

impl AppState {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            subject_locks: SubjectLocks::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_subject_serializes() {
        let locks = SubjectLocks::default();
        let guard = locks.acquire("cta_button").await;
        // A second acquire for the same subject must wait.
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            locks.acquire("cta_button"),
        );
        assert!(pending.await.is_err());
        drop(guard);
        // Released lock is immediately acquirable again.
        let _reacquired = locks.acquire("cta_button").await;
    }

    #[tokio::test]
    async fn distinct_subjects_do_not_block() {
        let locks = SubjectLocks::default();
        let _a = locks.acquire("hero").await;
        let _b = locks.acquire("footer").await;
    }
}

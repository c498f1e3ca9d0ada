//! Keyed, time-bounded locks that suppress duplicate user-triggered operations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use tracing::debug;

pub const DEFAULT_LOCK_DURATION: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug)]
struct LockEntry {
    expires_at: Timestamp,
}

#[derive(Default)]
pub struct OperationLock {
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl OperationLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.is_locked_at(key, Timestamp::now())
    }

    /// Expired entries are purged as they are observed.
    pub fn is_locked_at(&self, key: &str, now: Timestamp) -> bool {
        let mut entries = self.entries();
        let expired = match entries.get(key) {
            Some(entry) => now > entry.expires_at,
            None => return false,
        };
        if expired {
            entries.remove(key);
        }
        !expired
    }

    pub fn lock(&self, key: &str, duration: Duration) {
        self.lock_at(key, duration, Timestamp::now());
    }

    pub fn lock_at(&self, key: &str, duration: Duration, now: Timestamp) {
        let span = SignedDuration::try_from(duration).unwrap_or(SignedDuration::MAX);
        let expires_at = now.checked_add(span).unwrap_or(Timestamp::MAX);
        self.entries().insert(
            key.to_string(),
            LockEntry { expires_at },
        );
    }

    pub fn unlock(&self, key: &str) {
        self.entries().remove(key);
    }

    /// Runs `op` unless `key` is locked, in which case `None` is returned without running it.
    /// The lock is not released when `op` finishes; it lapses after `duration`.
    pub async fn execute_once_or_skip<F, Fut, T>(
        &self,
        key: &str,
        op: F,
        duration: Duration,
    ) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.is_locked(key) {
            debug!("operation '{}' skipped: locked", key);
            return None;
        }
        self.lock(key, duration);
        Some(op().await)
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, LockEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

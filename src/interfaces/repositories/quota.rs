use std::time::Duration;

use async_trait::async_trait;

/// Attempts made by one client inside its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaRecord {
    pub count: u32,
    /// Epoch milliseconds at which the window closes.
    pub reset_at_ms: i64,
}

impl QuotaRecord {
    /// A fresh window holding the request that opened it.
    pub fn open(now_ms: i64, window: Duration) -> Self {
        QuotaRecord {
            count: 1,
            reset_at_ms: now_ms.saturating_add(window.as_millis() as i64),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.reset_at_ms
    }
}

/// Outcome of a conditional increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    /// The counter was below the limit and has been bumped.
    Accepted(QuotaRecord),
    /// The counter already sits at the limit; nothing was written.
    Exhausted(QuotaRecord),
    /// No record under that key, e.g. swept between two calls.
    Missing,
}

/// Storage for per-client request counters.
///
/// Each method is atomic with respect to a single key. The in-memory store is
/// the default; a shared external counter store can be plugged in to run
/// several instances behind one quota.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<QuotaRecord>;

    /// Opens a new window when `key` has no record or its window has ended.
    /// Returns the new record, or `None` when a live window already exists.
    async fn set_if_absent_or_expired(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
    ) -> Option<QuotaRecord>;

    /// Bumps the counter only while it is below `limit`.
    async fn increment(&self, key: &str, limit: u32) -> Increment;

    /// Drops every record whose window ended before `now_ms`. Returns how many went.
    async fn sweep(&self, now_ms: i64) -> usize;

    async fn len(&self) -> usize;
}

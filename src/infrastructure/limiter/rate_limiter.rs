use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex;

use crate::repositories::quota::{Increment, QuotaRecord, QuotaStore};

/// Quota state reported back to the client after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub limit: u32,
    pub count: u32,
    pub reset_at_ms: i64,
    pub now_ms: i64,
}

impl QuotaSnapshot {
    fn new(limit: u32, record: &QuotaRecord, now_ms: i64) -> Self {
        Self {
            limit,
            count: record.count,
            reset_at_ms: record.reset_at_ms,
            now_ms,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    /// Whole seconds until the window closes, rounded up.
    pub fn retry_after_secs(&self) -> i64 {
        ceil_div(self.reset_at_ms - self.now_ms, 1_000)
    }

    /// Whole minutes until the window closes, rounded up.
    pub fn retry_after_minutes(&self) -> i64 {
        ceil_div(self.reset_at_ms - self.now_ms, 60_000)
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    if value <= 0 {
        0
    } else {
        (value + divisor - 1) / divisor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed(QuotaSnapshot),
    Limited(QuotaSnapshot),
}

/// Fixed-window limiter: `limit` requests per client per `window`.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, limit: u32, window: Duration) -> Self {
        Self { store, limit, window }
    }

    pub fn in_memory(limit: u32, window: Duration) -> Self {
        Self::new(Arc::new(InMemoryQuotaStore::new()), limit, window)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, now_ms()).await
    }

    pub async fn check_at(&self, key: &str, now_ms: i64) -> RateLimitDecision {
        // A record swept between the two store calls sends us round again
        for _ in 0..2 {
            if let Some(record) = self
                .store
                .set_if_absent_or_expired(key, now_ms, self.window)
                .await
            {
                return RateLimitDecision::Allowed(QuotaSnapshot::new(self.limit, &record, now_ms));
            }

            match self.store.increment(key, self.limit).await {
                Increment::Accepted(record) => {
                    return RateLimitDecision::Allowed(QuotaSnapshot::new(self.limit, &record, now_ms));
                }
                Increment::Exhausted(record) => {
                    tracing::debug!(client = %key, reset_at = record.reset_at_ms, "Quota exhausted");
                    return RateLimitDecision::Limited(QuotaSnapshot::new(self.limit, &record, now_ms));
                }
                Increment::Missing => continue,
            }
        }

        tracing::warn!(client = %key, "Quota record kept disappearing, admitting on a fresh window");
        let record = QuotaRecord::open(now_ms, self.window);
        RateLimitDecision::Allowed(QuotaSnapshot::new(self.limit, &record, now_ms))
    }

    pub async fn sweep(&self) -> usize {
        self.store.sweep(now_ms()).await
    }

    pub async fn tracked_clients(&self) -> usize {
        self.store.len().await
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// --- In-memory store ---
type Key = String;

/// Process-local quota store. Each client gets its own mutex so the
/// read-check-write of one identifier never interleaves with another request
/// for the same identifier.
#[derive(Clone, Default)]
pub struct InMemoryQuotaStore {
    map: Arc<DashMap<Key, Arc<Mutex<QuotaRecord>>>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_slot(&self, key: &str) -> Option<Arc<Mutex<QuotaRecord>>> {
        self.map.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn get(&self, key: &str) -> Option<QuotaRecord> {
        self.get_slot(key).map(|slot| *slot.lock())
    }

    async fn set_if_absent_or_expired(
        &self,
        key: &str,
        now_ms: i64,
        window: Duration,
    ) -> Option<QuotaRecord> {
        let fresh = QuotaRecord::open(now_ms, window);

        // The shard lock is held until the slot is updated, so a sweep cannot
        // drop the entry between the expiry check and the reset
        match self.map.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let mut record = entry.get().lock();
                if record.is_expired(now_ms) {
                    *record = fresh;
                    Some(fresh)
                } else {
                    None
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(fresh)));
                Some(fresh)
            }
        }
    }

    async fn increment(&self, key: &str, limit: u32) -> Increment {
        let Some(slot) = self.map.get(key) else {
            return Increment::Missing;
        };

        let mut record = slot.lock();
        if record.count >= limit {
            Increment::Exhausted(*record)
        } else {
            record.count += 1;
            Increment::Accepted(*record)
        }
    }

    async fn sweep(&self, now_ms: i64) -> usize {
        let before = self.map.len();
        self.map.retain(|_, slot| !slot.lock().is_expired(now_ms));
        before.saturating_sub(self.map.len())
    }

    async fn len(&self) -> usize {
        self.map.len()
    }
}

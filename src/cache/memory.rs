//! In-process store with the same expiry semantics as Redis.
//!
//! Used by the test suite and as the local fallback when no `REDIS_URL` is set.
//! Counters live only as long as the process, so it is unsuitable for more than
//! one server instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::store::CounterStore;
use crate::error::StoreError;

const NO_EXPIRY: i64 = -1;
const MISSING_KEY: i64 = -2;
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn counter() -> Self {
        Slot {
            value: "0".into(),
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A TTL too large to represent as an `Instant` is treated as no expiry.
fn deadline(seconds: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(seconds))
}

#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Slot>,
    started: Instant,
    last_sweep_ms: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            started: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_if_expired(&self, key: &str) {
        let now = Instant::now();
        self.entries.remove_if(key, |_, slot| slot.is_expired(now));
    }

    /// Drops every expired slot, at most once per `SWEEP_INTERVAL`.
    ///
    /// Must not be called while holding an entry guard: `retain` locks every shard.
    fn sweep_expired(&self) {
        let now_ms = self.started.elapsed().as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < SWEEP_INTERVAL.as_millis() as u64 {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired(now));
        tracing::debug!("swept {} expired slots", before.saturating_sub(self.entries.len()));
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.sweep_expired();
        // The entry guard holds the shard lock, which makes the read-modify-write atomic.
        let mut slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(Slot::counter);
        if slot.is_expired(Instant::now()) {
            *slot = Slot::counter();
        }
        let current: i64 = slot.value.parse().map_err(|_| StoreError::Malformed {
            key: key.to_string(),
            reason: "value is not an integer".into(),
        })?;
        let next = current + 1;
        slot.value = next.to_string();
        Ok(next)
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        self.purge_if_expired(key);
        match self.entries.get_mut(key) {
            Some(mut slot) => {
                slot.expires_at = deadline(seconds);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_expiry(&self, key: &str) -> Result<i64, StoreError> {
        self.purge_if_expired(key);
        let Some(slot) = self.entries.get(key) else {
            return Ok(MISSING_KEY);
        };
        Ok(match slot.expires_at {
            // Round up so a freshly set TTL reads back as the full value.
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                remaining.as_millis().div_ceil(1000) as i64
            }
            None => NO_EXPIRY,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.purge_if_expired(key);
        Ok(self.entries.get(key).map(|slot| slot.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        self.sweep_expired();
        self.entries.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: deadline(ttl_seconds),
            },
        );
        Ok(())
    }
}

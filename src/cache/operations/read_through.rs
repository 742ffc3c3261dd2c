use std::sync::Arc;

use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};

use crate::cache::keys::{delivery_key, normalize_lookup};
use crate::cache::store::CounterStore;
use crate::error::{AppError, StoreError};
use crate::upstream::UpstreamFetcher;

/// Source of the random TTL offset.
pub trait Jitter: Send + Sync {
    /// Returns a value uniformly drawn from `0..=max_seconds`.
    fn sample(&self, max_seconds: u64) -> u64;
}

/// Draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn sample(&self, max_seconds: u64) -> u64 {
        rand::thread_rng().gen_range(0..=max_seconds)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub base_ttl_secs: u64,
    pub jitter_max_secs: u64,
}

/// Cache that fills itself from the upstream on a miss.
///
/// Concurrent misses on one key each call the fetcher. There is no
/// single-flight de-duplication.
#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn CounterStore>,
    policy: CachePolicy,
    jitter: Arc<dyn Jitter>,
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn CounterStore>, policy: CachePolicy, jitter: Arc<dyn Jitter>) -> Self {
        Self {
            store,
            policy,
            jitter,
        }
    }

    pub async fn get_or_fetch<F>(&self, lookup: &str, fetcher: &F) -> Result<F::Record, AppError>
    where
        F: UpstreamFetcher + ?Sized,
        F::Record: Serialize + DeserializeOwned,
    {
        let normalized = normalize_lookup(lookup);
        if normalized.is_empty() {
            return Err(AppError::InvalidInput("empty lookup identity".into()));
        }
        let key = delivery_key(&normalized);

        if let Some(record) = self.read(&key).await? {
            tracing::debug!("cache hit: {}", key);
            return Ok(record);
        }

        tracing::debug!("cache miss: {}", key);
        let record = fetcher.fetch(&normalized).await?;

        let ttl = self
            .policy
            .base_ttl_secs
            .saturating_add(self.jitter.sample(self.policy.jitter_max_secs));
        let json = serde_json::to_string(&record).map_err(|e| StoreError::Malformed {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&key, &json, ttl).await?;
        tracing::debug!("cached {} for {}s", key, ttl);

        Ok(record)
    }

    /// Reads a cached record without falling back to the upstream.
    pub async fn get_cached<T: DeserializeOwned>(&self, lookup: &str) -> Result<Option<T>, AppError> {
        let normalized = normalize_lookup(lookup);
        if normalized.is_empty() {
            return Err(AppError::InvalidInput("empty lookup identity".into()));
        }
        Ok(self.read(&delivery_key(&normalized)).await?)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StoreError::Malformed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

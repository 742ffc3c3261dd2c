use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use crate::error::StoreError;

/// Shared key-value store holding both rate-limit counters and cached records.
///
/// `increment` must be atomic across every process sharing the store. Nothing
/// here adds locking on top of it.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments the integer at `key`, creating it at 0 first if absent.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Returns `false` when the key does not exist.
    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<bool, StoreError>;

    /// Seconds left before `key` expires. `-1` means no expiry, `-2` a missing key.
    async fn get_expiry(&self, key: &str) -> Result<i64, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError>;
}

/// Redis-backed store. Opens a multiplexed connection per operation.
#[derive(Clone)]
pub struct RedisStore {
    redis: Arc<RedisClient>,
}

impl RedisStore {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis: Arc::new(redis),
        }
    }

    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(RedisClient::open(url)?))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        Ok(self.redis.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        let count: i64 = conn.incr(key, 1).await?;
        Ok(count)
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        let applied: bool = conn.expire(key, seconds).await?;
        Ok(applied)
    }

    async fn get_expiry(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        let ttl: i64 = conn.ttl(key).await?;
        Ok(ttl)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }
}

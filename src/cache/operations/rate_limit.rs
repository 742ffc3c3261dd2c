use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::store::CounterStore;
use crate::error::StoreError;

/// Maximum requests per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestQuota {
    Limited(u64),
    /// Never denies. Used for local development.
    Unbounded,
}

impl RequestQuota {
    fn is_exceeded_by(self, count: i64) -> bool {
        match self {
            RequestQuota::Limited(max) => count > 0 && count as u64 > max,
            RequestQuota::Unbounded => false,
        }
    }
}

impl FromStr for RequestQuota {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unbounded" | "unlimited" | "inf" => Ok(RequestQuota::Unbounded),
            other => match other.parse::<u64>() {
                Ok(0) | Err(_) => Err(format!("invalid request quota: {s}")),
                Ok(max) => Ok(RequestQuota::Limited(max)),
            },
        }
    }
}

impl fmt::Display for RequestQuota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestQuota::Limited(max) => write!(f, "{max}"),
            RequestQuota::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Denied { retry_after_seconds: u64 },
}

/// Fixed-window rate limiting on top of a [`CounterStore`].
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// Fixed-window check: the window is anchored to the first request and only
    /// that request sets the expiry.
    pub async fn check(
        store: &dyn CounterStore,
        key: &str,
        window_secs: u64,
        max_requests: RequestQuota,
    ) -> Result<RateLimitResult, StoreError> {
        let count = store.increment(key).await?;

        if count == 1 {
            store.set_expiry(key, window_secs).await?;
        }

        if !max_requests.is_exceeded_by(count) {
            return Ok(RateLimitResult::Allowed);
        }

        let ttl = store.get_expiry(key).await?;
        let retry_after_seconds = if ttl > 0 { ttl as u64 } else { window_secs };
        tracing::warn!(
            "rate limit exceeded for {}: count {} > {}, retry after {}s",
            key,
            count,
            max_requests,
            retry_after_seconds
        );

        Ok(RateLimitResult::Denied {
            retry_after_seconds,
        })
    }
}

/// A rate limiter bound to one store, window and quota.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    window_secs: u64,
    max_requests: RequestQuota,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, window_secs: u64, max_requests: RequestQuota) -> Self {
        Self {
            store,
            window_secs,
            max_requests,
        }
    }

    pub async fn check(&self, key: &str) -> Result<RateLimitResult, StoreError> {
        RateLimitCacheOperations::check(
            self.store.as_ref(),
            key,
            self.window_secs,
            self.max_requests,
        )
        .await
    }
}

//! Cache-backed operations: fixed-window rate limiting and the read-through cache.

mod rate_limit;
mod read_through;

pub use rate_limit::{RateLimitCacheOperations, RateLimitResult, RateLimiter, RequestQuota};
pub use read_through::{CachePolicy, Jitter, ReadThroughCache, ThreadRngJitter};

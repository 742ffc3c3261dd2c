//! Store abstraction plus the rate-limit and read-through operations built on it.

pub mod keys;
mod memory;
pub mod operations;
mod store;

pub use memory::MemoryStore;
pub use operations::{RateLimitResult, RateLimiter, ReadThroughCache};
pub use store::{CounterStore, RedisStore};

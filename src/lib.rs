use std::sync::Arc;

use config::Config;
use cache::{CounterStore, RateLimiter, ReadThroughCache};
use cache::operations::{CachePolicy, Jitter};
use models::DeliveryEstimate;
use upstream::UpstreamFetcher;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod router;
pub mod routes;
pub mod upstream;

pub type DeliveryFetcher = dyn UpstreamFetcher<Record = DeliveryEstimate>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
    pub cache: ReadThroughCache,
    pub fetcher: Arc<DeliveryFetcher>,
}

impl AppState {
    /// Wires the rate limiter and the cache to one shared store.
    pub fn new(
        config: Config,
        store: Arc<dyn CounterStore>,
        fetcher: Arc<DeliveryFetcher>,
        jitter: Arc<dyn Jitter>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(
            store.clone(),
            config.rate_limit_window_secs,
            config.rate_limit_requests,
        );
        let cache = ReadThroughCache::new(
            store,
            CachePolicy {
                base_ttl_secs: config.cache_ttl_secs,
                jitter_max_secs: config.cache_jitter_secs,
            },
            jitter,
        );

        Self {
            config: Arc::new(config),
            rate_limiter,
            cache,
            fetcher,
        }
    }
}

//! Upstream delivery-estimate provider.

mod postnord;

pub use postnord::PostNordClient;

use async_trait::async_trait;

/// A failed upstream call. `status` is set when the provider answered with a
/// non-success HTTP status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("upstream fetch failed (status {status:?}): {reason}")]
pub struct FetchError {
    pub status: Option<u16>,
    pub reason: String,
}

impl FetchError {
    pub fn with_status(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            reason: reason.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: reason.into(),
        }
    }
}

/// Performs the network call behind the read-through cache.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    type Record;

    async fn fetch(&self, lookup: &str) -> Result<Self::Record, FetchError>;
}

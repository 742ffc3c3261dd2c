use std::time::Duration;

use async_trait::async_trait;

use super::{FetchError, UpstreamFetcher};
use crate::models::DeliveryEstimate;

/// Client for PostNord's "closest send-out arrival" endpoint.
#[derive(Debug, Clone)]
pub struct PostNordClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostNordClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl UpstreamFetcher for PostNordClient {
    type Record = DeliveryEstimate;

    async fn fetch(&self, postal_code: &str) -> Result<DeliveryEstimate, FetchError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("postalCode", postal_code)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("PostNord request for {} failed: {}", postal_code, e);
                FetchError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("PostNord answered {} for {}", status, postal_code);
            return Err(FetchError::with_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        response.json::<DeliveryEstimate>().await.map_err(|e| {
            tracing::error!("PostNord body for {} could not be decoded: {}", postal_code, e);
            FetchError::network(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/closest", addr)
    }

    #[tokio::test]
    async fn decodes_successful_response() {
        let router = Router::new().route(
            "/closest",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let code = params.get("postalCode").cloned().unwrap_or_default();
                Json(serde_json::json!({
                    "postalCode": code,
                    "city": "STOCKHOLM",
                    "delivery": "14 oktober, 2025",
                    "upcoming": "16 oktober, 2025",
                }))
            }),
        );
        let client = PostNordClient::new(serve(router).await, Duration::from_secs(5)).unwrap();

        let estimate = client.fetch("11122").await.unwrap();
        assert_eq!(estimate.postal_code, "11122");
        assert_eq!(estimate.city, "STOCKHOLM");
        assert_eq!(estimate.upcoming, "16 oktober, 2025");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/closest",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let client = PostNordClient::new(serve(router).await, Duration::from_secs(5)).unwrap();

        let err = client.fetch("11122").await.unwrap_err();
        assert_eq!(err.status, Some(503));
    }

    #[tokio::test]
    async fn unexpected_body_has_no_status() {
        let router = Router::new().route("/closest", get(|| async { "not json" }));
        let client = PostNordClient::new(serve(router).await, Duration::from_secs(5)).unwrap();

        let err = client.fetch("11122").await.unwrap_err();
        assert_eq!(err.status, None);
    }
}

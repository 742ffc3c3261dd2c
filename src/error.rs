use axum::Json;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::upstream::FetchError;

/// Failure talking to the counter/cache store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("malformed value at {key}: {reason}")]
    Malformed { key: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },
    #[error("upstream unavailable (status {status:?}): {reason}")]
    UpstreamUnavailable { status: Option<u16>, reason: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found")]
    NotFound,
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::UpstreamUnavailable {
            status: err.status,
            reason: err.reason,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, retry_after_seconds) = match &self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Inget postnummer angivet", None),
            AppError::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "För många förfrågningar, försök igen senare.",
                Some(*retry_after_seconds),
            ),
            AppError::UpstreamUnavailable { status, .. } => (
                status
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "Fel vid kontakt med PostNord",
                None,
            ),
            AppError::StoreUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Ett oväntat fel uppstod",
                None,
            ),
            // Calendar clients expect a bare text body, not JSON.
            AppError::NotFound => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            error,
            retry_after_seconds,
        });
        let mut response = (status, body).into_response();

        if let Some(secs) = retry_after_seconds {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    cache::{
        RateLimitResult,
        keys::{DELIVERY_BUCKET, normalize_lookup, rate_limit_key},
    },
    error::AppError,
    middleware::ClientIp,
};

use super::form::DeliveryForm;

/// Looks up the next delivery dates for the posted `postalCode`.
///
/// A missing postal code is rejected before the rate limiter is consulted.
pub async fn lookup_delivery(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    form: DeliveryForm,
) -> Result<Response, AppError> {
    let postal_code = form
        .postal_code
        .as_deref()
        .map(normalize_lookup)
        .unwrap_or_default();
    if postal_code.is_empty() {
        return Err(AppError::InvalidInput("missing postalCode".into()));
    }

    let key = rate_limit_key(DELIVERY_BUCKET, &ip);
    if let RateLimitResult::Denied {
        retry_after_seconds,
    } = state.rate_limiter.check(&key).await?
    {
        return Err(AppError::RateLimited {
            retry_after_seconds,
        });
    }

    let estimate = state
        .cache
        .get_or_fetch(&postal_code, state.fetcher.as_ref())
        .await?;

    Ok(([(header::CACHE_CONTROL, "max-age=86400")], Json(estimate)).into_response())
}

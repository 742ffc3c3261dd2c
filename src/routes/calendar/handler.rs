use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::ics::{DeliveryIcon, render_calendar};
use crate::{AppState, cache::keys::normalize_lookup, error::AppError, models::DeliveryEstimate};

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    pub icon: Option<String>,
}

/// Calendar feed built from the cached estimate. Never calls PostNord, so a
/// postal code must have been looked up before it can be subscribed to.
pub async fn delivery_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, AppError> {
    let postal_code = query
        .postal_code
        .as_deref()
        .map(normalize_lookup)
        .unwrap_or_default();
    if postal_code.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "Missing postalCode").into_response());
    }
    let icon = DeliveryIcon::from_param(query.icon.as_deref());

    let Some(estimate) = state
        .cache
        .get_cached::<DeliveryEstimate>(&postal_code)
        .await?
    else {
        tracing::debug!("no cached estimate for calendar {}", postal_code);
        return Err(AppError::NotFound);
    };

    let calendar = render_calendar(&estimate, &postal_code, icon, chrono::Utc::now());
    let disposition = format!("inline; filename=\"postnord-{}.ics\"", postal_code);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        calendar,
    )
        .into_response())
}

use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, middleware::log_errors, routes};

/// Builds the full application router, nested under the configured API base.
pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        // delivery lookup
        .route("/utdelningar.json", post(routes::delivery::lookup_delivery))
        // calendar feed
        .route("/cal/postnord.ics", get(routes::calendar::delivery_calendar));

    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(base, api_routes)
    };
    let router = router.layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}

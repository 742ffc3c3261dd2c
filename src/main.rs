use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use postnord_kalender::{
    AppState,
    cache::{CounterStore, MemoryStore, RedisStore, operations::ThreadRngJitter},
    config::Config,
    router,
    upstream::PostNordClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    tracing::info!(
        "Rate limit: {} requests per {}s",
        config.rate_limit_requests,
        config.rate_limit_window().as_secs()
    );

    let store: Arc<dyn CounterStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::open(url).expect("Failed to create Redis client")),
        None => {
            tracing::warn!("REDIS_URL not set, using in-process store");
            Arc::new(MemoryStore::new())
        }
    };

    let fetcher = Arc::new(
        PostNordClient::new(config.postnord_api_url.clone(), config.upstream_timeout())
            .expect("Failed to build HTTP client"),
    );

    let state = AppState::new(config, store, fetcher, Arc::new(ThreadRngJitter));

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    let app = router::app(state);

    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

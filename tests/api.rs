//! End-to-end tests for the HTTP surface, run in-process against the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use postnord_kalender::{
    AppState,
    cache::{
        CounterStore, MemoryStore,
        operations::{Jitter, RequestQuota},
    },
    config::Config,
    models::DeliveryEstimate,
    router,
    upstream::{FetchError, UpstreamFetcher},
};
use tower::ServiceExt;

struct StubFetcher {
    status: Option<u16>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            status: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status: Some(status),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl UpstreamFetcher for StubFetcher {
    type Record = DeliveryEstimate;

    async fn fetch(&self, lookup: &str) -> Result<DeliveryEstimate, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.status {
            Some(status) => Err(FetchError::with_status(status, "stubbed failure")),
            None => Ok(DeliveryEstimate {
                postal_code: lookup.to_string(),
                city: "UPPSALA".into(),
                delivery: "14 oktober, 2025".into(),
                upcoming: "16 oktober, 2025".into(),
            }),
        }
    }
}

struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&self, _max_seconds: u64) -> u64 {
        0
    }
}

fn app_with(
    quota: RequestQuota,
    store: Arc<MemoryStore>,
    fetcher: Arc<StubFetcher>,
) -> Router {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.rate_limit_requests = quota;
    config.rate_limit_window_secs = 3600;
    router::app(AppState::new(config, store, fetcher, Arc::new(NoJitter)))
}

fn lookup(postal_code: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/utdelningar.json")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", ip)
        .body(Body::from(format!("postalCode={postal_code}")))
        .unwrap()
}

fn calendar(query: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/cal/postnord.ics?{query}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn lookup_returns_and_caches_estimate() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::ok();
    let app = app_with(RequestQuota::Limited(10), store.clone(), fetcher.clone());

    let response = app.clone().oneshot(lookup("753+20", "1.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=86400");

    let body = json_body(response).await;
    assert_eq!(body["postalCode"], "75320");
    assert_eq!(body["city"], "UPPSALA");
    assert_eq!(body["delivery"], "14 oktober, 2025");

    let response = app.oneshot(lookup("75320", "1.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.get_expiry("pn_75320").await.unwrap(), 86400);
}

#[tokio::test]
async fn missing_postal_code_is_rejected_without_counting() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::ok();
    let app = app_with(RequestQuota::Limited(10), store.clone(), fetcher.clone());

    let response = app.oneshot(lookup("+++", "1.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Inget postnummer angivet");

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        store.get("rate_limit:utdelningar:1.1.1.1").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn multipart_form_body_is_accepted() {
    let fetcher = StubFetcher::ok();
    let app = app_with(
        RequestQuota::Limited(10),
        Arc::new(MemoryStore::new()),
        fetcher.clone(),
    );

    let body = "--XBOUNDARY\r\n\
                Content-Disposition: form-data; name=\"icon\"\r\n\r\n\
                package\r\n\
                --XBOUNDARY\r\n\
                Content-Disposition: form-data; name=\"postalCode\"\r\n\r\n\
                753 20\r\n\
                --XBOUNDARY--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/api/utdelningar.json")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .header("x-forwarded-for", "6.6.6.6")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["postalCode"], "75320");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_post_without_content_type_is_a_json_400() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::ok();
    let app = app_with(RequestQuota::Limited(10), store.clone(), fetcher.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/utdelningar.json")
        .header("x-forwarded-for", "7.7.7.7")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Inget postnummer angivet");

    let request = Request::builder()
        .method("POST")
        .uri("/api/utdelningar.json")
        .header(header::CONTENT_TYPE, "text/plain")
        .header("x-forwarded-for", "7.7.7.7")
        .body(Body::from("postalCode=75320"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        store.get("rate_limit:utdelningar:7.7.7.7").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn exceeding_quota_returns_429_with_retry_after() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(RequestQuota::Limited(2), store, StubFetcher::ok());

    for _ in 0..2 {
        let response = app.clone().oneshot(lookup("75320", "2.2.2.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(lookup("75320", "2.2.2.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((3590..=3600).contains(&retry_after));

    let body = json_body(response).await;
    assert_eq!(body["retryAfterSeconds"], retry_after);

    // Another client still has its own window.
    let response = app.oneshot(lookup("75320", "3.3.3.3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upstream_status_is_passed_through_and_not_cached() {
    let store = Arc::new(MemoryStore::new());
    let fetcher = StubFetcher::failing(503);
    let app = app_with(RequestQuota::Unbounded, store.clone(), fetcher.clone());

    let response = app.clone().oneshot(lookup("75320", "4.4.4.4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "Fel vid kontakt med PostNord");
    assert_eq!(store.get("pn_75320").await.unwrap(), None);

    app.oneshot(lookup("75320", "4.4.4.4")).await.unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn calendar_requires_postal_code_and_cached_entry() {
    let app = app_with(
        RequestQuota::Unbounded,
        Arc::new(MemoryStore::new()),
        StubFetcher::ok(),
    );

    let response = app.clone().oneshot(calendar("icon=package")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(calendar("postalCode=75320")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Not found");
}

#[tokio::test]
async fn calendar_renders_cached_estimate() {
    let fetcher = StubFetcher::ok();
    let app = app_with(
        RequestQuota::Unbounded,
        Arc::new(MemoryStore::new()),
        fetcher.clone(),
    );

    app.clone().oneshot(lookup("75320", "5.5.5.5")).await.unwrap();
    let response = app
        .oneshot(calendar("postalCode=753%2020&icon=letter"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/calendar; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"postnord-75320.ics\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let ics = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(ics.contains("SUMMARY;LANGUAGE=sv:✉️ Utdelning i UPPSALA\r\n"));
    assert!(ics.contains("DTSTART;VALUE=DATE:20251014\r\n"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

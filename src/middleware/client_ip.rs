use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

/// Client identity used as the rate-limit key.
///
/// Resolved from `x-real-ip`, then the first `x-forwarded-for` entry, then the
/// socket peer address, falling back to `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let peer_ip = peer.map(|addr| addr.ip().to_string());

        let ip = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .filter(|ip| !ip.trim().is_empty())
            .or_else(|| {
                headers
                    .get("x-forwarded-for")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
            })
            .or(peer_ip.as_deref())
            .unwrap_or("unknown")
            .trim()
            .to_string();

        ClientIp(ip)
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let client = Self::resolve(&parts.headers, peer);
        tracing::debug!("client ip: {}", client.0);
        Ok(client)
    }
}

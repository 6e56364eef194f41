//! API middleware.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, MatchedPath, State};
use axum::http::{header, HeaderValue, Request, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;

/// Maximum number of client IPs tracked before stale entries are purged.
const MAX_RATE_LIMITER_ENTRIES: usize = 10_000;

/// Per-client-IP rate limiter.
///
/// Forwarding headers only identify the client when `trust_proxy` is set;
/// otherwise the peer address of the connection is used.
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    trust_proxy: bool,
}

impl ClientRateLimiter {
    /// Create a limiter allowing `requests_per_second` with the given burst.
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst.max(requests_per_second)).unwrap_or(rate);
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_second(rate).allow_burst(burst))),
            trust_proxy: false,
        }
    }

    /// Read the client IP from `X-Forwarded-For`/`X-Real-IP`.
    pub fn trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Check rate limit for an IP.
    pub fn check(&self, ip: IpAddr) -> bool {
        if self.limiter.len() > MAX_RATE_LIMITER_ENTRIES {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&ip).is_ok()
    }
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::Method;

    let allowed_headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ORIGIN,
    ];

    let allowed_methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.iter().any(|o| o == "*") {
        // Wildcard origin - no credentials allowed, can use Any
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        // Explicit origins - session cookies allowed, so headers must be listed
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", request_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    // Skip health check logging
    if uri.path() != "/health" && uri.path() != "/healthz" && uri.path() != "/ready" {
        info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

/// Rate limiting middleware keyed by client IP.
pub async fn rate_limit_middleware(
    State(rate_limiter): State<ClientRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if let Some(ip) = extract_client_ip(&request, rate_limiter.trust_proxy) {
        if !rate_limiter.check(ip) {
            let endpoint = endpoint_label(&request);
            warn!(ip = %ip, endpoint, "Rate limit exceeded");
            metrics::record_rate_limit_hit(endpoint);

            let mut response = ApiError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            return response;
        }
    }

    next.run(request).await
}

/// Route template of the request, so metric labels stay bounded.
fn endpoint_label(request: &Request<Body>) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str())
        .unwrap_or("api")
}

/// Extract client IP from connection info, or from forwarding headers when
/// the proxy in front of us is trusted.
fn extract_client_ip(request: &Request<Body>, trust_proxy: bool) -> Option<IpAddr> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    if !trust_proxy {
        return peer;
    }

    // Take the first IP in the chain (original client)
    let forwarded = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());
    if forwarded.is_some() {
        return forwarded;
    }

    let real_ip = request
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok());
    if real_ip.is_some() {
        return real_ip;
    }

    peer
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn limited_router(limiter: ClientRateLimiter) -> Router {
        Router::new()
            .route("/jobs/:slug", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter, rate_limit_middleware))
    }

    fn request_from(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/jobs/rust");
        if let Some(ip) = forwarded_for {
            builder = builder.header("X-Forwarded-For", ip);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn test_rate_limiter_is_per_ip() {
        let limiter = ClientRateLimiter::new(1, 1);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
    }

    #[test]
    fn test_extract_client_ip_prefers_forwarded_for_behind_trusted_proxy() {
        let mut request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("127.0.0.1:9000".parse::<SocketAddr>().unwrap()));

        assert_eq!(extract_client_ip(&request, true), Some("203.0.113.7".parse().unwrap()));
        assert_eq!(extract_client_ip(&request, false), Some("127.0.0.1".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_is_limited_without_trusted_proxy() {
        let app = limited_router(ClientRateLimiter::new(1, 1));

        let mut allowed = 0;
        for i in 0..20 {
            let forwarded = format!("203.0.113.{}", i);
            let response = app
                .clone()
                .oneshot(request_from("192.0.2.10:5000", Some(forwarded.as_str())))
                .await
                .unwrap();
            if response.status() == StatusCode::OK {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 1);
    }

    #[tokio::test]
    async fn test_forwarded_for_identifies_clients_behind_trusted_proxy() {
        let app = limited_router(ClientRateLimiter::new(1, 1).trust_proxy(true));

        for client in ["203.0.113.1", "203.0.113.2"] {
            let response = app
                .clone()
                .oneshot(request_from("10.0.0.1:5000", Some(client)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_endpoint_label_is_route_template() {
        let app = Router::new()
            .route("/jobs/:slug", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(|request: Request<Body>, next: Next| async move {
                let label = endpoint_label(&request).to_string();
                let mut response = next.run(request).await;
                response
                    .headers_mut()
                    .insert("x-endpoint", HeaderValue::from_str(&label).unwrap());
                response
            }));

        let response = app.oneshot(request_from("192.0.2.30:5000", None)).await.unwrap();
        assert_eq!(response.headers()["x-endpoint"], "/jobs/:slug");

        let bare = Request::builder().uri("/jobs/rust").body(Body::empty()).unwrap();
        assert_eq!(endpoint_label(&bare), "api");
    }

    #[tokio::test]
    async fn test_limited_request_gets_error_envelope() {
        let app = limited_router(ClientRateLimiter::new(1, 1));

        let first = app.clone().oneshot(request_from("192.0.2.20:5000", None)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(request_from("192.0.2.20:5000", None)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()[header::RETRY_AFTER], "1");
        let bytes = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "message": "Rate limit exceeded. Please try again later."
            })
        );
    }
}

//! Response security headers.
//!
//! This module provides:
//! - The fixed header set attached to every response
//! - Content-Security-Policy for production deployments
//! - Strict-Transport-Security for requests that arrived over TLS
//!
//! Headers are written after the handler has run and overwrite any value the
//! handler set under the same name.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Headers attached to every response.
pub const STATIC_HEADERS: [(&str, &str); 8] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "camera=(), microphone=(), geolocation=(), payment=()"),
    ("cache-control", "no-store, no-cache, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Content-Security-Policy directives, in emission order.
pub const CSP_DIRECTIVES: [&str; 10] = [
    "default-src 'self'",
    "script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://cdnjs.cloudflare.com",
    "style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://fonts.googleapis.com",
    "font-src 'self' https://fonts.gstatic.com https://cdn.jsdelivr.net",
    "img-src 'self' data: https:",
    "connect-src 'self'",
    "frame-ancestors 'none'",
    "form-action 'self'",
    "base-uri 'self'",
    "object-src 'none'",
];

/// One year, with subdomains, eligible for the browser preload list.
pub const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains; preload";

/// Header set applied to outgoing responses.
#[derive(Debug, Clone)]
pub struct SecurityHeaderPolicy {
    static_headers: Vec<(HeaderName, HeaderValue)>,
    csp: Option<HeaderValue>,
    hsts: HeaderValue,
    trust_proxy: bool,
}

impl SecurityHeaderPolicy {
    pub fn new(production: bool, trust_proxy: bool) -> Self {
        let static_headers = STATIC_HEADERS
            .into_iter()
            .map(|(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
            .collect();

        let csp = production
            .then(|| HeaderValue::from_str(&CSP_DIRECTIVES.join("; ")))
            .and_then(Result::ok);

        Self {
            static_headers,
            csp,
            hsts: HeaderValue::from_static(HSTS_VALUE),
            trust_proxy,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.is_production(), config.trust_proxy)
    }

    /// Whether the request arrived over TLS.
    ///
    /// `X-Forwarded-Proto` is only consulted when running behind a trusted proxy.
    pub fn is_secure<B>(&self, request: &Request<B>) -> bool {
        if request.uri().scheme_str() == Some("https") {
            return true;
        }
        self.trust_proxy
            && request
                .headers()
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
    }

    /// Write the policy into a response header map.
    pub fn apply(&self, headers: &mut HeaderMap, secure: bool) {
        for (name, value) in &self.static_headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(csp) = &self.csp {
            headers.insert(header::CONTENT_SECURITY_POLICY, csp.clone());
        }
        if secure {
            headers.insert(header::STRICT_TRANSPORT_SECURITY, self.hsts.clone());
        }
    }
}

/// Security headers middleware.
pub async fn security_headers(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let secure = state.security_headers.is_secure(&request);
    let mut response = next.run(request).await;
    state.security_headers.apply(response.headers_mut(), secure);
    response
}

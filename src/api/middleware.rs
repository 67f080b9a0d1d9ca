//! # Middleware
//!
//! Request timing, request ids, security headers, the staff gate for the
//! back office and per-IP rate limiting for public write endpoints.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::HeaderValue, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{info, warn};

use crate::{error::AppError, services::AppState};

// =====================================
// Request Timing Middleware
// =====================================
/// Log method, path, status and duration of every request.
pub async fn request_timing(request: Request<Body>, next: Next) -> impl IntoResponse {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    if response.status().is_server_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// =====================================
// Request ID Middleware
// =====================================
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Propagate `X-Request-Id`, generating one when the client sent none.
pub async fn request_id(mut request: Request<Body>, next: Next) -> impl IntoResponse {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .cloned();

    let value = match incoming {
        Some(value) => value,
        None => {
            // nanoid's alphabet is header-safe
            let generated = HeaderValue::from_str(&nanoid::nanoid!(12));
            match generated {
                Ok(value) => value,
                Err(_) => return next.run(request).await,
            }
        }
    };

    request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, value);

    response
}

// =====================================
// Security Headers Middleware
// =====================================
pub async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

// =====================================
// Staff Gate
// =====================================
/// Reject requests without a valid staff token. Applied to the whole
/// `/api/admin` router; admin-only routes additionally use
/// [`AdminUser`](super::extractors::AdminUser).
///
/// ```rust,ignore
/// let admin = Router::new()
///     .route("/stats", get(stats))
///     .layer(axum::middleware::from_fn_with_state(state.clone(), require_staff));
/// ```
pub async fn require_staff(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(crate::services::extract_token_from_header)
        .ok_or_else(|| AppError::Unauthorized("Missing auth token".to_string()))?;

    let claims = state.auth_service.verify_token(token)?;
    if !claims.role.is_staff() {
        return Err(AppError::Forbidden("Staff access required".to_string()));
    }

    Ok(next.run(request).await)
}

// =====================================
// Rate Limiting
// =====================================
/// Keyed GCRA limiter, one bucket per client IP.
#[derive(Clone)]
pub struct RateLimiterState {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

impl RateLimiterState {
    /// `per_minute` sustained requests with bursts of up to `burst`.
    #[must_use]
    pub fn new(per_minute: u32, burst: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// # Errors
    /// `RateLimited` when `ip` has used up its quota.
    pub fn check(&self, ip: IpAddr) -> Result<(), AppError> {
        self.limiter.check_key(&ip).map_err(|_| {
            warn!(client_ip = %ip, "Rate limit exceeded");
            AppError::RateLimited
        })
    }

    /// Forget clients whose buckets are full again.
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

/// Apply the rate limiter to the wrapped routes.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(request.headers(), peer, state.config.trusted_proxy);

    state.rate_limiter.check(ip)?;
    Ok(next.run(request).await)
}

/// With `trust_headers`, the first address of `X-Forwarded-For`, then
/// `X-Real-IP`; otherwise, or when neither parses, the peer address.
/// Unknown clients share one bucket.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_headers: bool) -> IpAddr {
    if !trust_headers {
        return peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip("X-Forwarded-For")
        .or_else(|| header_ip("X-Real-IP"))
        .or(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("X-Real-IP", HeaderValue::from_static("198.51.100.2"));

        let peer = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(client_ip(&headers, peer, true), "203.0.113.7".parse::<IpAddr>().unwrap());

        headers.remove("X-Forwarded-For");
        assert_eq!(client_ip(&headers, peer, true), "198.51.100.2".parse::<IpAddr>().unwrap());

        assert_eq!(client_ip(&HeaderMap::new(), peer, true), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn client_ip_ignores_headers_without_trusted_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7"));
        headers.insert("X-Real-IP", HeaderValue::from_static("198.51.100.2"));

        let peer = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
        assert_eq!(client_ip(&headers, peer, false), IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
        assert_eq!(client_ip(&headers, None, false), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn limiter_allows_burst_then_rejects() {
        let limiter = RateLimiterState::new(1, 3);
        let ip = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
        let other = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2));

        for _ in 0..3 {
            assert!(limiter.check(ip).is_ok());
        }
        assert!(matches!(limiter.check(ip), Err(AppError::RateLimited)));
        assert!(limiter.check(other).is_ok());
    }
}

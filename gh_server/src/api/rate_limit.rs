//! Rate limiting middleware.
//!
//! Applies the per-client token bucket to every request, keyed by the
//! remote address with the port stripped. Throttled requests receive 429
//! with a `Retry-After` header.

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header::RETRY_AFTER, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse::limiter::{Decision, RateLimiter};
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

use crate::metrics;

/// Admission-control middleware backed by a shared [`RateLimiter`].
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check(addr.ip()) {
        Decision::Admitted => next.run(request).await,
        Decision::Throttled { retry_after } => {
            metrics::rate_limit_hits_total();
            warn!(ip = %addr.ip(), retry_after, "rate limit exceeded");

            (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, retry_after.to_string())],
                Json(json!({ "message": "rate limit exceeded" })),
            )
                .into_response()
        }
    }
}

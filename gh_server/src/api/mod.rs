//! HTTP API for the authentication service.
//!
//! # Modules
//!
//! - [`auth`]: register, login, refresh, and logout handlers
//! - [`health`]: backing-store status endpoint
//! - [`middleware`]: access-token validation for protected routes
//! - [`rate_limit`]: per-client admission control
//! - [`error`]: the single error-to-HTTP mapping point
//! - [`extract`]: validated JSON body extraction
//!
//! # Endpoints
//!
//! ```text
//! POST /auth/register    - Register user (public)
//! POST /auth/login       - Login (public)
//! POST /auth/refresh     - Rotate refresh token (public, bearer = refresh)
//! POST /auth/logout      - Revoke tokens (auth required)
//! GET  /health           - Backing-store status (public)
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod rate_limit;

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use gatehouse::cache::RevocationStore;
use gatehouse::hasher::Dispatcher;
use gatehouse::limiter::RateLimiter;
use gatehouse::store::{Database, UserRepository};
use gatehouse::token::TokenService;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Application state shared across all handlers.
///
/// Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub hasher: Arc<Dispatcher>,
    pub tokens: Arc<TokenService>,
    pub cache: Arc<dyn RevocationStore>,
    pub db: Database,
    pub http: reqwest::Client,
}

/// Build the HTTP client used for the breached-password advisory.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
}

/// Build a CORS layer from the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

/// Create the complete API router with all endpoints and middleware.
///
/// The rate limiter runs outermost so throttled requests never reach a
/// handler; CORS wraps everything so even 429s carry the right headers.
pub fn create_router(state: AppState, limiter: RateLimiter, cors: CorsLayer) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit,
        ))
        .layer(cors)
        .with_state(state)
}

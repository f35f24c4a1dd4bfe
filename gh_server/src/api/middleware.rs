//! Authentication middleware for protected endpoints.
//!
//! Extracts the access token from the `Authorization: Bearer <token>`
//! header, validates it (signature, expiry, kind, blacklist), and injects
//! the authenticated user id into request extensions for downstream
//! handlers.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::auth::bearer_token;
use super::error::ApiError;
use super::AppState;

/// Authenticated user id, available to handlers behind [`require_auth`]
/// via `Extension<CurrentUser>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Reject requests without a valid access token.
///
/// - missing or malformed header: 401
/// - invalid, expired, wrong-kind, or revoked token: 401
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        bearer_token(request.headers()).ok_or_else(|| ApiError::unauthorized("unauthorized"))?;

    let user_id = state
        .tokens
        .validate_access(token)
        .await
        .map_err(|_| ApiError::unauthorized("unauthorized"))?;

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

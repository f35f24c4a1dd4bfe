//! Authentication API handlers.
//!
//! - `POST /auth/register`: create an account (201) with a hashed password
//! - `POST /auth/login`: verify credentials, return a token pair (200)
//! - `POST /auth/refresh`: rotate a refresh token into a new pair (200)
//! - `POST /auth/logout`: revoke the presented tokens (204)
//!
//! Hashing and verification go through the worker pool; a full queue turns
//! into a 503 rather than blocking the handler.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt::Write as _;
use uuid::Uuid;
use validator::Validate;

use super::error::ApiError;
use super::extract::{Normalize, ValidatedJson};
use super::AppState;
use crate::metrics;

#[derive(Debug, Deserialize, Validate)]
pub struct AuthPayload {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 64, message = "must be between 8 and 64 characters"))]
    pub password: String,
}

impl Normalize for AuthPayload {
    fn normalize(&mut self) {
        self.email = self.email.trim().to_ascii_lowercase();
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogoutPayload {
    #[validate(length(min = 1, message = "is required"))]
    pub refresh_token: String,
}

impl Normalize for LogoutPayload {}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Register a new user account.
///
/// Runs the breached-password advisory, hashes the password on the worker
/// pool, and inserts the user row.
///
/// # Errors
///
/// - `400`: validation failure or breached password
/// - `409`: email already registered
/// - `503`: hashing pool at capacity
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AuthPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if let Some(rejection) = check_breached_password(&state.http, &payload.password).await {
        return Err(rejection);
    }

    let reply = state.hasher.hash(payload.password)?;
    let password_hash = reply
        .await
        .map_err(|_| ApiError::internal(anyhow::anyhow!("hash worker dropped its reply")))??;

    let user = state.users.create(&payload.email, &password_hash).await?;

    metrics::auth_attempts_total("register", true);
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// Authenticate a user and return an access/refresh token pair.
///
/// An unknown email and a wrong password are indistinguishable to the
/// client; both produce 401 "invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AuthPayload>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let user = match state.users.get_by_email(&payload.email).await {
        Ok(user) => user,
        Err(gatehouse::store::StoreError::NotFound) => {
            metrics::auth_attempts_total("login", false);
            return Err(ApiError::unauthorized("invalid credentials"));
        }
        Err(err) => return Err(err.into()),
    };

    let reply = state
        .hasher
        .verify(payload.password, user.password_hash.clone())?;
    let matched = reply
        .await
        .map_err(|_| ApiError::internal(anyhow::anyhow!("verify worker dropped its reply")))??;

    if !matched {
        metrics::auth_attempts_total("login", false);
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let user_id = user.id.to_string();
    let access_token = state.tokens.generate_access(&user_id)?;
    let refresh_token = state.tokens.generate_refresh(&user_id)?;

    metrics::auth_attempts_total("login", true);
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

/// Rotate a refresh token (presented as the bearer token) into a fresh
/// access/refresh pair. The incoming refresh token is revoked and can
/// never rotate again.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("missing token"))?;

    let (access_token, refresh_token) = state
        .tokens
        .rotate(token)
        .await
        .map_err(|_| ApiError::unauthorized("invalid or expired refresh token"))?;

    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

/// Revoke the presented access token and the refresh token in the body.
///
/// Runs behind the auth middleware, so the bearer token has already been
/// validated. Refresh revocation is best-effort: a malformed refresh token
/// does not fail an otherwise successful logout.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<LogoutPayload>,
) -> Result<StatusCode, ApiError> {
    if let Some(access_token) = bearer_token(&headers) {
        state.tokens.revoke(access_token).await?;
        metrics::tokens_revoked_total();
    }

    match state.tokens.revoke(&payload.refresh_token).await {
        Ok(()) => metrics::tokens_revoked_total(),
        Err(err) => tracing::debug!(error = %err, "refresh token revocation skipped"),
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort breached-password advisory against the pwned-passwords
/// range API (SHA-1 prefix k-anonymity).
///
/// Fails open: if the upstream is unreachable or answers garbage,
/// registration proceeds. Only a confirmed suffix match rejects.
async fn check_breached_password(client: &reqwest::Client, password: &str) -> Option<ApiError> {
    let digest = Sha1::digest(password.as_bytes());
    let hex = digest.iter().fold(String::with_capacity(40), |mut acc, b| {
        let _ = write!(acc, "{b:02X}");
        acc
    });
    let (prefix, suffix) = hex.split_at(5);

    let url = format!("https://api.pwnedpasswords.com/range/{prefix}");
    let body = match client.get(&url).send().await {
        Ok(response) => match response.text().await {
            Ok(body) => body,
            Err(_) => return None,
        },
        Err(err) => {
            tracing::debug!(error = %err, "breached-password check skipped");
            return None;
        }
    };

    for line in body.lines() {
        if let Some((candidate, _count)) = line.trim().split_once(':') {
            if candidate.eq_ignore_ascii_case(suffix) {
                return Some(ApiError::field(
                    StatusCode::BAD_REQUEST,
                    "validation failed",
                    "password",
                    "has been found in a data breach",
                ));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_auth_payload_normalization() {
        let mut payload = AuthPayload {
            email: "  Someone@Example.COM ".to_string(),
            password: "hunter22x".to_string(),
        };
        payload.normalize();
        assert_eq!(payload.email, "someone@example.com");
    }
}

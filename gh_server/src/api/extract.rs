//! Typed request decoding with declarative validation.
//!
//! [`ValidatedJson`] decodes the JSON body into the target shape, runs its
//! post-decode normalization hook, then applies the shape's `validator`
//! rules. Endpoints describe their constraints on the request type; nothing
//! enforces them by hand.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// Post-decode normalization hook, run before validation. The default does
/// nothing; implement it to canonicalize fields (e.g. lowercasing emails).
pub trait Normalize {
    fn normalize(&mut self) {}
}

/// JSON body extractor that yields a decoded, normalized, validated value.
///
/// Rejections:
/// - malformed JSON or wrong shape: 400 `{"message": "invalid request body"}`
/// - failed validation rules: 400 with per-field `errors`
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Normalize + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| ApiError::client(StatusCode::BAD_REQUEST, "invalid request body"))?;

        value.normalize();
        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

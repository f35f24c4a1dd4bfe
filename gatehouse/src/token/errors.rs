//! Token error types.

use thiserror::Error;

use crate::cache::CacheError;

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, signature-invalid, or expired token
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The token's `kind` does not match the entry point
    #[error("token kind mismatch")]
    WrongKind,

    /// The token's `jti` is present in the blacklist
    #[error("token revoked")]
    Revoked,

    /// A mandatory claim is absent or empty
    #[error("missing {0} claim")]
    MissingClaim(&'static str),

    /// Writing a revocation entry failed
    #[error("revocation store error: {0}")]
    Store(#[from] CacheError),
}

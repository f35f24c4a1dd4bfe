//! Token claim models.

use serde::{Deserialize, Serialize};

/// The declared type of a token. Access tokens authenticate API calls;
/// refresh tokens can only mint new token pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claim set shared by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier
    pub sub: String,
    /// Unique token identifier, the revocation key
    pub jti: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch; always strictly greater than `iat`
    pub exp: i64,
    /// Token kind, always present
    pub kind: TokenKind,
}

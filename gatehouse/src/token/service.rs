//! Token service implementation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{Claims, TokenError, TokenKind};
use crate::cache::RevocationStore;

/// Accepted signing algorithms. Restricting validation to the HMAC family
/// defeats algorithm-confusion forgeries (`alg: none`, RSA-as-HMAC) before
/// any state is touched.
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

fn blacklist_key(jti: &str) -> String {
    format!("blacklist:{jti}")
}

/// Issues and validates access/refresh tokens against a process-wide
/// secret, with a revocation blacklist in the backing store.
///
/// The secret and expiry windows are read once at startup and immutable for
/// the process lifetime.
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    store: Arc<dyn RevocationStore>,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC signing secret
    /// * `access_ttl` - access token lifetime
    /// * `refresh_ttl` - refresh token lifetime
    /// * `store` - blacklist backend
    pub fn new(
        secret: String,
        access_ttl: Duration,
        refresh_ttl: Duration,
        store: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            secret,
            access_ttl,
            refresh_ttl,
            store,
        }
    }

    /// Issue an access token for `user_id`.
    pub fn generate_access(&self, user_id: &str) -> Result<String, TokenError> {
        self.generate(user_id, TokenKind::Access)
    }

    /// Issue a refresh token for `user_id`.
    pub fn generate_refresh(&self, user_id: &str) -> Result<String, TokenError> {
        self.generate(user_id, TokenKind::Refresh)
    }

    fn generate(&self, user_id: &str, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind,
        };

        debug!(user_id, %kind, jti = %claims.jti, "issuing token");

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Validate an access token and return its subject.
    pub async fn validate_access(&self, token: &str) -> Result<String, TokenError> {
        self.validate(token, TokenKind::Access).await
    }

    /// Validate a refresh token and return its subject.
    pub async fn validate_refresh(&self, token: &str) -> Result<String, TokenError> {
        self.validate(token, TokenKind::Refresh).await
    }

    /// Shared validation core.
    ///
    /// Signature and expiry are verified first, then the kind, then the
    /// blacklist. A blacklist *lookup* failure is treated as "not revoked":
    /// the service fails open on store availability but never on the
    /// signature.
    async fn validate(&self, token: &str, expected: TokenKind) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_FAMILY.to_vec();

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        let claims = data.claims;

        if claims.kind != expected {
            return Err(TokenError::WrongKind);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::MissingClaim("sub"));
        }
        if claims.jti.is_empty() {
            return Err(TokenError::MissingClaim("jti"));
        }

        if let Ok(Some(value)) = self.store.get(&blacklist_key(&claims.jti)).await {
            if !value.is_empty() {
                return Err(TokenError::Revoked);
            }
        }

        Ok(claims.sub)
    }

    /// Revoke a token by blacklisting its `jti` for the remainder of its
    /// lifetime. Revoking an already-expired token is a no-op success.
    ///
    /// The token is parsed without signature verification: a client logging
    /// out with a token we cannot verify is harmless, and blacklisting a
    /// garbage `jti` costs one short-lived key.
    pub async fn revoke(&self, token: &str) -> Result<(), TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        let claims = data.claims;

        if claims.jti.is_empty() {
            return Err(TokenError::MissingClaim("jti"));
        }

        let ttl = claims.exp - Utc::now().timestamp();
        if ttl <= 0 {
            return Ok(());
        }

        debug!(jti = %claims.jti, ttl, "revoking token");
        self.store
            .set(
                &blacklist_key(&claims.jti),
                "1",
                std::time::Duration::from_secs(ttl as u64),
            )
            .await?;
        Ok(())
    }

    /// Rotate a refresh token: validate it, issue a fresh access/refresh
    /// pair, then revoke the incoming token so it can never rotate again.
    pub async fn rotate(&self, refresh_token: &str) -> Result<(String, String), TokenError> {
        let user_id = self.validate_refresh(refresh_token).await?;
        let access = self.generate_access(&user_id)?;
        let refresh = self.generate_refresh(&user_id)?;
        self.revoke(refresh_token).await?;
        Ok((access, refresh))
    }
}

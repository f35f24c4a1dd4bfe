//! Signed bearer token issuance, validation, rotation, and revocation.
//!
//! Two token kinds are issued over the same claim set: short-lived access
//! tokens and long-lived refresh tokens. Both are HMAC-SHA256 signed JWTs
//! carrying a unique `jti`; revocation writes `blacklist:<jti>` into the
//! [`RevocationStore`](crate::cache::RevocationStore) with a TTL equal to
//! the token's remaining lifetime, so the blacklist never outlives the
//! tokens it guards.
//!
//! ## Example
//!
//! ```no_run
//! use gatehouse::cache::MemoryStore;
//! use gatehouse::token::TokenService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokens = TokenService::new(
//!         "a-secret-of-at-least-32-characters!".to_string(),
//!         chrono::Duration::hours(24),
//!         chrono::Duration::days(30),
//!         Arc::new(MemoryStore::new()),
//!     );
//!
//!     let access = tokens.generate_access("user-1")?;
//!     let user_id = tokens.validate_access(&access).await?;
//!     assert_eq!(user_id, "user-1");
//!
//!     tokens.revoke(&access).await?;
//!     assert!(tokens.validate_access(&access).await.is_err());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod models;
pub mod service;

pub use errors::TokenError;
pub use models::{Claims, TokenKind};
pub use service::TokenService;

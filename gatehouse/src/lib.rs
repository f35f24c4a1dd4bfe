//! # Gatehouse
//!
//! Core building blocks for a stateless authentication service:
//!
//! - [`crypto`]: Argon2id password hashing with a PHC-style serialized form
//! - [`hasher`]: bounded worker pool that keeps Argon2id off the request path
//! - [`token`]: signed access/refresh token issuance, validation, rotation,
//!   and revocation against a blacklist
//! - [`cache`]: revocation store contract with redis-backed and in-memory
//!   implementations
//! - [`store`]: user persistence over PostgreSQL
//! - [`limiter`]: per-client token-bucket admission control
//!
//! The HTTP surface lives in the `gh_server` binary crate; this library is
//! deliberately framework-free so the primitives can be tested in isolation.

pub mod cache;
pub mod crypto;
pub mod hasher;
pub mod limiter;
pub mod store;
pub mod token;

pub use cache::{CacheError, MemoryStore, RedisCache, RevocationStore};
pub use crypto::CryptoError;
pub use hasher::{Dispatcher, Job, SubmitError};
pub use limiter::{Decision, RateLimiter, RateLimiterConfig};
pub use store::{Database, DatabaseConfig, PgUserRepository, StoreError, User, UserRepository};
pub use token::{TokenError, TokenKind, TokenService};

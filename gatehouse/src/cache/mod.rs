//! Revocation store contract and implementations.
//!
//! The token service only needs two capabilities from its backing store:
//! fetch a value by key and write a value with a TTL. That contract is the
//! [`RevocationStore`] trait; the redis-backed [`RedisCache`] is the
//! production implementation and [`MemoryStore`] serves tests and local
//! development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisCache;

/// Revocation store errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying redis command or connection failure
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Capability contract for the token blacklist.
///
/// `get` distinguishes "key absent" (`Ok(None)`) from a transport failure
/// (`Err`); callers decide how to treat the latter.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Report backend status for the health endpoint.
    async fn health(&self) -> HashMap<String, String>;
}

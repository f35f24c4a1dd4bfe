//! Redis-backed revocation store.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use super::{CacheError, RevocationStore};

/// Redis connection wrapper.
///
/// Holds a multiplexed async connection; cloning the connection per command
/// is cheap and lets concurrent requests share one socket.
#[derive(Clone)]
pub struct RedisCache {
    connection: MultiplexedConnection,
}

impl RedisCache {
    /// Connect to redis at `url` (e.g. `redis://localhost:6379/0`).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the URL is invalid or the initial
    /// connection fails.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!("redis connection established");
        Ok(Self { connection })
    }

    /// Issue a PING and report whether the server answered.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug_assert_eq!(pong, "PONG");
        Ok(())
    }
}

#[async_trait]
impl RevocationStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn health(&self) -> HashMap<String, String> {
        let mut status = HashMap::new();
        match self.ping().await {
            Ok(()) => {
                status.insert("status".to_string(), "up".to_string());
            }
            Err(err) => {
                status.insert("status".to_string(), "down".to_string());
                status.insert("error".to_string(), err.to_string());
            }
        }
        status
    }
}

//! User persistence over PostgreSQL.
//!
//! Manages the connection pool via sqlx and exposes the
//! [`UserRepository`] trait so handlers depend on the contract rather than
//! the concrete store.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;

pub mod config;
pub mod repository;

pub use config::DatabaseConfig;
pub use repository::{PgUserRepository, StoreError, User, UserRepository};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the pool cannot be established.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a pool without connecting eagerly. Connections are opened on
    /// first use; useful when the database may come up after the service.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect_lazy(&config.database_url)?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Report backend status for the health endpoint.
    pub async fn health(&self) -> HashMap<String, String> {
        let mut status = HashMap::new();
        match self.health_check().await {
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

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}

//! User repository trait and PostgreSQL implementation.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

/// SQLSTATE for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// User row. The password hash never leaves the service boundary.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// User store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique violation on the email column
    #[error("email already exists")]
    EmailTaken,

    /// No row matched the lookup
    #[error("user not found")]
    NotFound,

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// * `StoreError::EmailTaken` - email is already registered
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Find a user by email.
    ///
    /// # Errors
    ///
    /// * `StoreError::NotFound` - no user with that email
    async fn get_by_email(&self, email: &str) -> Result<User, StoreError>;
}

/// Default PostgreSQL implementation of [`UserRepository`]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id, email, password_hash",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            let unique_violation = err
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            if unique_violation {
                StoreError::EmailTaken
            } else {
                StoreError::Database(err)
            }
        })?;

        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
        })
    }

    async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT id, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("a@b.com"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }

    #[tokio::test]
    #[ignore = "Requires database setup"]
    async fn test_create_and_fetch_user() {
        let pool = PgPool::connect(
            &std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://postgres@localhost/gatehouse_test".to_string()),
        )
        .await
        .expect("Failed to connect to test database");
        let repo = PgUserRepository::new(pool);

        let email = format!("user{}@example.com", rand::random::<u32>());
        let created = repo.create(&email, "$argon2id$stub").await.unwrap();
        assert_eq!(created.email, email);

        let fetched = repo.get_by_email(&email).await.unwrap();
        assert_eq!(fetched.id, created.id);

        assert!(matches!(
            repo.create(&email, "$argon2id$stub").await,
            Err(StoreError::EmailTaken)
        ));

        assert!(matches!(
            repo.get_by_email("absent@example.com").await,
            Err(StoreError::NotFound)
        ));
    }
}

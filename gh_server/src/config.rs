//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Values are read once at startup; nothing re-reads the
//! environment per request.

use gatehouse::store::DatabaseConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis connection URL
    pub redis_url: String,
    /// Security configuration
    pub security: SecurityConfig,
    /// Rate limiter configuration
    pub rate_limit: RateLimitSettings,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Optional Prometheus scrape listener address
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Access token lifetime in hours
    pub access_expiry_hours: i64,
    /// Refresh token lifetime in days
    pub refresh_expiry_days: i64,
}

/// Rate limiter settings
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    /// Steady-state tokens per second per client
    pub rps: f64,
    /// Maximum instantaneous admission count per client
    pub burst: f64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Arguments
    ///
    /// * `port_override` - Optional port override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env(
        port_override: Option<u16>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = port_override.unwrap_or_else(|| parse_env_or("PORT", 8080));
        let bind: SocketAddr = SocketAddr::from(([0, 0, 0, 0], port));

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379/0".to_string());

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        let security = SecurityConfig {
            jwt_secret,
            access_expiry_hours: parse_env_or("JWT_EXPIRY_HOURS", 24),
            refresh_expiry_days: parse_env_or("REFRESH_TOKEN_EXPIRY_DAYS", 30),
        };

        let rate_limit = RateLimitSettings {
            rps: parse_env_or("RATE_LIMIT_RPS", 10.0),
            burst: parse_env_or("RATE_LIMIT_BURST", 20.0),
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        let metrics_bind = std::env::var("METRICS_BIND")
            .ok()
            .and_then(|addr| addr.parse().ok());

        Ok(ServerConfig {
            bind,
            database,
            redis_url,
            security,
            rate_limit,
            cors_origins,
            metrics_bind,
        })
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.access_expiry_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRY_HOURS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.security.refresh_expiry_days <= 0 {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_EXPIRY_DAYS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limit.rps <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_RPS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limit.burst < 1.0 {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_BURST".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.rate_limit.burst < self.rate_limit.rps {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_BURST".to_string(),
                reason: format!(
                    "Must be at least the refill rate ({})",
                    self.rate_limit.rps
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind: "0.0.0.0:8080".parse().unwrap(),
            database: DatabaseConfig {
                database_url: "postgres://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
            },
            redis_url: "redis://localhost:6379/0".to_string(),
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                access_expiry_hours: 24,
                refresh_expiry_days: 30,
            },
            rate_limit: RateLimitSettings {
                rps: 10.0,
                burst: 20.0,
            },
            cors_origins: vec!["http://localhost:3000".to_string()],
            metrics_bind: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_zero_rps_rejected() {
        let mut config = test_config();
        config.rate_limit.rps = 0.0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn test_burst_below_rps_rejected() {
        let mut config = test_config();
        config.rate_limit.burst = 5.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_BURST"));
    }

    #[test]
    fn test_negative_expiry_rejected() {
        let mut config = test_config();
        config.security.access_expiry_hours = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }
}

//! Authentication service over HTTP/JSON.
//!
//! Wires the gatehouse primitives together: PostgreSQL-backed users, a
//! redis-backed token blacklist, the Argon2id worker pool, and per-client
//! rate limiting.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use gatehouse::cache::{RedisCache, RevocationStore};
use gatehouse::hasher::Dispatcher;
use gatehouse::limiter::{RateLimiter, RateLimiterConfig};
use gatehouse::store::{Database, PgUserRepository};
use gatehouse::token::TokenService;
use pico_args::Arguments;

use gh_server::api;
use gh_server::config::ServerConfig;
use gh_server::{logging, metrics};

const HELP: &str = "\
Run the authentication service

USAGE:
  gh_server [OPTIONS]

OPTIONS:
  --port       PORT        HTTP listen port            [default: env PORT or 8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  PORT                     HTTP listen port
  DATABASE_URL             PostgreSQL connection string
  REDIS_URL                Redis connection string
  JWT_SECRET               JWT signing secret (required)
  JWT_EXPIRY_HOURS         Access token lifetime in hours (default 24)
  REFRESH_TOKEN_EXPIRY_DAYS Refresh token lifetime in days (default 30)
  RATE_LIMIT_RPS           Per-client refill rate (default 10)
  RATE_LIMIT_BURST         Per-client burst size (default 20)
  CORS_ORIGINS             Comma-separated allowed origins
  METRICS_BIND             Prometheus scrape address (optional)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // dotenvy does NOT override variables already set in the environment.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let port_override: Option<u16> = pargs.opt_value_from_str("--port")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(port_override, database_url_override)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    tracing::info!("Configuration loaded and validated");

    if let Some(metrics_addr) = config.metrics_bind {
        match metrics::init_metrics(metrics_addr) {
            Ok(()) => tracing::info!("Metrics endpoint at http://{}/metrics", metrics_addr),
            Err(e) => tracing::warn!("Failed to initialize metrics: {}", e),
        }
    }

    tracing::info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Connecting to redis at {}", config.redis_url);
    let cache = RedisCache::connect(&config.redis_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to redis: {}", e))?;
    let cache: Arc<dyn RevocationStore> = Arc::new(cache);

    let mut hasher = Dispatcher::new();
    hasher.start();
    let hasher = Arc::new(hasher);

    let limiter = RateLimiter::new(RateLimiterConfig {
        rps: config.rate_limit.rps,
        burst: config.rate_limit.burst,
        ..RateLimiterConfig::default()
    });
    limiter.start();

    let tokens = Arc::new(TokenService::new(
        config.security.jwt_secret.clone(),
        chrono::Duration::hours(config.security.access_expiry_hours),
        chrono::Duration::days(config.security.refresh_expiry_days),
        cache.clone(),
    ));

    let state = api::AppState {
        users: Arc::new(PgUserRepository::new(db.pool().clone())),
        hasher,
        tokens,
        cache,
        db,
        http: api::http_client()?,
    };

    let app = api::create_router(state, limiter.clone(), api::cors_layer(&config.cors_origins));

    tracing::info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Shutting down");
    limiter.stop().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}

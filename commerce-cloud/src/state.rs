//! Application state

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::config::Config;
use crate::error::BoxError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Session token service
    pub jwt: Arc<JwtService>,
    /// Rate limiter for the login route
    pub rate_limiter: RateLimiter,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl AppState {
    /// Connect the pool, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self::from_parts(
            pool,
            JwtService::with_config(JwtConfig::from_config(config)),
            config.session_cookie_secure,
        ))
    }

    /// Assemble state from an existing pool (tests use a lazy pool)
    pub fn from_parts(pool: PgPool, jwt: JwtService, cookie_secure: bool) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            rate_limiter: RateLimiter::new(),
            cookie_secure,
        }
    }
}

//! Server configuration

use crate::error::BoxError;

/// Minimum JWT secret length outside development
const MIN_JWT_SECRET_LEN: usize = 32;

/// Server configuration, loaded from the environment (`.env` supported)
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime in minutes
    pub jwt_expiry_minutes: i64,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Connection pool size
    pub db_max_connections: u32,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Directory for daily rolling log files
    pub log_dir: Option<String>,
    /// Add `Secure` to the session cookie
    pub session_cookie_secure: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) if !v.is_empty() => v,
            _ => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production-use-only")
            }
        };
        if environment != "development" && val.len() < MIN_JWT_SECRET_LEN {
            return Err(format!(
                "{name} must be at least {MIN_JWT_SECRET_LEN} characters in {environment} environment"
            )
            .into());
        }
        Ok(val)
    }

    fn env_or(name: &str, default: &str) -> String {
        std::env::var(name).unwrap_or_else(|_| default.into())
    }

    fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn env_flag(name: &str, default: bool) -> bool {
        match std::env::var(name) {
            Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
            Err(_) => default,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = Self::env_or("ENVIRONMENT", "development");
        let is_dev = environment == "development";

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::env_parse("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_minutes: Self::env_parse("JWT_EXPIRY_MINUTES", 1440),
            jwt_issuer: Self::env_or("JWT_ISSUER", "commerce-cloud"),
            jwt_audience: Self::env_or("JWT_AUDIENCE", "commerce-clients"),
            db_max_connections: Self::env_parse("DB_MAX_CONNECTIONS", 10),
            log_level: Self::env_or("LOG_LEVEL", "info"),
            log_json: Self::env_flag("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            session_cookie_secure: Self::env_flag("SESSION_COOKIE_SECURE", !is_dev),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_secret_dev_fallback() {
        let val = Config::require_secret("COMMERCE_TEST_UNSET_SECRET", "development").unwrap();
        assert!(val.starts_with("dev-"));
    }

    #[test]
    fn test_require_secret_missing_in_production() {
        let err = Config::require_secret("COMMERCE_TEST_UNSET_SECRET", "production").unwrap_err();
        assert!(err.to_string().contains("must be set"));
    }
}

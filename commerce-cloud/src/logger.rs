//! Logging Infrastructure
//!
//! Structured logging setup for development (pretty, stdout) and
//! production (JSON, optionally to a daily rolling file).

use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Default filter when `RUST_LOG` is unset
fn default_filter(level: &str) -> String {
    format!("commerce_cloud={level},shared={level},security=info,tower_http=info,sqlx=warn")
}

/// Initialize the global subscriber from configuration
pub fn init_logger(config: &Config) {
    init_logger_with_file(
        &config.log_level,
        config.log_json,
        config.log_dir.as_deref(),
    );
}

/// Initialize the logger with optional file output
pub fn init_logger_with_file(log_level: &str, json: bool, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // File output only if the directory exists
    let file_appender = log_dir
        .map(Path::new)
        .filter(|p| p.is_dir())
        .map(|p| tracing_appender::rolling::daily(p, "commerce-cloud"));

    match (file_appender, json) {
        (Some(appender), true) => subscriber.json().with_writer(appender).init(),
        (Some(appender), false) => subscriber.with_ansi(false).with_writer(appender).init(),
        (None, true) => subscriber.json().init(),
        (None, false) => subscriber.init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_level() {
        let f = default_filter("debug");
        assert!(f.contains("commerce_cloud=debug"));
        assert!(f.contains("security=info"));
        assert!(EnvFilter::try_new(f).is_ok());
    }
}

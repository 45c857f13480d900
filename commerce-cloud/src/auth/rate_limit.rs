//! Application-layer rate limiting for the login route

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::security_log;
use crate::state::AppState;

/// Login attempts allowed per IP and window
pub const LOGIN_MAX_ATTEMPTS: u32 = 5;
pub const LOGIN_WINDOW_SECS: u64 = 60;

/// Entries idle longer than this are dropped by [`RateLimiter::cleanup`]
const ENTRY_TTL: Duration = Duration::from_secs(300);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Remove entries older than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < ENTRY_TTL);
        }

        map.retain(|_, route_map| !route_map.is_empty());
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// Client IP: first `X-Forwarded-For` entry, then the peer address
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Rate limit middleware for login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if !state
        .rate_limiter
        .check("login", &ip, LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW_SECS)
        .await
    {
        security_log!("WARN", "login_rate_limited", ip = ip);
        return Err(AppError::with_message(
            ErrorCode::RateLimited,
            "Too many login attempts, try again later",
        )
        .with_detail("retry_after_secs", LOGIN_WINDOW_SECS));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_limit_per_ip() {
        let limiter = RateLimiter::new();
        for _ in 0..LOGIN_MAX_ATTEMPTS {
            assert!(limiter.check("login", "10.0.0.1", LOGIN_MAX_ATTEMPTS, 60).await);
        }
        assert!(!limiter.check("login", "10.0.0.1", LOGIN_MAX_ATTEMPTS, 60).await);
        // other clients are unaffected
        assert!(limiter.check("login", "10.0.0.2", LOGIN_MAX_ATTEMPTS, 60).await);
    }

    #[tokio::test]
    async fn test_expired_window_resets() {
        let limiter = RateLimiter::new();
        // a zero-length window is always expired
        for _ in 0..10 {
            assert!(limiter.check("login", "ip", 1, 0).await);
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "a", 5, 60).await;
        limiter.check("login", "b", 5, 60).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, 2);
        assert!(limiter.check("login", "a", 2, 60).await);
        assert!(!limiter.check("login", "a", 2, 60).await);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let req = http::Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&req), "203.0.113.9");

        let req = http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_ip(&req), "unknown");
    }
}

//! Request correlation and request logging
//!
//! `SetRequestIdLayer` guarantees every request carries `x-request-id`
//! (client supplied or a fresh UUID v4). [`correlate`] binds that id as the
//! task-local correlation for the rest of the stack, so every envelope,
//! including 401/403 from middleware and the 404 fallback, reports it.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use http::{HeaderName, HeaderValue};
use std::time::Instant;
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest client-supplied request id accepted verbatim
const MAX_REQUEST_ID_LEN: usize = 128;

/// UUID v4 request id generator
#[derive(Clone, Default)]
pub struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Correlation id for a request: the `x-request-id` header when usable,
/// otherwise a fresh UUID
pub fn request_correlation(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Bind the correlation id and log request completion
pub async fn correlate(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let correlation = request_correlation(&req);

    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let scoped = correlation.clone();
    let mut response = shared::correlation::scope(scoped, next.run(req)).await;

    // require_auth copies the caller onto the response
    let user = response
        .extensions()
        .get::<CurrentUser>()
        .map(|u| format!("{}({})", u.email, u.id));

    // A replaced client id must not be echoed back by the propagation layer
    if let Ok(value) = HeaderValue::from_str(&correlation) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let latency = start.elapsed();
    let status = response.status();
    if status.is_server_error() || status.is_client_error() {
        warn!(
            correlation = %correlation,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            user = ?user,
            "Request completed with error"
        );
    } else {
        info!(
            correlation = %correlation,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            user = ?user,
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_correlation_from_header() {
        let req = http::Request::builder()
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_correlation(&req), "abc-123");
    }

    #[test]
    fn test_request_correlation_generated() {
        let req = http::Request::builder().body(Body::empty()).unwrap();
        let id = request_correlation(&req);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_oversized_request_id_replaced() {
        let req = http::Request::builder()
            .header("x-request-id", "x".repeat(MAX_REQUEST_ID_LEN + 1))
            .body(Body::empty())
            .unwrap();
        assert!(Uuid::parse_str(&request_correlation(&req)).is_ok());
    }

    #[test]
    fn test_make_request_id() {
        let req = http::Request::builder().body(()).unwrap();
        let id = XRequestId.make_request_id(&req).unwrap();
        assert!(Uuid::parse_str(id.header_value().to_str().unwrap()).is_ok());
    }
}

//! Authentication middleware
//!
//! Axum middleware for session resolution and permission checks

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};

use super::session::{JwtError, TokenSource, token_from_headers};
use super::CurrentUser;
use crate::security_log;
use crate::state::AppState;

/// Paths reachable without a session
fn is_public_path(path: &str) -> bool {
    !path.starts_with("/api/")
        || path == "/api/health"
        || path.starts_with("/api/health/")
        || path == "/api/auth/login"
}

/// Authentication middleware, requires a valid session
///
/// Reads `Authorization: Bearer <token>` first, then the `session` cookie.
/// On success the [`CurrentUser`] is inserted into the request extensions,
/// and copied onto the response for request logging.
///
/// # Skipped
///
/// - `OPTIONS *` (CORS preflight)
/// - non `/api/` paths (including `/health*`)
/// - `/api/health`, `/api/auth/login`
///
/// # Errors
///
/// | Error | HTTP status |
/// |------|------------|
/// | no token | 401 NotAuthenticated |
/// | expired | 401 TokenExpired |
/// | invalid token or claims | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS || is_public_path(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let token = match token_from_headers(req.headers()) {
        TokenSource::Bearer(token) | TokenSource::Cookie(token) => token.to_string(),
        TokenSource::MalformedHeader => {
            security_log!("WARN", "auth_malformed_header", uri = req.uri().to_string());
            return Err(AppError::invalid_token("Invalid authorization header"));
        }
        TokenSource::Missing => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::not_authenticated());
        }
    };

    match state.jwt.resolve(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user.clone());
            let mut response = next.run(req).await;
            response.extensions_mut().insert(user);
            Ok(response)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                uri = req.uri().to_string()
            );
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Permission middleware, requires a specific permission
///
/// # Usage
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/products", get(handler::list))
///     .layer(middleware::from_fn(require_permission("products:read")));
/// ```
///
/// Missing permission returns 403 PermissionDenied.
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req.current_user()?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    email = user.email.clone(),
                    role = user.role.as_str(),
                    required_permission = permission
                );
                return Err(AppError::permission_denied(format!(
                    "Permission denied: {}",
                    permission
                ))
                .with_detail("permission", permission));
            }

            Ok(next.run(req).await)
        })
    }
}

/// Platform administrator middleware
///
/// Non super-admins get 403 AdminRequired.
pub async fn require_super_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_super_admin() {
        security_log!(
            "WARN",
            "super_admin_required",
            user_id = user.id,
            email = user.email.clone(),
            role = user.role.as_str()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

/// Read the [`CurrentUser`] placed by [`require_auth`]
pub trait CurrentUserExt {
    /// 401 NotAuthenticated when the request carries no session
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or_else(AppError::not_authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/health/ready"));
        assert!(is_public_path("/api/health"));
        assert!(is_public_path("/api/health/ready"));
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/favicon.ico"));

        assert!(!is_public_path("/api/auth/me"));
        assert!(!is_public_path("/api/auth/logout"));
        assert!(!is_public_path("/api/healthz"));
        assert!(!is_public_path("/api/orders"));
    }
}

//! Authentication handlers

use axum::{extract::State, response::IntoResponse};
use http::header::SET_COOKIE;
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{OrganizationStatus, Role, User};

use crate::ServiceError;
use crate::api::{ApiResult, audit};
use crate::auth::permissions::permissions_for;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::auth::{CurrentUser, OrgScope};
use crate::db;
use crate::extract::Json;
use crate::security_log;
use crate::state::AppState;
use crate::util::{dummy_hash, verify_password};
use crate::validation::normalize_email;

const RESOURCE: &str = "session";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub permissions: &'static [&'static str],
}

/// POST /api/auth/login - exchange credentials for a session token
///
/// The token is returned in the body and set as the `session` cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let email = normalize_email(&req.email);

    let Some(credentials) = db::users::find_credentials(&state.pool, &email).await? else {
        // Same hashing cost as a real account
        let _ = verify_password(&req.password, dummy_hash());
        security_log!("WARN", "login_unknown_email", email = email);
        return Err(AppError::invalid_credentials().into());
    };

    if !verify_password(&req.password, &credentials.hashed_password) {
        security_log!(
            "WARN",
            "login_bad_password",
            user_id = credentials.user.id,
            email = email
        );
        return Err(AppError::invalid_credentials().into());
    }

    let user = credentials.user;
    if !user.is_active {
        security_log!("WARN", "login_account_disabled", user_id = user.id);
        return Err(AppError::new(ErrorCode::AccountDisabled).into());
    }

    if let Some(status) = credentials.organization_status.as_deref()
        && !OrganizationStatus::from_db(status).is_some_and(|s| s.can_login())
    {
        security_log!(
            "WARN",
            "login_tenant_suspended",
            user_id = user.id,
            organization_id = user.organization_id.unwrap_or_default()
        );
        return Err(AppError::new(ErrorCode::TenantSuspended).into());
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|e: shared::models::UnknownRole| ServiceError::Db(e.into()))?;
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role,
        organization_id: user.organization_id,
        customer_id: user.customer_id,
    };

    let token = state.jwt.issue(&current).map_err(|e| {
        tracing::error!(error = %e, "Session token creation failed");
        AppError::new(ErrorCode::InternalError)
    })?;
    let expires_in = state.jwt.lifetime_seconds();

    audit(&state, &current, user.organization_id, "login", RESOURCE, Some(user.id), None).await;
    tracing::info!(user_id = user.id, role = %role, "User logged in");

    let cookie = session_cookie(&token, expires_in, state.cookie_secure);
    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::success(LoginResponse {
            token,
            expires_in,
            user,
        }),
    ))
}

/// POST /api/auth/logout - clear the session cookie
///
/// Tokens are stateless; a bearer token stays valid until it expires.
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    audit(&state, &user, user.organization_id, "logout", RESOURCE, Some(user.id), None).await;
    (
        [(SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        ApiResponse::ok(),
    )
}

/// GET /api/auth/me - the signed-in user and their grants
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<MeResponse> {
    let scope = user.organization_id.map_or(OrgScope::All, OrgScope::Org);
    let row = db::users::find_by_id(&state.pool, scope, user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(ApiResponse::success(MeResponse {
        user: row,
        permissions: permissions_for(user.role),
    }))
}

//! User account handlers
//!
//! Role rules enforced here:
//! - only a platform administrator creates another platform administrator
//! - the SUPER_ADMIN role is never assigned by update
//! - a CUSTOMER account links exactly one customer of the same organization
//! - nobody deletes their own account

use axum::extract::State;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Role, User, UserCreate, UserUpdate};
use shared::response::{PageRequest, PaginatedResponse};

use crate::api::{ApiResult, audit, paged};
use crate::auth::TenantContext;
use crate::db;
use crate::db::users::{NewUser, UserChanges, UserFilter};
use crate::extract::{Json, Path, Query};
use crate::state::AppState;
use crate::util::hash_password;
use crate::validation::{
    MAX_NAME_LEN, normalize_email, validate_email, validate_password, validate_required_text,
};
use crate::{ServiceError, ServiceResult, security_log};

const RESOURCE: &str = "user";

fn hash(password: &str) -> ServiceResult<String> {
    hash_password(password).map_err(|e| ServiceError::Db(e.to_string().into()))
}

/// The customer exists in `organization_id` and has no other account
async fn check_customer_link(
    state: &AppState,
    organization_id: i64,
    customer_id: i64,
    except_user: Option<i64>,
) -> ServiceResult<()> {
    let mut conn = state.pool.acquire().await?;
    if !db::exists_in_org(&mut conn, "customers", customer_id, organization_id).await? {
        return Err(AppError::new(ErrorCode::CustomerNotFound).into());
    }
    drop(conn);
    if db::users::customer_link_taken(&state.pool, customer_id, except_user).await? {
        return Err(AppError::conflict("Customer is already linked to another account")
            .with_detail("customer_id", customer_id)
            .into());
    }
    Ok(())
}

/// GET /api/users - accounts in scope
pub async fn list(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<PaginatedResponse<User>> {
    let rows = db::users::list(&state.pool, ctx.scope, &filter, &page).await?;
    Ok(paged(rows, &page))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    let user = db::users::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(ApiResponse::success(user))
}

/// POST /api/users - create an account
///
/// The account joins the caller's write organization, except a
/// SUPER_ADMIN account which belongs to none.
pub async fn create(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(payload): Json<UserCreate>,
) -> ApiResult<User> {
    let email = normalize_email(&payload.email);
    validate_email(&email, "email")?;
    validate_password(&payload.password)?;
    validate_required_text(&payload.display_name, "display_name", MAX_NAME_LEN)?;

    let organization_id = if payload.role == Role::SuperAdmin {
        if !ctx.user.is_super_admin() {
            security_log!(
                "WARN",
                "role_escalation_attempt",
                user_id = ctx.user.id,
                role = ctx.user.role.as_str()
            );
            return Err(AppError::with_message(
                ErrorCode::RoleNotAssignable,
                "Only a platform administrator can create platform administrators",
            )
            .into());
        }
        None
    } else {
        Some(ctx.write_org()?)
    };

    let customer_id = match (payload.role, organization_id) {
        (Role::Customer, Some(org)) => {
            let customer_id = payload.customer_id.ok_or_else(|| {
                AppError::with_message(ErrorCode::RequiredField, "customer_id is required for CUSTOMER accounts")
                    .with_detail("field", "customer_id")
            })?;
            check_customer_link(&state, org, customer_id, None).await?;
            Some(customer_id)
        }
        _ => None,
    };

    let hashed_password = hash(&payload.password)?;
    let now = shared::util::now_millis();
    let user = db::users::create(
        &state.pool,
        &NewUser {
            email: &email,
            hashed_password: &hashed_password,
            display_name: payload.display_name.trim(),
            role: payload.role,
            organization_id,
            customer_id,
        },
        now,
    )
    .await?;

    audit(
        &state,
        &ctx.user,
        organization_id,
        "create",
        RESOURCE,
        Some(user.id),
        Some(serde_json::json!({ "role": payload.role.as_str() })),
    )
    .await;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/{id} - profile, password, role or activation
pub async fn update(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> ApiResult<User> {
    if let Some(name) = &payload.display_name {
        validate_required_text(name, "display_name", MAX_NAME_LEN)?;
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }

    let existing = db::users::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    let current_role: Role = existing
        .role
        .parse()
        .map_err(|e: shared::models::UnknownRole| ServiceError::Db(e.into()))?;

    if let Some(role) = payload.role
        && role != current_role
        && (role == Role::SuperAdmin || current_role == Role::SuperAdmin)
    {
        return Err(AppError::with_message(
            ErrorCode::RoleNotAssignable,
            "The platform administrator role cannot be assigned or removed",
        )
        .into());
    }

    let role = payload.role.unwrap_or(current_role);
    let customer_id = if role == Role::Customer {
        let customer_id = payload.customer_id.or(existing.customer_id).ok_or_else(|| {
            AppError::with_message(ErrorCode::RequiredField, "customer_id is required for CUSTOMER accounts")
                .with_detail("field", "customer_id")
        })?;
        if Some(customer_id) != existing.customer_id
            && let Some(org) = existing.organization_id
        {
            check_customer_link(&state, org, customer_id, Some(id)).await?;
        }
        Some(customer_id)
    } else {
        None
    };

    let hashed_password = payload.password.as_deref().map(hash).transpose()?;
    let changes = UserChanges {
        display_name: payload.display_name.as_deref().map(str::trim),
        hashed_password: hashed_password.as_deref(),
        role: payload.role,
        customer_id: customer_id.filter(|c| Some(*c) != existing.customer_id),
        is_active: payload.is_active,
    };

    let now = shared::util::now_millis();
    let user = db::users::update(&state.pool, ctx.scope, id, &changes, now).await?;

    audit(
        &state,
        &ctx.user,
        user.organization_id,
        "update",
        RESOURCE,
        Some(user.id),
        Some(serde_json::json!({
            "role": payload.role.map(|r| r.as_str()),
            "is_active": payload.is_active,
            "password_changed": payload.password.is_some(),
        })),
    )
    .await;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if id == ctx.user.id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf).into());
    }
    let user = db::users::find_by_id(&state.pool, ctx.scope, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    db::users::delete(&state.pool, ctx.scope, id).await?;

    audit(&state, &ctx.user, user.organization_id, "delete", RESOURCE, Some(id), None).await;
    Ok(ApiResponse::ok())
}

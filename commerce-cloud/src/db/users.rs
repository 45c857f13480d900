//! User account operations

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, User};
use shared::response::PageRequest;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str =
    "id, email, display_name, role, organization_id, customer_id, is_active, created_at, updated_at";

/// Login lookup: the user, its password hash and its organization status
#[derive(Debug, sqlx::FromRow)]
pub struct Credentials {
    #[sqlx(flatten)]
    pub user: User,
    pub hashed_password: String,
    pub organization_status: Option<String>,
}

/// List filters (`?role=STAFF&q=ann`)
#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub q: Option<String>,
}

/// Validated insert
pub struct NewUser<'a> {
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub display_name: &'a str,
    pub role: Role,
    pub organization_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// Validated update, `None` keeps the current value
#[derive(Default)]
pub struct UserChanges<'a> {
    pub display_name: Option<&'a str>,
    pub hashed_password: Option<&'a str>,
    pub role: Option<Role>,
    pub customer_id: Option<i64>,
    pub is_active: Option<bool>,
}

pub async fn find_credentials(pool: &PgPool, email: &str) -> ServiceResult<Option<Credentials>> {
    let row = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.display_name, u.role, u.organization_id, u.customer_id,
               u.is_active, u.created_at, u.updated_at, u.hashed_password,
               o.status AS organization_status
        FROM users u
        LEFT JOIN organizations o ON o.id = u.organization_id
        WHERE u.email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: OrgScope, filter: &UserFilter) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = super::like_pattern(q);
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR display_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &UserFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<User>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users WHERE TRUE"));
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<Option<User>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, user: &NewUser<'_>, now: i64) -> ServiceResult<User> {
    let row = sqlx::query_as(&format!(
        "INSERT INTO users (email, hashed_password, display_name, role, organization_id, customer_id,
                            is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
         RETURNING {COLUMNS}"
    ))
    .bind(user.email)
    .bind(user.hashed_password)
    .bind(user.display_name)
    .bind(user.role.as_str())
    .bind(user.organization_id)
    .bind(user.customer_id)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Apply changes; a role change away from CUSTOMER clears the customer link
pub async fn update(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    changes: &UserChanges<'_>,
    now: i64,
) -> ServiceResult<User> {
    let mut qb = QueryBuilder::new("UPDATE users SET updated_at = ");
    qb.push_bind(now);
    if let Some(name) = changes.display_name {
        qb.push(", display_name = ").push_bind(name);
    }
    if let Some(hash) = changes.hashed_password {
        qb.push(", hashed_password = ").push_bind(hash);
    }
    if let Some(role) = changes.role {
        qb.push(", role = ").push_bind(role.as_str());
        if role != Role::Customer && changes.customer_id.is_none() {
            qb.push(", customer_id = NULL");
        }
    }
    if let Some(customer_id) = changes.customer_id {
        qb.push(", customer_id = ").push_bind(customer_id);
    }
    if let Some(active) = changes.is_active {
        qb.push(", is_active = ").push_bind(active);
    }
    qb.push(" WHERE id = ").push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(format!(" RETURNING {COLUMNS}"));

    let row = qb.build_query_as().fetch_optional(pool).await?;
    row.ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
}

pub async fn delete(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<()> {
    let mut qb = QueryBuilder::new("DELETE FROM users WHERE id = ");
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let result = qb.build().execute(pool).await?;
    super::ensure_affected(result.rows_affected(), || AppError::new(ErrorCode::UserNotFound))
}

/// Active user of the organization (ticket assignee check)
pub async fn is_active_member(
    conn: &mut PgConnection,
    organization_id: i64,
    id: i64,
) -> ServiceResult<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND organization_id = $2 AND is_active)",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Customer linked to another user account, if any
pub async fn customer_link_taken(
    pool: &PgPool,
    customer_id: i64,
    except_user: Option<i64>,
) -> ServiceResult<bool> {
    let (taken,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE customer_id = $1 AND id IS DISTINCT FROM $2)",
    )
    .bind(customer_id)
    .bind(except_user)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

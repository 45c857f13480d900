//! Customer operations

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};
use shared::response::PageRequest;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str =
    "id, organization_id, name, email, phone, address, notes, created_at, updated_at";

#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilter {
    /// Matches name, email or phone
    pub q: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: OrgScope, filter: &CustomerFilter) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = super::like_pattern(q);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &CustomerFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<Customer>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM customers WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM customers WHERE TRUE"));
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY name, id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<Option<Customer>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM customers WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &CustomerCreate,
    now: i64,
) -> ServiceResult<Customer> {
    let row = sqlx::query_as(&format!(
        "INSERT INTO customers (organization_id, name, email, phone, address, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(&data.name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.address)
    .bind(&data.notes)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    data: &CustomerUpdate,
    now: i64,
) -> ServiceResult<Customer> {
    let mut qb = QueryBuilder::new("UPDATE customers SET updated_at = ");
    qb.push_bind(now);
    if let Some(name) = &data.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(email) = &data.email {
        qb.push(", email = ").push_bind(email);
    }
    if let Some(phone) = &data.phone {
        qb.push(", phone = ").push_bind(phone);
    }
    if let Some(address) = &data.address {
        qb.push(", address = ").push_bind(address);
    }
    if let Some(notes) = &data.notes {
        qb.push(", notes = ").push_bind(notes);
    }
    qb.push(" WHERE id = ").push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(format!(" RETURNING {COLUMNS}"));

    let row = qb.build_query_as().fetch_optional(pool).await?;
    row.ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound).into())
}

/// Customers referenced by orders, invoices or a user account cannot be
/// deleted (foreign key violation, 400)
pub async fn delete(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<()> {
    let mut qb = QueryBuilder::new("DELETE FROM customers WHERE id = ");
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let result = qb.build().execute(pool).await?;
    super::ensure_affected(result.rows_affected(), || {
        AppError::new(ErrorCode::CustomerNotFound)
    })
}

//! Supplier operations

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Supplier, SupplierCreate, SupplierUpdate};
use shared::response::PageRequest;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str = "id, organization_id, name, contact_name, email, phone, address, notes, \
                       is_active, created_at, updated_at";

#[derive(Debug, Default, Deserialize)]
pub struct SupplierFilter {
    pub q: Option<String>,
    pub is_active: Option<bool>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: OrgScope, filter: &SupplierFilter) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = super::like_pattern(q);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR contact_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &SupplierFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<Supplier>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM suppliers WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM suppliers WHERE TRUE"));
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY name, id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<Option<Supplier>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM suppliers WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &SupplierCreate,
    now: i64,
) -> ServiceResult<Supplier> {
    let row = sqlx::query_as(&format!(
        "INSERT INTO suppliers (organization_id, name, contact_name, email, phone, address, notes,
                                is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $8)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(&data.name)
    .bind(&data.contact_name)
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
    data: &SupplierUpdate,
    now: i64,
) -> ServiceResult<Supplier> {
    let mut qb = QueryBuilder::new("UPDATE suppliers SET updated_at = ");
    qb.push_bind(now);
    if let Some(name) = &data.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(contact_name) = &data.contact_name {
        qb.push(", contact_name = ").push_bind(contact_name);
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
    if let Some(active) = data.is_active {
        qb.push(", is_active = ").push_bind(active);
    }
    qb.push(" WHERE id = ").push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(format!(" RETURNING {COLUMNS}"));

    let row = qb.build_query_as().fetch_optional(pool).await?;
    row.ok_or_else(|| AppError::new(ErrorCode::SupplierNotFound).into())
}

/// Suppliers with purchase orders are kept for history
pub async fn delete(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let mut qb = QueryBuilder::new("SELECT organization_id FROM suppliers WHERE id = ");
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" FOR UPDATE");
    let row: Option<(i64,)> = qb.build_query_as().fetch_optional(&mut *tx).await?;
    if row.is_none() {
        return Err(AppError::new(ErrorCode::SupplierNotFound).into());
    }

    let (has_orders,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE supplier_id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if has_orders {
        return Err(AppError::new(ErrorCode::SupplierHasPurchaseOrders).into());
    }

    sqlx::query("DELETE FROM suppliers WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

//! Invoice operations

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Invoice, InvoiceCreate, InvoiceStatus};
use shared::response::PageRequest;
use shared::util::{document_number, round_money};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str = "id, organization_id, invoice_number, order_id, customer_id, amount, status, \
                       due_at, issued_at, paid_at, notes, created_at, updated_at";

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<i64>,
    pub order_id: Option<i64>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: OrgScope, filter: &InvoiceFilter) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(order_id) = filter.order_id {
        qb.push(" AND order_id = ").push_bind(order_id);
    }
}

pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    filter: &InvoiceFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<Invoice>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM invoices WHERE TRUE");
    push_filters(&mut count, scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM invoices WHERE TRUE"));
    push_filters(&mut qb, scope, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(pool: &PgPool, scope: OrgScope, id: i64) -> ServiceResult<Option<Invoice>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM invoices WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

/// Create a draft invoice
///
/// With an order, the amount defaults to the order total and the customer
/// to the order's customer. Without one, `amount` is required.
pub async fn create(
    pool: &PgPool,
    organization_id: i64,
    data: &InvoiceCreate,
    now: i64,
) -> ServiceResult<Invoice> {
    let mut tx = pool.begin().await?;

    let mut amount = data.amount.map(round_money);
    let mut customer_id = data.customer_id;

    if let Some(order_id) = data.order_id {
        let order: Option<(Decimal, Option<i64>)> = sqlx::query_as(
            "SELECT total, customer_id FROM orders WHERE id = $1 AND organization_id = $2",
        )
        .bind(order_id)
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((total, order_customer)) = order else {
            return Err(AppError::new(ErrorCode::OrderNotFound).into());
        };
        amount = amount.or(Some(total));
        customer_id = customer_id.or(order_customer);
    }

    if let Some(customer_id) = customer_id
        && !super::exists_in_org(&mut tx, "customers", customer_id, organization_id).await?
    {
        return Err(AppError::new(ErrorCode::CustomerNotFound).into());
    }

    let Some(amount) = amount else {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "amount is required for an invoice without an order",
        )
        .with_detail("field", "amount")
        .into());
    };

    let invoice = sqlx::query_as(&format!(
        "INSERT INTO invoices (organization_id, invoice_number, order_id, customer_id, amount, status,
                               due_at, notes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(organization_id)
    .bind(document_number("INV"))
    .bind(data.order_id)
    .bind(customer_id)
    .bind(amount)
    .bind(InvoiceStatus::Draft.as_db())
    .bind(data.due_at)
    .bind(&data.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(invoice)
}

/// `draft → issued | void`, `issued → paid | void`
pub async fn change_status(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    next: InvoiceStatus,
    now: i64,
) -> ServiceResult<Invoice> {
    let mut tx = pool.begin().await?;

    let mut qb = QueryBuilder::new("SELECT status FROM invoices WHERE id = ");
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" FOR UPDATE");
    let row: Option<(String,)> = qb.build_query_as().fetch_optional(&mut *tx).await?;
    let Some((status,)) = row else {
        return Err(AppError::new(ErrorCode::InvoiceNotFound).into());
    };
    let current = InvoiceStatus::from_db(&status)
        .ok_or_else(|| AppError::internal(format!("Unknown invoice status: {status}")))?;

    if !current.can_transition_to(next) {
        return Err(AppError::invalid_transition(current.as_db(), next.as_db()).into());
    }

    let invoice = sqlx::query_as(&format!(
        "UPDATE invoices SET
            status = $2,
            issued_at = CASE WHEN $2 = 'issued' THEN $3 ELSE issued_at END,
            paid_at = CASE WHEN $2 = 'paid' THEN $3 ELSE paid_at END,
            updated_at = $3
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(next.as_db())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(invoice)
}

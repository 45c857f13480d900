//! Loyalty accounts and point transactions
//!
//! Accounts are created on first use, one per customer. The balance is
//! guarded by `points_balance >= 0` in every update.

use shared::error::{AppError, ErrorCode};
use shared::models::{LoyaltyAccount, LoyaltyTransaction};
use shared::response::PageRequest;
use sqlx::{PgConnection, PgPool, QueryBuilder};

use crate::ServiceResult;
use crate::auth::OrgScope;

const COLUMNS: &str =
    "id, organization_id, customer_id, points_balance, lifetime_points, created_at, updated_at";

const TX_COLUMNS: &str =
    "id, organization_id, account_id, delta, reason, order_id, created_by, created_at";

/// Reason recorded when a paid order earns points
pub const REASON_ORDER_PAID: &str = "order_paid";
/// Reason recorded when a refund takes earned points back
pub const REASON_ORDER_REFUNDED: &str = "order_refunded";

pub async fn list_accounts(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    page: &PageRequest,
) -> ServiceResult<(Vec<LoyaltyAccount>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM loyalty_accounts WHERE TRUE");
    scope.push_org_filter(&mut count, "organization_id");
    if let Some(customer_id) = customer_scope {
        count.push(" AND customer_id = ").push_bind(customer_id);
    }
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM loyalty_accounts WHERE TRUE"));
    scope.push_org_filter(&mut qb, "organization_id");
    if let Some(customer_id) = customer_scope {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    qb.push(" ORDER BY points_balance DESC, id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_customer(
    pool: &PgPool,
    scope: OrgScope,
    customer_id: i64,
) -> ServiceResult<Option<LoyaltyAccount>> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM loyalty_accounts WHERE customer_id = "
    ));
    qb.push_bind(customer_id);
    scope.push_org_filter(&mut qb, "organization_id");
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn list_transactions(
    pool: &PgPool,
    account_id: i64,
    page: &PageRequest,
) -> ServiceResult<(Vec<LoyaltyTransaction>, i64)> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM loyalty_transactions WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(pool)
            .await?;
    let rows = sqlx::query_as(&format!(
        "SELECT {TX_COLUMNS} FROM loyalty_transactions WHERE account_id = $1
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(account_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok((rows, total))
}

/// Get or create the account of a customer
async fn ensure_account(
    conn: &mut PgConnection,
    organization_id: i64,
    customer_id: i64,
    now: i64,
) -> ServiceResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO loyalty_accounts (organization_id, customer_id, points_balance, lifetime_points, created_at, updated_at)
         VALUES ($1, $2, 0, 0, $3, $3)
         ON CONFLICT (customer_id) DO UPDATE SET updated_at = loyalty_accounts.updated_at
         RETURNING id",
    )
    .bind(organization_id)
    .bind(customer_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Change a balance and record the transaction
///
/// Positive deltas also count towards lifetime points. A delta that would
/// take the balance below zero fails with `LoyaltyInsufficientPoints`.
#[allow(clippy::too_many_arguments)]
pub async fn apply(
    conn: &mut PgConnection,
    organization_id: i64,
    customer_id: i64,
    delta: i64,
    reason: &str,
    order_id: Option<i64>,
    created_by: Option<i64>,
    now: i64,
) -> ServiceResult<LoyaltyAccount> {
    let account_id = ensure_account(conn, organization_id, customer_id, now).await?;

    let row: Option<LoyaltyAccount> = sqlx::query_as(&format!(
        "UPDATE loyalty_accounts SET
            points_balance = points_balance + $2,
            lifetime_points = lifetime_points + GREATEST($2, 0),
            updated_at = $3
         WHERE id = $1 AND points_balance + $2 >= 0
         RETURNING {COLUMNS}"
    ))
    .bind(account_id)
    .bind(delta)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(account) = row else {
        return Err(AppError::new(ErrorCode::LoyaltyInsufficientPoints)
            .with_detail("delta", delta)
            .into());
    };

    sqlx::query(
        "INSERT INTO loyalty_transactions (organization_id, account_id, delta, reason, order_id, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(organization_id)
    .bind(account_id)
    .bind(delta)
    .bind(reason)
    .bind(order_id)
    .bind(created_by)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(account)
}

/// Net points an order has earned so far
pub async fn points_from_order(conn: &mut PgConnection, order_id: i64) -> ServiceResult<i64> {
    let (net,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM loyalty_transactions
         WHERE order_id = $1 AND reason IN ($2, $3)",
    )
    .bind(order_id)
    .bind(REASON_ORDER_PAID)
    .bind(REASON_ORDER_REFUNDED)
    .fetch_one(&mut *conn)
    .await?;
    Ok(net)
}

/// Current balance, 0 without an account
pub async fn balance(conn: &mut PgConnection, customer_id: i64) -> ServiceResult<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT points_balance FROM loyalty_accounts WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map_or(0, |(b,)| b))
}

/// Manual adjustment of a customer's points
pub async fn adjust(
    pool: &PgPool,
    organization_id: i64,
    customer_id: i64,
    delta: i64,
    reason: &str,
    created_by: i64,
    now: i64,
) -> ServiceResult<LoyaltyAccount> {
    let mut tx = pool.begin().await?;
    if !super::exists_in_org(&mut tx, "customers", customer_id, organization_id).await? {
        return Err(AppError::new(ErrorCode::CustomerNotFound).into());
    }
    let account = apply(
        &mut tx,
        organization_id,
        customer_id,
        delta,
        reason,
        None,
        Some(created_by),
        now,
    )
    .await?;
    tx.commit().await?;
    Ok(account)
}

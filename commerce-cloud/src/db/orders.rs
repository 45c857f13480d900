//! Order operations
//!
//! Creating an order reserves stock in the same transaction that writes the
//! order; cancelling puts it back.

use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MovementReason, Order, OrderCreate, OrderDetail, OrderItem, OrderStatus,
};
use shared::response::PageRequest;
use shared::util::document_number;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::products;
use crate::ServiceResult;
use crate::auth::OrgScope;
use crate::pricing;

pub(crate) const COLUMNS: &str = "id, organization_id, order_number, customer_id, status, subtotal, \
                                  discount, tax_rate, tax, total, notes, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, sku, quantity, unit_price, line_total";

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<i64>,
    /// Created at or after (millis)
    pub from: Option<i64>,
    /// Created before (millis)
    pub to: Option<i64>,
}

/// Who an order is created for and by
pub struct OrderOwner {
    pub organization_id: i64,
    pub customer_id: Option<i64>,
    pub created_by: i64,
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: OrgScope,
    customer_scope: Option<i64>,
    filter: &OrderFilter,
) {
    scope.push_org_filter(qb, "organization_id");
    if let Some(customer_id) = customer_scope.or(filter.customer_id) {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(from) = filter.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

/// `customer_scope` restricts the listing to one customer's orders and
/// overrides any `customer_id` filter
pub async fn list(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    filter: &OrderFilter,
    page: &PageRequest,
) -> ServiceResult<(Vec<Order>, i64)> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE TRUE");
    push_filters(&mut count, scope, customer_scope, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM orders WHERE TRUE"));
    push_filters(&mut qb, scope, customer_scope, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

pub async fn find_by_id(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    id: i64,
) -> ServiceResult<Option<Order>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM orders WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    if let Some(customer_id) = customer_scope {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    let row = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row)
}

pub async fn find_detail(
    pool: &PgPool,
    scope: OrgScope,
    customer_scope: Option<i64>,
    id: i64,
) -> ServiceResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(pool, scope, customer_scope, id).await? else {
        return Ok(None);
    };
    let mut conn = pool.acquire().await?;
    let items = items_of(&mut conn, order.id).await?;
    let amount_paid = amount_paid(&mut conn, order.id).await?;
    Ok(Some(OrderDetail {
        order,
        items,
        amount_paid,
    }))
}

pub async fn items_of(conn: &mut PgConnection, order_id: i64) -> ServiceResult<Vec<OrderItem>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Sum of completed payments
pub async fn amount_paid(conn: &mut PgConnection, order_id: i64) -> ServiceResult<Decimal> {
    let (paid,): (Decimal,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE order_id = $1 AND status = 'completed'",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(paid)
}

/// Lock an order row for a status change
pub async fn lock(
    conn: &mut PgConnection,
    scope: OrgScope,
    id: i64,
) -> ServiceResult<Order> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM orders WHERE id = "));
    qb.push_bind(id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" FOR UPDATE");
    let row: Option<Order> = qb.build_query_as().fetch_optional(&mut *conn).await?;
    row.ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
}

pub fn status_of(order: &Order) -> ServiceResult<OrderStatus> {
    OrderStatus::from_db(&order.status).ok_or_else(|| {
        AppError::internal(format!("Unknown order status: {}", order.status)).into()
    })
}

pub async fn set_status_row(
    conn: &mut PgConnection,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> ServiceResult<Order> {
    let row = sqlx::query_as(&format!(
        "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_db())
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Reserve stock for one line: `stock >= quantity` guard
///
/// Returns (name, sku, price) of the product as sold.
async fn reserve_line(
    conn: &mut PgConnection,
    organization_id: i64,
    product_id: i64,
    quantity: i32,
    now: i64,
) -> ServiceResult<(String, String, Decimal)> {
    let row: Option<(String, String, Decimal)> = sqlx::query_as(
        "UPDATE products SET stock = stock - $3, updated_at = $4
         WHERE id = $1 AND organization_id = $2 AND is_active AND stock >= $3
         RETURNING name, sku, price",
    )
    .bind(product_id)
    .bind(organization_id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(sold) = row {
        return Ok(sold);
    }

    let state: Option<(bool, i32)> = sqlx::query_as(
        "SELECT is_active, stock FROM products WHERE id = $1 AND organization_id = $2",
    )
    .bind(product_id)
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?;
    let err = match state {
        None => AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", product_id),
        Some((false, _)) => {
            AppError::new(ErrorCode::ProductInactive).with_detail("product_id", product_id)
        }
        Some((true, available)) => AppError::new(ErrorCode::ProductOutOfStock)
            .with_detail("product_id", product_id)
            .with_detail("requested", quantity)
            .with_detail("available", available),
    };
    Err(err.into())
}

/// Status a new order starts in: `paid` when nothing is owed
fn initial_status(totals: &pricing::OrderTotals) -> OrderStatus {
    if totals.is_settled() {
        OrderStatus::Paid
    } else {
        OrderStatus::Pending
    }
}

/// Create an order, reserving stock for every line
///
/// Inputs are validated by the caller; foreign references are resolved
/// inside the owner's organization.
pub async fn create(
    pool: &PgPool,
    owner: &OrderOwner,
    data: &OrderCreate,
    now: i64,
) -> ServiceResult<OrderDetail> {
    let org = owner.organization_id;
    let mut tx = pool.begin().await?;

    if let Some(customer_id) = owner.customer_id
        && !super::exists_in_org(&mut tx, "customers", customer_id, org).await?
    {
        return Err(AppError::new(ErrorCode::CustomerNotFound).into());
    }

    let order_number = document_number("ORD");

    struct Line {
        product_id: i64,
        name: String,
        sku: String,
        quantity: i32,
        unit_price: Decimal,
        line_total: Decimal,
    }

    let mut lines = Vec::with_capacity(data.items.len());
    for item in &data.items {
        let (name, sku, unit_price) =
            reserve_line(&mut tx, org, item.product_id, item.quantity, now).await?;
        products::record_movement(
            &mut tx,
            org,
            item.product_id,
            -item.quantity,
            MovementReason::Sale,
            Some(&order_number),
            Some(owner.created_by),
            now,
        )
        .await?;
        lines.push(Line {
            product_id: item.product_id,
            name,
            sku,
            quantity: item.quantity,
            unit_price,
            line_total: pricing::line_total(unit_price, item.quantity)?,
        });
    }

    let totals = pricing::order_totals(
        lines.iter().map(|l| l.line_total),
        data.discount.unwrap_or(Decimal::ZERO),
        data.tax_rate.unwrap_or(Decimal::ZERO),
    )?;

    let order: Order = sqlx::query_as(&format!(
        "INSERT INTO orders (organization_id, order_number, customer_id, status, subtotal, discount,
                             tax_rate, tax, total, notes, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
         RETURNING {COLUMNS}"
    ))
    .bind(org)
    .bind(&order_number)
    .bind(owner.customer_id)
    .bind(initial_status(&totals).as_db())
    .bind(totals.subtotal)
    .bind(totals.discount)
    .bind(totals.tax_rate)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(&data.notes)
    .bind(owner.created_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i64> = lines.iter().map(|l| l.product_id).collect();
    let names: Vec<String> = lines.iter().map(|l| l.name.clone()).collect();
    let skus: Vec<String> = lines.iter().map(|l| l.sku.clone()).collect();
    let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
    let unit_prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price).collect();
    let line_totals: Vec<Decimal> = lines.iter().map(|l| l.line_total).collect();
    let items: Vec<OrderItem> = sqlx::query_as(&format!(
        r#"
        INSERT INTO order_items (order_id, product_id, product_name, sku, quantity, unit_price, line_total)
        SELECT $1, * FROM UNNEST($2::bigint[], $3::text[], $4::text[], $5::integer[], $6::numeric[], $7::numeric[])
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(order.id)
    .bind(&product_ids)
    .bind(&names)
    .bind(&skus)
    .bind(&quantities)
    .bind(&unit_prices)
    .bind(&line_totals)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(OrderDetail {
        order,
        items,
        amount_paid: Decimal::ZERO,
    })
}

/// Manual status change (`pending → cancelled`, `paid → fulfilled |
/// cancelled`); cancelling returns the reserved stock
pub async fn change_status(
    pool: &PgPool,
    scope: OrgScope,
    id: i64,
    next: OrderStatus,
    changed_by: i64,
    now: i64,
) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;
    let order = lock(&mut tx, scope, id).await?;
    let current = status_of(&order)?;

    if !current.can_transition_to(next) {
        let err = match (current, next) {
            (_, OrderStatus::Paid) => AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                "Orders become paid through payments",
            ),
            (OrderStatus::Cancelled, _) => AppError::new(ErrorCode::OrderCancelled),
            (OrderStatus::Fulfilled, _) => AppError::new(ErrorCode::OrderAlreadyFulfilled),
            _ => AppError::invalid_transition(current.as_db(), next.as_db()),
        };
        return Err(err.into());
    }

    if next == OrderStatus::Cancelled {
        for item in items_of(&mut tx, order.id).await? {
            sqlx::query(
                "UPDATE products SET stock = stock + $3, updated_at = $4
                 WHERE id = $1 AND organization_id = $2",
            )
            .bind(item.product_id)
            .bind(order.organization_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            products::record_movement(
                &mut tx,
                order.organization_id,
                item.product_id,
                item.quantity,
                MovementReason::OrderCancelled,
                Some(&order.order_number),
                Some(changed_by),
                now,
            )
            .await?;
        }
    }

    let updated = set_status_row(&mut tx, order.id, next, now).await?;
    tx.commit().await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_initial_status() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        let owed = pricing::order_totals([d("5")], Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(initial_status(&owed), OrderStatus::Pending);

        // fully discounted: settled on creation, can be fulfilled next
        let free = pricing::order_totals([d("5")], d("5"), d("20")).unwrap();
        assert_eq!(initial_status(&free), OrderStatus::Paid);
        assert!(initial_status(&free).can_transition_to(OrderStatus::Fulfilled));
    }
}

//! Payment operations
//!
//! A payment that brings the completed total up to the order total marks the
//! order paid and credits loyalty points to the order's customer. Refunds
//! return a paid order to pending and take those points back.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    OrderStatus, Payment, PaymentCreate, PaymentReceipt, PaymentStatus, points_for_total,
};
use sqlx::{PgPool, QueryBuilder};

use super::{loyalty, orders};
use crate::ServiceResult;
use crate::auth::OrgScope;
use crate::pricing;

const COLUMNS: &str = "id, organization_id, order_id, amount, method, status, reference, \
                       created_by, created_at, refunded_at";

/// Payments of an order, oldest first
pub async fn list_for_order(
    pool: &PgPool,
    scope: OrgScope,
    order_id: i64,
) -> ServiceResult<Vec<Payment>> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM payments WHERE order_id = "));
    qb.push_bind(order_id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" ORDER BY created_at, id");
    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// Record a payment against a pending order
pub async fn create(
    pool: &PgPool,
    scope: OrgScope,
    order_id: i64,
    data: &PaymentCreate,
    created_by: i64,
    now: i64,
) -> ServiceResult<PaymentReceipt> {
    let mut tx = pool.begin().await?;
    let order = orders::lock(&mut tx, scope, order_id).await?;
    let status = orders::status_of(&order)?;

    if !status.accepts_payments() {
        let err = match status {
            OrderStatus::Paid => AppError::new(ErrorCode::OrderAlreadyPaid),
            OrderStatus::Fulfilled => AppError::new(ErrorCode::OrderAlreadyFulfilled),
            _ => AppError::new(ErrorCode::OrderCancelled),
        };
        return Err(err.into());
    }

    let paid = orders::amount_paid(&mut tx, order.id).await?;
    let new_paid = pricing::apply_payment(order.total, paid, data.amount)?;

    let payment: Payment = sqlx::query_as(&format!(
        "INSERT INTO payments (organization_id, order_id, amount, method, status, reference, created_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {COLUMNS}"
    ))
    .bind(order.organization_id)
    .bind(order.id)
    .bind(new_paid - paid)
    .bind(data.method.as_db())
    .bind(PaymentStatus::Completed.as_db())
    .bind(&data.reference)
    .bind(created_by)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let mut order_status = status;
    let mut points_awarded = 0;
    if new_paid >= order.total {
        orders::set_status_row(&mut tx, order.id, OrderStatus::Paid, now).await?;
        order_status = OrderStatus::Paid;

        let points = points_for_total(order.total);
        if let Some(customer_id) = order.customer_id
            && points > 0
        {
            loyalty::apply(
                &mut tx,
                order.organization_id,
                customer_id,
                points,
                loyalty::REASON_ORDER_PAID,
                Some(order.id),
                Some(created_by),
                now,
            )
            .await?;
            points_awarded = points;
        }
    }

    tx.commit().await?;
    Ok(PaymentReceipt {
        payment,
        order_status: order_status.as_db().to_string(),
        balance: pricing::balance(order.total, new_paid),
        points_awarded,
    })
}

/// Refund a completed payment
pub async fn refund(
    pool: &PgPool,
    scope: OrgScope,
    payment_id: i64,
    refunded_by: i64,
    now: i64,
) -> ServiceResult<Payment> {
    let mut tx = pool.begin().await?;

    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM payments WHERE id = "));
    qb.push_bind(payment_id);
    scope.push_org_filter(&mut qb, "organization_id");
    qb.push(" FOR UPDATE");
    let payment: Option<Payment> = qb.build_query_as().fetch_optional(&mut *tx).await?;
    let Some(payment) = payment else {
        return Err(AppError::new(ErrorCode::PaymentNotFound).into());
    };
    if PaymentStatus::from_db(&payment.status) != Some(PaymentStatus::Completed) {
        return Err(AppError::new(ErrorCode::PaymentAlreadyRefunded).into());
    }

    // Lock order before touching its payments
    let order = orders::lock(&mut tx, OrgScope::Org(payment.organization_id), payment.order_id).await?;

    let refunded: Payment = sqlx::query_as(&format!(
        "UPDATE payments SET status = $2, refunded_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(payment.id)
    .bind(PaymentStatus::Refunded.as_db())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if orders::status_of(&order)? == OrderStatus::Paid {
        orders::set_status_row(&mut tx, order.id, OrderStatus::Pending, now).await?;

        if let Some(customer_id) = order.customer_id {
            let earned = loyalty::points_from_order(&mut tx, order.id).await?;
            // Points already spent stay spent
            let reclaim = earned.min(loyalty::balance(&mut tx, customer_id).await?);
            if reclaim > 0 {
                loyalty::apply(
                    &mut tx,
                    order.organization_id,
                    customer_id,
                    -reclaim,
                    loyalty::REASON_ORDER_REFUNDED,
                    Some(order.id),
                    Some(refunded_by),
                    now,
                )
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(refunded)
}


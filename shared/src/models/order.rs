//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// ```text
/// pending ──pay──▶ paid ──▶ fulfilled
///    │               │
///    └──▶ cancelled ◀┘
/// ```
///
/// `paid` is reached only by recording payments, or on creation when nothing
/// is owed; a refund on a paid order sends it back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "fulfilled" => Some(Self::Fulfilled),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    /// Transitions allowed through the status endpoint
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Cancelled)
                | (Self::Paid, Self::Fulfilled)
                | (Self::Paid, Self::Cancelled)
        )
    }

    /// Payments may be recorded only while the order awaits them
    pub fn accepts_payments(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub organization_id: i64,
    pub order_number: String,
    pub customer_id: Option<i64>,
    pub status: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    /// Tax rate in percent applied to `subtotal - discount`
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line, price captured at order time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Order with its lines and payment summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Sum of completed payments
    pub amount_paid: Decimal,
}

/// One requested line of a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    /// Ignored for CUSTOMER callers, who always order for themselves
    pub customer_id: Option<i64>,
    pub items: Vec<OrderItemInput>,
    pub discount: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_manual_transitions() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Fulfilled));
        assert!(Paid.can_transition_to(Cancelled));

        // paid only through payments
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Fulfilled));
        // terminal states
        for next in [Pending, Paid, Fulfilled, Cancelled] {
            assert!(!Fulfilled.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_accepts_payments() {
        assert!(Pending.accepts_payments());
        assert!(!Paid.accepts_payments());
        assert!(!Cancelled.accepts_payments());
    }

    #[test]
    fn test_status_serde() {
        let update: OrderStatusUpdate = serde_json::from_str(r#"{"status":"fulfilled"}"#).unwrap();
        assert_eq!(update.status, Fulfilled);
        assert!(serde_json::from_str::<OrderStatusUpdate>(r#"{"status":"shipped"}"#).is_err());
        for s in [Pending, Paid, Fulfilled, Cancelled] {
            assert_eq!(OrderStatus::from_db(s.as_db()), Some(s));
        }
    }
}

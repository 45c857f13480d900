//! Supplier and purchase order models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supplier entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create supplier payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierCreate {
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Update supplier payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Purchase order status
///
/// `draft → ordered → received`, with `cancelled` reachable from `draft`
/// and `ordered`. `received` is reached only through the receive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Ordered,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "ordered" => Some(Self::Ordered),
            "received" => Some(Self::Received),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ordered => "ordered",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    /// Transitions allowed through the status endpoint
    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Ordered) | (Self::Draft, Self::Cancelled) | (Self::Ordered, Self::Cancelled)
        )
    }
}

/// Purchase order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: i64,
    pub organization_id: i64,
    pub po_number: String,
    pub supplier_id: i64,
    pub status: String,
    pub total: Decimal,
    pub notes: Option<String>,
    pub expected_at: Option<i64>,
    pub received_at: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Purchase order line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PurchaseOrderItem {
    pub id: i64,
    pub purchase_order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
}

/// Purchase order with lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

/// One requested purchase line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
    /// Defaults to the product's current cost
    pub unit_cost: Option<Decimal>,
}

/// Create purchase order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderCreate {
    pub supplier_id: i64,
    pub items: Vec<PurchaseOrderItemInput>,
    pub notes: Option<String>,
    pub expected_at: Option<i64>,
}

/// Purchase order status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderStatusUpdate {
    pub status: PurchaseOrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseOrderStatus::*;

    #[test]
    fn test_purchase_order_transitions() {
        assert!(Draft.can_transition_to(Ordered));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Ordered.can_transition_to(Cancelled));

        // receive goes through its own action
        assert!(!Ordered.can_transition_to(Received));
        assert!(!Draft.can_transition_to(Received));
        assert!(!Ordered.can_transition_to(Draft));
        for next in [Draft, Ordered, Received, Cancelled] {
            assert!(!Received.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }
}

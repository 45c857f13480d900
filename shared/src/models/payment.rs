//! Payment and invoice models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Refunded => "refunded",
        }
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    StoreCredit,
    Other,
}

impl PaymentMethod {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::StoreCredit => "store_credit",
            Self::Other => "other",
        }
    }
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub organization_id: i64,
    pub order_id: i64,
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub reference: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub refunded_at: Option<i64>,
}

/// Record payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

/// Result of recording a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// Order status after the payment
    pub order_status: String,
    /// Outstanding amount after the payment
    pub balance: Decimal,
    /// Loyalty points credited when this payment settled the order
    pub points_awarded: i64,
}

/// Invoice status
///
/// `draft → issued | void`, `issued → paid | void`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "issued" => Some(Self::Issued),
            "paid" => Some(Self::Paid),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Issued)
                | (Self::Draft, Self::Void)
                | (Self::Issued, Self::Paid)
                | (Self::Issued, Self::Void)
        )
    }
}

/// Invoice entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub organization_id: i64,
    pub invoice_number: String,
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub amount: Decimal,
    pub status: String,
    pub due_at: Option<i64>,
    pub issued_at: Option<i64>,
    pub paid_at: Option<i64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create invoice payload
///
/// When `order_id` is given the amount defaults to the order total and the
/// customer to the order's customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCreate {
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub due_at: Option<i64>,
    pub notes: Option<String>,
}

/// Invoice status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceStatusUpdate {
    pub status: InvoiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use InvoiceStatus::*;

    #[test]
    fn test_invoice_transitions() {
        assert!(Draft.can_transition_to(Issued));
        assert!(Draft.can_transition_to(Void));
        assert!(Issued.can_transition_to(Paid));
        assert!(Issued.can_transition_to(Void));

        assert!(!Draft.can_transition_to(Paid));
        assert!(!Issued.can_transition_to(Draft));
        for next in [Draft, Issued, Paid, Void] {
            assert!(!Paid.can_transition_to(next));
            assert!(!Void.can_transition_to(next));
        }
    }

    #[test]
    fn test_payment_method_serde() {
        let p: PaymentCreate =
            serde_json::from_str(r#"{"amount":12.5,"method":"bank_transfer"}"#).unwrap();
        assert_eq!(p.method, PaymentMethod::BankTransfer);
        assert_eq!(p.method.as_db(), "bank_transfer");
        assert!(serde_json::from_str::<PaymentCreate>(r#"{"amount":1,"method":"bitcoin"}"#).is_err());
    }

    #[test]
    fn test_payment_status_db() {
        assert_eq!(PaymentStatus::from_db("refunded"), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::Completed.as_db(), "completed");
    }
}

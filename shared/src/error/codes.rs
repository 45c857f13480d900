//! Unified error codes for the commerce platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant errors
//! - 4xxx: Order errors
//! - 5xxx: Payment / accounting errors
//! - 6xxx: Catalog and inventory errors
//! - 7xxx: Procurement errors
//! - 8xxx: Customer relationship errors (users, customers, tickets, marketing, loyalty)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the dashboard can
/// switch on them without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Status transition not allowed
    InvalidStatusTransition = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Too many attempts, slow down
    TooManyAttempts = 1008,
    /// Password too short
    PasswordTooShort = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Platform administrator required
    AdminRequired = 2003,
    /// Role cannot be granted by the caller
    RoleNotAssignable = 2004,
    /// Cannot delete the calling user
    CannotDeleteSelf = 2005,

    // ==================== 3xxx: Tenant ====================
    /// Request needs a target organization
    TenantNotSelected = 3001,
    /// Organization not found
    TenantNotFound = 3002,
    /// Organization is suspended
    TenantSuspended = 3003,
    /// Organization slug already taken
    TenantSlugExists = 3004,
    /// Organization still owns data
    TenantHasData = 3005,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Order has already been fulfilled
    OrderAlreadyFulfilled = 4003,
    /// Order has been cancelled
    OrderCancelled = 4004,
    /// Order is empty
    OrderEmpty = 4007,
    /// Discount exceeds subtotal
    OrderInvalidDiscount = 4008,

    // ==================== 5xxx: Payment / accounting ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment would exceed the outstanding amount
    PaymentExceedsBalance = 5002,
    /// Invalid payment method
    PaymentInvalidMethod = 5003,
    /// Payment has already been refunded
    PaymentAlreadyRefunded = 5004,
    /// Invalid amount
    InvalidAmount = 5005,
    /// Invoice not found
    InvoiceNotFound = 5101,

    // ==================== 6xxx: Catalog / inventory ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Product SKU already exists
    ProductSkuExists = 6004,
    /// Product is inactive
    ProductInactive = 6005,
    /// Stock adjustment would go negative
    StockWouldGoNegative = 6101,

    // ==================== 7xxx: Procurement ====================
    /// Supplier not found
    SupplierNotFound = 7001,
    /// Supplier has purchase orders
    SupplierHasPurchaseOrders = 7002,
    /// Purchase order not found
    PurchaseOrderNotFound = 7101,
    /// Purchase order is empty
    PurchaseOrderEmpty = 7102,

    // ==================== 8xxx: CRM ====================
    /// User not found
    UserNotFound = 8001,
    /// Email already registered
    UserEmailExists = 8002,
    /// Customer not found
    CustomerNotFound = 8101,
    /// Customer email already exists in organization
    CustomerEmailExists = 8102,
    /// Ticket not found
    TicketNotFound = 8201,
    /// Assignee not found
    AssigneeNotFound = 8202,
    /// Campaign not found
    CampaignNotFound = 8301,
    /// Campaign schedule invalid
    CampaignInvalidSchedule = 8302,
    /// Loyalty account not found
    LoyaltyAccountNotFound = 8401,
    /// Not enough points
    LoyaltyInsufficientPoints = 8402,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Rate limited
    RateLimited = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::InvalidStatusTransition => "Status transition is not allowed",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::TooManyAttempts => "Too many attempts, try again later",
            ErrorCode::PasswordTooShort => "Password is too short",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Platform administrator role is required",
            ErrorCode::RoleNotAssignable => "Role cannot be assigned by this user",
            ErrorCode::CannotDeleteSelf => "Users cannot delete themselves",

            // Tenant
            ErrorCode::TenantNotSelected => "Target organization is required",
            ErrorCode::TenantNotFound => "Organization not found",
            ErrorCode::TenantSuspended => "Organization is suspended",
            ErrorCode::TenantSlugExists => "Organization slug already exists",
            ErrorCode::TenantHasData => "Organization still owns data",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderAlreadyFulfilled => "Order has already been fulfilled",
            ErrorCode::OrderCancelled => "Order has been cancelled",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderInvalidDiscount => "Discount exceeds order subtotal",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentExceedsBalance => "Payment exceeds outstanding balance",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentAlreadyRefunded => "Payment has already been refunded",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::InvoiceNotFound => "Invoice not found",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductSkuExists => "Product SKU already exists",
            ErrorCode::ProductInactive => "Product is inactive",
            ErrorCode::StockWouldGoNegative => "Stock cannot go below zero",

            // Procurement
            ErrorCode::SupplierNotFound => "Supplier not found",
            ErrorCode::SupplierHasPurchaseOrders => "Supplier has purchase orders",
            ErrorCode::PurchaseOrderNotFound => "Purchase order not found",
            ErrorCode::PurchaseOrderEmpty => "Purchase order has no items",

            // CRM
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserEmailExists => "Email is already registered",
            ErrorCode::CustomerNotFound => "Customer not found",
            ErrorCode::CustomerEmailExists => "Customer email already exists",
            ErrorCode::TicketNotFound => "Ticket not found",
            ErrorCode::AssigneeNotFound => "Assignee not found",
            ErrorCode::CampaignNotFound => "Campaign not found",
            ErrorCode::CampaignInvalidSchedule => "Campaign schedule is invalid",
            ErrorCode::LoyaltyAccountNotFound => "Loyalty account not found",
            ErrorCode::LoyaltyInsufficientPoints => "Not enough loyalty points",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::RateLimited => "Too many requests, try again later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::InvalidStatusTransition),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::TooManyAttempts),
            1009 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::RoleNotAssignable),
            2005 => Ok(ErrorCode::CannotDeleteSelf),

            // Tenant
            3001 => Ok(ErrorCode::TenantNotSelected),
            3002 => Ok(ErrorCode::TenantNotFound),
            3003 => Ok(ErrorCode::TenantSuspended),
            3004 => Ok(ErrorCode::TenantSlugExists),
            3005 => Ok(ErrorCode::TenantHasData),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyPaid),
            4003 => Ok(ErrorCode::OrderAlreadyFulfilled),
            4004 => Ok(ErrorCode::OrderCancelled),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderInvalidDiscount),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentExceedsBalance),
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5004 => Ok(ErrorCode::PaymentAlreadyRefunded),
            5005 => Ok(ErrorCode::InvalidAmount),
            5101 => Ok(ErrorCode::InvoiceNotFound),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductSkuExists),
            6005 => Ok(ErrorCode::ProductInactive),
            6101 => Ok(ErrorCode::StockWouldGoNegative),

            // Procurement
            7001 => Ok(ErrorCode::SupplierNotFound),
            7002 => Ok(ErrorCode::SupplierHasPurchaseOrders),
            7101 => Ok(ErrorCode::PurchaseOrderNotFound),
            7102 => Ok(ErrorCode::PurchaseOrderEmpty),

            // CRM
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UserEmailExists),
            8101 => Ok(ErrorCode::CustomerNotFound),
            8102 => Ok(ErrorCode::CustomerEmailExists),
            8201 => Ok(ErrorCode::TicketNotFound),
            8202 => Ok(ErrorCode::AssigneeNotFound),
            8301 => Ok(ErrorCode::CampaignNotFound),
            8302 => Ok(ErrorCode::CampaignInvalidSchedule),
            8401 => Ok(ErrorCode::LoyaltyAccountNotFound),
            8402 => Ok(ErrorCode::LoyaltyInsufficientPoints),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::RateLimited),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::InvalidStatusTransition.code(), 9);

        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::TokenInvalid.code(), 1004);

        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::AdminRequired.code(), 2003);

        assert_eq!(ErrorCode::TenantNotSelected.code(), 3001);
        assert_eq!(ErrorCode::TenantSuspended.code(), 3003);

        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::PaymentExceedsBalance.code(), 5002);
        assert_eq!(ErrorCode::ProductOutOfStock.code(), 6003);
        assert_eq!(ErrorCode::PurchaseOrderNotFound.code(), 7101);
        assert_eq!(ErrorCode::LoyaltyInsufficientPoints.code(), 8402);

        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::RateLimited.code(), 9006);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(2001), Ok(ErrorCode::PermissionDenied));
        assert_eq!(ErrorCode::try_from(3001), Ok(ErrorCode::TenantNotSelected));
        assert_eq!(ErrorCode::try_from(8202), Ok(ErrorCode::AssigneeNotFound));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(65535), Err(InvalidErrorCode(65535)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::TenantNotFound).unwrap();
        assert_eq!(json, "3002");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6003").unwrap();
        assert_eq!(code, ErrorCode::ProductOutOfStock);

        let result: Result<ErrorCode, _> = serde_json::from_str("12345");
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip_every_listed_code() {
        let codes = [
            ErrorCode::Unknown,
            ErrorCode::RequiredField,
            ErrorCode::PasswordTooShort,
            ErrorCode::CannotDeleteSelf,
            ErrorCode::TenantHasData,
            ErrorCode::OrderInvalidDiscount,
            ErrorCode::InvoiceNotFound,
            ErrorCode::StockWouldGoNegative,
            ErrorCode::PurchaseOrderEmpty,
            ErrorCode::CampaignInvalidSchedule,
            ErrorCode::ConfigError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::PermissionDenied), "2001");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(
            ErrorCode::TenantNotSelected.message(),
            "Target organization is required"
        );
    }
}

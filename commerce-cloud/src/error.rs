//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`), so handlers and queries propagate with `?`.
//! Constraint violations raised by PostgreSQL become client errors; every
//! other database failure is logged and surfaced as a bare `InternalError`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use sqlx::error::ErrorKind;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error, two variants only.
///
/// - `Db`: database/infrastructure errors (auto-logged, mapped to InternalError)
/// - `App`: business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error (sqlx, hashing, serde, etc.)
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                if let Some(mapped) = constraint_violation(&db_err) {
                    return mapped;
                }
                tracing::error!(
                    error = %db_err,
                    correlation = shared::correlation::current().as_deref().unwrap_or("-"),
                    "Service database error"
                );
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Translate PostgreSQL integrity errors into client-facing errors
fn constraint_violation(err: &BoxError) -> Option<AppError> {
    let db_err = err.downcast_ref::<sqlx::Error>()?.as_database_error()?;
    let constraint = db_err.constraint().unwrap_or_default();
    // numeric_value_out_of_range
    if db_err.code().as_deref() == Some("22003") {
        return Some(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "Value exceeds the storable range",
        ));
    }
    match db_err.kind() {
        ErrorKind::UniqueViolation => {
            let code = match constraint {
                "organizations_slug_key" => ErrorCode::TenantSlugExists,
                "users_email_key" => ErrorCode::UserEmailExists,
                "customers_org_email_key" => ErrorCode::CustomerEmailExists,
                "products_org_sku_key" => ErrorCode::ProductSkuExists,
                _ => ErrorCode::AlreadyExists,
            };
            Some(AppError::new(code).with_detail("constraint", constraint))
        }
        ErrorKind::ForeignKeyViolation => Some(
            AppError::with_message(
                ErrorCode::ValidationFailed,
                "Referenced record does not exist or is still in use",
            )
            .with_detail("constraint", constraint),
        ),
        ErrorKind::CheckViolation | ErrorKind::NotNullViolation => Some(
            AppError::validation("Value violates a data constraint")
                .with_detail("constraint", constraint),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError = ServiceError::App(AppError::new(ErrorCode::OrderEmpty)).into();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_db_error_is_hidden() {
        let err: AppError = ServiceError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal server error");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_boxed_error_is_hidden() {
        let boxed: BoxError = "disk on fire".into();
        let err: AppError = ServiceError::from(boxed).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("disk"));
    }
}

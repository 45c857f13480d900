//! commerce-cloud: multi-tenant commerce API
//!
//! JSON API over PostgreSQL serving many organizations from one deployment:
//! - Session tokens (JWT, bearer header or `session` cookie)
//! - Role permission gate per route
//! - Organization scope injected into every query
//! - Catalog, orders, payments, procurement, invoicing, support, marketing
//!   and loyalty resources

pub mod api;
pub mod auth;
pub mod config;
pub mod correlation;
pub mod db;
pub mod error;
pub mod extract;
pub mod logger;
pub mod pricing;
pub mod state;
pub mod util;
pub mod validation;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;

/// Security event log on the `security` target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

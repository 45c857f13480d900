//! Data models
//!
//! Shared between the API server and its clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Statuses are stored as lowercase text; each status enum converts with
//! `from_db` / `as_db` and owns its transition table.
//! Money is `rust_decimal::Decimal`, timestamps are UTC milliseconds.

pub mod audit;
pub mod campaign;
pub mod customer;
pub mod loyalty;
pub mod order;
pub mod organization;
pub mod payment;
pub mod procurement;
pub mod product;
pub mod role;
pub mod ticket;
pub mod user;

// Re-exports
pub use audit::*;
pub use campaign::*;
pub use customer::*;
pub use loyalty::*;
pub use order::*;
pub use organization::*;
pub use payment::*;
pub use procurement::*;
pub use product::*;
pub use role::*;
pub use ticket::*;
pub use user::*;

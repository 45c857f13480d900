//! User Model

use serde::{Deserialize, Serialize};

use super::role::Role;

/// User entity (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: String,
    /// `None` only for SUPER_ADMIN
    pub organization_id: Option<i64>,
    /// Linked customer record, CUSTOMER role only
    pub customer_id: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create user payload
///
/// The organization is not part of the body: it is the caller's write
/// organization, or none when a super-admin creates another super-admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
    pub customer_id: Option<i64>,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub customer_id: Option<i64>,
    pub is_active: Option<bool>,
}

//! Audit log model

use serde::{Deserialize, Serialize};

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: i64,
    /// `None` for platform-level actions
    pub organization_id: Option<i64>,
    pub user_id: Option<i64>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<i64>,
    pub detail: Option<serde_json::Value>,
    pub correlation: Option<String>,
    pub created_at: i64,
}

//! Support ticket models

use serde::{Deserialize, Serialize};

/// Ticket status
///
/// ```text
/// open ⇄ in_progress → resolved → closed
///   ▲                     │
///   └──────── reopen ─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::InProgress)
                | (Self::InProgress, Self::Open)
                | (Self::InProgress, Self::Resolved)
                | (Self::Resolved, Self::Closed)
                | (Self::Resolved, Self::Open)
        )
    }
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Support ticket entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SupportTicket {
    pub id: i64,
    pub organization_id: i64,
    pub subject: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub customer_id: Option<i64>,
    /// User of the same organization handling the ticket
    pub assignee_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
}

/// Create ticket payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCreate {
    pub subject: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    /// Ignored for CUSTOMER callers
    pub customer_id: Option<i64>,
    pub assignee_id: Option<i64>,
}

/// Update ticket payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketUpdate {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TicketPriority>,
    pub status: Option<TicketStatus>,
    pub assignee_id: Option<i64>,
}

/// Ticket comment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TicketComment {
    pub id: i64,
    pub organization_id: i64,
    pub ticket_id: i64,
    pub author_id: Option<i64>,
    pub body: String,
    pub created_at: i64,
}

/// Add comment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCommentCreate {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::*;

    #[test]
    fn test_ticket_transitions() {
        assert!(Open.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Open));
        assert!(InProgress.can_transition_to(Resolved));
        assert!(Resolved.can_transition_to(Closed));
        assert!(Resolved.can_transition_to(Open));

        assert!(!Open.can_transition_to(Closed));
        assert!(!Open.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(InProgress));
        for next in [Open, InProgress, Resolved, Closed] {
            assert!(!Closed.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_db_values() {
        assert_eq!(InProgress.as_db(), "in_progress");
        assert_eq!(TicketStatus::from_db("in_progress"), Some(InProgress));
        assert_eq!(TicketStatus::from_db("pending"), None);
    }
}

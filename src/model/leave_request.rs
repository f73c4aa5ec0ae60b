use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveType {
    Vacation,
    Sick,
    Personal,
    Maternity,
    Paternity,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// `approved` and `rejected` are terminal; only a pending request may
    /// change status.
    pub fn can_transition(self) -> bool {
        matches!(self, LeaveStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub user_id: u64,

    /// Requester name captured at creation time.
    #[schema(example = "María García")]
    pub user_name: String,

    #[serde(rename = "type")]
    pub leave_type: LeaveType,

    #[schema(example = "2024-07-15", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2024-07-19", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    /// Supplied by the caller at creation; not recomputed from the range.
    #[schema(example = 5)]
    pub days_count: i32,

    #[schema(example = "Vacaciones de verano", nullable = true)]
    pub reason: Option<String>,

    pub status: LeaveStatus,

    #[schema(example = 2, nullable = true)]
    pub reviewed_by: Option<u64>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[schema(nullable = true)]
    pub review_comments: Option<String>,

    #[schema(example = "2024-06-08T10:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Column list matching [`LeaveRequest`], for runtime-bound SELECTs.
pub const LEAVE_COLUMNS: &str = "id, user_id, user_name, leave_type, start_date, end_date, \
     days_count, reason, status, reviewed_by, reviewed_at, review_comments, created_at";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_may_transition() {
        assert!(LeaveStatus::Pending.can_transition());
        assert!(!LeaveStatus::Approved.can_transition());
        assert!(!LeaveStatus::Rejected.can_transition());
    }

    #[test]
    fn leave_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LeaveType::Maternity).unwrap(),
            "\"maternity\""
        );
        assert_eq!(
            serde_json::from_str::<LeaveType>("\"vacation\"").unwrap(),
            LeaveType::Vacation
        );
    }
}

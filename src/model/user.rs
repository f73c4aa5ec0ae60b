use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Public user record. The password hash is never selected into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "maria.garcia@example.com")]
    pub email: String,

    #[schema(example = "María García")]
    pub name: String,

    pub role: Role,

    #[schema(example = 3, nullable = true)]
    pub team_id: Option<u64>,

    /// May go negative: vacation approvals debit without a floor.
    #[schema(example = 22)]
    pub vacation_days_balance: i32,

    #[schema(example = 3)]
    pub sick_days_balance: i32,

    #[schema(example = "2024-06-01T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Column list matching [`User`], for runtime-bound SELECTs.
pub const USER_COLUMNS: &str =
    "id, email, name, role, team_id, vacation_days_balance, sick_days_balance, created_at";

/// Balance defaults applied when creation omits them.
pub const DEFAULT_VACATION_DAYS: i32 = 22;
pub const DEFAULT_SICK_DAYS: i32 = 3;

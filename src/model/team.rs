use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Team {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Desarrollo")]
    pub name: String,

    /// Zero or one manager; must reference a user with the manager or hr role.
    #[schema(example = 2, nullable = true)]
    pub manager_id: Option<u64>,

    #[schema(example = "2024-01-15T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

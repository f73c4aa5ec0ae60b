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
pub enum HolidayType {
    National,
    Regional,
    Local,
    Company,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Año Nuevo")]
    pub name: String,

    #[schema(example = "2025-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[serde(rename = "type")]
    pub holiday_type: HolidayType,

    #[schema(example = true)]
    pub is_mandatory: bool,

    #[schema(example = 3)]
    pub created_by: u64,

    #[schema(example = "2024-12-01T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Column list matching [`Holiday`], for runtime-bound SELECTs.
pub const HOLIDAY_COLUMNS: &str =
    "id, name, date, holiday_type, is_mandatory, created_by, created_at";

/// Duplicate key for holiday names: trimmed, lowercased, inner runs of
/// whitespace collapsed to a single space. Two holidays collide when their
/// normalized names and exact dates both match.
pub fn normalized_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_padding() {
        assert_eq!(normalized_name("  Año Nuevo  "), "año nuevo");
        assert_eq!(normalized_name("AÑO NUEVO"), "año nuevo");
        assert_eq!(normalized_name("Año   Nuevo"), "año nuevo");
    }

    #[test]
    fn distinct_names_stay_distinct() {
        assert_ne!(normalized_name("Año Nuevo"), normalized_name("Reyes"));
        assert_ne!(
            normalized_name("Fiesta Nacional"),
            normalized_name("Fiesta Local")
        );
    }

    #[test]
    fn empty_and_blank_normalize_to_empty() {
        assert_eq!(normalized_name(""), "");
        assert_eq!(normalized_name("   "), "");
    }
}

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;

use crate::model::leave_request::LeaveStatus;

/// Crate-wide error type. Every handler surfaces failures through this enum
/// so the HTTP mapping and the JSON body shape stay in one place.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "a holiday named '{}' already exists on {}", name, date)]
    DuplicateHoliday { name: String, date: NaiveDate },

    #[display(fmt = "request is already {}", from)]
    InvalidTransition { from: LeaveStatus },

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "internal server error")]
    Database,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::DuplicateHoliday { .. } => "duplicate_holiday",
            ApiError::InvalidTransition { .. } => "invalid_transition",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Database => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateHoliday { .. } => StatusCode::CONFLICT,
            ApiError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database error");
        ApiError::Database
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("team").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::DuplicateHoliday {
                name: "Año Nuevo".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidTransition {
                from: LeaveStatus::Approved
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::Database.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn transition_error_names_current_status() {
        let err = ApiError::InvalidTransition {
            from: LeaveStatus::Rejected,
        };
        assert_eq!(err.to_string(), "request is already rejected");
    }
}

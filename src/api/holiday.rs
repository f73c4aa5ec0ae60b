use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use strum_macros::EnumString;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::holiday::{HOLIDAY_COLUMNS, Holiday, HolidayType, normalized_name};

#[derive(Deserialize, ToSchema)]
pub struct HolidayPayload {
    #[schema(example = "Año Nuevo")]
    pub name: String,
    #[schema(example = "2025-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub holiday_type: HolidayType,
    #[schema(example = true)]
    pub is_mandatory: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ImportSummary {
    #[schema(example = 12)]
    pub imported: u32,
    #[schema(example = 2)]
    pub skipped: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, EnumString)]
#[strum(serialize_all = "lowercase")]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    /// "csv" (default) or "json"
    pub format: Option<String>,
}

fn validated_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Holiday name must not be empty".into()));
    }
    Ok(trimmed)
}

/// Looks for an existing holiday colliding on (normalized name, exact date).
/// The name comparison runs here rather than in SQL so the normalization
/// rules live in exactly one place.
async fn find_duplicate(
    pool: &MySqlPool,
    name: &str,
    date: NaiveDate,
    exclude_id: Option<u64>,
) -> Result<Option<u64>, ApiError> {
    let key = normalized_name(name);

    let same_day = sqlx::query_as::<_, (u64, String)>("SELECT id, name FROM holidays WHERE date = ?")
        .bind(date)
        .fetch_all(pool)
        .await?;

    Ok(same_day
        .into_iter()
        .filter(|(id, _)| Some(*id) != exclude_id)
        .find(|(_, existing)| normalized_name(existing) == key)
        .map(|(id, _)| id))
}

async fn fetch_holiday(pool: &MySqlPool, id: u64) -> Result<Option<Holiday>, ApiError> {
    let sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?");
    let holiday = sqlx::query_as::<_, Holiday>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(holiday)
}

#[utoipa::path(
    get,
    path = "/api/v1/holidays",
    responses((status = 200, description = "All holidays ordered by date", body = [Holiday])),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays ORDER BY date ASC");
    let holidays = sqlx::query_as::<_, Holiday>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/v1/holidays",
    request_body = HolidayPayload,
    responses(
        (status = 201, description = "Holiday created", body = Holiday),
        (status = 409, description = "Duplicate name+date pair"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<HolidayPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_holiday_admin()?;

    let name = validated_name(&payload.name)?;

    if find_duplicate(pool.get_ref(), name, payload.date, None)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateHoliday {
            name: name.to_string(),
            date: payload.date,
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO holidays (name, date, holiday_type, is_mandatory, created_by)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(payload.date)
    .bind(payload.holiday_type)
    .bind(payload.is_mandatory)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let created = fetch_holiday(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("holiday"))?;

    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/v1/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    request_body = HolidayPayload,
    responses(
        (status = 200, description = "Holiday updated", body = Holiday),
        (status = 404, description = "Holiday not found"),
        (status = 409, description = "Duplicate name+date pair"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn update_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<HolidayPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_holiday_admin()?;

    let holiday_id = path.into_inner();
    let name = validated_name(&payload.name)?;

    if fetch_holiday(pool.get_ref(), holiday_id).await?.is_none() {
        return Err(ApiError::NotFound("holiday").into());
    }

    // The row being updated is excluded from the comparison set.
    if find_duplicate(pool.get_ref(), name, payload.date, Some(holiday_id))
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateHoliday {
            name: name.to_string(),
            date: payload.date,
        }
        .into());
    }

    sqlx::query(
        r#"
        UPDATE holidays
        SET name = ?, date = ?, holiday_type = ?, is_mandatory = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(payload.date)
    .bind(payload.holiday_type)
    .bind(payload.is_mandatory)
    .bind(holiday_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let updated = fetch_holiday(pool.get_ref(), holiday_id)
        .await?
        .ok_or(ApiError::NotFound("holiday"))?;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 204, description = "Holiday removed"),
        (status = 404, description = "Holiday not found"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_holiday_admin()?;

    // Unconditional removal; leave requests never reference holidays.
    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("holiday").into());
    }

    Ok(HttpResponse::NoContent().finish())
}

/* =========================
Bulk import
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/holidays/import",
    request_body = Vec<HolidayPayload>,
    responses(
        (status = 200, description = "Import summary", body = ImportSummary),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Import aborted; body reports progress so far")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn import_holidays(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<Vec<HolidayPayload>>,
) -> actix_web::Result<impl Responder> {
    auth.require_holiday_admin()?;

    let mut imported: u32 = 0;
    let mut skipped: u32 = 0;

    // Candidates are checked one at a time against the live table, so a
    // duplicate later in the batch is skipped even when its twin was
    // inserted by this same import.
    for candidate in payload.into_inner() {
        let name = match validated_name(&candidate.name) {
            Ok(n) => n.to_string(),
            Err(e) => {
                // Anything other than a duplicate aborts the remaining batch.
                tracing::warn!(error = %e, "Holiday import aborted on invalid candidate");
                return Ok(HttpResponse::BadRequest().json(json!({
                    "error": e.to_string(),
                    "imported": imported,
                    "skipped": skipped,
                })));
            }
        };

        match find_duplicate(pool.get_ref(), &name, candidate.date, None).await {
            Ok(Some(_)) => {
                skipped += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Holiday import aborted");
                return Ok(HttpResponse::InternalServerError().json(json!({
                    "error": "holiday import aborted",
                    "imported": imported,
                    "skipped": skipped,
                })));
            }
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO holidays (name, date, holiday_type, is_mandatory, created_by)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&name)
        .bind(candidate.date)
        .bind(candidate.holiday_type)
        .bind(candidate.is_mandatory)
        .bind(auth.user_id)
        .execute(pool.get_ref())
        .await;

        match insert {
            Ok(_) => imported += 1,
            Err(e) => {
                tracing::error!(error = %e, holiday = %name, "Holiday import aborted");
                return Ok(HttpResponse::InternalServerError().json(json!({
                    "error": "holiday import aborted",
                    "imported": imported,
                    "skipped": skipped,
                })));
            }
        }
    }

    tracing::info!(imported, skipped, "Holiday import finished");

    Ok(HttpResponse::Ok().json(ImportSummary { imported, skipped }))
}

/* =========================
Export
========================= */

fn to_csv(holidays: &[Holiday]) -> String {
    let mut rows = vec!["name,date,type,mandatory".to_string()];
    rows.extend(holidays.iter().map(|h| {
        format!(
            "\"{}\",{},{},{}",
            h.name.replace('"', "\"\""),
            h.date,
            h.holiday_type,
            if h.is_mandatory { "yes" } else { "no" }
        )
    }));
    rows.join("\n")
}

#[utoipa::path(
    get,
    path = "/api/v1/holidays/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Holiday calendar as CSV or JSON"),
        (status = 400, description = "Unknown format")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn export_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<impl Responder> {
    let format = match query.format.as_deref() {
        None => ExportFormat::Csv,
        Some(raw) => ExportFormat::from_str(raw)
            .map_err(|_| ApiError::Validation(format!("Unknown export format '{raw}'")))?,
    };

    let sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays ORDER BY date ASC");
    let holidays = sqlx::query_as::<_, Holiday>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let response = match format {
        ExportFormat::Csv => HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"holidays.csv\"",
            ))
            .body(to_csv(&holidays)),
        ExportFormat::Json => {
            let body = serde_json::to_string_pretty(&holidays)
                .map_err(|_| ApiError::Database)?;
            HttpResponse::Ok()
                .content_type("application/json")
                .insert_header((
                    "Content-Disposition",
                    "attachment; filename=\"holidays.json\"",
                ))
                .body(body)
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::HolidayType;

    fn holiday(name: &str, mandatory: bool) -> Holiday {
        Holiday {
            id: 1,
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            holiday_type: HolidayType::National,
            is_mandatory: mandatory,
            created_by: 3,
            created_at: None,
        }
    }

    #[test]
    fn csv_quotes_names_and_doubles_embedded_quotes() {
        let csv = to_csv(&[holiday("Día \"grande\"", true)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,date,type,mandatory"));
        assert_eq!(
            lines.next(),
            Some("\"Día \"\"grande\"\"\",2025-01-01,national,yes")
        );
    }

    #[test]
    fn csv_of_empty_calendar_is_just_the_header() {
        assert_eq!(to_csv(&[]), "name,date,type,mandatory");
    }

    #[test]
    fn export_format_parses_known_values_only() {
        assert_eq!(ExportFormat::from_str("csv").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_str("json").unwrap(), ExportFormat::Json);
        assert!(ExportFormat::from_str("xml").is_err());
    }
}

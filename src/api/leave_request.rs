use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, Transaction};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest, LeaveStatus, LeaveType};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    #[schema(example = "2024-07-15", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-07-19", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Inclusive day span as computed by the caller; stored as-is.
    #[schema(example = 5)]
    pub days_count: i32,
    #[schema(example = "Vacaciones de verano", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy!", nullable = true)]
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requester (reviewers only; others are pinned to themselves)
    pub user_id: Option<u64>,
    /// Filter by request status
    pub status: Option<LeaveStatus>,
    /// Keep requests whose range ends on or after this date
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Keep requests whose range starts on or before this date
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Status(LeaveStatus),
    Date(NaiveDate),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

async fn fetch_request(pool: &MySqlPool, id: u64) -> Result<Option<LeaveRequest>, ApiError> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
    let request = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(request)
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Request created in pending state", body = LeaveRequest),
        (status = 400, description = "Invalid dates or day count"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if payload.start_date > payload.end_date {
        return Err(ApiError::Validation("start_date cannot be after end_date".into()).into());
    }

    if payload.days_count <= 0 {
        return Err(ApiError::Validation("days_count must be positive".into()).into());
    }

    // Snapshot the requester's name; also proves the user row still exists.
    let user_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
        .bind(auth.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFound("user"))?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, user_name, leave_type, start_date, end_date, days_count, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(auth.user_id)
    .bind(&user_name)
    .bind(payload.leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.days_count)
    .bind(payload.reason.as_deref())
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let created = fetch_request(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::NotFound("leave request"))?;

    tracing::info!(
        request_id = created.id,
        user_id = auth.user_id,
        "Leave request submitted"
    );

    Ok(HttpResponse::Created().json(created))
}

/* =========================
Review (approve / reject)
========================= */

/// Debits the vacation ledger inside the approval transaction. There is no
/// floor at zero: the balance may go negative.
async fn debit_vacation(
    tx: &mut Transaction<'_, MySql>,
    user_id: u64,
    days: i32,
) -> Result<i32, ApiError> {
    sqlx::query("UPDATE users SET vacation_days_balance = vacation_days_balance - ? WHERE id = ?")
        .bind(days)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    let balance =
        sqlx::query_scalar::<_, i32>("SELECT vacation_days_balance FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

    Ok(balance)
}

/// Single status transition: pending -> approved | rejected, exactly once.
/// Approval of a vacation request and its ledger debit commit atomically.
async fn set_status(
    pool: &MySqlPool,
    reviewer: &AuthUser,
    id: u64,
    new_status: LeaveStatus,
    comments: Option<String>,
) -> Result<LeaveRequest, ApiError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, (u64, LeaveType, i32, LeaveStatus)>(
        "SELECT user_id, leave_type, days_count, status FROM leave_requests WHERE id = ? FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let (user_id, leave_type, days_count, status) = row.ok_or(ApiError::NotFound("leave request"))?;

    if !status.can_transition() {
        return Err(ApiError::InvalidTransition { from: status });
    }

    sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, reviewed_by = ?, reviewed_at = NOW(), review_comments = ?
        WHERE id = ?
        "#,
    )
    .bind(new_status)
    .bind(reviewer.user_id)
    .bind(comments.as_deref())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if new_status == LeaveStatus::Approved && leave_type == LeaveType::Vacation {
        let balance = debit_vacation(&mut tx, user_id, days_count).await?;
        tracing::info!(user_id, days_count, balance, "Vacation balance debited");
    }

    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
    let updated = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(request_id = id, reviewer = reviewer.user_id, %new_status, "Leave request reviewed");

    Ok(updated)
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Request approved", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already reviewed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let updated = set_status(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveStatus::Approved,
        payload.into_inner().comments,
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Request rejected", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already reviewed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let updated = set_status(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveStatus::Rejected,
        payload.into_inner().comments,
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Fetch one
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = fetch_request(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("leave request"))?;

    if !auth.capabilities().can_review && request.user_id != auth.user_id {
        return Err(ApiError::Forbidden("not your request").into());
    }

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
List with filters
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    // Non-reviewers only ever see their own requests.
    let user_filter = if auth.capabilities().can_review {
        query.user_id
    } else {
        Some(auth.user_id)
    };

    if let Some(user_id) = user_filter {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Status(status));
    }

    // Date-range overlap: keep requests intersecting [from, to].
    if let Some(from) = query.from {
        where_sql.push_str(" AND end_date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND start_date <= ?");
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Status(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Status(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: requests,
        page,
        per_page,
        total,
    }))
}

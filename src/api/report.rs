use actix_web::{HttpResponse, Responder, web};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::dates::{clamp_range, days_in, inclusive_days};
use crate::error::ApiError;
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest, LeaveType};
use crate::model::user::{USER_COLUMNS, User};

#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 3)]
    pub pending_requests: i64,
    #[schema(example = 5)]
    pub approved_this_month: i64,
    #[schema(example = 1)]
    pub team_members_out: i64,
    #[schema(example = 2)]
    pub upcoming_holidays: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses((status = 200, description = "Headline counters", body = DashboardStats)),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn dashboard_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let pending_requests =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests WHERE status = 'pending'")
            .fetch_one(pool.get_ref())
            .await
            .map_err(ApiError::from)?;

    let approved_this_month = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM leave_requests \
         WHERE status = 'approved' \
         AND YEAR(created_at) = YEAR(CURDATE()) AND MONTH(created_at) = MONTH(CURDATE())",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    // Viewers with a team see their team; hr (teamless) sees everyone.
    let team_members_out = match auth.team_id {
        Some(team_id) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(DISTINCT r.user_id) FROM leave_requests r \
                 JOIN users u ON u.id = r.user_id \
                 WHERE r.status = 'approved' \
                 AND CURDATE() BETWEEN r.start_date AND r.end_date \
                 AND u.team_id = ?",
            )
            .bind(team_id)
            .fetch_one(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(DISTINCT user_id) FROM leave_requests \
                 WHERE status = 'approved' \
                 AND CURDATE() BETWEEN start_date AND end_date",
            )
            .fetch_one(pool.get_ref())
            .await
        }
    }
    .map_err(ApiError::from)?;

    let upcoming_holidays = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM holidays \
         WHERE date > CURDATE() AND date <= DATE_ADD(CURDATE(), INTERVAL 7 DAY)",
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        pending_requests,
        approved_this_month,
        team_members_out,
        upcoming_holidays,
    }))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthlyReportQuery {
    #[param(example = 2024)]
    pub year: i32,
    #[param(example = 7)]
    pub month: u32,
    /// hr only; managers are pinned to their own team
    pub team_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct DayAbsence {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
}

#[derive(Serialize, ToSchema)]
pub struct MemberMonthlyReport {
    pub user_id: u64,
    pub name: String,
    /// Approved absence days clamped into the month
    #[schema(example = 4)]
    pub days_absent: i64,
    pub absences: Vec<DayAbsence>,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub members: Vec<MemberMonthlyReport>,
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly",
    params(MonthlyReportQuery),
    responses(
        (status = 200, description = "Per-member absence days for the month", body = MonthlyReport),
        (status = 400, description = "Invalid year/month"),
        (status = 403, description = "Reviewer role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn monthly_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthlyReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let month_start = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| ApiError::Validation("invalid year/month".into()))?;
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| ApiError::Validation("invalid year/month".into()))?;

    // Managers report on their own team; hr picks any team or all users.
    let team_scope = if auth.capabilities().can_manage_users {
        query.team_id
    } else {
        Some(
            auth.team_id
                .ok_or(ApiError::Forbidden("no team assigned"))?,
        )
    };

    let members: Vec<User> = match team_scope {
        Some(team_id) => {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE team_id = ? ORDER BY name ASC");
            sqlx::query_as::<_, User>(&sql)
                .bind(team_id)
                .fetch_all(pool.get_ref())
                .await
        }
        None => {
            let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name ASC");
            sqlx::query_as::<_, User>(&sql).fetch_all(pool.get_ref()).await
        }
    }
    .map_err(ApiError::from)?;

    let requests: Vec<LeaveRequest> = if members.is_empty() {
        Vec::new()
    } else {
        let placeholders = vec!["?"; members.len()].join(", ");
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests \
             WHERE status = 'approved' AND user_id IN ({placeholders}) \
             AND start_date <= ? AND end_date >= ?"
        );
        let mut q = sqlx::query_as::<_, LeaveRequest>(&sql);
        for member in &members {
            q = q.bind(member.id);
        }
        q.bind(month_end)
            .bind(month_start)
            .fetch_all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
    };

    let members = members
        .into_iter()
        .map(|member| {
            let mut days_absent = 0i64;
            let mut absences = Vec::new();
            for request in requests.iter().filter(|r| r.user_id == member.id) {
                if let Some((s, e)) =
                    clamp_range(request.start_date, request.end_date, month_start, month_end)
                {
                    days_absent += inclusive_days(s, e);
                    absences.extend(days_in(s, e).map(|date| DayAbsence {
                        date,
                        leave_type: request.leave_type,
                    }));
                }
            }
            absences.sort_by_key(|a| a.date);
            MemberMonthlyReport {
                user_id: member.id,
                name: member.name,
                days_absent,
                absences,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(MonthlyReport {
        year: query.year,
        month: query.month,
        members,
    }))
}

use std::collections::HashSet;

use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::availability::{
    Absentee, CriticalDay, DEFAULT_CRITICAL_THRESHOLD, MemberStatus, absences_by_date,
    critical_days, member_status, upcoming_absences,
};
use crate::error::ApiError;
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest, LeaveType};
use crate::model::user::{USER_COLUMNS, User};

const DEFAULT_HORIZON_DAYS: u32 = 30;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    /// Reference date; defaults to today
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "date")]
    pub as_of: Option<NaiveDate>,
    /// Window length in days; defaults to 30
    pub horizon_days: Option<u32>,
    /// Critical-day threshold in (0, 1); defaults to 0.5
    pub threshold: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct DayLoad {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub absentees: Vec<Absentee>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityState {
    Available,
    Absent,
}

#[derive(Serialize, ToSchema)]
pub struct MemberAvailability {
    pub user_id: u64,
    pub name: String,
    pub status: AvailabilityState,
    /// Leave type behind the absence, when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<LeaveType>,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub team_id: u64,
    #[schema(value_type = String, format = "date")]
    pub as_of: NaiveDate,
    pub horizon_days: u32,
    pub members_total: usize,
    /// Approved absences intersecting the window, earliest first
    pub upcoming: Vec<LeaveRequest>,
    /// Day-by-day absence load inside the window
    pub by_date: Vec<DayLoad>,
    /// Days where absent members exceed the threshold share of the team
    pub critical_days: Vec<CriticalDay>,
    pub members: Vec<MemberAvailability>,
}

fn distinct_absentees(leaves: &[&LeaveRequest]) -> Vec<Absentee> {
    let mut seen = HashSet::new();
    leaves
        .iter()
        .filter(|l| seen.insert(l.user_id))
        .map(|l| Absentee {
            user_id: l.user_id,
            user_name: l.user_name.clone(),
            leave_type: l.leave_type,
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/teams/{team_id}/availability",
    params(
        ("team_id" = u64, Path, description = "Team ID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Team availability projections", body = AvailabilityResponse),
        (status = 403, description = "Reviewer role required / not your team"),
        (status = 404, description = "Team not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Availability"
)]
pub async fn team_availability(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<AvailabilityQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let team_id = path.into_inner();

    // Managers see their own team; hr sees any.
    if !auth.capabilities().can_manage_users && auth.team_id != Some(team_id) {
        return Err(ApiError::Forbidden("not your team").into());
    }

    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let horizon_days = query.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
    let threshold = query.threshold.unwrap_or(DEFAULT_CRITICAL_THRESHOLD);

    if !(0.0..1.0).contains(&threshold) {
        return Err(ApiError::Validation("threshold must be in [0, 1)".into()).into());
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::from)?;
    if exists == 0 {
        return Err(ApiError::NotFound("team").into());
    }

    let members_sql = format!("SELECT {USER_COLUMNS} FROM users WHERE team_id = ? ORDER BY name ASC");
    let members = sqlx::query_as::<_, User>(&members_sql)
        .bind(team_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let requests = if members.is_empty() {
        Vec::new()
    } else {
        // Window prefilter in SQL; the engine re-filters and sorts.
        let placeholders = vec!["?"; members.len()].join(", ");
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests \
             WHERE status = 'approved' AND user_id IN ({placeholders}) \
             AND end_date >= ? AND start_date <= ?"
        );
        let mut q = sqlx::query_as::<_, LeaveRequest>(&sql);
        for member in &members {
            q = q.bind(member.id);
        }
        q.bind(as_of)
            .bind(as_of + chrono::Duration::days(i64::from(horizon_days)))
            .fetch_all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
    };

    let upcoming: Vec<LeaveRequest> = upcoming_absences(&requests, as_of, horizon_days)
        .into_iter()
        .cloned()
        .collect();

    let by_date: Vec<DayLoad> = absences_by_date(&requests, as_of, horizon_days)
        .into_iter()
        .map(|(date, leaves)| DayLoad {
            date,
            absentees: distinct_absentees(&leaves),
        })
        .collect();

    let critical = critical_days(members.len(), &requests, as_of, horizon_days, threshold);

    let member_statuses: Vec<MemberAvailability> = members
        .iter()
        .map(|m| {
            let (status, reason) = match member_status(&requests, m.id, as_of) {
                MemberStatus::Available => (AvailabilityState::Available, None),
                MemberStatus::Absent { reason } => (AvailabilityState::Absent, Some(reason)),
            };
            MemberAvailability {
                user_id: m.id,
                name: m.name.clone(),
                status,
                reason,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(AvailabilityResponse {
        team_id,
        as_of,
        horizon_days,
        members_total: members.len(),
        upcoming,
        by_date,
        critical_days: critical,
        members: member_statuses,
    }))
}

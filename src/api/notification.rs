use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::engine::notifications::{Notification, synthesize};
use crate::error::ApiError;
use crate::model::holiday::{HOLIDAY_COLUMNS, Holiday};
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest};

/// Notifications are a pure projection of the current request and holiday
/// collections: derived on every call, never stored, never marked read.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses((status = 200, description = "Synthesized notifications", body = [Notification])),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let caps = auth.capabilities();

    // Pending requests only matter to reviewers; skip the query otherwise.
    let requests: Vec<LeaveRequest> = if caps.can_review {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE status = 'pending'");
        sqlx::query_as::<_, LeaveRequest>(&sql)
            .fetch_all(pool.get_ref())
            .await
            .map_err(ApiError::from)?
    } else {
        Vec::new()
    };

    let holidays_sql = format!(
        "SELECT {HOLIDAY_COLUMNS} FROM holidays \
         WHERE date > CURDATE() AND date <= DATE_ADD(CURDATE(), INTERVAL 7 DAY)"
    );
    let holidays = sqlx::query_as::<_, Holiday>(&holidays_sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    let now = Utc::now();
    let notifications: Vec<Notification> = synthesize(
        auth.user_id,
        caps,
        &requests,
        &holidays,
        now.date_naive(),
        now,
    );

    Ok(HttpResponse::Ok().json(notifications))
}

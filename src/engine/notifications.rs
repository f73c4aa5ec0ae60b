//! Synthetic notifications derived on every read from the current request
//! and holiday collections. Nothing here is persisted; read-state tracking
//! belongs to whatever stores real notifications.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::holiday::Holiday;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Capabilities;

/// Holidays at most this many days ahead trigger the upcoming-holidays note.
const UPCOMING_HOLIDAY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    /// Stable slug, not a database id.
    #[schema(example = "pending-requests")]
    pub id: String,

    pub user_id: u64,

    pub title: String,

    pub message: String,

    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// Always false: synthetic notifications carry no read-state.
    pub is_read: bool,

    #[schema(nullable = true)]
    pub related_type: Option<&'static str>,

    #[schema(nullable = true)]
    pub related_id: Option<u64>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Derives the viewer's notifications:
/// reviewers get a warning when requests are pending, and everyone gets an
/// info note when holidays fall within the next seven days (tomorrow through
/// `today + 7`; today itself is no longer "upcoming").
pub fn synthesize(
    viewer_id: u64,
    caps: Capabilities,
    requests: &[LeaveRequest],
    holidays: &[Holiday],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    if caps.can_review {
        let pending = requests
            .iter()
            .filter(|r| r.status == LeaveStatus::Pending)
            .count();
        if pending > 0 {
            notifications.push(Notification {
                id: "pending-requests".to_string(),
                user_id: viewer_id,
                title: "Pending requests".to_string(),
                message: format!("You have {pending} request(s) awaiting review"),
                kind: NotificationKind::Warning,
                is_read: false,
                related_type: Some("leave_request"),
                related_id: None,
                created_at: now,
            });
        }
    }

    let horizon = today + Duration::days(UPCOMING_HOLIDAY_DAYS);
    let upcoming = holidays
        .iter()
        .filter(|h| h.date > today && h.date <= horizon)
        .count();
    if upcoming > 0 {
        notifications.push(Notification {
            id: "upcoming-holidays".to_string(),
            user_id: viewer_id,
            title: "Upcoming holidays".to_string(),
            message: format!("{upcoming} holiday(s) in the next 7 days"),
            kind: NotificationKind::Info,
            is_read: false,
            related_type: Some("holiday"),
            related_id: None,
            created_at: now,
        });
    }

    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::HolidayType;
    use crate::model::leave_request::LeaveType;
    use crate::model::role::Role;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn pending_request(id: u64) -> LeaveRequest {
        LeaveRequest {
            id,
            user_id: 1,
            user_name: "María García".to_string(),
            leave_type: LeaveType::Vacation,
            start_date: d(2024, 7, 15),
            end_date: d(2024, 7, 19),
            days_count: 5,
            reason: None,
            status: LeaveStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_comments: None,
            created_at: None,
        }
    }

    fn holiday(id: u64, date: NaiveDate) -> Holiday {
        Holiday {
            id,
            name: format!("holiday-{id}"),
            date,
            holiday_type: HolidayType::National,
            is_mandatory: true,
            created_by: 3,
            created_at: None,
        }
    }

    #[test]
    fn reviewer_sees_pending_warning_with_count() {
        let requests = vec![pending_request(1), pending_request(2)];
        let out = synthesize(
            9,
            Role::Manager.capabilities(),
            &requests,
            &[],
            d(2024, 7, 1),
            Utc::now(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "pending-requests");
        assert_eq!(out[0].kind, NotificationKind::Warning);
        assert!(out[0].message.contains('2'));
        assert!(!out[0].is_read);
    }

    #[test]
    fn employee_never_sees_pending_warning() {
        let requests = vec![pending_request(1)];
        let out = synthesize(
            1,
            Role::Employee.capabilities(),
            &requests,
            &[],
            d(2024, 7, 1),
            Utc::now(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn no_pending_requests_means_no_warning() {
        let mut request = pending_request(1);
        request.status = LeaveStatus::Approved;
        let out = synthesize(
            9,
            Role::Hr.capabilities(),
            &[request],
            &[],
            d(2024, 7, 1),
            Utc::now(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn holiday_window_excludes_today_and_includes_day_seven() {
        let today = d(2024, 7, 1);
        let caps = Role::Employee.capabilities();

        let same_day = synthesize(1, caps, &[], &[holiday(1, today)], today, Utc::now());
        assert!(same_day.is_empty());

        let edge = synthesize(1, caps, &[], &[holiday(1, d(2024, 7, 8))], today, Utc::now());
        assert_eq!(edge.len(), 1);
        assert_eq!(edge[0].id, "upcoming-holidays");
        assert_eq!(edge[0].kind, NotificationKind::Info);

        let beyond = synthesize(1, caps, &[], &[holiday(1, d(2024, 7, 9))], today, Utc::now());
        assert!(beyond.is_empty());
    }

    #[test]
    fn both_notifications_can_coexist() {
        let requests = vec![pending_request(1)];
        let holidays = vec![holiday(1, d(2024, 7, 3)), holiday(2, d(2024, 7, 5))];
        let out = synthesize(
            9,
            Role::Hr.capabilities(),
            &requests,
            &holidays,
            d(2024, 7, 1),
            Utc::now(),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "pending-requests");
        assert_eq!(out[1].id, "upcoming-holidays");
        assert!(out[1].message.contains('2'));
    }
}

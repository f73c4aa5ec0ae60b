//! Read-side projections over a team's approved leave requests. Everything
//! here is pure: callers fetch the rows, these functions only derive.

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::dates::{clamp_range, days_in, ranges_overlap};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

/// Default share of a team that must be absent before a day counts as
/// critical. The comparison is strict: exactly half absent is not critical.
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Absentee {
    pub user_id: u64,
    pub user_name: String,
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CriticalDay {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    /// absent members / team size, in `(threshold, 1.0]`.
    pub ratio: f64,
    pub absentees: Vec<Absentee>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemberStatus {
    Available,
    Absent { reason: LeaveType },
}

fn window_end(as_of: NaiveDate, horizon_days: u32) -> NaiveDate {
    as_of + Duration::days(i64::from(horizon_days))
}

/// Approved requests whose inclusive range intersects
/// `[as_of, as_of + horizon_days]`, ordered by start date then id.
pub fn upcoming_absences<'a>(
    requests: &'a [LeaveRequest],
    as_of: NaiveDate,
    horizon_days: u32,
) -> Vec<&'a LeaveRequest> {
    let end = window_end(as_of, horizon_days);
    let mut hits: Vec<&LeaveRequest> = requests
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved)
        .filter(|r| ranges_overlap(r.start_date, r.end_date, as_of, end))
        .collect();
    hits.sort_by_key(|r| (r.start_date, r.id));
    hits
}

/// Day-by-day expansion of the upcoming absences, clamped to the window.
pub fn absences_by_date<'a>(
    requests: &'a [LeaveRequest],
    as_of: NaiveDate,
    horizon_days: u32,
) -> BTreeMap<NaiveDate, Vec<&'a LeaveRequest>> {
    let end = window_end(as_of, horizon_days);
    let mut by_date: BTreeMap<NaiveDate, Vec<&LeaveRequest>> = BTreeMap::new();
    for request in upcoming_absences(requests, as_of, horizon_days) {
        if let Some((s, e)) = clamp_range(request.start_date, request.end_date, as_of, end) {
            for day in days_in(s, e) {
                by_date.entry(day).or_default().push(request);
            }
        }
    }
    by_date
}

/// Days on which strictly more than `threshold × member_count` distinct
/// members are absent, ordered by date.
pub fn critical_days(
    member_count: usize,
    requests: &[LeaveRequest],
    as_of: NaiveDate,
    horizon_days: u32,
    threshold: f64,
) -> Vec<CriticalDay> {
    if member_count == 0 {
        return Vec::new();
    }
    absences_by_date(requests, as_of, horizon_days)
        .into_iter()
        .filter_map(|(date, leaves)| {
            // A member with overlapping approved requests counts once.
            let mut seen = HashSet::new();
            let absentees: Vec<Absentee> = leaves
                .iter()
                .filter(|l| seen.insert(l.user_id))
                .map(|l| Absentee {
                    user_id: l.user_id,
                    user_name: l.user_name.clone(),
                    leave_type: l.leave_type,
                })
                .collect();
            let absent = absentees.len() as f64;
            let ratio = absent / member_count as f64;
            (absent > threshold * member_count as f64).then_some(CriticalDay {
                date,
                ratio,
                absentees,
            })
        })
        .collect()
}

/// Whether a member is out on `as_of`. With several covering requests the
/// earliest-starting (then lowest-id) one supplies the reason.
pub fn member_status(requests: &[LeaveRequest], member_id: u64, as_of: NaiveDate) -> MemberStatus {
    requests
        .iter()
        .filter(|r| r.user_id == member_id && r.status == LeaveStatus::Approved)
        .filter(|r| r.start_date <= as_of && as_of <= r.end_date)
        .min_by_key(|r| (r.start_date, r.id))
        .map_or(MemberStatus::Available, |r| MemberStatus::Absent {
            reason: r.leave_type,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn request(
        id: u64,
        user_id: u64,
        leave_type: LeaveType,
        status: LeaveStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveRequest {
        LeaveRequest {
            id,
            user_id,
            user_name: format!("user-{user_id}"),
            leave_type,
            start_date: start,
            end_date: end,
            days_count: crate::engine::dates::inclusive_days(start, end) as i32,
            reason: None,
            status,
            reviewed_by: None,
            reviewed_at: None,
            review_comments: None,
            created_at: None,
        }
    }

    #[test]
    fn upcoming_keeps_partial_overlaps_and_drops_outsiders() {
        let as_of = d(2024, 7, 1);
        let requests = vec![
            // straddles the window start
            request(1, 1, LeaveType::Vacation, LeaveStatus::Approved, d(2024, 6, 28), d(2024, 7, 2)),
            // fully inside
            request(2, 2, LeaveType::Sick, LeaveStatus::Approved, d(2024, 7, 3), d(2024, 7, 4)),
            // entirely after the 7-day window
            request(3, 3, LeaveType::Vacation, LeaveStatus::Approved, d(2024, 7, 20), d(2024, 7, 25)),
            // overlapping but still pending
            request(4, 4, LeaveType::Vacation, LeaveStatus::Pending, d(2024, 7, 2), d(2024, 7, 5)),
        ];

        let upcoming = upcoming_absences(&requests, as_of, 7);
        let ids: Vec<u64> = upcoming.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn upcoming_includes_request_ending_exactly_on_window_edge() {
        let as_of = d(2024, 7, 1);
        let requests = vec![request(
            1,
            1,
            LeaveType::Vacation,
            LeaveStatus::Approved,
            d(2024, 7, 8),
            d(2024, 7, 10),
        )];
        // window end is as_of + 7 = 2024-07-08
        assert_eq!(upcoming_absences(&requests, as_of, 7).len(), 1);
        assert!(upcoming_absences(&requests, as_of, 6).is_empty());
    }

    #[test]
    fn by_date_expands_inclusive_ranges() {
        let as_of = d(2024, 7, 1);
        let requests = vec![request(
            1,
            1,
            LeaveType::Vacation,
            LeaveStatus::Approved,
            d(2024, 7, 2),
            d(2024, 7, 4),
        )];

        let by_date = absences_by_date(&requests, as_of, 30);
        assert_eq!(by_date.len(), 3);
        assert!(by_date.contains_key(&d(2024, 7, 2)));
        assert!(by_date.contains_key(&d(2024, 7, 3)));
        assert!(by_date.contains_key(&d(2024, 7, 4)));
        assert!(!by_date.contains_key(&d(2024, 7, 5)));
    }

    #[test]
    fn by_date_clamps_to_window_start() {
        let as_of = d(2024, 7, 1);
        let requests = vec![request(
            1,
            1,
            LeaveType::Sick,
            LeaveStatus::Approved,
            d(2024, 6, 28),
            d(2024, 7, 2),
        )];

        let by_date = absences_by_date(&requests, as_of, 30);
        assert_eq!(
            by_date.keys().copied().collect::<Vec<_>>(),
            vec![d(2024, 7, 1), d(2024, 7, 2)]
        );
    }

    #[test]
    fn three_of_four_absent_is_critical_at_default_threshold() {
        let as_of = d(2024, 7, 1);
        let day = d(2024, 7, 10);
        let requests = vec![
            request(1, 1, LeaveType::Vacation, LeaveStatus::Approved, day, day),
            request(2, 2, LeaveType::Sick, LeaveStatus::Approved, day, day),
            request(3, 3, LeaveType::Personal, LeaveStatus::Approved, day, day),
        ];

        let critical = critical_days(4, &requests, as_of, 30, DEFAULT_CRITICAL_THRESHOLD);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].date, day);
        assert_eq!(critical[0].ratio, 0.75);
        assert_eq!(critical[0].absentees.len(), 3);
    }

    #[test]
    fn exactly_half_absent_is_not_critical() {
        let as_of = d(2024, 7, 1);
        let day = d(2024, 7, 10);
        let requests = vec![
            request(1, 1, LeaveType::Vacation, LeaveStatus::Approved, day, day),
            request(2, 2, LeaveType::Vacation, LeaveStatus::Approved, day, day),
        ];

        assert!(critical_days(4, &requests, as_of, 30, DEFAULT_CRITICAL_THRESHOLD).is_empty());
    }

    #[test]
    fn overlapping_requests_of_one_member_count_once() {
        let as_of = d(2024, 7, 1);
        let day = d(2024, 7, 10);
        let requests = vec![
            request(1, 1, LeaveType::Vacation, LeaveStatus::Approved, day, day),
            request(2, 1, LeaveType::Personal, LeaveStatus::Approved, day, day),
            request(3, 2, LeaveType::Sick, LeaveStatus::Approved, day, day),
        ];

        // 2 distinct absentees out of 4 -> ratio 0.5, below the strict bar
        assert!(critical_days(4, &requests, as_of, 30, DEFAULT_CRITICAL_THRESHOLD).is_empty());
        // but out of 3 members the same day is critical
        let critical = critical_days(3, &requests, as_of, 30, DEFAULT_CRITICAL_THRESHOLD);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].absentees.len(), 2);
    }

    #[test]
    fn empty_team_never_reports_critical_days() {
        let day = d(2024, 7, 10);
        let requests = vec![request(
            1, 1, LeaveType::Vacation, LeaveStatus::Approved, day, day,
        )];
        assert!(critical_days(0, &requests, d(2024, 7, 1), 30, 0.5).is_empty());
    }

    #[test]
    fn member_is_absent_across_the_full_inclusive_range() {
        let requests = vec![request(
            1,
            1,
            LeaveType::Vacation,
            LeaveStatus::Approved,
            d(2024, 7, 15),
            d(2024, 7, 19),
        )];

        for day in 15..=19 {
            assert_eq!(
                member_status(&requests, 1, d(2024, 7, day)),
                MemberStatus::Absent {
                    reason: LeaveType::Vacation
                }
            );
        }
        assert_eq!(member_status(&requests, 1, d(2024, 7, 14)), MemberStatus::Available);
        assert_eq!(member_status(&requests, 1, d(2024, 7, 20)), MemberStatus::Available);
    }

    #[test]
    fn earliest_request_supplies_the_reason() {
        let requests = vec![
            request(7, 1, LeaveType::Personal, LeaveStatus::Approved, d(2024, 7, 10), d(2024, 7, 12)),
            request(2, 1, LeaveType::Vacation, LeaveStatus::Approved, d(2024, 7, 8), d(2024, 7, 12)),
        ];

        assert_eq!(
            member_status(&requests, 1, d(2024, 7, 11)),
            MemberStatus::Absent {
                reason: LeaveType::Vacation
            }
        );
    }

    #[test]
    fn pending_and_rejected_requests_leave_members_available() {
        let day = d(2024, 7, 10);
        let requests = vec![
            request(1, 1, LeaveType::Vacation, LeaveStatus::Pending, day, day),
            request(2, 1, LeaveType::Sick, LeaveStatus::Rejected, day, day),
        ];
        assert_eq!(member_status(&requests, 1, day), MemberStatus::Available);
    }
}

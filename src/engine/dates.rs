use chrono::NaiveDate;

/// Inclusive span in days: a request from Monday to Friday covers 5 days.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Whether two inclusive ranges share at least one day.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Clamps `[start, end]` into `[lo, hi]`; `None` when they do not intersect.
pub fn clamp_range(
    start: NaiveDate,
    end: NaiveDate,
    lo: NaiveDate,
    hi: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let s = start.max(lo);
    let e = end.min(hi);
    (s <= e).then_some((s, e))
}

/// Iterates every day of the inclusive range.
pub fn days_in(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn span_is_inclusive() {
        assert_eq!(inclusive_days(d(2024, 7, 15), d(2024, 7, 19)), 5);
        assert_eq!(inclusive_days(d(2024, 6, 20), d(2024, 6, 20)), 1);
    }

    #[test]
    fn overlap_counts_shared_boundary_days() {
        // touching at one end
        assert!(ranges_overlap(d(2024, 7, 1), d(2024, 7, 7), d(2024, 7, 7), d(2024, 7, 10)));
        // disjoint
        assert!(!ranges_overlap(d(2024, 7, 1), d(2024, 7, 6), d(2024, 7, 7), d(2024, 7, 10)));
        // containment
        assert!(ranges_overlap(d(2024, 7, 1), d(2024, 7, 31), d(2024, 7, 10), d(2024, 7, 12)));
    }

    #[test]
    fn clamp_trims_to_the_window() {
        assert_eq!(
            clamp_range(d(2024, 6, 28), d(2024, 7, 3), d(2024, 7, 1), d(2024, 7, 31)),
            Some((d(2024, 7, 1), d(2024, 7, 3)))
        );
        assert_eq!(
            clamp_range(d(2024, 6, 1), d(2024, 6, 30), d(2024, 7, 1), d(2024, 7, 31)),
            None
        );
    }

    #[test]
    fn day_iterator_walks_inclusive_range() {
        let days: Vec<_> = days_in(d(2024, 2, 27), d(2024, 3, 1)).collect();
        assert_eq!(
            days,
            vec![d(2024, 2, 27), d(2024, 2, 28), d(2024, 2, 29), d(2024, 3, 1)]
        );
    }
}

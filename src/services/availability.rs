use chrono::NaiveDate;

/// Half-open interval overlap: `[a1, a2)` conflicts with `[b1, b2)` iff
/// `a1 < b2 && b1 < a2`. Back-to-back stays (checkout day == check-in day)
/// do not conflict.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

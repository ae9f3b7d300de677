//! Priority score: an additive, unbounded sum of independent contributions.
//!
//! - due date: overdue/today +10, 1-2 days +8, 3-7 days +5, later +2, none 0
//! - effort, consequences, desire: raw rating values
//! - repetitions: +1 per repetition beyond the first

use chrono::{DateTime, Utc};

use crate::task::TaskAttributes;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `now` until `due`, rounded toward negative infinity.
///
/// A deadline twelve hours in the past is day -1, not day 0.
pub fn whole_days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn due_date_points(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(due) = due else { return 0 };
    match whole_days_until(due, now) {
        d if d <= 0 => 10,
        d if d <= 2 => 8,
        d if d <= 7 => 5,
        _ => 2,
    }
}

/// Deterministic and total: ratings outside 1-10 are taken as given.
pub fn compute_score(attrs: &TaskAttributes, now: DateTime<Utc>) -> f64 {
    let total = due_date_points(attrs.due_date, now)
        .saturating_add(i64::from(attrs.effort))
        .saturating_add(i64::from(attrs.consequences))
        .saturating_add(i64::from(attrs.desire))
        .saturating_add(attrs.repetitions.saturating_sub(1));
    total as f64
}

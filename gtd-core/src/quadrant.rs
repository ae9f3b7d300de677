//! Urgency × importance grouping. Used for display only; ranking is `score`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::whole_days_until;
use crate::task::TaskAttributes;

/// Tasks due within this many whole days (or overdue) are urgent.
pub const URGENT_DAYS: i64 = 2;

/// Minimum `consequences + desire` for a task to count as important.
pub const IMPORTANCE_THRESHOLD: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quadrant {
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::NotUrgentImportant,
        Quadrant::UrgentNotImportant,
        Quadrant::NotUrgentNotImportant,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "Urgent & Important",
            Quadrant::NotUrgentImportant => "Not Urgent & Important",
            Quadrant::UrgentNotImportant => "Urgent & Not Important",
            Quadrant::NotUrgentNotImportant => "Not Urgent & Not Important",
        }
    }
}

pub fn is_urgent(attrs: &TaskAttributes, now: DateTime<Utc>) -> bool {
    attrs
        .due_date
        .is_some_and(|due| whole_days_until(due, now) <= URGENT_DAYS)
}

pub fn is_important(attrs: &TaskAttributes) -> bool {
    i64::from(attrs.consequences) + i64::from(attrs.desire) >= IMPORTANCE_THRESHOLD
}

pub fn classify(attrs: &TaskAttributes, now: DateTime<Utc>) -> Quadrant {
    match (is_urgent(attrs, now), is_important(attrs)) {
        (true, true) => Quadrant::UrgentImportant,
        (false, true) => Quadrant::NotUrgentImportant,
        (true, false) => Quadrant::UrgentNotImportant,
        (false, false) => Quadrant::NotUrgentNotImportant,
    }
}

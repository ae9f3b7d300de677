//! Due-soon projection: which incomplete tasks fall due inside a window, and
//! how to phrase the time left. Delivery is somebody else's job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

pub const DEFAULT_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueReminder {
    pub task_id: TaskId,
    pub title: String,
    pub subtitle: String,
    pub due_date: DateTime<Utc>,
}

/// Relative phrase for a deadline `remaining` away.
pub fn describe_remaining(remaining: Duration) -> String {
    let hours = remaining.num_seconds() as f64 / 3600.0;
    if hours <= 1.0 {
        "due within an hour!".to_string()
    } else if hours <= 2.0 {
        "due in about 2 hours".to_string()
    } else if hours <= 24.0 {
        format!("due in {} hours", hours as i64)
    } else {
        let days = (hours / 24.0) as i64;
        format!("due in {} day{}", days, if days > 1 { "s" } else { "" })
    }
}

/// Incomplete tasks due within `[now, now + window]`, soonest first.
/// A window reaching past the representable range covers everything after `now`.
pub fn due_soon(tasks: &[Task], now: DateTime<Utc>, window: Duration) -> Vec<DueReminder> {
    let cutoff = now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC);
    let mut out: Vec<DueReminder> = tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(|t| {
            let due = t.due_date?;
            if due < now || due > cutoff {
                return None;
            }
            Some(DueReminder {
                task_id: t.id,
                title: format!("Task #{}: {}", t.id, t.title),
                subtitle: describe_remaining(due - now),
                due_date: due,
            })
        })
        .collect();
    out.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.task_id.cmp(&b.task_id)));
    out
}

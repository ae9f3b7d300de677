//! Plain-text rendering for the terminal.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use gtd_core::{Quadrant, Task, classify};

pub fn format_due(due: Option<DateTime<Utc>>, tz: Tz) -> String {
    match due {
        Some(d) => d.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn task_row(task: &Task, now: DateTime<Utc>, tz: Tz) -> String {
    let status = if task.completed { "✓" } else { "○" };
    format!(
        "{:>4}  {} {:<40} {:<16} {:>6.2}  {}",
        task.id,
        status,
        truncate(&task.title, 40),
        format_due(task.due_date, tz),
        task.score,
        classify(&task.attributes(), now).label(),
    )
}

pub fn task_details(task: &Task, now: DateTime<Utc>, tz: Tz) -> String {
    let pre_task = task
        .pre_task
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "N/A".to_string());
    [
        format!("Task #{}: {}", task.id, task.title),
        format!("  Description:  {}", task.description.as_deref().unwrap_or("N/A")),
        format!("  Due date:     {}", format_due(task.due_date, tz)),
        format!("  Effort:       {}", task.effort),
        format!("  Consequences: {}", task.consequences),
        format!("  Desire:       {}", task.desire),
        format!("  Repetitions:  {}", task.repetitions),
        format!("  Prerequisite: {pre_task}"),
        format!("  Score:        {:.2}", task.score),
        format!("  Quadrant:     {}", classify(&task.attributes(), now).label()),
        format!("  Completed:    {}", if task.completed { "yes" } else { "no" }),
    ]
    .join("\n")
}

/// Rows under one heading per quadrant, in `Quadrant::ALL` order. Empty quadrants are kept.
pub fn quadrant_groups(tasks: &[Task], now: DateTime<Utc>, tz: Tz) -> String {
    let mut sections = Vec::with_capacity(Quadrant::ALL.len());
    for quadrant in Quadrant::ALL {
        let rows: Vec<String> = tasks
            .iter()
            .filter(|t| classify(&t.attributes(), now) == quadrant)
            .map(|t| task_row(t, now, tz))
            .collect();
        let body = if rows.is_empty() { "  (none)".to_string() } else { rows.join("\n") };
        sections.push(format!("== {} ({}) ==\n{}", quadrant.label(), rows.len(), body));
    }
    sections.join("\n\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

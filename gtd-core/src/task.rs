//! Task model: stored tasks, creation payloads and partial updates.
//!
//! The store owns persistence; everything here is plain data plus the rules for
//! keeping `score` in sync with the attributes it is derived from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::score::compute_score;

pub type TaskId = i64;

pub const DEFAULT_RATING: i32 = 5;

/// Borrowed view of everything the score and quadrant depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskAttributes {
    pub due_date: Option<DateTime<Utc>>,
    pub effort: i32,
    pub consequences: i32,
    pub desire: i32,
    pub repetitions: i64,
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,

    /// 1-10, higher means less effort required.
    pub effort: i32,

    /// 1-10, higher means more severe if neglected.
    pub consequences: i32,

    /// 1-10, higher means more desire to complete.
    pub desire: i32,

    pub repetitions: i64,

    /// Derived from the attributes above; see `score::compute_score`.
    pub score: f64,

    /// Advisory prerequisite. Stored, never enforced.
    pub pre_task: Option<TaskId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Materialize a new task from a creation payload. The store supplies the id.
    pub fn from_new(id: TaskId, new: &NewTask, now: DateTime<Utc>) -> Self {
        let mut task = Self {
            id,
            title: new.title.clone(),
            description: new.description.clone(),
            due_date: new.due_date,
            completed: false,
            effort: new.effort,
            consequences: new.consequences,
            desire: new.desire,
            repetitions: 1,
            score: 0.0,
            pre_task: new.pre_task,
            created_at: now,
            updated_at: now,
        };
        task.refresh_score(now);
        task
    }

    pub fn attributes(&self) -> TaskAttributes {
        TaskAttributes {
            due_date: self.due_date,
            effort: self.effort,
            consequences: self.consequences,
            desire: self.desire,
            repetitions: self.repetitions,
        }
    }

    pub fn refresh_score(&mut self, now: DateTime<Utc>) {
        self.score = compute_score(&self.attributes(), now);
    }

    /// Apply a partial update and recompute the score.
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) -> Result<()> {
        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(Error::EmptyTitle);
            }
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(effort) = update.effort {
            self.effort = effort;
        }
        if let Some(consequences) = update.consequences {
            self.consequences = consequences;
        }
        if let Some(desire) = update.desire {
            self.desire = desire;
        }
        if let Some(pre_task) = update.pre_task {
            self.pre_task = pre_task;
        }

        self.refresh_score(now);
        self.updated_at = now;
        Ok(())
    }

    /// One-way transition to completed.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.refresh_score(now);
        self.updated_at = now;
    }
}

/// Creation payload. Defaults match a freshly entered task: all ratings 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub effort: i32,
    pub consequences: i32,
    pub desire: i32,
    pub pre_task: Option<TaskId>,
}

impl Default for NewTask {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            due_date: None,
            effort: DEFAULT_RATING,
            consequences: DEFAULT_RATING,
            desire: DEFAULT_RATING,
            pre_task: None,
        }
    }
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_ratings(mut self, effort: i32, consequences: i32, desire: i32) -> Self {
        self.effort = effort;
        self.consequences = consequences;
        self.desire = desire;
        self
    }

    pub fn with_pre_task(mut self, pre_task: TaskId) -> Self {
        self.pre_task = Some(pre_task);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        Ok(())
    }

    /// Attributes as they will be on creation (repetitions always starts at 1).
    pub fn attributes(&self) -> TaskAttributes {
        TaskAttributes {
            due_date: self.due_date,
            effort: self.effort,
            consequences: self.consequences,
            desire: self.desire,
            repetitions: 1,
        }
    }
}

/// Explicit partial update. `None` leaves a field untouched; the nested
/// `Option`s allow clearing optional fields.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub effort: Option<i32>,
    pub consequences: Option<i32>,
    pub desire: Option<i32>,
    pub pre_task: Option<Option<TaskId>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.effort.is_none()
            && self.consequences.is_none()
            && self.desire.is_none()
            && self.pre_task.is_none()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    /// `None` lists everything.
    pub completed: Option<bool>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self { completed: None }
    }

    pub fn active() -> Self {
        Self {
            completed: Some(false),
        }
    }

    pub fn completed() -> Self {
        Self {
            completed: Some(true),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.completed.is_none_or(|c| task.completed == c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn new_task_uses_defaults() {
        let t = Task::from_new(1, &NewTask::new("Buy milk"), now());
        assert_eq!((t.effort, t.consequences, t.desire), (5, 5, 5));
        assert_eq!(t.repetitions, 1);
        assert!(!t.completed);
        assert_eq!(t.score, 15.0);
        assert_eq!(t.created_at, now());
    }

    #[test]
    fn apply_recomputes_score() {
        let mut t = Task::from_new(1, &NewTask::new("Report"), now());
        let update = TaskUpdate {
            due_date: Some(Some(now() + Duration::days(1))),
            effort: Some(9),
            ..Default::default()
        };
        t.apply(&update, now()).unwrap();
        assert_eq!(t.score, compute_score(&t.attributes(), now()));
        assert_eq!(t.score, 8.0 + 9.0 + 5.0 + 5.0);

        t.apply(
            &TaskUpdate {
                due_date: Some(None),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(t.due_date, None);
        assert_eq!(t.score, 19.0);
    }

    #[test]
    fn apply_rejects_blank_title() {
        let mut t = Task::from_new(1, &NewTask::new("Report"), now());
        let err = t
            .apply(
                &TaskUpdate {
                    title: Some("   ".into()),
                    ..Default::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::EmptyTitle));
        assert_eq!(t.title, "Report");
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TaskUpdate::default().is_empty());
        assert!(
            !TaskUpdate {
                pre_task: Some(None),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn filter_matches_completion() {
        let mut t = Task::from_new(1, &NewTask::new("x"), now());
        assert!(TaskFilter::active().matches(&t));
        t.mark_completed(now());
        assert!(TaskFilter::completed().matches(&t));
        assert!(!TaskFilter::active().matches(&t));
        assert!(TaskFilter::all().matches(&t));
    }
}

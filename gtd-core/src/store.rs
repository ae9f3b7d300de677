//! Task store contract plus a deterministic in-memory implementation.
//!
//! Every operation that changes score-affecting attributes recomputes `score`
//! before it is written. Merges go through `apply_merge`, which must update the
//! keeper and delete the loser as one unit.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::merge::{MergePlan, ensure_mergeable, plan_merge};
use crate::task::{NewTask, Task, TaskFilter, TaskId, TaskUpdate};

pub trait TaskStore {
    /// Insert a new task and return its id. The score is computed from `new`.
    fn create(&mut self, new: &NewTask, now: DateTime<Utc>) -> Result<TaskId>;

    fn get(&self, id: TaskId) -> Result<Option<Task>>;

    /// Tasks matching `filter`, highest score first (ties by ascending id).
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// Apply a partial update and recompute the score. `Ok(false)` if the id is unknown.
    fn update(&mut self, id: TaskId, update: &TaskUpdate, now: DateTime<Utc>) -> Result<bool>;

    /// Mark completed (one-way). `Ok(false)` if the id is unknown.
    fn complete(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool>;

    /// Record one more occurrence: repetitions +1, score +1, `updated_at = now`.
    fn increase_repetition(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool>;

    fn delete(&mut self, id: TaskId) -> Result<bool>;

    /// Merge two incomplete tasks as one unit. Keeper and loser are chosen with
    /// `plan_merge` from the rows as they are inside the unit; then
    /// keeper.repetitions += loser.repetitions, keeper.score += 1, `pre_task`
    /// references to the loser move to the keeper and the loser is deleted.
    fn apply_merge(&mut self, a: TaskId, b: TaskId) -> Result<MergePlan>;

    /// Highest-scored incomplete task.
    fn top_task(&self) -> Result<Option<Task>> {
        Ok(self.list(&TaskFilter::active())?.into_iter().next())
    }

    fn require(&self, id: TaskId) -> Result<Task> {
        self.get(id)?.ok_or(Error::NotFound(id))
    }
}

/// Ordering used by every `list` implementation.
pub fn by_score_desc(a: &Task, b: &Task) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(a.id.cmp(&b.id))
}

/// In-memory store keyed by id. Ids are handed out sequentially from 1.
#[derive(Debug, Default, Clone)]
pub struct MemoryTaskStore {
    tasks: BTreeMap<TaskId, Task>,
    next_id: TaskId,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&mut self, new: &NewTask, now: DateTime<Utc>) -> Result<TaskId> {
        new.validate()?;
        self.next_id += 1;
        let task = Task::from_new(self.next_id, new, now);
        tracing::debug!(id = task.id, score = task.score, "created task");
        self.tasks.insert(task.id, task);
        Ok(self.next_id)
    }

    fn get(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut out: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        out.sort_by(by_score_desc);
        Ok(out)
    }

    fn update(&mut self, id: TaskId, update: &TaskUpdate, now: DateTime<Utc>) -> Result<bool> {
        let Some(task) = self.tasks.get_mut(&id) else {
            return Ok(false);
        };
        task.apply(update, now)?;
        tracing::debug!(id, score = task.score, "updated task");
        Ok(true)
    }

    fn complete(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool> {
        let Some(task) = self.tasks.get_mut(&id) else {
            return Ok(false);
        };
        task.mark_completed(now);
        Ok(true)
    }

    fn increase_repetition(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool> {
        let Some(task) = self.tasks.get_mut(&id) else {
            return Ok(false);
        };
        task.repetitions += 1;
        task.score += 1.0;
        task.updated_at = now;
        Ok(true)
    }

    fn delete(&mut self, id: TaskId) -> Result<bool> {
        Ok(self.tasks.remove(&id).is_some())
    }

    fn apply_merge(&mut self, a: TaskId, b: TaskId) -> Result<MergePlan> {
        // Validate everything before touching state so a failure leaves no partial merge.
        if a == b {
            return Err(Error::InvalidMerge(format!("task {a} merged with itself")));
        }
        let first = self.tasks.get(&a).ok_or(Error::NotFound(a))?;
        let second = self.tasks.get(&b).ok_or(Error::NotFound(b))?;
        ensure_mergeable(first)?;
        ensure_mergeable(second)?;
        let plan = plan_merge(first, second);

        self.tasks.remove(&plan.loser);
        for task in self.tasks.values_mut() {
            if task.pre_task == Some(plan.loser) {
                task.pre_task = (task.id != plan.keeper).then_some(plan.keeper);
            }
        }
        if let Some(keeper) = self.tasks.get_mut(&plan.keeper) {
            keeper.repetitions += plan.added_repetitions;
            keeper.score += 1.0;
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn create_then_get_round_trips_attributes() {
        let mut s = MemoryTaskStore::new();
        let new = NewTask::new("File taxes")
            .with_description("federal + state")
            .with_due_date(now())
            .with_ratings(3, 9, 2);
        let id = s.create(&new, now()).unwrap();
        let t = s.get(id).unwrap().unwrap();
        assert_eq!(t.title, new.title);
        assert_eq!(t.description, new.description);
        assert_eq!(t.due_date, new.due_date);
        assert_eq!((t.effort, t.consequences, t.desire), (3, 9, 2));
        assert_eq!(t.pre_task, None);
    }

    #[test]
    fn create_rejects_empty_title() {
        let mut s = MemoryTaskStore::new();
        assert!(matches!(s.create(&NewTask::new(""), now()), Err(Error::EmptyTitle)));
        assert!(s.is_empty());
    }

    #[test]
    fn list_orders_by_score_then_id() {
        let mut s = MemoryTaskStore::new();
        let a = s.create(&NewTask::new("a").with_ratings(1, 1, 1), now()).unwrap();
        let b = s.create(&NewTask::new("b"), now()).unwrap();
        let c = s.create(&NewTask::new("c"), now()).unwrap();
        let ids: Vec<_> = s.list(&TaskFilter::all()).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[test]
    fn completed_tasks_leave_top_task() {
        let mut s = MemoryTaskStore::new();
        let hi = s.create(&NewTask::new("hi").with_ratings(9, 9, 9), now()).unwrap();
        let lo = s.create(&NewTask::new("lo"), now()).unwrap();
        assert_eq!(s.top_task().unwrap().unwrap().id, hi);
        assert!(s.complete(hi, now()).unwrap());
        assert_eq!(s.top_task().unwrap().unwrap().id, lo);
        assert_eq!(s.list(&TaskFilter::completed()).unwrap().len(), 1);
    }

    #[test]
    fn repeat_bumps_repetitions_and_score() {
        let mut s = MemoryTaskStore::new();
        let id = s.create(&NewTask::new("stretch"), now()).unwrap();
        let later = now() + chrono::Duration::hours(3);
        assert!(s.increase_repetition(id, later).unwrap());
        let t = s.get(id).unwrap().unwrap();
        assert_eq!((t.repetitions, t.score), (2, 16.0));
        assert_eq!((t.created_at, t.updated_at), (now(), later));
        assert!(!s.increase_repetition(99, later).unwrap());
    }

    #[test]
    fn unknown_ids_report_false_or_not_found() {
        let mut s = MemoryTaskStore::new();
        assert!(!s.update(7, &TaskUpdate::default(), now()).unwrap());
        assert!(!s.complete(7, now()).unwrap());
        assert!(!s.delete(7).unwrap());
        assert!(matches!(s.require(7), Err(Error::NotFound(7))));
    }

    #[test]
    fn failed_merge_leaves_store_untouched() {
        let mut s = MemoryTaskStore::new();
        let a = s.create(&NewTask::new("a"), now()).unwrap();
        let before = s.get(a).unwrap();
        assert!(matches!(s.apply_merge(a, 42), Err(Error::NotFound(42))));
        assert!(matches!(s.apply_merge(a, a), Err(Error::InvalidMerge(_))));
        assert_eq!(s.get(a).unwrap(), before);
    }

    #[test]
    fn merge_uses_current_rows_not_earlier_reads() {
        let mut s = MemoryTaskStore::new();
        let a = s.create(&NewTask::new("Mow lawn").with_ratings(9, 9, 9), now()).unwrap();
        let b = s.create(&NewTask::new("mow lawn"), now()).unwrap();
        let stale = plan_merge(&s.require(a).unwrap(), &s.require(b).unwrap());
        assert_eq!((stale.keeper, stale.added_repetitions), (a, 1));

        s.increase_repetition(b, now()).unwrap();
        s.increase_repetition(b, now()).unwrap();
        let plan = s.apply_merge(a, b).unwrap();
        assert_eq!(plan, MergePlan { keeper: a, loser: b, added_repetitions: 3 });
        assert_eq!(s.require(a).unwrap().repetitions, 4);
    }

    #[test]
    fn merge_rejects_completed_rows() {
        let mut s = MemoryTaskStore::new();
        let a = s.create(&NewTask::new("x"), now()).unwrap();
        let b = s.create(&NewTask::new("x"), now()).unwrap();
        s.complete(b, now()).unwrap();
        assert!(matches!(s.apply_merge(a, b), Err(Error::InvalidMerge(_))));
        assert_eq!(s.len(), 2);
    }
}

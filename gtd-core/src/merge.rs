//! Near-duplicate detection and merging.
//!
//! Candidate selection:
//! - only incomplete tasks other than the one being checked
//! - similarity >= threshold
//! - highest similarity wins, ties go to the lowest id
//!
//! Merge policy:
//! - the higher score is kept (equal scores keep the lower id)
//! - keeper.repetitions += loser.repetitions, keeper.score += 1 (flat bonus)
//! - the loser is deleted in the same transaction
//!
//! Keeper and loser are decided by the store from the rows it reads inside
//! that transaction, so a concurrent edit between lookup and merge is never lost.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::similarity::similarity;
use crate::store::TaskStore;
use crate::task::{Task, TaskFilter, TaskId};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Keeper/loser decision made by `TaskStore::apply_merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    pub keeper: TaskId,
    pub loser: TaskId,
    /// The loser's repetition count, added onto the keeper.
    pub added_repetitions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeCandidate {
    pub task: Task,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub plan: MergePlan,
    /// Keeper as stored after the merge.
    pub keeper: Task,
}

pub fn plan_merge(a: &Task, b: &Task) -> MergePlan {
    let a_wins = a.score > b.score || (a.score == b.score && a.id < b.id);
    let (keeper, loser) = if a_wins { (a, b) } else { (b, a) };
    MergePlan {
        keeper: keeper.id,
        loser: loser.id,
        added_repetitions: loser.repetitions,
    }
}

/// Completed tasks never take part in a merge, on either side.
pub fn ensure_mergeable(task: &Task) -> Result<()> {
    if task.completed {
        return Err(Error::InvalidMerge(format!("task {} is completed", task.id)));
    }
    Ok(())
}

/// Best merge partner for `task_id`, if any clears `threshold`.
/// A missing or completed task has no candidate.
pub fn find_merge_candidate<S: TaskStore + ?Sized>(
    store: &S,
    task_id: TaskId,
    threshold: f64,
) -> Result<Option<MergeCandidate>> {
    let Some(task) = store.get(task_id)? else {
        return Ok(None);
    };
    if task.completed {
        return Ok(None);
    }

    let mut best: Option<MergeCandidate> = None;
    for other in store.list(&TaskFilter::active())? {
        if other.id == task.id {
            continue;
        }
        let sim = similarity(&task.title, &other.title);
        if sim < threshold {
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => sim > b.similarity || (sim == b.similarity && other.id < b.task.id),
        };
        if better {
            best = Some(MergeCandidate {
                task: other,
                similarity: sim,
            });
        }
    }

    Ok(best)
}

/// Merge `task_id` into its most similar incomplete task, if one clears `threshold`.
/// Returns whether a merge happened; a missing or completed task is a no-op.
pub fn maybe_merge<S: TaskStore + ?Sized>(store: &mut S, task_id: TaskId, threshold: f64) -> Result<bool> {
    let Some(candidate) = find_merge_candidate(&*store, task_id, threshold)? else {
        tracing::debug!(task_id, "no merge candidate");
        return Ok(false);
    };

    let plan = store.apply_merge(task_id, candidate.task.id)?;
    tracing::info!(
        keeper = plan.keeper,
        loser = plan.loser,
        similarity = candidate.similarity,
        "merged similar tasks"
    );
    Ok(true)
}

/// Merge two specific incomplete tasks regardless of similarity.
pub fn merge_tasks<S: TaskStore + ?Sized>(store: &mut S, a: TaskId, b: TaskId) -> Result<MergeOutcome> {
    if a == b {
        return Err(Error::InvalidMerge(format!("task {a} merged with itself")));
    }
    ensure_mergeable(&store.require(a)?)?;
    ensure_mergeable(&store.require(b)?)?;

    let plan = store.apply_merge(a, b)?;
    tracing::info!(keeper = plan.keeper, loser = plan.loser, "merged tasks");

    let keeper = store.require(plan.keeper)?;
    Ok(MergeOutcome { plan, keeper })
}

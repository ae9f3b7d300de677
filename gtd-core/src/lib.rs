//! gtd-core: task model, priority scoring, quadrant classification and
//! near-duplicate merging for the gtd task manager.

pub mod due;
pub mod error;
pub mod merge;
pub mod quadrant;
pub mod score;
pub mod similarity;
pub mod store;
pub mod task;
pub mod time;

pub use due::{DueReminder, due_soon};
pub use error::{Error, Result};
pub use merge::{
    DEFAULT_SIMILARITY_THRESHOLD, MergeCandidate, MergeOutcome, MergePlan, ensure_mergeable,
    find_merge_candidate, maybe_merge, merge_tasks, plan_merge,
};
pub use quadrant::{Quadrant, classify};
pub use score::compute_score;
pub use similarity::similarity;
pub use store::{MemoryTaskStore, TaskStore};
pub use task::{NewTask, Task, TaskAttributes, TaskFilter, TaskId, TaskUpdate};
pub use time::parse_due_date;

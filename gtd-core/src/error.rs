//! Error type shared by the core and its store implementations.

use thiserror::Error;

use crate::task::TaskId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("invalid merge: {0}")]
    InvalidMerge(String),

    #[error("invalid due date: {0}")]
    InvalidDate(String),

    /// Backend failure (SQLite, poisoned lock, ...). Carries the rendered cause.
    #[error("task store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the 500-character storage limit.
    #[error("task title exceeds 500 character limit")]
    TitleTooLong,

    /// The requested state transition is not permitted.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The task is completed or cancelled and can no longer change.
    #[error("task {task_id} is {status} and can no longer be modified")]
    TerminalTask {
        /// Task being modified.
        task_id: TaskId,
        /// Terminal status.
        status: TaskStatus,
    },
}

/// Error returned while parsing task enumerations from persistence or user
/// input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {type_name}: {value}")]
pub struct ParseTaskValueError {
    /// Name of the enumeration being parsed.
    pub type_name: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseTaskValueError {
    pub(crate) fn new(type_name: &'static str, value: &str) -> Self {
        Self {
            type_name,
            value: value.to_owned(),
        }
    }
}

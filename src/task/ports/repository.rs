//! Repository ports for tasks and their evaluation reports.

use crate::registry::domain::RepoName;
use crate::task::domain::{EvaluationReport, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Filter for listing tasks. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to one repository.
    pub repo: Option<RepoName>,
    /// Restrict to one status.
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    /// Returns `true` when `task` passes the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.repo
            .as_ref()
            .is_none_or(|repo| task.assigned_repo() == Some(repo))
            && self.status.is_none_or(|status| task.status() == status)
    }
}

/// Task persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Replaces a task when the stored version still equals
    /// `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// and [`TaskRepositoryError::VersionConflict`] when another writer got
    /// there first.
    async fn update(&self, task: &Task, expected_version: u64) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Lists tasks matching `filter`, oldest first.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;
}

/// Persistence contract for evaluator verdicts.
#[async_trait]
pub trait EvaluationReportRepository: Send + Sync {
    /// Stores a report.
    async fn store_report(&self, report: &EvaluationReport) -> TaskRepositoryResult<()>;

    /// Lists the reports of a task, oldest first.
    async fn list_reports(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<EvaluationReport>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored version moved on since the task was read.
    #[error("task {task_id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Task being updated.
        task_id: TaskId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persisted data could not be converted back into domain values.
    #[error("invalid persisted task data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Wraps a decoding error for persisted rows.
    #[must_use]
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }
}

//! Task aggregate root.

use super::{Priority, TaskDomainError, TaskId, TaskStatus};
use crate::evaluation::domain::Grade;
use crate::registry::domain::{FilePath, RepoName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

const MAX_TITLE_LENGTH: usize = 500;

/// Fields supplied when a task is first created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Priority.
    pub priority: Priority,
    /// Repository the work belongs to.
    pub assigned_repo: Option<RepoName>,
    /// Number of users the plan must serve today.
    pub actual_users: u32,
    /// Proposed technical solution, if one was given.
    pub proposed_solution: Option<String>,
    /// Files the task touches.
    pub related_files: Vec<FilePath>,
}

/// Task aggregate root.
///
/// Only the workflow engine changes a task's status. Every mutation bumps
/// `version`, which repositories use for compare-and-swap updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    priority: Priority,
    assigned_repo: Option<RepoName>,
    actual_users: u32,
    proposed_solution: Option<String>,
    related_files: Vec<FilePath>,
    plan_grade: Option<Grade>,
    completion_grade: Option<Grade>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted repository assignment.
    pub assigned_repo: Option<RepoName>,
    /// Persisted user count.
    pub actual_users: u32,
    /// Persisted solution.
    pub proposed_solution: Option<String>,
    /// Persisted related files.
    pub related_files: Vec<FilePath>,
    /// Persisted plan grade.
    pub plan_grade: Option<Grade>,
    /// Persisted completion grade.
    pub completion_grade: Option<Grade>,
    /// Persisted first start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted version.
    pub version: u64,
}

impl Task {
    /// Creates a task in [`TaskStatus::Planning`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`] when the title is invalid.
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong);
        }
        let timestamp = clock.utc();
        let mut related_files = Vec::with_capacity(draft.related_files.len());
        push_unique(&mut related_files, draft.related_files);

        Ok(Self {
            id: TaskId::new(),
            title: title.to_owned(),
            description: draft.description,
            status: TaskStatus::Planning,
            priority: draft.priority,
            assigned_repo: draft.assigned_repo,
            actual_users: draft.actual_users,
            proposed_solution: draft
                .proposed_solution
                .filter(|solution| !solution.trim().is_empty()),
            related_files,
            plan_grade: None,
            completion_grade: None,
            started_at: None,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            assigned_repo: data.assigned_repo,
            actual_users: data.actual_users,
            proposed_solution: data.proposed_solution,
            related_files: data.related_files,
            plan_grade: data.plan_grade,
            completion_grade: data.completion_grade,
            started_at: data.started_at,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            version: data.version,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the title and description joined for keyword matching.
    #[must_use]
    pub fn subject_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the assigned repository.
    #[must_use]
    pub const fn assigned_repo(&self) -> Option<&RepoName> {
        self.assigned_repo.as_ref()
    }

    /// Returns the user count the plan was sized for.
    #[must_use]
    pub const fn actual_users(&self) -> u32 {
        self.actual_users
    }

    /// Returns the proposed solution.
    #[must_use]
    pub fn proposed_solution(&self) -> Option<&str> {
        self.proposed_solution.as_deref()
    }

    /// Returns the files attached to the task.
    #[must_use]
    pub fn related_files(&self) -> &[FilePath] {
        &self.related_files
    }

    /// Returns the most recent plan grade.
    #[must_use]
    pub const fn plan_grade(&self) -> Option<Grade> {
        self.plan_grade
    }

    /// Returns the most recent completion grade.
    #[must_use]
    pub const fn completion_grade(&self) -> Option<Grade> {
        self.completion_grade
    }

    /// Returns when work first started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task was completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the optimistic-concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Moves the task to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the
    /// lifecycle does not permit the move.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_transition(target)?;
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Checks a transition without applying it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the
    /// lifecycle does not permit the move.
    pub const fn ensure_transition(&self, target: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            })
        }
    }

    /// Approves the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] from a status
    /// that cannot be approved.
    pub fn approve(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Approved, clock)
    }

    /// Blocks the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] from a status
    /// that cannot be blocked.
    pub fn block(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Blocked, clock)
    }

    /// Starts work, keeping the first start time on a re-start.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is planning or approved.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::InProgress, clock)?;
        if self.started_at.is_none() {
            self.started_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Completes the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task
    /// is in progress.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Completed, clock)?;
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Cancels the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// already completed or cancelled.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Cancelled, clock)
    }

    /// Records the grade of a plan evaluation.
    pub fn record_plan_grade(&mut self, grade: Grade, clock: &impl Clock) {
        self.plan_grade = Some(grade);
        self.touch(clock);
    }

    /// Records the grade of a completion evaluation.
    pub fn record_completion_grade(&mut self, grade: Grade, clock: &impl Clock) {
        self.completion_grade = Some(grade);
        self.touch(clock);
    }

    /// Attaches files, skipping ones already attached. Returns how many
    /// were added.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TerminalTask`] when the task is completed
    /// or cancelled.
    pub fn attach_files(
        &mut self,
        files: impl IntoIterator<Item = FilePath>,
        clock: &impl Clock,
    ) -> Result<usize, TaskDomainError> {
        if self.status.is_terminal() {
            return Err(TaskDomainError::TerminalTask {
                task_id: self.id,
                status: self.status,
            });
        }
        let added = push_unique(&mut self.related_files, files);
        if added > 0 {
            self.touch(clock);
        }
        Ok(added)
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.version = self.version.saturating_add(1);
    }
}

fn push_unique(target: &mut Vec<FilePath>, files: impl IntoIterator<Item = FilePath>) -> usize {
    let before = target.len();
    for file in files {
        if !target.contains(&file) {
            target.push(file);
        }
    }
    target.len().saturating_sub(before)
}

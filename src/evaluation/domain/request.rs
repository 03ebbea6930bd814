//! Evaluation request sent to the external judge.

use super::EvaluationKind;
use crate::registry::domain::RepoName;
use serde::{Deserialize, Serialize};

/// Everything the evaluator is told about a task.
///
/// Plan requests carry the user count and proposed solution; completion
/// requests carry the repository the work landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    kind: EvaluationKind,
    task_title: String,
    task_description: String,
    repo: Option<RepoName>,
    actual_users: Option<u32>,
    proposed_solution: Option<String>,
}

impl EvaluationRequest {
    /// Creates a plan evaluation request.
    #[must_use]
    pub fn plan(
        task_title: impl Into<String>,
        task_description: impl Into<String>,
        actual_users: u32,
        proposed_solution: impl Into<String>,
    ) -> Self {
        Self {
            kind: EvaluationKind::Plan,
            task_title: task_title.into(),
            task_description: task_description.into(),
            repo: None,
            actual_users: Some(actual_users),
            proposed_solution: Some(proposed_solution.into()),
        }
    }

    /// Creates a completion evaluation request.
    #[must_use]
    pub fn completion(
        task_title: impl Into<String>,
        task_description: impl Into<String>,
        repo: Option<RepoName>,
    ) -> Self {
        Self {
            kind: EvaluationKind::Completion,
            task_title: task_title.into(),
            task_description: task_description.into(),
            repo,
            actual_users: None,
            proposed_solution: None,
        }
    }

    /// Attaches the repository the plan targets.
    #[must_use]
    pub fn with_repo(mut self, repo: Option<RepoName>) -> Self {
        self.repo = repo;
        self
    }

    /// Returns the evaluation kind.
    #[must_use]
    pub const fn kind(&self) -> EvaluationKind {
        self.kind
    }

    /// Returns the task title.
    #[must_use]
    pub fn task_title(&self) -> &str {
        &self.task_title
    }

    /// Returns the task description.
    #[must_use]
    pub fn task_description(&self) -> &str {
        &self.task_description
    }

    /// Returns the repository, if known.
    #[must_use]
    pub const fn repo(&self) -> Option<&RepoName> {
        self.repo.as_ref()
    }

    /// Returns the actual user count for plan requests.
    #[must_use]
    pub const fn actual_users(&self) -> Option<u32> {
        self.actual_users
    }

    /// Returns the proposed solution for plan requests.
    #[must_use]
    pub fn proposed_solution(&self) -> Option<&str> {
        self.proposed_solution.as_deref()
    }
}

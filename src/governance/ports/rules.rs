//! The governance seam the workflow engine depends on.

use super::GovernanceRepositoryError;
use crate::governance::domain::Violation;
use crate::registry::domain::RepoName;
use crate::registry::services::RegistryServiceError;
use crate::task::domain::Task;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for rule evaluation.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Rule checks applied to a task.
///
/// Every method returns violations as data; an empty vector means the
/// task passed. Errors are reserved for failures reading rules or the
/// registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GovernanceRules: Send + Sync {
    /// Checks the task against placement rules for `proposed_repo`.
    async fn validate_placement(
        &self,
        task: &Task,
        proposed_repo: &RepoName,
    ) -> GovernanceResult<Vec<Violation>>;

    /// Checks `proposed_solution` against the actual user count.
    async fn validate_scale(
        &self,
        task: &Task,
        proposed_solution: &str,
        actual_users: u32,
    ) -> GovernanceResult<Vec<Violation>>;

    /// Checks the task's files against the registry.
    async fn validate_task_files(&self, task: &Task) -> GovernanceResult<Vec<Violation>>;

    /// Suggests a repository for a description.
    fn determine_repo(&self, description: &str) -> Option<RepoName>;
}

/// Failures while evaluating rules.
#[derive(Debug, Clone, Error)]
pub enum GovernanceError {
    /// Placement rules could not be read.
    #[error(transparent)]
    Rules(#[from] GovernanceRepositoryError),

    /// The registry could not be read.
    #[error(transparent)]
    Registry(#[from] RegistryServiceError),
}

//! Placement rule administration and violation queries.

use crate::governance::{
    domain::{ComponentPlacementRule, GovernanceDomainError, Violation},
    ports::{GovernanceRepositoryError, PlacementRuleRepository, ViolationRepository},
};
use crate::registry::domain::{RegistryDomainError, RepoName};
use crate::task::domain::TaskId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for declaring a placement rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPlacementRuleRequest {
    component_pattern: String,
    correct_repo: String,
    correct_location: Option<String>,
    rationale: Option<String>,
}

impl RegisterPlacementRuleRequest {
    /// Creates a request binding `component_pattern` to `correct_repo`.
    #[must_use]
    pub fn new(component_pattern: impl Into<String>, correct_repo: impl Into<String>) -> Self {
        Self {
            component_pattern: component_pattern.into(),
            correct_repo: correct_repo.into(),
            correct_location: None,
            rationale: None,
        }
    }

    /// Sets the location inside the repository.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.correct_location = Some(location.into());
        self
    }

    /// Sets the rationale.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Service-level errors for governance administration.
#[derive(Debug, Error)]
pub enum GovernanceServiceError {
    /// Rule validation failed.
    #[error(transparent)]
    Domain(#[from] GovernanceDomainError),
    /// The repository name is invalid.
    #[error(transparent)]
    Repo(#[from] RegistryDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] GovernanceRepositoryError),
}

/// Result type for governance service operations.
pub type GovernanceServiceResult<T> = Result<T, GovernanceServiceError>;

/// Placement rule and violation administration.
#[derive(Clone)]
pub struct GovernanceService<R, C>
where
    R: PlacementRuleRepository + ViolationRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> GovernanceService<R, C>
where
    R: PlacementRuleRepository + ViolationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a governance service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Declares a placement rule.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceServiceError::Domain`] for a blank pattern,
    /// [`GovernanceServiceError::Repo`] for an invalid repository name and
    /// [`GovernanceRepositoryError::DuplicatePlacementRule`] when the
    /// pattern already has a rule.
    pub async fn register_rule(
        &self,
        request: RegisterPlacementRuleRequest,
    ) -> GovernanceServiceResult<ComponentPlacementRule> {
        let RegisterPlacementRuleRequest {
            component_pattern,
            correct_repo,
            correct_location,
            rationale,
        } = request;
        let repo = RepoName::new(correct_repo)?;
        let rule = ComponentPlacementRule::new(
            &component_pattern,
            repo,
            correct_location,
            rationale,
            &*self.clock,
        )?;
        self.repository.store_rule(&rule).await?;
        info!(
            pattern = rule.component_pattern(),
            repo = %rule.correct_repo(),
            "registered placement rule"
        );
        Ok(rule)
    }

    /// Lists every placement rule.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceServiceError::Repository`] when the query fails.
    pub async fn list_rules(&self) -> GovernanceServiceResult<Vec<ComponentPlacementRule>> {
        Ok(self.repository.list_rules().await?)
    }

    /// Lists the violations recorded against a task.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceServiceError::Repository`] when the query fails.
    pub async fn violations_for_task(
        &self,
        task_id: TaskId,
    ) -> GovernanceServiceResult<Vec<Violation>> {
        Ok(self.repository.list_for_task(task_id).await?)
    }
}

//! Repository ports for placement rules and violations.

use crate::governance::domain::{ComponentPlacementRule, Violation, ViolationId};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for governance repository operations.
pub type GovernanceRepositoryResult<T> = Result<T, GovernanceRepositoryError>;

/// Persistence contract for placement rules.
#[async_trait]
pub trait PlacementRuleRepository: Send + Sync {
    /// Stores a rule.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceRepositoryError::DuplicatePlacementRule`] when a
    /// rule with the same pattern exists.
    async fn store_rule(&self, rule: &ComponentPlacementRule) -> GovernanceRepositoryResult<()>;

    /// Lists every rule, oldest first.
    async fn list_rules(&self) -> GovernanceRepositoryResult<Vec<ComponentPlacementRule>>;
}

/// Persistence contract for violations.
#[async_trait]
pub trait ViolationRepository: Send + Sync {
    /// Stores a batch of new violations.
    async fn store_violations(&self, violations: &[Violation]) -> GovernanceRepositoryResult<()>;

    /// Lists the violations of a task, oldest first.
    async fn list_for_task(&self, task_id: TaskId) -> GovernanceRepositoryResult<Vec<Violation>>;

    /// Persists a status change.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceRepositoryError::ViolationNotFound`] when the
    /// violation does not exist.
    async fn update_violation(&self, violation: &Violation) -> GovernanceRepositoryResult<()>;
}

/// Errors returned by governance repository implementations.
#[derive(Debug, Clone, Error)]
pub enum GovernanceRepositoryError {
    /// A rule for the same component pattern already exists.
    #[error("a placement rule for '{0}' already exists")]
    DuplicatePlacementRule(String),

    /// The violation was not found.
    #[error("violation not found: {0}")]
    ViolationNotFound(ViolationId),

    /// Persisted data could not be converted back into domain values.
    #[error("invalid persisted governance data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl GovernanceRepositoryError {
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

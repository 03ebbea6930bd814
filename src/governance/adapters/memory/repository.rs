//! In-memory repository for placement rules and violations.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::governance::{
    domain::{ComponentPlacementRule, Violation},
    ports::{
        GovernanceRepositoryError, GovernanceRepositoryResult, PlacementRuleRepository,
        ViolationRepository,
    },
};
use crate::task::domain::TaskId;

/// Thread-safe in-memory governance repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGovernanceRepository {
    state: Arc<RwLock<InMemoryGovernanceState>>,
}

#[derive(Debug, Default)]
struct InMemoryGovernanceState {
    rules: Vec<ComponentPlacementRule>,
    violations: Vec<Violation>,
}

impl InMemoryGovernanceRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> GovernanceRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryGovernanceState>> {
        self.state.read().map_err(|err| {
            GovernanceRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> GovernanceRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryGovernanceState>> {
        self.state.write().map_err(|err| {
            GovernanceRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl PlacementRuleRepository for InMemoryGovernanceRepository {
    async fn store_rule(&self, rule: &ComponentPlacementRule) -> GovernanceRepositoryResult<()> {
        let mut state = self.write()?;
        let pattern = rule.component_pattern().to_lowercase();
        if state
            .rules
            .iter()
            .any(|existing| existing.component_pattern().to_lowercase() == pattern)
        {
            return Err(GovernanceRepositoryError::DuplicatePlacementRule(
                rule.component_pattern().to_owned(),
            ));
        }
        state.rules.push(rule.clone());
        Ok(())
    }

    async fn list_rules(&self) -> GovernanceRepositoryResult<Vec<ComponentPlacementRule>> {
        let state = self.read()?;
        Ok(state.rules.clone())
    }
}

#[async_trait]
impl ViolationRepository for InMemoryGovernanceRepository {
    async fn store_violations(&self, violations: &[Violation]) -> GovernanceRepositoryResult<()> {
        let mut state = self.write()?;
        state.violations.extend_from_slice(violations);
        Ok(())
    }

    async fn list_for_task(&self, task_id: TaskId) -> GovernanceRepositoryResult<Vec<Violation>> {
        let state = self.read()?;
        Ok(state
            .violations
            .iter()
            .filter(|violation| violation.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn update_violation(&self, violation: &Violation) -> GovernanceRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .violations
            .iter_mut()
            .find(|existing| existing.id() == violation.id())
            .ok_or(GovernanceRepositoryError::ViolationNotFound(violation.id()))?;
        *stored = violation.clone();
        Ok(())
    }
}

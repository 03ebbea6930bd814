//! Component placement rules.

use super::{GovernanceDomainError, PlacementRuleId};
use crate::registry::domain::RepoName;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

const MAX_PATTERN_LENGTH: usize = 200;

/// Declares which repository a named component belongs in.
///
/// A task whose title or description mentions `component_pattern` must be
/// assigned to `correct_repo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPlacementRule {
    id: PlacementRuleId,
    component_pattern: String,
    correct_repo: RepoName,
    correct_location: Option<String>,
    rationale: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPlacementRuleData {
    /// Persisted rule identifier.
    pub id: PlacementRuleId,
    /// Persisted pattern.
    pub component_pattern: String,
    /// Persisted target repository.
    pub correct_repo: RepoName,
    /// Persisted location inside the repository.
    pub correct_location: Option<String>,
    /// Persisted rationale.
    pub rationale: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ComponentPlacementRule {
    /// Creates a rule.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceDomainError::EmptyComponentPattern`] or
    /// [`GovernanceDomainError::ComponentPatternTooLong`] when the pattern
    /// is invalid.
    pub fn new(
        component_pattern: &str,
        correct_repo: RepoName,
        correct_location: Option<String>,
        rationale: Option<String>,
        clock: &impl Clock,
    ) -> Result<Self, GovernanceDomainError> {
        let pattern = component_pattern.trim();
        if pattern.is_empty() {
            return Err(GovernanceDomainError::EmptyComponentPattern);
        }
        if pattern.chars().count() > MAX_PATTERN_LENGTH {
            return Err(GovernanceDomainError::ComponentPatternTooLong(
                pattern.to_owned(),
            ));
        }
        Ok(Self {
            id: PlacementRuleId::new(),
            component_pattern: pattern.to_owned(),
            correct_repo,
            correct_location: correct_location.filter(|location| !location.trim().is_empty()),
            rationale,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a rule from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPlacementRuleData) -> Self {
        Self {
            id: data.id,
            component_pattern: data.component_pattern,
            correct_repo: data.correct_repo,
            correct_location: data.correct_location,
            rationale: data.rationale,
            created_at: data.created_at,
        }
    }

    /// Returns the rule identifier.
    #[must_use]
    pub const fn id(&self) -> PlacementRuleId {
        self.id
    }

    /// Returns the component pattern.
    #[must_use]
    pub fn component_pattern(&self) -> &str {
        &self.component_pattern
    }

    /// Returns the repository the component belongs in.
    #[must_use]
    pub const fn correct_repo(&self) -> &RepoName {
        &self.correct_repo
    }

    /// Returns the location inside the repository, if declared.
    #[must_use]
    pub fn correct_location(&self) -> Option<&str> {
        self.correct_location.as_deref()
    }

    /// Returns the rationale, if declared.
    #[must_use]
    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns where the component should live, as `repo/location` when a
    /// location is declared.
    #[must_use]
    pub fn destination(&self) -> String {
        self.correct_location.as_deref().map_or_else(
            || self.correct_repo.to_string(),
            |location| format!("{}/{}", self.correct_repo, location.trim_start_matches('/')),
        )
    }
}

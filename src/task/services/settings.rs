//! Workspace settings consumed by the workflow engine.

use crate::registry::domain::RepoName;
use std::time::Duration;

/// Known repositories, fallback repository and evaluator call budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    known_repos: Vec<RepoName>,
    default_repo: RepoName,
    evaluator_timeout: Duration,
}

impl WorkflowSettings {
    /// Creates settings. `default_repo` is expected to be one of
    /// `known_repos`; configuration loading enforces this.
    #[must_use]
    pub const fn new(
        known_repos: Vec<RepoName>,
        default_repo: RepoName,
        evaluator_timeout: Duration,
    ) -> Self {
        Self {
            known_repos,
            default_repo,
            evaluator_timeout,
        }
    }

    /// Returns the closed set of repositories tasks may target.
    #[must_use]
    pub fn known_repos(&self) -> &[RepoName] {
        &self.known_repos
    }

    /// Returns the repository used when nothing else decides.
    #[must_use]
    pub const fn default_repo(&self) -> &RepoName {
        &self.default_repo
    }

    /// Returns how long an evaluator call may take.
    #[must_use]
    pub const fn evaluator_timeout(&self) -> Duration {
        self.evaluator_timeout
    }

    /// Returns `true` when `repo` is a known repository.
    #[must_use]
    pub fn is_known(&self, repo: &RepoName) -> bool {
        self.known_repos.contains(repo)
    }

    /// Replaces the evaluator budget.
    #[must_use]
    pub const fn with_evaluator_timeout(mut self, evaluator_timeout: Duration) -> Self {
        self.evaluator_timeout = evaluator_timeout;
        self
    }
}

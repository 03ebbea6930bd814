//! Layered configuration.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `archwarden.toml` in the working directory, or an explicit path
//! 3. Environment variables prefixed `ARCHWARDEN_`, with `__` separating
//!    sections (`ARCHWARDEN_EVALUATOR__TIMEOUT_SECS=10` sets
//!    `evaluator.timeout_secs`)

mod error;

pub use error::ConfigError;

use crate::registry::domain::RepoName;
use crate::task::services::WorkflowSettings;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "archwarden.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "ARCHWARDEN_";

/// Solution terms that signal infrastructure sized for large scale.
pub const DEFAULT_HEAVY_INFRASTRUCTURE_TERMS: &[&str] = &[
    "kubernetes",
    "vault",
    "microservices",
    "service mesh",
    "kafka",
    "consul",
    "distributed",
    "cloud-native",
];

/// User count at or below which heavy infrastructure is over-engineering.
pub const DEFAULT_SMALL_SCALE_USER_LIMIT: u32 = 5;

/// Default evaluator call budget in seconds.
pub const DEFAULT_EVALUATOR_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchwardenConfig {
    /// Storage settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Known repositories.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Scale rule settings.
    #[serde(default)]
    pub scale: ScaleConfig,
    /// Keyword vocabularies for the classifier.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// External evaluator settings.
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL. In-memory storage is used when unset.
    pub url: Option<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 4,
        }
    }
}

/// The closed set of repositories tasks may be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Repository names accepted as task targets.
    pub known_repos: Vec<String>,
    /// Repository used when nothing else picks one.
    pub default_repo: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            known_repos: [
                "workspace",
                "meridian-core",
                "meridian-research",
                "meridian-trading",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            default_repo: "workspace".to_owned(),
        }
    }
}

/// Scale rule settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// User count at or below which heavy infrastructure is flagged.
    pub small_user_limit: u32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            small_user_limit: DEFAULT_SMALL_SCALE_USER_LIMIT,
        }
    }
}

/// Keyword bucket routing task descriptions to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoBucket {
    /// Repository chosen when a keyword matches.
    pub repo: String,
    /// Case-insensitive keywords.
    pub keywords: Vec<String>,
}

impl RepoBucket {
    fn new(repo: &str, keywords: &[&str]) -> Self {
        Self {
            repo: repo.to_owned(),
            keywords: keywords.iter().map(|keyword| (*keyword).to_owned()).collect(),
        }
    }
}

/// Keyword vocabularies.
///
/// Buckets are checked in order, so domain buckets come before the
/// framework bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Terms that mark a solution as heavy infrastructure.
    pub heavy_infrastructure_terms: Vec<String>,
    /// Ordered repository buckets.
    pub repo_buckets: Vec<RepoBucket>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            heavy_infrastructure_terms: DEFAULT_HEAVY_INFRASTRUCTURE_TERMS
                .iter()
                .map(|term| (*term).to_owned())
                .collect(),
            repo_buckets: vec![
                RepoBucket::new(
                    "meridian-trading",
                    &["trading", "tdom", "larry williams", "market", "strategy"],
                ),
                RepoBucket::new(
                    "meridian-research",
                    &["research", "query", "investigation", "analysis"],
                ),
                RepoBucket::new(
                    "meridian-core",
                    &[
                        "orchestration",
                        "learning engine",
                        "proposal manager",
                        "voting system",
                        "abstract",
                        "base class",
                    ],
                ),
            ],
        }
    }
}

/// External evaluator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Endpoint of the evaluation backend.
    pub endpoint: Option<String>,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Call budget in seconds.
    pub timeout_secs: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: DEFAULT_EVALUATOR_TIMEOUT_SECS,
        }
    }
}

impl EvaluatorConfig {
    /// Returns the call budget as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ArchwardenConfig {
    /// Loads configuration from defaults, the config file, and the
    /// environment, then validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] when `path` is given but does
    /// not exist, [`ConfigError::Figment`] when a source cannot be
    /// extracted, and [`ConfigError::InvalidValue`] when validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(explicit) = path.filter(|candidate| !candidate.exists()) {
            return Err(ConfigError::MissingFile(explicit.display().to_string()));
        }
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the provider chain without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workflow_settings().map(|_| ())?;
        for (index, bucket) in self.classifier.repo_buckets.iter().enumerate() {
            RepoName::new(bucket.repo.as_str()).map_err(|err| {
                ConfigError::invalid(&format!("classifier.repo_buckets[{index}].repo"), err.to_string())
            })?;
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::invalid(
                "database.pool_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Resolves the workflow settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a repository name is
    /// invalid, the default repository is not a known one, or the evaluator
    /// timeout is zero.
    pub fn workflow_settings(&self) -> Result<WorkflowSettings, ConfigError> {
        let known_repos = self
            .workspace
            .known_repos
            .iter()
            .map(|name| RepoName::new(name.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ConfigError::invalid("workspace.known_repos", err.to_string()))?;
        if known_repos.is_empty() {
            return Err(ConfigError::invalid(
                "workspace.known_repos",
                "at least one repository is required",
            ));
        }
        let default_repo = RepoName::new(self.workspace.default_repo.as_str())
            .map_err(|err| ConfigError::invalid("workspace.default_repo", err.to_string()))?;
        if !known_repos.contains(&default_repo) {
            return Err(ConfigError::invalid(
                "workspace.default_repo",
                format!("'{default_repo}' is not listed in workspace.known_repos"),
            ));
        }
        if self.evaluator.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "evaluator.timeout_secs",
                "must be at least 1",
            ));
        }
        Ok(WorkflowSettings::new(
            known_repos,
            default_repo,
            self.evaluator.timeout(),
        ))
    }
}

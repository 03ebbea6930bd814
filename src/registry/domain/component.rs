//! Architecture component aggregate and scope rules.

use super::{ComponentId, ComponentName, FilePath, ParseRegistryValueError, RepoName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural kind of an architecture component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// A source module.
    Module,
    /// A single class or type.
    Class,
    /// A deployable service.
    Service,
    /// A package or crate.
    Package,
}

impl ComponentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Service => "service",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ComponentKind {
    type Error = ParseRegistryValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "module" => Ok(Self::Module),
            "class" => Ok(Self::Class),
            "service" => Ok(Self::Service),
            "package" => Ok(Self::Package),
            _ => Err(ParseRegistryValueError::new("component kind", value)),
        }
    }
}

/// Lifecycle status of an architecture component.
///
/// Components are never hard-deleted; retirement is a move to
/// [`ComponentStatus::Deprecated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// The component is live and accepts mappings.
    Active,
    /// The component has been retired.
    Deprecated,
    /// The component is declared but not yet built.
    Planned,
}

impl ComponentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deprecated => "deprecated",
            Self::Planned => "planned",
        }
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ComponentStatus {
    type Error = ParseRegistryValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "deprecated" => Ok(Self::Deprecated),
            "planned" => Ok(Self::Planned),
            _ => Err(ParseRegistryValueError::new("component status", value)),
        }
    }
}

/// Allow and forbid path fragments bounding a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRules {
    /// Path fragments the component is expected to live under.
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    /// Path fragments that must never appear in a mapped file's path.
    #[serde(default)]
    pub forbidden_paths: Vec<String>,
}

impl ScopeRules {
    /// Creates scope rules from allow and forbid fragment lists.
    #[must_use]
    pub fn new(
        allowed_paths: impl IntoIterator<Item = String>,
        forbidden_paths: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            allowed_paths: allowed_paths.into_iter().collect(),
            forbidden_paths: forbidden_paths.into_iter().collect(),
        }
    }

    /// Returns `true` when neither list has entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_paths.is_empty() && self.forbidden_paths.is_empty()
    }
}

/// Advisory finding that a file path crosses a component boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeViolation {
    /// The forbidden fragment found in the path.
    pub forbidden_fragment: String,
    /// Human-readable description of the breach.
    pub message: String,
}

/// Optional component attributes supplied at registration.
///
/// Used both to create a component and to merge into an existing one, where
/// only the `Some` fields replace stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDetails {
    /// Expected location of the component's code.
    pub expected_path: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Scope boundaries.
    pub scope: Option<ScopeRules>,
    /// Lifecycle status override.
    pub status: Option<ComponentStatus>,
    /// Actor registering the component.
    pub registered_by: Option<String>,
}

/// Declared architectural unit owned by exactly one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureComponent {
    id: ComponentId,
    name: ComponentName,
    kind: ComponentKind,
    repo: RepoName,
    expected_path: Option<String>,
    description: Option<String>,
    scope: ScopeRules,
    status: ComponentStatus,
    registered_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedComponentData {
    /// Persisted component identifier.
    pub id: ComponentId,
    /// Persisted component name.
    pub name: ComponentName,
    /// Persisted component kind.
    pub kind: ComponentKind,
    /// Persisted owning repository.
    pub repo: RepoName,
    /// Persisted expected path.
    pub expected_path: Option<String>,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted scope rules.
    pub scope: ScopeRules,
    /// Persisted lifecycle status.
    pub status: ComponentStatus,
    /// Persisted registering actor.
    pub registered_by: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ArchitectureComponent {
    /// Creates a new component. Status defaults to [`ComponentStatus::Active`].
    #[must_use]
    pub fn new(
        name: ComponentName,
        kind: ComponentKind,
        repo: RepoName,
        details: ComponentDetails,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        let ComponentDetails {
            expected_path,
            description,
            scope,
            status,
            registered_by,
        } = details;

        Self {
            id: ComponentId::new(),
            name,
            kind,
            repo,
            expected_path,
            description,
            scope: scope.unwrap_or_default(),
            status: status.unwrap_or(ComponentStatus::Active),
            registered_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a component from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedComponentData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            kind: data.kind,
            repo: data.repo,
            expected_path: data.expected_path,
            description: data.description,
            scope: data.scope,
            status: data.status,
            registered_by: data.registered_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the component identifier.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the component name.
    #[must_use]
    pub const fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Returns the component kind.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Returns the owning repository.
    #[must_use]
    pub const fn repo(&self) -> &RepoName {
        &self.repo
    }

    /// Returns the expected code location, if declared.
    #[must_use]
    pub fn expected_path(&self) -> Option<&str> {
        self.expected_path.as_deref()
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the scope rules.
    #[must_use]
    pub const fn scope(&self) -> &ScopeRules {
        &self.scope
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ComponentStatus {
        self.status
    }

    /// Returns the registering actor, if recorded.
    #[must_use]
    pub fn registered_by(&self) -> Option<&str> {
        self.registered_by.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Merges a repeated registration into this component.
    ///
    /// The kind is always replaced; optional attributes only when supplied.
    /// The original registering actor is kept.
    pub fn merge(&mut self, kind: ComponentKind, details: ComponentDetails, clock: &impl Clock) {
        let ComponentDetails {
            expected_path,
            description,
            scope,
            status,
            registered_by,
        } = details;

        self.kind = kind;
        if expected_path.is_some() {
            self.expected_path = expected_path;
        }
        if description.is_some() {
            self.description = description;
        }
        if let Some(new_scope) = scope {
            self.scope = new_scope;
        }
        if let Some(new_status) = status {
            self.status = new_status;
        }
        if self.registered_by.is_none() {
            self.registered_by = registered_by;
        }
        self.touch(clock);
    }

    /// Marks the component as deprecated.
    pub fn deprecate(&mut self, clock: &impl Clock) {
        self.status = ComponentStatus::Deprecated;
        self.touch(clock);
    }

    /// Checks a file path against this component's forbidden fragments.
    ///
    /// Matching is a plain substring test. An empty result means the path is
    /// within scope.
    #[must_use]
    pub fn scope_violations(&self, file_path: &FilePath) -> Vec<ScopeViolation> {
        self.scope
            .forbidden_paths
            .iter()
            .filter(|fragment| !fragment.is_empty() && file_path.as_str().contains(fragment.as_str()))
            .map(|fragment| ScopeViolation {
                forbidden_fragment: fragment.clone(),
                message: format!(
                    "File '{file_path}' violates boundaries of component '{}': path contains forbidden fragment '{fragment}'",
                    self.name
                ),
            })
            .collect()
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

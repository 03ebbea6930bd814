//! Code-to-component mapping records.

use super::{ComponentId, FilePath, MappingId, ParseRegistryValueError, RegistryDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a file relates to the component it is mapped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    /// The file implements the component.
    #[default]
    Direct,
    /// The file supports the component without implementing it.
    Indirect,
    /// The component depends on the file.
    Dependency,
}

impl MappingKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Indirect => "indirect",
            Self::Dependency => "dependency",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MappingKind {
    type Error = ParseRegistryValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "direct" => Ok(Self::Direct),
            "indirect" => Ok(Self::Indirect),
            "dependency" => Ok(Self::Dependency),
            _ => Err(ParseRegistryValueError::new("mapping kind", value)),
        }
    }
}

/// Answer to "is this file mapped, and to what?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    /// Whether a mapping exists for the path.
    pub mapped: bool,
    /// The mapped component when `mapped` is `true`.
    pub component_id: Option<ComponentId>,
}

impl FileMapping {
    /// A mapped result.
    #[must_use]
    pub const fn mapped(component_id: ComponentId) -> Self {
        Self {
            mapped: true,
            component_id: Some(component_id),
        }
    }

    /// An unmapped result.
    #[must_use]
    pub const fn unmapped() -> Self {
        Self {
            mapped: false,
            component_id: None,
        }
    }
}

/// Association of one file path with one component.
///
/// `file_path` is unique across the registry: re-mapping a file replaces
/// its component, kind and reason in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeComponentMapping {
    id: MappingId,
    file_path: FilePath,
    component_id: ComponentId,
    kind: MappingKind,
    reason: String,
    validated: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMappingData {
    /// Persisted mapping identifier.
    pub id: MappingId,
    /// Persisted file path.
    pub file_path: FilePath,
    /// Persisted component identifier.
    pub component_id: ComponentId,
    /// Persisted mapping kind.
    pub kind: MappingKind,
    /// Persisted mapping reason.
    pub reason: String,
    /// Persisted validation flag.
    pub validated: bool,
    /// Persisted creating actor.
    pub created_by: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CodeComponentMapping {
    /// Creates a new, not-yet-validated mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyMappingReason`] when the reason is
    /// blank.
    pub fn new(
        file_path: FilePath,
        component_id: ComponentId,
        kind: MappingKind,
        reason: impl Into<String>,
        created_by: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, RegistryDomainError> {
        let reason_value = reason.into();
        let trimmed = reason_value.trim();
        if trimmed.is_empty() {
            return Err(RegistryDomainError::EmptyMappingReason);
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: MappingId::new(),
            file_path,
            component_id,
            kind,
            reason: trimmed.to_owned(),
            validated: false,
            created_by: created_by.into(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a mapping from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMappingData) -> Self {
        Self {
            id: data.id,
            file_path: data.file_path,
            component_id: data.component_id,
            kind: data.kind,
            reason: data.reason,
            validated: data.validated,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the mapping identifier.
    #[must_use]
    pub const fn id(&self) -> MappingId {
        self.id
    }

    /// Returns the mapped file path.
    #[must_use]
    pub const fn file_path(&self) -> &FilePath {
        &self.file_path
    }

    /// Returns the mapped component identifier.
    #[must_use]
    pub const fn component_id(&self) -> ComponentId {
        self.component_id
    }

    /// Returns the mapping kind.
    #[must_use]
    pub const fn kind(&self) -> MappingKind {
        self.kind
    }

    /// Returns the human-authored reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns whether the mapping has been validated by a reviewer.
    #[must_use]
    pub const fn validated(&self) -> bool {
        self.validated
    }

    /// Returns the actor that created the mapping.
    #[must_use]
    pub fn created_by(&self) -> &str {
        &self.created_by
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

    /// Overwrites this mapping with a newer one for the same path.
    ///
    /// Identity, creator and creation time are kept. Pointing the file at a
    /// different component clears the validation flag.
    pub fn overwrite_with(&mut self, newer: &Self) {
        if self.component_id != newer.component_id {
            self.validated = false;
        }
        self.component_id = newer.component_id;
        self.kind = newer.kind;
        self.reason.clone_from(&newer.reason);
        self.updated_at = newer.updated_at;
    }
}

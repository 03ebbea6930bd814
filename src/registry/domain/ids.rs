//! Identifier and validated scalar types for the registry domain.

use super::RegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a repository name, matching the `VARCHAR(100)` column.
const MAX_REPO_NAME_LENGTH: usize = 100;

/// Maximum length for a component name, matching the `VARCHAR(200)` column.
const MAX_COMPONENT_NAME_LENGTH: usize = 200;

/// Maximum length for a file path, matching the `VARCHAR(500)` column.
const MAX_FILE_PATH_LENGTH: usize = 500;

/// Unique identifier for an architecture component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Uuid);

impl ComponentId {
    /// Creates a new random component identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a component identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a code-to-component mapping row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingId(Uuid);

impl MappingId {
    /// Creates a new random mapping identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a mapping identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MappingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an unregistered-file ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnregisteredFileId(Uuid);

impl UnregisteredFileId {
    /// Creates a new random ledger identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ledger identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for UnregisteredFileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnregisteredFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated repository name, e.g. `meridian-core`.
///
/// Names are trimmed and lowercased; only `[a-z0-9._-]` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    /// Creates a validated repository name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyRepoName`] when the value is empty
    /// after trimming, [`RegistryDomainError::RepoNameTooLong`] when it
    /// exceeds 100 characters, or [`RegistryDomainError::InvalidRepoName`]
    /// when it contains characters outside `[a-z0-9._-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyRepoName);
        }

        if normalized.len() > MAX_REPO_NAME_LENGTH {
            return Err(RegistryDomainError::RepoNameTooLong(raw));
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
        if !is_valid {
            return Err(RegistryDomainError::InvalidRepoName(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the repository name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoName {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepoName> for String {
    fn from(value: RepoName) -> Self {
        value.0
    }
}

impl AsRef<str> for RepoName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated architecture component name.
///
/// Case is preserved for display; uniqueness is enforced together with the
/// owning repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentName(String);

impl ComponentName {
    /// Creates a validated component name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyComponentName`] when the value is
    /// empty after trimming or [`RegistryDomainError::ComponentNameTooLong`]
    /// when it exceeds 200 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(RegistryDomainError::EmptyComponentName);
        }
        if trimmed.chars().count() > MAX_COMPONENT_NAME_LENGTH {
            return Err(RegistryDomainError::ComponentNameTooLong(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the component name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repository-relative file path used as the registry's unique key.
///
/// Paths are trimmed, use forward slashes, and drop a leading `./`. No other
/// normalization happens: lookups are exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePath(String);

impl FilePath {
    /// Creates a validated file path.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyFilePath`] when the value is empty
    /// after normalization or [`RegistryDomainError::FilePathTooLong`] when
    /// it exceeds 500 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = value.into();
        let slashed = raw.trim().replace('\\', "/");
        let normalized = slashed.strip_prefix("./").unwrap_or(&slashed);

        if normalized.is_empty() {
            return Err(RegistryDomainError::EmptyFilePath);
        }
        if normalized.chars().count() > MAX_FILE_PATH_LENGTH {
            return Err(RegistryDomainError::FilePathTooLong(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FilePath {
    type Error = RegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FilePath> for String {
    fn from(value: FilePath) -> Self {
        value.0
    }
}

impl AsRef<str> for FilePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

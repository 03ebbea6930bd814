//! Ledger of files seen without a mapping.

use super::{
    ComponentId, FilePath, ParseRegistryValueError, RegistryDomainError, RepoName,
    UnregisteredFileId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review status of an unregistered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnregisteredStatus {
    /// Seen by a scan, not yet looked at.
    Unregistered,
    /// A reviewer is deciding where the file belongs.
    UnderReview,
    /// A mapping now exists for the file.
    Mapped,
    /// The file is deliberately left out of the registry.
    Ignored,
}

impl UnregisteredStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::UnderReview => "under_review",
            Self::Mapped => "mapped",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for UnregisteredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnregisteredStatus {
    type Error = ParseRegistryValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unregistered" => Ok(Self::Unregistered),
            "under_review" => Ok(Self::UnderReview),
            "mapped" => Ok(Self::Mapped),
            "ignored" => Ok(Self::Ignored),
            _ => Err(ParseRegistryValueError::new("unregistered file status", value)),
        }
    }
}

/// One row per file path that a scan found without a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisteredFile {
    id: UnregisteredFileId,
    file_path: FilePath,
    repo: RepoName,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    detection_count: u32,
    status: UnregisteredStatus,
    resolved_component_id: Option<ComponentId>,
    review_notes: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUnregisteredData {
    /// Persisted row identifier.
    pub id: UnregisteredFileId,
    /// Persisted file path.
    pub file_path: FilePath,
    /// Persisted repository.
    pub repo: RepoName,
    /// Persisted first detection time.
    pub first_seen: DateTime<Utc>,
    /// Persisted latest detection time.
    pub last_seen: DateTime<Utc>,
    /// Persisted detection counter.
    pub detection_count: u32,
    /// Persisted review status.
    pub status: UnregisteredStatus,
    /// Persisted resolving component.
    pub resolved_component_id: Option<ComponentId>,
    /// Persisted review notes.
    pub review_notes: Option<String>,
    /// Persisted reviewer.
    pub reviewed_by: Option<String>,
    /// Persisted review time.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl UnregisteredFile {
    /// Creates a first detection of `file_path`.
    #[must_use]
    pub fn first_detection(file_path: FilePath, repo: RepoName, seen_at: DateTime<Utc>) -> Self {
        Self {
            id: UnregisteredFileId::new(),
            file_path,
            repo,
            first_seen: seen_at,
            last_seen: seen_at,
            detection_count: 1,
            status: UnregisteredStatus::Unregistered,
            resolved_component_id: None,
            review_notes: None,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    /// Reconstructs a ledger row from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUnregisteredData) -> Self {
        Self {
            id: data.id,
            file_path: data.file_path,
            repo: data.repo,
            first_seen: data.first_seen,
            last_seen: data.last_seen,
            detection_count: data.detection_count,
            status: data.status,
            resolved_component_id: data.resolved_component_id,
            review_notes: data.review_notes,
            reviewed_by: data.reviewed_by,
            reviewed_at: data.reviewed_at,
        }
    }

    /// Returns the row identifier.
    #[must_use]
    pub const fn id(&self) -> UnregisteredFileId {
        self.id
    }

    /// Returns the file path.
    #[must_use]
    pub const fn file_path(&self) -> &FilePath {
        &self.file_path
    }

    /// Returns the repository the file was seen in.
    #[must_use]
    pub const fn repo(&self) -> &RepoName {
        &self.repo
    }

    /// Returns the first detection time.
    #[must_use]
    pub const fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    /// Returns the latest detection time.
    #[must_use]
    pub const fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Returns how many times the file has been detected.
    #[must_use]
    pub const fn detection_count(&self) -> u32 {
        self.detection_count
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> UnregisteredStatus {
        self.status
    }

    /// Returns the component that resolved this row, once mapped.
    #[must_use]
    pub const fn resolved_component_id(&self) -> Option<ComponentId> {
        self.resolved_component_id
    }

    /// Returns reviewer notes, if any.
    #[must_use]
    pub fn review_notes(&self) -> Option<&str> {
        self.review_notes.as_deref()
    }

    /// Returns the reviewer, if any.
    #[must_use]
    pub fn reviewed_by(&self) -> Option<&str> {
        self.reviewed_by.as_deref()
    }

    /// Returns the review time, if any.
    #[must_use]
    pub const fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// Records another detection of the same file.
    pub const fn redetect(&mut self, seen_at: DateTime<Utc>) {
        self.detection_count = self.detection_count.saturating_add(1);
        self.last_seen = seen_at;
    }

    /// Marks the row as resolved by a new mapping.
    pub fn resolve(&mut self, component_id: ComponentId, resolved_by: &str, at: DateTime<Utc>) {
        self.status = UnregisteredStatus::Mapped;
        self.resolved_component_id = Some(component_id);
        self.reviewed_by = Some(resolved_by.to_owned());
        self.reviewed_at = Some(at);
    }

    /// Applies a reviewer decision.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::InvalidReviewStatus`] unless `status`
    /// is [`UnregisteredStatus::UnderReview`] or
    /// [`UnregisteredStatus::Ignored`]. Rows only become mapped through a
    /// mapping.
    pub fn review(
        &mut self,
        status: UnregisteredStatus,
        notes: Option<String>,
        reviewer: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryDomainError> {
        if !matches!(
            status,
            UnregisteredStatus::UnderReview | UnregisteredStatus::Ignored
        ) {
            return Err(RegistryDomainError::InvalidReviewStatus(
                status.as_str().to_owned(),
            ));
        }
        self.status = status;
        if notes.is_some() {
            self.review_notes = notes;
        }
        self.reviewed_by = Some(reviewer.to_owned());
        self.reviewed_at = Some(at);
        Ok(())
    }
}

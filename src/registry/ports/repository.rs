//! Repository port for components, mappings and the unregistered-file ledger.

use crate::registry::domain::{
    ArchitectureComponent, CodeComponentMapping, ComponentId, ComponentName, FilePath, RepoName,
    UnregisteredFile, UnregisteredStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for registry repository operations.
pub type RegistryRepositoryResult<T> = Result<T, RegistryRepositoryError>;

/// Filter for listing unregistered-file ledger rows.
///
/// `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnregisteredFilter {
    /// Restrict to one repository.
    pub repo: Option<RepoName>,
    /// Restrict to one review status.
    pub status: Option<UnregisteredStatus>,
}

impl UnregisteredFilter {
    /// Returns `true` when `file` passes the filter.
    #[must_use]
    pub fn matches(&self, file: &UnregisteredFile) -> bool {
        self.repo.as_ref().is_none_or(|repo| file.repo() == repo)
            && self.status.is_none_or(|status| file.status() == status)
    }
}

/// Registry persistence contract.
///
/// Every per-path mutation is atomic: two concurrent scans recording the
/// same path must leave exactly one ledger row.
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Stores a new component.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryRepositoryError::DuplicateComponent`] when the
    /// `(name, repo)` pair is already registered.
    async fn store_component(
        &self,
        component: &ArchitectureComponent,
    ) -> RegistryRepositoryResult<()>;

    /// Persists changes to an existing component.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryRepositoryError::ComponentNotFound`] when the
    /// component does not exist.
    async fn update_component(
        &self,
        component: &ArchitectureComponent,
    ) -> RegistryRepositoryResult<()>;

    /// Finds a component by identifier.
    async fn find_component(
        &self,
        id: ComponentId,
    ) -> RegistryRepositoryResult<Option<ArchitectureComponent>>;

    /// Finds a component by its unique `(name, repo)` pair.
    async fn find_component_by_name(
        &self,
        name: &ComponentName,
        repo: &RepoName,
    ) -> RegistryRepositoryResult<Option<ArchitectureComponent>>;

    /// Lists components, optionally restricted to one repository, ordered
    /// by repository then name.
    async fn list_components(
        &self,
        repo: Option<&RepoName>,
    ) -> RegistryRepositoryResult<Vec<ArchitectureComponent>>;

    /// Finds the mapping for an exact file path.
    async fn find_mapping(
        &self,
        file_path: &FilePath,
    ) -> RegistryRepositoryResult<Option<CodeComponentMapping>>;

    /// Upserts a mapping on its file path and resolves the matching ledger
    /// row in the same atomic step.
    ///
    /// When a mapping already exists for the path it is overwritten in place
    /// (see [`CodeComponentMapping::overwrite_with`]). Returns the stored
    /// mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryRepositoryError::ComponentNotFound`] when the
    /// referenced component does not exist.
    async fn map_file(
        &self,
        mapping: &CodeComponentMapping,
    ) -> RegistryRepositoryResult<CodeComponentMapping>;

    /// Lists every mapping pointing at `component_id`, ordered by path.
    async fn list_mappings_for_component(
        &self,
        component_id: ComponentId,
    ) -> RegistryRepositoryResult<Vec<CodeComponentMapping>>;

    /// Lists every mapping, ordered by path.
    async fn list_mappings(&self) -> RegistryRepositoryResult<Vec<CodeComponentMapping>>;

    /// Records a detection of an unmapped file.
    ///
    /// Inserts a row with `detection_count = 1` on first sight, otherwise
    /// increments the counter and refreshes `last_seen`. Returns the row as
    /// stored.
    async fn record_unregistered(
        &self,
        file_path: &FilePath,
        repo: &RepoName,
        seen_at: DateTime<Utc>,
    ) -> RegistryRepositoryResult<UnregisteredFile>;

    /// Finds the ledger row for an exact file path.
    async fn find_unregistered(
        &self,
        file_path: &FilePath,
    ) -> RegistryRepositoryResult<Option<UnregisteredFile>>;

    /// Lists ledger rows matching `filter`, ordered by path.
    async fn list_unregistered(
        &self,
        filter: &UnregisteredFilter,
    ) -> RegistryRepositoryResult<Vec<UnregisteredFile>>;

    /// Persists a reviewed ledger row.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryRepositoryError::UnregisteredFileNotFound`] when no
    /// row exists for the path.
    async fn update_unregistered(&self, file: &UnregisteredFile) -> RegistryRepositoryResult<()>;
}

/// Errors returned by registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RegistryRepositoryError {
    /// A component with the same `(name, repo)` pair already exists.
    #[error("component '{name}' already registered in {repo}")]
    DuplicateComponent {
        /// Component name.
        name: ComponentName,
        /// Owning repository.
        repo: RepoName,
    },

    /// The component was not found.
    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// No ledger row exists for the path.
    #[error("unregistered file not found: {0}")]
    UnregisteredFileNotFound(FilePath),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RegistryRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

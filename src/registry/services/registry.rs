//! Service layer for component registration, file mapping and scan intake.
//!
//! Provides [`RegistryService`], the single entry point through which files
//! are mapped to components and unmapped files are recorded.

use crate::registry::{
    domain::{
        ArchitectureComponent, ChangeCheck, CodeComponentMapping, ComponentDetails, ComponentId,
        ComponentKind, ComponentName, ComponentStatus, CoverageReport, FileMapping, FilePath,
        MappingKind, RegistryDomainError, RepoCoverage, RepoName, ScanSummary, ScannedFile,
        ScopeRules, ScopeViolation, TrackedFile, UnregisteredFile, UnregisteredStatus,
    },
    ports::{RegistryRepository, RegistryRepositoryError, UnregisteredFilter},
};
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Actor recorded when a caller does not name one.
const DEFAULT_ACTOR: &str = "manual";

/// Request payload for mapping a file to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFileRequest {
    file_path: String,
    component_id: ComponentId,
    reason: String,
    kind: MappingKind,
    mapped_by: String,
}

impl MapFileRequest {
    /// Creates a direct mapping request.
    #[must_use]
    pub fn new(
        file_path: impl Into<String>,
        component_id: ComponentId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            component_id,
            reason: reason.into(),
            kind: MappingKind::Direct,
            mapped_by: DEFAULT_ACTOR.to_owned(),
        }
    }

    /// Sets the mapping kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: MappingKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_mapped_by(mut self, actor: impl Into<String>) -> Self {
        self.mapped_by = actor.into();
        self
    }
}

/// Request payload for registering (or re-registering) a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterComponentRequest {
    name: String,
    kind: ComponentKind,
    repo: String,
    details: ComponentDetails,
}

impl RegisterComponentRequest {
    /// Creates a request with the required component fields.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ComponentKind, repo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            repo: repo.into(),
            details: ComponentDetails::default(),
        }
    }

    /// Sets the expected code location.
    #[must_use]
    pub fn with_expected_path(mut self, path: impl Into<String>) -> Self {
        self.details.expected_path = Some(path.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.details.description = Some(description.into());
        self
    }

    /// Sets the scope rules.
    #[must_use]
    pub fn with_scope(mut self, scope: ScopeRules) -> Self {
        self.details.scope = Some(scope);
        self
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub const fn with_status(mut self, status: ComponentStatus) -> Self {
        self.details.status = Some(status);
        self
    }

    /// Sets the registering actor.
    #[must_use]
    pub fn with_registered_by(mut self, actor: impl Into<String>) -> Self {
        self.details.registered_by = Some(actor.into());
        self
    }
}

/// Reviewer decision on an unregistered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewUnregisteredRequest {
    file_path: String,
    status: UnregisteredStatus,
    notes: Option<String>,
    reviewer: String,
}

impl ReviewUnregisteredRequest {
    /// Creates a review request.
    #[must_use]
    pub fn new(
        file_path: impl Into<String>,
        status: UnregisteredStatus,
        reviewer: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            status,
            notes: None,
            reviewer: reviewer.into(),
        }
    }

    /// Attaches reviewer notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Service-level errors for registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RegistryRepositoryError),
}

/// Result type for registry service operations.
pub type RegistryServiceResult<T> = Result<T, RegistryServiceError>;

/// Registry orchestration service.
#[derive(Clone)]
pub struct RegistryService<R, C>
where
    R: RegistryRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RegistryService<R, C>
where
    R: RegistryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new registry service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Looks up the mapping for an exact path.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when the lookup fails.
    pub async fn is_mapped(&self, file_path: &FilePath) -> RegistryServiceResult<FileMapping> {
        let mapping = self.repository.find_mapping(file_path).await?;
        let result = mapping.map_or_else(FileMapping::unmapped, |found| {
            FileMapping::mapped(found.component_id())
        });
        debug!(file_path = %file_path, mapped = result.mapped, "registry lookup");
        Ok(result)
    }

    /// Records a detection of an unmapped file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when the upsert fails.
    pub async fn record_unregistered(
        &self,
        file_path: &FilePath,
        repo: &RepoName,
    ) -> RegistryServiceResult<UnregisteredFile> {
        let row = self
            .repository
            .record_unregistered(file_path, repo, self.clock.utc())
            .await?;
        debug!(
            file_path = %file_path,
            repo = %repo,
            detection_count = row.detection_count(),
            "recorded unregistered file"
        );
        Ok(row)
    }

    /// Maps a file to a component, replacing any earlier mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Domain`] for an invalid path or blank
    /// reason and [`RegistryRepositoryError::ComponentNotFound`] when the
    /// component does not exist.
    pub async fn map_file(
        &self,
        request: MapFileRequest,
    ) -> RegistryServiceResult<CodeComponentMapping> {
        let MapFileRequest {
            file_path,
            component_id,
            reason,
            kind,
            mapped_by,
        } = request;

        let path = FilePath::new(file_path)?;
        let mapping =
            CodeComponentMapping::new(path, component_id, kind, reason, mapped_by, &*self.clock)?;
        let stored = self.repository.map_file(&mapping).await?;
        info!(
            file_path = %stored.file_path(),
            component_id = %stored.component_id(),
            kind = %stored.kind(),
            "mapped file"
        );
        Ok(stored)
    }

    /// Registers a component, merging into an existing `(name, repo)` entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Domain`] for an invalid name or repo
    /// and [`RegistryServiceError::Repository`] when persistence fails.
    pub async fn register_component(
        &self,
        request: RegisterComponentRequest,
    ) -> RegistryServiceResult<ArchitectureComponent> {
        let RegisterComponentRequest {
            name,
            kind,
            repo,
            details,
        } = request;

        let component_name = ComponentName::new(name)?;
        let repo_name = RepoName::new(repo)?;

        if let Some(existing) = self
            .merge_existing(&component_name, &repo_name, kind, details.clone())
            .await?
        {
            return Ok(existing);
        }

        let component = ArchitectureComponent::new(
            component_name.clone(),
            kind,
            repo_name.clone(),
            details.clone(),
            &*self.clock,
        );
        match self.repository.store_component(&component).await {
            Ok(()) => {
                info!(
                    component = %component.name(),
                    repo = %component.repo(),
                    "registered component"
                );
                Ok(component)
            }
            Err(RegistryRepositoryError::DuplicateComponent { name, repo }) => {
                debug!(component = %name, repo = %repo, "lost registration race, merging");
                self.merge_existing(&component_name, &repo_name, kind, details)
                    .await?
                    .ok_or_else(|| {
                        RegistryServiceError::Repository(
                            RegistryRepositoryError::DuplicateComponent { name, repo },
                        )
                    })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn merge_existing(
        &self,
        name: &ComponentName,
        repo: &RepoName,
        kind: ComponentKind,
        details: ComponentDetails,
    ) -> RegistryServiceResult<Option<ArchitectureComponent>> {
        let Some(mut existing) = self.repository.find_component_by_name(name, repo).await? else {
            return Ok(None);
        };
        existing.merge(kind, details, &*self.clock);
        self.repository.update_component(&existing).await?;
        info!(component = %existing.name(), repo = %existing.repo(), "updated component");
        Ok(Some(existing))
    }

    /// Checks a path against a component's forbidden fragments.
    #[expect(
        clippy::unused_self,
        reason = "scope checks belong to the registry contract even though they need no storage"
    )]
    #[must_use]
    pub fn validate_scope(
        &self,
        file_path: &FilePath,
        component: &ArchitectureComponent,
    ) -> Vec<ScopeViolation> {
        component.scope_violations(file_path)
    }

    /// Ingests one scan from the external file scanner.
    ///
    /// Mapped files are counted; every other file is recorded in the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] on the first failed
    /// lookup or upsert.
    pub async fn ingest_scan(
        &self,
        files: Vec<ScannedFile>,
    ) -> RegistryServiceResult<ScanSummary> {
        let mut summary = ScanSummary {
            scanned: files.len(),
            ..ScanSummary::default()
        };

        for ScannedFile { file_path, repo } in files {
            if self.is_mapped(&file_path).await?.mapped {
                summary.mapped = summary.mapped.saturating_add(1);
                continue;
            }
            let row = self.record_unregistered(&file_path, &repo).await?;
            if row.detection_count() == 1 {
                summary.newly_unregistered = summary.newly_unregistered.saturating_add(1);
            } else {
                summary.redetected = summary.redetected.saturating_add(1);
            }
        }

        info!(
            scanned = summary.scanned,
            mapped = summary.mapped,
            newly_unregistered = summary.newly_unregistered,
            "ingested scan"
        );
        Ok(summary)
    }

    /// Checks a change set before commit.
    ///
    /// Unmapped paths are recorded in the ledger and reported as untracked;
    /// mapped paths carry their component's scope findings.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when a lookup or upsert
    /// fails.
    pub async fn check_changed_files(
        &self,
        repo: &RepoName,
        paths: Vec<FilePath>,
    ) -> RegistryServiceResult<ChangeCheck> {
        let mut check = ChangeCheck::default();

        for file_path in paths {
            let Some(component_id) = self.is_mapped(&file_path).await?.component_id else {
                self.record_unregistered(&file_path, repo).await?;
                check.untracked.push(file_path);
                continue;
            };

            let scope_violations = self
                .repository
                .find_component(component_id)
                .await?
                .map(|component| component.scope_violations(&file_path))
                .unwrap_or_default();
            check.tracked.push(TrackedFile {
                file_path,
                component_id,
                scope_violations,
            });
        }

        Ok(check)
    }

    /// Lists ledger rows. `status` defaults to
    /// [`UnregisteredStatus::Unregistered`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when the query fails.
    pub async fn list_unregistered(
        &self,
        repo: Option<RepoName>,
        status: Option<UnregisteredStatus>,
    ) -> RegistryServiceResult<Vec<UnregisteredFile>> {
        let filter = UnregisteredFilter {
            repo,
            status: Some(status.unwrap_or(UnregisteredStatus::Unregistered)),
        };
        Ok(self.repository.list_unregistered(&filter).await?)
    }

    /// Applies a reviewer decision to a ledger row.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::InvalidReviewStatus`] for statuses a
    /// reviewer may not set and
    /// [`RegistryRepositoryError::UnregisteredFileNotFound`] when the path has
    /// no ledger row.
    pub async fn review_unregistered(
        &self,
        request: ReviewUnregisteredRequest,
    ) -> RegistryServiceResult<UnregisteredFile> {
        let ReviewUnregisteredRequest {
            file_path,
            status,
            notes,
            reviewer,
        } = request;

        let path = FilePath::new(file_path)?;
        let mut row = self
            .repository
            .find_unregistered(&path)
            .await?
            .ok_or_else(|| RegistryRepositoryError::UnregisteredFileNotFound(path.clone()))?;
        row.review(status, notes, &reviewer, self.clock.utc())?;
        self.repository.update_unregistered(&row).await?;
        info!(file_path = %path, status = %status, reviewer = %reviewer, "reviewed unregistered file");
        Ok(row)
    }

    /// Soft-deletes a component.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryRepositoryError::ComponentNotFound`] when the
    /// component does not exist.
    pub async fn deprecate_component(
        &self,
        id: ComponentId,
    ) -> RegistryServiceResult<ArchitectureComponent> {
        let mut component = self.require_component(id).await?;
        component.deprecate(&*self.clock);
        self.repository.update_component(&component).await?;
        info!(component = %component.name(), repo = %component.repo(), "deprecated component");
        Ok(component)
    }

    /// Finds a component by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when the lookup fails.
    pub async fn find_component(
        &self,
        id: ComponentId,
    ) -> RegistryServiceResult<Option<ArchitectureComponent>> {
        Ok(self.repository.find_component(id).await?)
    }

    /// Lists components, optionally for one repository.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when the query fails.
    pub async fn list_components(
        &self,
        repo: Option<&RepoName>,
    ) -> RegistryServiceResult<Vec<ArchitectureComponent>> {
        Ok(self.repository.list_components(repo).await?)
    }

    /// Lists the files mapped to a component.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryRepositoryError::ComponentNotFound`] when the
    /// component does not exist.
    pub async fn component_files(
        &self,
        id: ComponentId,
    ) -> RegistryServiceResult<Vec<CodeComponentMapping>> {
        self.require_component(id).await?;
        Ok(self.repository.list_mappings_for_component(id).await?)
    }

    /// Computes mapping coverage per repository.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when a query fails.
    pub async fn coverage(&self, repo: Option<&RepoName>) -> RegistryServiceResult<CoverageReport> {
        let owners: HashMap<ComponentId, RepoName> = self
            .repository
            .list_components(None)
            .await?
            .into_iter()
            .map(|component| (component.id(), component.repo().clone()))
            .collect();
        let mappings = self.repository.list_mappings().await?;
        let ledger = self
            .repository
            .list_unregistered(&UnregisteredFilter::default())
            .await?;

        let mut rows: BTreeMap<RepoName, RepoCoverage> = BTreeMap::new();
        if let Some(wanted) = repo {
            rows.insert(wanted.clone(), RepoCoverage::empty(wanted.clone()));
        }
        let wanted = |candidate: &RepoName| repo.is_none_or(|name| name == candidate);

        for owner in mappings
            .iter()
            .filter_map(|mapping| owners.get(&mapping.component_id()))
            .filter(|owner| wanted(*owner))
        {
            let row = rows
                .entry(owner.clone())
                .or_insert_with(|| RepoCoverage::empty(owner.clone()));
            row.mapped = row.mapped.saturating_add(1);
        }

        for file in ledger.iter().filter(|file| wanted(file.repo())) {
            let row = rows
                .entry(file.repo().clone())
                .or_insert_with(|| RepoCoverage::empty(file.repo().clone()));
            match file.status() {
                UnregisteredStatus::Unregistered | UnregisteredStatus::UnderReview => {
                    row.unmapped = row.unmapped.saturating_add(1);
                }
                UnregisteredStatus::Ignored => row.ignored = row.ignored.saturating_add(1),
                UnregisteredStatus::Mapped => {}
            }
        }

        Ok(CoverageReport {
            repos: rows.into_values().collect(),
        })
    }

    async fn require_component(
        &self,
        id: ComponentId,
    ) -> RegistryServiceResult<ArchitectureComponent> {
        self.repository
            .find_component(id)
            .await?
            .ok_or_else(|| RegistryRepositoryError::ComponentNotFound(id).into())
    }
}

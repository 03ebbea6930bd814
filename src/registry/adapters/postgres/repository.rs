//! `PostgreSQL` repository implementation for the registry.

use super::{
    models::{
        ComponentRow, MappingRow, NewComponentRow, NewMappingRow, NewUnregisteredRow,
        UnregisteredRow,
    },
    schema::{architecture_components, code_component_mappings, unregistered_files},
};
use crate::registry::{
    domain::{
        ArchitectureComponent, CodeComponentMapping, ComponentId, ComponentKind, ComponentName,
        ComponentStatus, FilePath, MappingId, MappingKind, PersistedComponentData,
        PersistedMappingData, PersistedUnregisteredData, RepoName, ScopeRules, UnregisteredFile,
        UnregisteredFileId, UnregisteredStatus,
    },
    ports::{
        RegistryRepository, RegistryRepositoryError, RegistryRepositoryResult, UnregisteredFilter,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;

/// `PostgreSQL` connection pool type used by registry adapters.
pub type RegistryPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed registry repository.
///
/// Per-path atomicity comes from `INSERT ... ON CONFLICT (file_path)` on
/// the unique path columns; `map_file` additionally runs in a transaction so
/// the ledger row flips to `mapped` with the mapping write.
#[derive(Debug, Clone)]
pub struct PostgresRegistryRepository {
    pool: RegistryPgPool,
}

impl PostgresRegistryRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RegistryRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RegistryRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RegistryRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RegistryRepositoryError::persistence)?
    }
}

impl From<DieselError> for RegistryRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl RegistryRepository for PostgresRegistryRepository {
    async fn store_component(
        &self,
        component: &ArchitectureComponent,
    ) -> RegistryRepositoryResult<()> {
        let name = component.name().clone();
        let repo = component.repo().clone();
        let new_row = to_new_component_row(component)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(architecture_components::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RegistryRepositoryError::DuplicateComponent {
                            name: name.clone(),
                            repo: repo.clone(),
                        }
                    }
                    _ => RegistryRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_component(
        &self,
        component: &ArchitectureComponent,
    ) -> RegistryRepositoryResult<()> {
        let component_id = component.id();
        let name = component.name().clone();
        let repo = component.repo().clone();
        let row = to_new_component_row(component)?;

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                architecture_components::table
                    .filter(architecture_components::id.eq(component_id.into_inner())),
            )
            .set((
                architecture_components::name.eq(&row.name),
                architecture_components::kind.eq(&row.kind),
                architecture_components::repo.eq(&row.repo),
                architecture_components::expected_path.eq(&row.expected_path),
                architecture_components::description.eq(&row.description),
                architecture_components::scope.eq(&row.scope),
                architecture_components::status.eq(&row.status),
                architecture_components::registered_by.eq(&row.registered_by),
                architecture_components::updated_at.eq(row.updated_at),
            ))
            .execute(connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    RegistryRepositoryError::DuplicateComponent {
                        name: name.clone(),
                        repo: repo.clone(),
                    }
                }
                _ => RegistryRepositoryError::persistence(err),
            })?;

            if updated_count == 0 {
                return Err(RegistryRepositoryError::ComponentNotFound(component_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_component(
        &self,
        id: ComponentId,
    ) -> RegistryRepositoryResult<Option<ArchitectureComponent>> {
        self.run_blocking(move |connection| {
            let row = architecture_components::table
                .filter(architecture_components::id.eq(id.into_inner()))
                .select(ComponentRow::as_select())
                .first::<ComponentRow>(connection)
                .optional()?;
            row.map(row_to_component).transpose()
        })
        .await
    }

    async fn find_component_by_name(
        &self,
        name: &ComponentName,
        repo: &RepoName,
    ) -> RegistryRepositoryResult<Option<ArchitectureComponent>> {
        let lookup_name = name.as_str().to_owned();
        let lookup_repo = repo.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = architecture_components::table
                .filter(architecture_components::name.eq(&lookup_name))
                .filter(architecture_components::repo.eq(&lookup_repo))
                .select(ComponentRow::as_select())
                .first::<ComponentRow>(connection)
                .optional()?;
            row.map(row_to_component).transpose()
        })
        .await
    }

    async fn list_components(
        &self,
        repo: Option<&RepoName>,
    ) -> RegistryRepositoryResult<Vec<ArchitectureComponent>> {
        let repo_filter = repo.map(|name| name.as_str().to_owned());
        self.run_blocking(move |connection| {
            let mut query = architecture_components::table
                .select(ComponentRow::as_select())
                .order((
                    architecture_components::repo.asc(),
                    architecture_components::name.asc(),
                ))
                .into_boxed();
            if let Some(wanted) = repo_filter {
                query = query.filter(architecture_components::repo.eq(wanted));
            }
            let rows = query.load::<ComponentRow>(connection)?;
            rows.into_iter().map(row_to_component).collect()
        })
        .await
    }

    async fn find_mapping(
        &self,
        file_path: &FilePath,
    ) -> RegistryRepositoryResult<Option<CodeComponentMapping>> {
        let path = file_path.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = code_component_mappings::table
                .filter(code_component_mappings::file_path.eq(&path))
                .select(MappingRow::as_select())
                .first::<MappingRow>(connection)
                .optional()?;
            row.map(row_to_mapping).transpose()
        })
        .await
    }

    async fn map_file(
        &self,
        mapping: &CodeComponentMapping,
    ) -> RegistryRepositoryResult<CodeComponentMapping> {
        let component_id = mapping.component_id();
        let resolved_by = mapping.created_by().to_owned();
        let resolved_at = mapping.updated_at();
        let new_row = to_new_mapping_row(mapping);

        self.run_blocking(move |connection| {
            connection.transaction::<_, RegistryRepositoryError, _>(|tx| {
                let stored = upsert_mapping(tx, &new_row).map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        RegistryRepositoryError::ComponentNotFound(component_id)
                    }
                    _ => RegistryRepositoryError::persistence(err),
                })?;

                diesel::update(
                    unregistered_files::table
                        .filter(unregistered_files::file_path.eq(&new_row.file_path)),
                )
                .set((
                    unregistered_files::status.eq(UnregisteredStatus::Mapped.as_str()),
                    unregistered_files::resolved_component_id.eq(Some(component_id.into_inner())),
                    unregistered_files::reviewed_by.eq(Some(resolved_by.as_str())),
                    unregistered_files::reviewed_at.eq(Some(resolved_at)),
                ))
                .execute(tx)?;

                row_to_mapping(stored)
            })
        })
        .await
    }

    async fn list_mappings_for_component(
        &self,
        component_id: ComponentId,
    ) -> RegistryRepositoryResult<Vec<CodeComponentMapping>> {
        self.run_blocking(move |connection| {
            let rows = code_component_mappings::table
                .filter(code_component_mappings::component_id.eq(component_id.into_inner()))
                .order(code_component_mappings::file_path.asc())
                .select(MappingRow::as_select())
                .load::<MappingRow>(connection)?;
            rows.into_iter().map(row_to_mapping).collect()
        })
        .await
    }

    async fn list_mappings(&self) -> RegistryRepositoryResult<Vec<CodeComponentMapping>> {
        self.run_blocking(move |connection| {
            let rows = code_component_mappings::table
                .order(code_component_mappings::file_path.asc())
                .select(MappingRow::as_select())
                .load::<MappingRow>(connection)?;
            rows.into_iter().map(row_to_mapping).collect()
        })
        .await
    }

    async fn record_unregistered(
        &self,
        file_path: &FilePath,
        repo: &RepoName,
        seen_at: DateTime<Utc>,
    ) -> RegistryRepositoryResult<UnregisteredFile> {
        let new_row = NewUnregisteredRow {
            id: UnregisteredFileId::new().into_inner(),
            file_path: file_path.as_str().to_owned(),
            repo: repo.as_str().to_owned(),
            first_seen: seen_at,
            last_seen: seen_at,
            detection_count: 1,
            status: UnregisteredStatus::Unregistered.as_str().to_owned(),
        };

        self.run_blocking(move |connection| {
            let row = diesel::insert_into(unregistered_files::table)
                .values(&new_row)
                .on_conflict(unregistered_files::file_path)
                .do_update()
                .set((
                    unregistered_files::detection_count
                        .eq(unregistered_files::detection_count + 1),
                    unregistered_files::last_seen.eq(excluded(unregistered_files::last_seen)),
                ))
                .returning(UnregisteredRow::as_returning())
                .get_result::<UnregisteredRow>(connection)?;
            row_to_unregistered(row)
        })
        .await
    }

    async fn find_unregistered(
        &self,
        file_path: &FilePath,
    ) -> RegistryRepositoryResult<Option<UnregisteredFile>> {
        let path = file_path.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = unregistered_files::table
                .filter(unregistered_files::file_path.eq(&path))
                .select(UnregisteredRow::as_select())
                .first::<UnregisteredRow>(connection)
                .optional()?;
            row.map(row_to_unregistered).transpose()
        })
        .await
    }

    async fn list_unregistered(
        &self,
        filter: &UnregisteredFilter,
    ) -> RegistryRepositoryResult<Vec<UnregisteredFile>> {
        let repo_filter = filter.repo.as_ref().map(|repo| repo.as_str().to_owned());
        let status_filter = filter.status.map(UnregisteredStatus::as_str);
        self.run_blocking(move |connection| {
            let mut query = unregistered_files::table
                .select(UnregisteredRow::as_select())
                .order(unregistered_files::file_path.asc())
                .into_boxed();
            if let Some(repo) = repo_filter {
                query = query.filter(unregistered_files::repo.eq(repo));
            }
            if let Some(status) = status_filter {
                query = query.filter(unregistered_files::status.eq(status));
            }
            let rows = query.load::<UnregisteredRow>(connection)?;
            rows.into_iter().map(row_to_unregistered).collect()
        })
        .await
    }

    async fn update_unregistered(&self, file: &UnregisteredFile) -> RegistryRepositoryResult<()> {
        let file_path = file.file_path().clone();
        let status = file.status().as_str();
        let resolved_component_id = file.resolved_component_id().map(ComponentId::into_inner);
        let review_notes = file.review_notes().map(str::to_owned);
        let reviewed_by = file.reviewed_by().map(str::to_owned);
        let reviewed_at = file.reviewed_at();

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                unregistered_files::table
                    .filter(unregistered_files::file_path.eq(file_path.as_str())),
            )
            .set((
                unregistered_files::status.eq(status),
                unregistered_files::resolved_component_id.eq(resolved_component_id),
                unregistered_files::review_notes.eq(&review_notes),
                unregistered_files::reviewed_by.eq(&reviewed_by),
                unregistered_files::reviewed_at.eq(reviewed_at),
            ))
            .execute(connection)?;

            if updated_count == 0 {
                return Err(RegistryRepositoryError::UnregisteredFileNotFound(file_path));
            }
            Ok(())
        })
        .await
    }
}

/// Inserts or overwrites the mapping for a path.
///
/// Identity, creator and creation time survive an overwrite; the validated
/// flag survives only when the component is unchanged.
fn upsert_mapping(
    connection: &mut PgConnection,
    new_row: &NewMappingRow,
) -> Result<MappingRow, DieselError> {
    diesel::insert_into(code_component_mappings::table)
        .values(new_row)
        .on_conflict(code_component_mappings::file_path)
        .do_update()
        .set((
            code_component_mappings::validated.eq(code_component_mappings::validated.and(
                code_component_mappings::component_id
                    .eq(excluded(code_component_mappings::component_id)),
            )),
            code_component_mappings::component_id
                .eq(excluded(code_component_mappings::component_id)),
            code_component_mappings::kind.eq(excluded(code_component_mappings::kind)),
            code_component_mappings::reason.eq(excluded(code_component_mappings::reason)),
            code_component_mappings::updated_at.eq(excluded(code_component_mappings::updated_at)),
        ))
        .returning(MappingRow::as_returning())
        .get_result::<MappingRow>(connection)
}

fn to_new_component_row(
    component: &ArchitectureComponent,
) -> RegistryRepositoryResult<NewComponentRow> {
    let scope = serde_json::to_value(component.scope())
        .map_err(RegistryRepositoryError::persistence)?;

    Ok(NewComponentRow {
        id: component.id().into_inner(),
        name: component.name().as_str().to_owned(),
        kind: component.kind().as_str().to_owned(),
        repo: component.repo().as_str().to_owned(),
        expected_path: component.expected_path().map(str::to_owned),
        description: component.description().map(str::to_owned),
        scope,
        status: component.status().as_str().to_owned(),
        registered_by: component.registered_by().map(str::to_owned),
        created_at: component.created_at(),
        updated_at: component.updated_at(),
    })
}

fn to_new_mapping_row(mapping: &CodeComponentMapping) -> NewMappingRow {
    NewMappingRow {
        id: mapping.id().into_inner(),
        file_path: mapping.file_path().as_str().to_owned(),
        component_id: mapping.component_id().into_inner(),
        kind: mapping.kind().as_str().to_owned(),
        reason: mapping.reason().to_owned(),
        validated: mapping.validated(),
        created_by: mapping.created_by().to_owned(),
        created_at: mapping.created_at(),
        updated_at: mapping.updated_at(),
    }
}

fn row_to_component(row: ComponentRow) -> RegistryRepositoryResult<ArchitectureComponent> {
    let ComponentRow {
        id,
        name,
        kind,
        repo,
        expected_path,
        description,
        scope,
        status,
        registered_by,
        created_at,
        updated_at,
    } = row;

    let data = PersistedComponentData {
        id: ComponentId::from_uuid(id),
        name: ComponentName::new(name).map_err(RegistryRepositoryError::invalid_persisted_data)?,
        kind: ComponentKind::try_from(kind.as_str())
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        repo: RepoName::new(repo).map_err(RegistryRepositoryError::invalid_persisted_data)?,
        expected_path,
        description,
        scope: serde_json::from_value::<ScopeRules>(scope)
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        status: ComponentStatus::try_from(status.as_str())
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        registered_by,
        created_at,
        updated_at,
    };
    Ok(ArchitectureComponent::from_persisted(data))
}

fn row_to_mapping(row: MappingRow) -> RegistryRepositoryResult<CodeComponentMapping> {
    let MappingRow {
        id,
        file_path,
        component_id,
        kind,
        reason,
        validated,
        created_by,
        created_at,
        updated_at,
    } = row;

    let data = PersistedMappingData {
        id: MappingId::from_uuid(id),
        file_path: FilePath::new(file_path)
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        component_id: ComponentId::from_uuid(component_id),
        kind: MappingKind::try_from(kind.as_str())
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        reason,
        validated,
        created_by,
        created_at,
        updated_at,
    };
    Ok(CodeComponentMapping::from_persisted(data))
}

fn row_to_unregistered(row: UnregisteredRow) -> RegistryRepositoryResult<UnregisteredFile> {
    let UnregisteredRow {
        id,
        file_path,
        repo,
        first_seen,
        last_seen,
        detection_count,
        status,
        resolved_component_id,
        review_notes,
        reviewed_by,
        reviewed_at,
    } = row;

    let data = PersistedUnregisteredData {
        id: UnregisteredFileId::from_uuid(id),
        file_path: FilePath::new(file_path)
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        repo: RepoName::new(repo).map_err(RegistryRepositoryError::invalid_persisted_data)?,
        first_seen,
        last_seen,
        detection_count: u32::try_from(detection_count)
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        status: UnregisteredStatus::try_from(status.as_str())
            .map_err(RegistryRepositoryError::invalid_persisted_data)?,
        resolved_component_id: resolved_component_id.map(ComponentId::from_uuid),
        review_notes,
        reviewed_by,
        reviewed_at,
    };
    Ok(UnregisteredFile::from_persisted(data))
}

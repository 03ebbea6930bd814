//! In-memory registry repository for tests and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::registry::{
    domain::{
        ArchitectureComponent, CodeComponentMapping, ComponentId, ComponentName, FilePath,
        RepoName, UnregisteredFile,
    },
    ports::{
        RegistryRepository, RegistryRepositoryError, RegistryRepositoryResult, UnregisteredFilter,
    },
};

/// Thread-safe in-memory registry repository.
///
/// One write lock guards all three tables, so every upsert is atomic with
/// respect to concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistryRepository {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    components: HashMap<ComponentId, ArchitectureComponent>,
    name_index: HashMap<(ComponentName, RepoName), ComponentId>,
    mappings: HashMap<FilePath, CodeComponentMapping>,
    unregistered: HashMap<FilePath, UnregisteredFile>,
}

impl InMemoryRegistryRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> RegistryRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryRegistryState>> {
        self.state.read().map_err(|err| {
            RegistryRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> RegistryRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryRegistryState>> {
        self.state.write().map_err(|err| {
            RegistryRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn name_key(component: &ArchitectureComponent) -> (ComponentName, RepoName) {
    (component.name().clone(), component.repo().clone())
}

fn sorted_by_path<T>(mut rows: Vec<T>, path: impl Fn(&T) -> &FilePath) -> Vec<T> {
    rows.sort_by(|left, right| path(left).cmp(path(right)));
    rows
}

#[async_trait]
impl RegistryRepository for InMemoryRegistryRepository {
    async fn store_component(
        &self,
        component: &ArchitectureComponent,
    ) -> RegistryRepositoryResult<()> {
        let mut state = self.write()?;
        let key = name_key(component);
        if state.name_index.contains_key(&key) {
            return Err(RegistryRepositoryError::DuplicateComponent {
                name: key.0,
                repo: key.1,
            });
        }

        state.name_index.insert(key, component.id());
        state.components.insert(component.id(), component.clone());
        Ok(())
    }

    async fn update_component(
        &self,
        component: &ArchitectureComponent,
    ) -> RegistryRepositoryResult<()> {
        let mut state = self.write()?;
        let Some(existing) = state.components.get(&component.id()) else {
            return Err(RegistryRepositoryError::ComponentNotFound(component.id()));
        };

        let old_key = name_key(existing);
        let new_key = name_key(component);
        if old_key != new_key {
            if state.name_index.contains_key(&new_key) {
                return Err(RegistryRepositoryError::DuplicateComponent {
                    name: new_key.0,
                    repo: new_key.1,
                });
            }
            state.name_index.remove(&old_key);
            state.name_index.insert(new_key, component.id());
        }

        state.components.insert(component.id(), component.clone());
        Ok(())
    }

    async fn find_component(
        &self,
        id: ComponentId,
    ) -> RegistryRepositoryResult<Option<ArchitectureComponent>> {
        let state = self.read()?;
        Ok(state.components.get(&id).cloned())
    }

    async fn find_component_by_name(
        &self,
        name: &ComponentName,
        repo: &RepoName,
    ) -> RegistryRepositoryResult<Option<ArchitectureComponent>> {
        let state = self.read()?;
        let key = (name.clone(), repo.clone());
        Ok(state
            .name_index
            .get(&key)
            .and_then(|id| state.components.get(id))
            .cloned())
    }

    async fn list_components(
        &self,
        repo: Option<&RepoName>,
    ) -> RegistryRepositoryResult<Vec<ArchitectureComponent>> {
        let state = self.read()?;
        let mut components: Vec<ArchitectureComponent> = state
            .components
            .values()
            .filter(|component| repo.is_none_or(|wanted| component.repo() == wanted))
            .cloned()
            .collect();
        components.sort_by(|left, right| {
            (left.repo(), left.name().as_str()).cmp(&(right.repo(), right.name().as_str()))
        });
        Ok(components)
    }

    async fn find_mapping(
        &self,
        file_path: &FilePath,
    ) -> RegistryRepositoryResult<Option<CodeComponentMapping>> {
        let state = self.read()?;
        Ok(state.mappings.get(file_path).cloned())
    }

    async fn map_file(
        &self,
        mapping: &CodeComponentMapping,
    ) -> RegistryRepositoryResult<CodeComponentMapping> {
        let mut state = self.write()?;
        if !state.components.contains_key(&mapping.component_id()) {
            return Err(RegistryRepositoryError::ComponentNotFound(
                mapping.component_id(),
            ));
        }

        let stored = state
            .mappings
            .entry(mapping.file_path().clone())
            .and_modify(|existing| existing.overwrite_with(mapping))
            .or_insert_with(|| mapping.clone())
            .clone();

        if let Some(row) = state.unregistered.get_mut(mapping.file_path()) {
            row.resolve(
                mapping.component_id(),
                mapping.created_by(),
                mapping.updated_at(),
            );
        }

        Ok(stored)
    }

    async fn list_mappings_for_component(
        &self,
        component_id: ComponentId,
    ) -> RegistryRepositoryResult<Vec<CodeComponentMapping>> {
        let state = self.read()?;
        let rows = state
            .mappings
            .values()
            .filter(|mapping| mapping.component_id() == component_id)
            .cloned()
            .collect();
        Ok(sorted_by_path(rows, CodeComponentMapping::file_path))
    }

    async fn list_mappings(&self) -> RegistryRepositoryResult<Vec<CodeComponentMapping>> {
        let state = self.read()?;
        let rows = state.mappings.values().cloned().collect();
        Ok(sorted_by_path(rows, CodeComponentMapping::file_path))
    }

    async fn record_unregistered(
        &self,
        file_path: &FilePath,
        repo: &RepoName,
        seen_at: DateTime<Utc>,
    ) -> RegistryRepositoryResult<UnregisteredFile> {
        let mut state = self.write()?;
        let row = state
            .unregistered
            .entry(file_path.clone())
            .and_modify(|existing| existing.redetect(seen_at))
            .or_insert_with(|| {
                UnregisteredFile::first_detection(file_path.clone(), repo.clone(), seen_at)
            });
        Ok(row.clone())
    }

    async fn find_unregistered(
        &self,
        file_path: &FilePath,
    ) -> RegistryRepositoryResult<Option<UnregisteredFile>> {
        let state = self.read()?;
        Ok(state.unregistered.get(file_path).cloned())
    }

    async fn list_unregistered(
        &self,
        filter: &UnregisteredFilter,
    ) -> RegistryRepositoryResult<Vec<UnregisteredFile>> {
        let state = self.read()?;
        let rows = state
            .unregistered
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        Ok(sorted_by_path(rows, UnregisteredFile::file_path))
    }

    async fn update_unregistered(&self, file: &UnregisteredFile) -> RegistryRepositoryResult<()> {
        let mut state = self.write()?;
        let Some(existing) = state.unregistered.get_mut(file.file_path()) else {
            return Err(RegistryRepositoryError::UnregisteredFileNotFound(
                file.file_path().clone(),
            ));
        };
        *existing = file.clone();
        Ok(())
    }
}

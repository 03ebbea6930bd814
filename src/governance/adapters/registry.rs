//! Registry-backed file alignment.

use crate::governance::ports::FileAlignment;
use crate::registry::{
    domain::{ArchitectureComponent, ComponentId, FileMapping, FilePath},
    ports::RegistryRepository,
    services::{RegistryService, RegistryServiceResult},
};
use async_trait::async_trait;
use mockable::Clock;

#[async_trait]
impl<R, C> FileAlignment for RegistryService<R, C>
where
    R: RegistryRepository,
    C: Clock + Send + Sync,
{
    async fn is_mapped(&self, file_path: &FilePath) -> RegistryServiceResult<FileMapping> {
        Self::is_mapped(self, file_path).await
    }

    async fn find_component(
        &self,
        id: ComponentId,
    ) -> RegistryServiceResult<Option<ArchitectureComponent>> {
        Self::find_component(self, id).await
    }
}

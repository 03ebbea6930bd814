//! Registry reads needed by the rule engine.

use crate::registry::domain::{ArchitectureComponent, ComponentId, FilePath, FileMapping};
use crate::registry::services::RegistryServiceResult;
use async_trait::async_trait;

/// Read-only view of the code-to-architecture registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileAlignment: Send + Sync {
    /// Reports whether `file_path` is mapped, and to what.
    async fn is_mapped(&self, file_path: &FilePath) -> RegistryServiceResult<FileMapping>;

    /// Finds a component by identifier.
    async fn find_component(
        &self,
        id: ComponentId,
    ) -> RegistryServiceResult<Option<ArchitectureComponent>>;
}

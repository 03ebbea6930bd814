//! Domain model for the code-to-architecture registry.
//!
//! Components are keyed by `(name, repo)`, mappings and unregistered-file
//! rows are keyed by file path. None of these types know about storage.

mod component;
mod error;
mod ids;
mod mapping;
mod scan;
mod unregistered;

pub use component::{
    ArchitectureComponent, ComponentDetails, ComponentKind, ComponentStatus,
    PersistedComponentData, ScopeRules, ScopeViolation,
};
pub use error::{ParseRegistryValueError, RegistryDomainError};
pub use ids::{ComponentId, ComponentName, FilePath, MappingId, RepoName, UnregisteredFileId};
pub use mapping::{CodeComponentMapping, FileMapping, MappingKind, PersistedMappingData};
pub use scan::{
    ChangeCheck, CoverageReport, RepoCoverage, ScanSummary, ScannedFile, TrackedFile,
};
pub use unregistered::{PersistedUnregisteredData, UnregisteredFile, UnregisteredStatus};

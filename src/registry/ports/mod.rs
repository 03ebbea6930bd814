//! Port contracts for the code-to-architecture registry.

pub mod repository;

pub use repository::{
    RegistryRepository, RegistryRepositoryError, RegistryRepositoryResult, UnregisteredFilter,
};

//! Application services for the code-to-architecture registry.

mod registry;

pub use registry::{
    MapFileRequest, RegisterComponentRequest, RegistryService, RegistryServiceError,
    RegistryServiceResult, ReviewUnregisteredRequest,
};

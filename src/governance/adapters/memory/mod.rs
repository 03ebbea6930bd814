//! In-memory adapters for governance persistence.

mod repository;

pub use repository::InMemoryGovernanceRepository;

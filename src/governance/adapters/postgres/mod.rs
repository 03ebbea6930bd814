//! `PostgreSQL` adapters for governance persistence.

mod models;
mod repository;
mod schema;

pub use repository::{GovernancePgPool, PostgresGovernanceRepository};

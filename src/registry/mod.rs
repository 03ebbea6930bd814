//! Code-to-architecture registry.
//!
//! The registry owns declared architecture components, the mapping of source
//! files onto those components, and the ledger of files that were seen by a
//! scan without any mapping. It answers the single question the rest of the
//! governance workflow depends on: is file F mapped, and to what component?
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

//! Placement and scale governance.
//!
//! The rule engine turns a task, its proposed solution and its files into
//! [`domain::Violation`] records. Violations are data: nothing in this
//! module fails because a rule was broken.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Rule engine and rule administration in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

//! External evaluator gateway.
//!
//! Plans and completed work are graded by an external judge. This module
//! holds the request and verdict vocabulary, the [`ports::Evaluator`]
//! contract, and two adapters: an HTTP client for the real backend and a
//! deterministic keyword judge used as a test double.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;

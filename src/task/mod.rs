//! Governed task lifecycle.
//!
//! A task is created in `planning`, passes placement, scale and plan gates
//! to become `approved` or `blocked`, and is started and completed through
//! the [`services::WorkflowEngine`]. Evaluator verdicts are kept as
//! [`domain::EvaluationReport`] records next to the task.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The workflow engine in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

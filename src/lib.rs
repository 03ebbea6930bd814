//! Archwarden: governed task workflow for a multi-repository workspace.
//!
//! Tasks move through a small state machine. Before work starts, each task
//! passes placement rules, a scale check and an external plan evaluation.
//! When work finishes, the task's files are checked against the
//! code-to-architecture registry and the result is graded again.
//!
//! # Architecture
//!
//! Each bounded context follows the hexagonal layout:
//!
//! - **Domain**: validated values and aggregates with no I/O
//! - **Ports**: async traits the services depend on
//! - **Adapters**: in-memory and `PostgreSQL` stores, plus evaluator backends
//! - **Services**: orchestration over the ports
//!
//! # Modules
//!
//! - [`registry`]: architecture components, file mappings, unregistered files
//! - [`governance`]: placement rules, scale rules and recorded violations
//! - [`evaluation`]: the external evaluator gateway
//! - [`task`]: tasks, evaluation reports and the workflow engine
//! - [`config`]: layered configuration

pub mod config;
pub mod evaluation;
pub mod governance;
pub mod registry;
pub mod task;

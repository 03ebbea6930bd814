//! Domain model for the task lifecycle.
//!
//! A task carries its own state machine; the workflow engine is the only
//! caller that moves it between states.

mod error;
mod ids;
mod report;
mod status;
mod task;

pub use error::{ParseTaskValueError, TaskDomainError};
pub use ids::{EvaluationReportId, TaskId};
pub use report::{EvaluationReport, PersistedReportData};
pub use status::{Priority, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskDraft};

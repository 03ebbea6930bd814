//! Port contracts for task persistence.

mod repository;

pub use repository::{
    EvaluationReportRepository, TaskFilter, TaskRepository, TaskRepositoryError,
    TaskRepositoryResult,
};

//! The workflow engine and its settings.

mod settings;
mod workflow;

pub use settings::WorkflowSettings;
pub use workflow::{
    CompletionOutcome, CreateTaskRequest, RevalidationOutcome, StartOutcome, TaskCreation,
    WorkContext, WorkflowEngine, WorkflowError, WorkflowPorts, WorkflowResult,
};

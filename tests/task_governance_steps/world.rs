//! Shared world state for task governance BDD scenarios.

use std::sync::Arc;

use archwarden::config::ArchwardenConfig;
use archwarden::evaluation::{adapters::KeywordEvaluator, ports::Evaluator};
use archwarden::governance::{
    adapters::{KeywordClassifier, memory::InMemoryGovernanceRepository},
    ports::ViolationRepository,
    services::{GovernanceService, RuleEngine, ScalePolicy},
};
use archwarden::registry::{adapters::memory::InMemoryRegistryRepository, services::RegistryService};
use archwarden::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::Task,
    ports::{EvaluationReportRepository, TaskRepository},
    services::{
        CompletionOutcome, CreateTaskRequest, StartOutcome, TaskCreation, WorkContext,
        WorkflowEngine, WorkflowPorts,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Registry service used by the world.
pub type WorldRegistry = RegistryService<InMemoryRegistryRepository, DefaultClock>;

/// Task details gathered by `Given` steps before creation.
#[derive(Default)]
pub struct PendingTask {
    /// Task title.
    pub title: String,
    /// Users the plan must serve.
    pub users: u32,
    /// Proposed solution text.
    pub solution: Option<String>,
    /// Repository the task asks for.
    pub repo: Option<String>,
    /// Files the task touches.
    pub files: Vec<String>,
}

/// Scenario world for task governance behaviour tests.
pub struct GovernanceWorld {
    /// Registry shared with the rule engine.
    pub registry: Arc<WorldRegistry>,
    /// Placement rules and violations.
    pub governance_store: Arc<InMemoryGovernanceRepository>,
    /// Tasks and reports.
    pub tasks: Arc<InMemoryTaskRepository>,
    /// Evaluator double, replaced by grade steps.
    pub evaluator: Arc<KeywordEvaluator>,
    /// Task being assembled.
    pub pending: PendingTask,
    /// Result of the creation step.
    pub creation: Option<TaskCreation>,
    /// Result of the last start attempt.
    pub start: Option<StartOutcome>,
    /// Result of the last completion attempt.
    pub completion: Option<CompletionOutcome>,
    /// Task as it stood after it was started.
    pub started: Option<Task>,
}

impl GovernanceWorld {
    /// Creates a world with empty stores and a default evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RegistryService::new(
                Arc::new(InMemoryRegistryRepository::new()),
                Arc::new(DefaultClock),
            )),
            governance_store: Arc::new(InMemoryGovernanceRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            evaluator: Arc::new(KeywordEvaluator::default()),
            pending: PendingTask::default(),
            creation: None,
            start: None,
            completion: None,
            started: None,
        }
    }

    /// Placement rule administration over the world's store.
    #[must_use]
    pub fn governance(&self) -> GovernanceService<InMemoryGovernanceRepository, DefaultClock> {
        GovernanceService::new(Arc::clone(&self.governance_store), Arc::new(DefaultClock))
    }

    /// Builds a workflow engine over the world's stores.
    ///
    /// # Errors
    ///
    /// Returns an error when the default configuration does not validate.
    pub fn engine(&self) -> eyre::Result<WorkflowEngine<DefaultClock>> {
        let config = ArchwardenConfig::default();
        let clock = Arc::new(DefaultClock);
        let rules = RuleEngine::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.governance_store),
            Arc::new(KeywordClassifier::from_config(&config.classifier)?),
            Arc::clone(&clock),
            ScalePolicy::default(),
        );
        let ports = WorkflowPorts {
            tasks: Arc::clone(&self.tasks) as Arc<dyn TaskRepository>,
            reports: Arc::clone(&self.tasks) as Arc<dyn EvaluationReportRepository>,
            violations: Arc::clone(&self.governance_store) as Arc<dyn ViolationRepository>,
            rules: Arc::new(rules),
            evaluator: Arc::clone(&self.evaluator) as Arc<dyn Evaluator>,
        };
        Ok(WorkflowEngine::new(ports, config.workflow_settings()?, clock))
    }

    /// Request built from the pending task.
    #[must_use]
    pub fn request(&self) -> CreateTaskRequest {
        let pending = &self.pending;
        let mut request = CreateTaskRequest::new(&pending.title, "", pending.users)
            .with_related_files(pending.files.iter().map(String::as_str));
        if let Some(solution) = &pending.solution {
            request = request.with_solution(solution);
        }
        if let Some(repo) = &pending.repo {
            request = request.with_proposed_repo(repo);
        }
        request
    }

    /// The created task.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn created(&self) -> eyre::Result<&TaskCreation> {
        self.creation
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no task created in scenario world"))
    }
}

impl Default for GovernanceWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> GovernanceWorld {
    GovernanceWorld::default()
}

/// Context used by every step.
#[must_use]
pub fn ctx() -> WorkContext {
    WorkContext::new("scenario")
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

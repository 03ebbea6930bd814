//! Shared wiring for in-memory integration tests.

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
    ports::{EvaluationReportRepository, TaskRepository},
    services::{WorkContext, WorkflowEngine, WorkflowPorts},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Registry service over in-memory storage.
pub type TestRegistry = RegistryService<InMemoryRegistryRepository, DefaultClock>;

/// Every service of the workspace, sharing one set of in-memory stores.
pub struct Workspace {
    /// Component and mapping registry.
    pub registry: Arc<TestRegistry>,
    /// Placement rule administration.
    pub governance: GovernanceService<InMemoryGovernanceRepository, DefaultClock>,
    /// Evaluator double, kept for call counting.
    pub evaluator: Arc<KeywordEvaluator>,
    /// Workflow under test.
    pub engine: WorkflowEngine<DefaultClock>,
}

impl Workspace {
    /// Wires a workspace around `evaluator` using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the default configuration does not validate.
    pub fn with_evaluator(evaluator: KeywordEvaluator) -> eyre::Result<Self> {
        let config = ArchwardenConfig::default();
        let clock = Arc::new(DefaultClock);
        let registry = Arc::new(RegistryService::new(
            Arc::new(InMemoryRegistryRepository::new()),
            Arc::clone(&clock),
        ));
        let governance_store = Arc::new(InMemoryGovernanceRepository::new());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let evaluator = Arc::new(evaluator);
        let rules = RuleEngine::new(
            Arc::clone(&registry),
            Arc::clone(&governance_store),
            Arc::new(KeywordClassifier::from_config(&config.classifier)?),
            Arc::clone(&clock),
            ScalePolicy::default(),
        );
        let ports = WorkflowPorts {
            tasks: Arc::clone(&tasks) as Arc<dyn TaskRepository>,
            reports: tasks as Arc<dyn EvaluationReportRepository>,
            violations: Arc::clone(&governance_store) as Arc<dyn ViolationRepository>,
            rules: Arc::new(rules),
            evaluator: Arc::clone(&evaluator) as Arc<dyn Evaluator>,
        };
        Ok(Self {
            registry,
            governance: GovernanceService::new(governance_store, Arc::clone(&clock)),
            evaluator,
            engine: WorkflowEngine::new(ports, config.workflow_settings()?, clock),
        })
    }
}

/// Workspace with a default-grading evaluator.
#[fixture]
pub fn workspace() -> eyre::Result<Workspace> {
    Workspace::with_evaluator(KeywordEvaluator::default())
}

/// Context for an integration-test actor with no current repository.
#[fixture]
pub fn ctx() -> WorkContext {
    WorkContext::new("integration")
}

//! Workflow engine tests: gates, transitions and evaluator handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::ArchwardenConfig;
use crate::evaluation::{
    adapters::KeywordEvaluator,
    domain::{EvaluationKind, EvaluationRequest, EvaluationVerdict, Grade},
    ports::{Evaluator, EvaluatorError, EvaluatorResult, MockEvaluator},
};
use crate::governance::{
    adapters::{memory::InMemoryGovernanceRepository, KeywordClassifier},
    domain::{
        ComponentPlacementRule, Severity, Violation, ViolationDetails, ViolationKind,
        ViolationStatus,
    },
    ports::{GovernanceRules, MockGovernanceRules, PlacementRuleRepository, ViolationRepository},
    services::{RuleEngine, ScalePolicy},
};
use crate::registry::{
    adapters::memory::InMemoryRegistryRepository,
    domain::{RegistryDomainError, RepoName},
    services::RegistryService,
};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Task, TaskDomainError, TaskId, TaskStatus},
    ports::{EvaluationReportRepository, TaskFilter, TaskRepository, TaskRepositoryError},
    services::{
        CompletionOutcome, CreateTaskRequest, RevalidationOutcome, StartOutcome, WorkContext,
        WorkflowEngine, WorkflowError, WorkflowPorts, WorkflowSettings,
    },
};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

struct Harness {
    tasks: Arc<InMemoryTaskRepository>,
    governance: Arc<InMemoryGovernanceRepository>,
    engine: WorkflowEngine<DefaultClock>,
}

fn repo(name: &str) -> RepoName {
    RepoName::new(name).expect("valid repo name")
}

fn default_settings() -> WorkflowSettings {
    ArchwardenConfig::default()
        .workflow_settings()
        .expect("default settings are valid")
}

fn rule_engine(
    governance: &Arc<InMemoryGovernanceRepository>,
) -> RuleEngine<
    RegistryService<InMemoryRegistryRepository, DefaultClock>,
    InMemoryGovernanceRepository,
    KeywordClassifier,
    DefaultClock,
> {
    let registry = RegistryService::new(
        Arc::new(InMemoryRegistryRepository::new()),
        Arc::new(DefaultClock),
    );
    let classifier = KeywordClassifier::from_config(&ArchwardenConfig::default().classifier)
        .expect("default classifier is valid");
    RuleEngine::new(
        Arc::new(registry),
        Arc::clone(governance),
        Arc::new(classifier),
        Arc::new(DefaultClock),
        ScalePolicy::default(),
    )
}

fn build_with(
    evaluator: Arc<dyn Evaluator>,
    rules: Option<MockGovernanceRules>,
    settings: WorkflowSettings,
) -> Harness {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let governance = Arc::new(InMemoryGovernanceRepository::new());
    let rules: Arc<dyn GovernanceRules> = match rules {
        Some(mock) => Arc::new(mock),
        None => Arc::new(rule_engine(&governance)),
    };
    let ports = WorkflowPorts {
        tasks: Arc::clone(&tasks) as Arc<dyn TaskRepository>,
        reports: Arc::clone(&tasks) as Arc<dyn EvaluationReportRepository>,
        violations: Arc::clone(&governance) as Arc<dyn ViolationRepository>,
        rules,
        evaluator,
    };
    Harness {
        tasks,
        governance,
        engine: WorkflowEngine::new(ports, settings, Arc::new(DefaultClock)),
    }
}

fn build(evaluator: &Arc<KeywordEvaluator>) -> Harness {
    build_with(Arc::clone(evaluator) as Arc<dyn Evaluator>, None, default_settings())
}

#[fixture]
fn evaluator() -> Arc<KeywordEvaluator> {
    Arc::new(KeywordEvaluator::default())
}

#[fixture]
fn ctx() -> WorkContext {
    WorkContext::new("dana")
}

async fn reload(harness: &Harness, task_id: TaskId) -> Task {
    harness
        .engine
        .find(task_id)
        .await
        .expect("lookup succeeds")
        .expect("task exists")
}

async fn approved_task(harness: &Harness, ctx: &WorkContext) -> Task {
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Add score cache", "Keep scores between runs", 3)
                .with_proposed_repo("meridian-core"),
            ctx,
        )
        .await
        .expect("create succeeds");
    assert_eq!(creation.task.status(), TaskStatus::Approved);
    creation.task
}

async fn in_progress_task(harness: &Harness, ctx: &WorkContext) -> Task {
    let task = approved_task(harness, ctx).await;
    let outcome = harness
        .engine
        .start(task.id(), ctx)
        .await
        .expect("start succeeds");
    outcome.task().clone()
}

/// Evaluator that answers after `delay`.
struct SlowEvaluator {
    delay: Duration,
}

#[async_trait]
impl Evaluator for SlowEvaluator {
    async fn evaluate(&self, _request: &EvaluationRequest) -> EvaluatorResult<EvaluationVerdict> {
        tokio::time::sleep(self.delay).await;
        Ok(EvaluationVerdict::graded(Grade::A))
    }
}

// ── create ─────────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_without_solution_is_approved_without_evaluation(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);

    let creation = harness
        .engine
        .create(CreateTaskRequest::new("Write runbook", "Document restarts", 1), &ctx)
        .await
        .expect("create succeeds");

    assert_eq!(creation.task.status(), TaskStatus::Approved);
    assert!(creation.violations.is_empty());
    assert!(creation.plan_report.is_none());
    assert_eq!(evaluator.call_count(), 0);
    assert_eq!(reload(&harness, creation.task.id()).await, creation.task);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn heavy_solution_for_one_user_is_blocked(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);

    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 1)
                .with_solution("Kubernetes operator with Vault secrets"),
            &ctx,
        )
        .await
        .expect("create succeeds");

    assert!(creation.is_blocked());
    assert!(
        creation
            .violations
            .iter()
            .any(|violation| violation.kind() == ViolationKind::OverEngineering)
    );
    assert_eq!(evaluator.call_count(), 0);
    let stored = harness
        .engine
        .violations(creation.task.id())
        .await
        .expect("violations listed");
    assert_eq!(stored, creation.violations);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn same_solution_for_many_users_is_not_blocked_on_scale(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);

    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 500)
                .with_solution("Kubernetes operator with Vault secrets"),
            &ctx,
        )
        .await
        .expect("create succeeds");

    assert_eq!(creation.task.status(), TaskStatus::Approved);
    assert!(creation.violations.is_empty());
    assert_eq!(creation.task.plan_grade(), Some(Grade::B));
    assert_eq!(evaluator.call_count(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn component_in_wrong_repo_is_blocked_naming_the_right_one(ctx: WorkContext) {
    let settings = WorkflowSettings::new(
        vec![repo("alpha"), repo("beta")],
        repo("alpha"),
        Duration::from_secs(5),
    );
    let harness = build_with(Arc::new(KeywordEvaluator::default()), None, settings);
    let rule = ComponentPlacementRule::new("VotingSystem", repo("alpha"), None, None, &DefaultClock)
        .expect("valid rule");
    harness
        .governance
        .store_rule(&rule)
        .await
        .expect("rule stored");

    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Rework tallies", "Split the VotingSystem", 10)
                .with_proposed_repo("beta"),
            &ctx,
        )
        .await
        .expect("create succeeds");

    assert!(creation.is_blocked());
    let violation = creation.violations.first().expect("one violation");
    assert_eq!(violation.kind(), ViolationKind::ComponentPlacement);
    assert!(violation.message().contains("alpha"));
    assert_eq!(creation.task.assigned_repo(), Some(&repo("beta")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn plan_rejected_by_evaluator_is_blocked(ctx: WorkContext) {
    let evaluator = Arc::new(KeywordEvaluator::default().with_plan_grade(Grade::D));
    let harness = build(&evaluator);

    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 3)
                .with_solution("A SQLite table"),
            &ctx,
        )
        .await
        .expect("create succeeds");

    assert!(creation.is_blocked());
    assert!(creation.violations.is_empty());
    assert_eq!(creation.task.plan_grade(), Some(Grade::D));
    let reports = harness
        .engine
        .reports(creation.task.id())
        .await
        .expect("reports listed");
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports.first().map(|report| report.kind()),
        Some(EvaluationKind::Plan)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_proposed_repo_is_refused(evaluator: Arc<KeywordEvaluator>, ctx: WorkContext) {
    let harness = build(&evaluator);

    let result = harness
        .engine
        .create(
            CreateTaskRequest::new("Anything", "", 1).with_proposed_repo("elsewhere"),
            &ctx,
        )
        .await;

    assert!(matches!(result, Err(WorkflowError::UnknownRepository(name)) if name == repo("elsewhere")));
    let all = harness
        .engine
        .list(&TaskFilter::default())
        .await
        .expect("list succeeds");
    assert!(all.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_file_path_is_invalid_input(evaluator: Arc<KeywordEvaluator>, ctx: WorkContext) {
    let harness = build(&evaluator);
    let result = harness
        .engine
        .create(
            CreateTaskRequest::new("Anything", "", 1).with_related_files(["  "]),
            &ctx,
        )
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::InvalidInput(RegistryDomainError::EmptyFilePath))
    ));
}

#[rstest]
#[case("Tune the TDOM strategy", None, "meridian-trading")]
#[case("Rename a variable", Some("meridian-research"), "meridian-research")]
#[case("Rename a variable", Some("not-in-workspace"), "workspace")]
#[case("Rename a variable", None, "workspace")]
#[tokio::test(flavor = "multi_thread")]
async fn repository_falls_back_from_classifier_to_context_to_default(
    evaluator: Arc<KeywordEvaluator>,
    #[case] description: &str,
    #[case] current_repo: Option<&str>,
    #[case] expected: &str,
) {
    let harness = build(&evaluator);
    let base = WorkContext::new("dana");
    let work_context = match current_repo {
        Some(name) => base.with_current_repo(repo(name)),
        None => base,
    };

    let creation = harness
        .engine
        .create(CreateTaskRequest::new("Task", description, 1), &work_context)
        .await
        .expect("create succeeds");

    assert_eq!(creation.task.assigned_repo(), Some(&repo(expected)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn evaluator_outage_during_create_leaves_task_planning(ctx: WorkContext) {
    let evaluator = Arc::new(KeywordEvaluator::default().unavailable());
    let harness = build(&evaluator);

    let result = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 3)
                .with_solution("A SQLite table"),
            &ctx,
        )
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Evaluator(EvaluatorError::Unavailable(_)))
    ));
    let stored = harness
        .engine
        .list(&TaskFilter::default())
        .await
        .expect("list succeeds");
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().map(Task::status),
        Some(TaskStatus::Planning)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_evaluator_times_out(ctx: WorkContext) {
    let settings = default_settings().with_evaluator_timeout(Duration::from_millis(20));
    let harness = build_with(
        Arc::new(SlowEvaluator {
            delay: Duration::from_secs(30),
        }),
        None,
        settings,
    );

    let result = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 3)
                .with_solution("A SQLite table"),
            &ctx,
        )
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::EvaluatorTimeout(budget)) if budget == Duration::from_millis(20)
    ));
}

// ── start ──────────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn starting_an_approved_task_records_start_time(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let task = approved_task(&harness, &ctx).await;

    let outcome = harness
        .engine
        .start(task.id(), &ctx)
        .await
        .expect("start succeeds");

    assert!(matches!(outcome, StartOutcome::Started(_)));
    let stored = reload(&harness, task.id()).await;
    assert_eq!(stored.status(), TaskStatus::InProgress);
    assert!(stored.started_at().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn starting_a_blocked_task_changes_nothing(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Queue", "Async jobs", 2).with_solution("Kafka cluster"),
            &ctx,
        )
        .await
        .expect("create succeeds");
    let before = reload(&harness, creation.task.id()).await;

    let outcome = harness
        .engine
        .start(before.id(), &ctx)
        .await
        .expect("start returns an outcome");

    let StartOutcome::Blocked {
        task,
        open_violations,
    } = outcome
    else {
        panic!("blocked task must not start");
    };
    assert_eq!(task, before);
    assert_eq!(open_violations, creation.violations);
    assert_eq!(reload(&harness, before.id()).await, before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn starting_twice_is_an_invalid_transition(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let task = in_progress_task(&harness, &ctx).await;

    let result = harness.engine.start(task.id(), &ctx).await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::InvalidStateTransition {
            from: TaskStatus::InProgress,
            to: TaskStatus::InProgress,
            ..
        }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn starting_an_unknown_task_is_not_found(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let missing = TaskId::new();
    let result = harness.engine.start(missing, &ctx).await;
    assert!(matches!(result, Err(WorkflowError::TaskNotFound(id)) if id == missing));
}

// ── complete ───────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_completion_blocks_and_keeps_start_time(ctx: WorkContext) {
    let evaluator = Arc::new(KeywordEvaluator::default().with_completion_grade(Grade::F));
    let harness = build(&evaluator);
    let task = in_progress_task(&harness, &ctx).await;

    let outcome = harness
        .engine
        .complete(task.id(), &ctx)
        .await
        .expect("complete returns an outcome");

    assert!(matches!(outcome, CompletionOutcome::Rejected { .. }));
    assert_eq!(outcome.report().grade(), Grade::F);
    let stored = reload(&harness, task.id()).await;
    assert_eq!(stored.status(), TaskStatus::Blocked);
    assert_eq!(stored.started_at(), task.started_at());
    assert_eq!(stored.completed_at(), None);
    assert_eq!(stored.completion_grade(), Some(Grade::F));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_completion_records_unmapped_files_without_blocking(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let task = in_progress_task(&harness, &ctx).await;
    harness
        .engine
        .attach_files(task.id(), ["core/cache.py"], &ctx)
        .await
        .expect("attach succeeds");

    let outcome = harness
        .engine
        .complete(task.id(), &ctx)
        .await
        .expect("complete succeeds");

    let CompletionOutcome::Completed {
        task: completed,
        file_violations,
        ..
    } = outcome
    else {
        panic!("completion should be accepted");
    };
    assert_eq!(completed.status(), TaskStatus::Completed);
    assert!(completed.completed_at().is_some());
    assert_eq!(file_violations.len(), 1);
    assert_eq!(
        file_violations.first().map(Violation::kind),
        Some(ViolationKind::UnmappedFile)
    );
    let recorded = harness
        .engine
        .violations(task.id())
        .await
        .expect("violations listed");
    assert_eq!(recorded, file_violations);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_an_approved_task_is_refused_before_evaluation(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let task = approved_task(&harness, &ctx).await;

    let result = harness.engine.complete(task.id(), &ctx).await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::InvalidStateTransition {
            from: TaskStatus::Approved,
            to: TaskStatus::Completed,
            ..
        }))
    ));
    assert_eq!(evaluator.call_count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn evaluator_outage_during_complete_leaves_task_in_progress(ctx: WorkContext) {
    let evaluator = Arc::new(KeywordEvaluator::default().unavailable());
    let harness = build(&evaluator);
    let task = in_progress_task(&harness, &ctx).await;

    let result = harness.engine.complete(task.id(), &ctx).await;

    assert!(matches!(result, Err(WorkflowError::Evaluator(_))));
    assert_eq!(
        reload(&harness, task.id()).await.status(),
        TaskStatus::InProgress
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retried_completion_records_each_file_breach_once(ctx: WorkContext) {
    let calls = AtomicUsize::new(0);
    let mut evaluator = MockEvaluator::new();
    evaluator.expect_evaluate().times(2).returning(move |_| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(EvaluatorError::unavailable(std::io::Error::other(
                "connection refused",
            )))
        } else {
            Ok(EvaluationVerdict::graded(Grade::B))
        }
    });
    let harness = build_with(Arc::new(evaluator), None, default_settings());
    let task = in_progress_task(&harness, &ctx).await;
    harness
        .engine
        .attach_files(task.id(), ["core/cache.py"], &ctx)
        .await
        .expect("attach succeeds");

    let first = harness.engine.complete(task.id(), &ctx).await;
    assert!(matches!(first, Err(WorkflowError::Evaluator(_))));
    assert!(harness
        .engine
        .violations(task.id())
        .await
        .expect("violations listed")
        .is_empty());
    assert!(harness
        .engine
        .reports(task.id())
        .await
        .expect("reports listed")
        .is_empty());

    let second = harness
        .engine
        .complete(task.id(), &ctx)
        .await
        .expect("retry succeeds");

    assert!(matches!(second, CompletionOutcome::Completed { .. }));
    let recorded = harness
        .engine
        .violations(task.id())
        .await
        .expect("violations listed");
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded.first().map(Violation::kind),
        Some(ViolationKind::UnmappedFile)
    );
    assert_eq!(
        harness
            .engine
            .reports(task.id())
            .await
            .expect("reports listed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_keeps_both_reports(evaluator: Arc<KeywordEvaluator>, ctx: WorkContext) {
    let harness = build(&evaluator);
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 3)
                .with_solution("A SQLite table")
                .with_proposed_repo("workspace"),
            &ctx,
        )
        .await
        .expect("create succeeds");
    let task_id = creation.task.id();
    harness.engine.start(task_id, &ctx).await.expect("start");
    harness
        .engine
        .complete(task_id, &ctx)
        .await
        .expect("complete");

    let kinds: Vec<EvaluationKind> = harness
        .engine
        .reports(task_id)
        .await
        .expect("reports listed")
        .iter()
        .map(|report| report.kind())
        .collect();
    assert_eq!(kinds, vec![EvaluationKind::Plan, EvaluationKind::Completion]);
    assert_eq!(evaluator.call_count(), 2);
}

// ── revalidate ─────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revalidation_approves_once_the_plan_passes(ctx: WorkContext) {
    let calls = AtomicUsize::new(0);
    let mut evaluator = MockEvaluator::new();
    evaluator.expect_evaluate().times(2).returning(move |_| {
        let grade = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Grade::D
        } else {
            Grade::B
        };
        Ok(EvaluationVerdict::graded(grade))
    });
    let harness = build_with(Arc::new(evaluator), None, default_settings());
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Feature flags", "Toggle features", 3)
                .with_solution("A SQLite table"),
            &ctx,
        )
        .await
        .expect("create succeeds");
    assert!(creation.is_blocked());

    let outcome = harness
        .engine
        .revalidate(creation.task.id(), &ctx)
        .await
        .expect("revalidate succeeds");

    assert!(matches!(outcome, RevalidationOutcome::Approved { .. }));
    assert_eq!(outcome.task().status(), TaskStatus::Approved);
    assert_eq!(outcome.task().plan_grade(), Some(Grade::B));
    let started = harness
        .engine
        .start(creation.task.id(), &ctx)
        .await
        .expect("start succeeds");
    assert!(matches!(started, StartOutcome::Started(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revalidation_after_rejected_completion_keeps_file_breaches_open(ctx: WorkContext) {
    let evaluator = Arc::new(KeywordEvaluator::default().with_completion_grade(Grade::F));
    let harness = build(&evaluator);
    let task = in_progress_task(&harness, &ctx).await;
    harness
        .engine
        .attach_files(task.id(), ["core/unmapped.py"], &ctx)
        .await
        .expect("attach succeeds");
    let rejected = harness
        .engine
        .complete(task.id(), &ctx)
        .await
        .expect("complete returns an outcome");
    assert!(matches!(rejected, CompletionOutcome::Rejected { .. }));

    let outcome = harness
        .engine
        .revalidate(task.id(), &ctx)
        .await
        .expect("revalidate succeeds");

    let RevalidationOutcome::Approved { closed, .. } = outcome else {
        panic!("planning gates pass without a solution");
    };
    assert!(closed.is_empty());
    let recorded = harness
        .engine
        .violations(task.id())
        .await
        .expect("violations listed");
    assert_eq!(recorded.len(), 1);
    let unmapped = recorded.first().expect("one violation");
    assert_eq!(unmapped.kind(), ViolationKind::UnmappedFile);
    assert_eq!(unmapped.status(), ViolationStatus::Open);

    harness.engine.start(task.id(), &ctx).await.expect("restart");
    harness
        .engine
        .complete(task.id(), &ctx)
        .await
        .expect("second completion returns an outcome");
    assert_eq!(
        harness
            .engine
            .violations(task.id())
            .await
            .expect("violations listed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revalidation_closes_violations_whose_cause_is_gone(ctx: WorkContext) {
    let calls = AtomicUsize::new(0);
    let mut rules = MockGovernanceRules::new();
    rules
        .expect_validate_placement()
        .times(2)
        .returning(move |task, _repo| {
            if calls.fetch_add(1, Ordering::SeqCst) > 0 {
                return Ok(Vec::new());
            }
            Ok(vec![Violation::new(
                task.id(),
                ViolationKind::ComponentPlacement,
                Severity::Critical,
                ViolationDetails {
                    message: "Component belongs in meridian-core, not workspace".to_owned(),
                    rule_violated: "Component placement: Widget".to_owned(),
                    fix_required: "Move to meridian-core".to_owned(),
                    file_path: None,
                },
                &DefaultClock,
            )])
        });
    let evaluator = Arc::new(KeywordEvaluator::default());
    let harness = build_with(evaluator, Some(rules), default_settings());
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Widget", "", 1).with_proposed_repo("workspace"),
            &ctx,
        )
        .await
        .expect("create succeeds");
    assert!(creation.is_blocked());

    let outcome = harness
        .engine
        .revalidate(creation.task.id(), &ctx)
        .await
        .expect("revalidate succeeds");

    let RevalidationOutcome::Approved { task, closed } = outcome else {
        panic!("task should be re-approved");
    };
    assert_eq!(task.status(), TaskStatus::Approved);
    assert_eq!(closed.len(), 1);
    let stored = harness
        .engine
        .violations(task.id())
        .await
        .expect("violations listed");
    assert!(
        stored
            .iter()
            .all(|violation| violation.status() == ViolationStatus::Fixed
                && violation.resolved_at().is_some())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revalidation_does_not_duplicate_open_breaches(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Queue", "Async jobs", 2).with_solution("Kafka cluster"),
            &ctx,
        )
        .await
        .expect("create succeeds");

    let outcome = harness
        .engine
        .revalidate(creation.task.id(), &ctx)
        .await
        .expect("revalidate succeeds");

    let RevalidationOutcome::StillBlocked { violations, .. } = outcome else {
        panic!("task should stay blocked");
    };
    assert_eq!(violations.len(), creation.violations.len());
    let stored = harness
        .engine
        .violations(creation.task.id())
        .await
        .expect("violations listed");
    assert_eq!(stored, creation.violations);
    assert_eq!(
        reload(&harness, creation.task.id()).await.status(),
        TaskStatus::Blocked
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_blocked_tasks_can_be_revalidated(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let task = approved_task(&harness, &ctx).await;

    let result = harness.engine.revalidate(task.id(), &ctx).await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::InvalidStateTransition {
            from: TaskStatus::Approved,
            ..
        }))
    ));
}

// ── cancel and files ───────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocked_task_can_be_cancelled_once(evaluator: Arc<KeywordEvaluator>, ctx: WorkContext) {
    let harness = build(&evaluator);
    let creation = harness
        .engine
        .create(
            CreateTaskRequest::new("Queue", "Async jobs", 2).with_solution("Kafka cluster"),
            &ctx,
        )
        .await
        .expect("create succeeds");

    let cancelled = harness
        .engine
        .cancel(creation.task.id(), &ctx)
        .await
        .expect("cancel succeeds");
    let again = harness.engine.cancel(creation.task.id(), &ctx).await;

    assert_eq!(cancelled.status(), TaskStatus::Cancelled);
    assert!(matches!(
        again,
        Err(WorkflowError::Domain(TaskDomainError::InvalidStateTransition {
            from: TaskStatus::Cancelled,
            ..
        }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn attaching_files_is_deduplicated_and_persisted(
    evaluator: Arc<KeywordEvaluator>,
    ctx: WorkContext,
) {
    let harness = build(&evaluator);
    let task = approved_task(&harness, &ctx).await;

    harness
        .engine
        .attach_files(task.id(), ["core/a.py", "core/b.py"], &ctx)
        .await
        .expect("first attach");
    let updated = harness
        .engine
        .attach_files(task.id(), ["./core/a.py"], &ctx)
        .await
        .expect("second attach");

    assert_eq!(updated.related_files().len(), 2);
    assert_eq!(reload(&harness, task.id()).await, updated);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_writer_loses_to_the_workflow(evaluator: Arc<KeywordEvaluator>, ctx: WorkContext) {
    let harness = build(&evaluator);
    let stale = approved_task(&harness, &ctx).await;
    harness
        .engine
        .start(stale.id(), &ctx)
        .await
        .expect("start succeeds");

    let mut late = stale.clone();
    late.cancel(&DefaultClock).expect("cancel in memory");
    let result = harness.tasks.update(&late, stale.version()).await;

    assert!(matches!(
        result,
        Err(TaskRepositoryError::VersionConflict { .. })
    ));
}

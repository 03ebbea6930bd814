//! Task lifecycle against real placement rules and registry data.

use super::helpers::{Workspace, ctx, workspace};
use archwarden::evaluation::adapters::KeywordEvaluator;
use archwarden::evaluation::domain::Grade;
use archwarden::governance::{
    domain::{Severity, ViolationKind, ViolationStatus},
    services::RegisterPlacementRuleRequest,
};
use archwarden::registry::{
    domain::{ComponentKind, ScopeRules},
    services::{MapFileRequest, RegisterComponentRequest},
};
use archwarden::task::{
    domain::TaskStatus,
    ports::TaskFilter,
    services::{CompletionOutcome, CreateTaskRequest, RevalidationOutcome, StartOutcome, WorkContext},
};
use eyre::{bail, ensure};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scope_breach_of_a_mapped_file_is_reported_at_completion(
    workspace: eyre::Result<Workspace>,
    ctx: WorkContext,
) -> eyre::Result<()> {
    let ws = workspace?;
    let component = ws
        .registry
        .register_component(
            RegisterComponentRequest::new("Research", ComponentKind::Package, "meridian-research")
                .with_scope(ScopeRules::new(Vec::new(), vec!["trading".to_owned()])),
        )
        .await?;
    ws.registry
        .map_file(MapFileRequest::new(
            "research/trading_sampler.py",
            component.id(),
            "sampler for the research package",
        ))
        .await?;
    let creation = ws
        .engine
        .create(
            CreateTaskRequest::new("Sample fills", "Compare fills", 2)
                .with_proposed_repo("meridian-research")
                .with_related_files(["research/trading_sampler.py"]),
            &ctx,
        )
        .await?;
    ws.engine.start(creation.task.id(), &ctx).await?;

    let outcome = ws.engine.complete(creation.task.id(), &ctx).await?;

    let CompletionOutcome::Completed {
        task,
        file_violations,
        ..
    } = outcome
    else {
        bail!("completion should be accepted");
    };
    ensure!(task.status() == TaskStatus::Completed, "task should complete");
    ensure!(file_violations.len() == 1, "one scope finding expected");
    let finding = file_violations
        .first()
        .ok_or_else(|| eyre::eyre!("missing finding"))?;
    ensure!(finding.kind() == ViolationKind::ScopeViolation, "wrong kind");
    ensure!(finding.severity() == Severity::Medium, "wrong severity");
    ensure!(
        finding.message().contains("trading"),
        "message should name the fragment: {}",
        finding.message()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mapped_file_inside_scope_completes_cleanly(
    workspace: eyre::Result<Workspace>,
    ctx: WorkContext,
) -> eyre::Result<()> {
    let ws = workspace?;
    let component = ws
        .registry
        .register_component(RegisterComponentRequest::new(
            "LearningEngine",
            ComponentKind::Module,
            "meridian-core",
        ))
        .await?;
    ws.registry
        .map_file(MapFileRequest::new(
            "core/learning.py",
            component.id(),
            "engine entry point",
        ))
        .await?;
    let creation = ws
        .engine
        .create(
            CreateTaskRequest::new("Tune decay", "Adjust weights", 4)
                .with_proposed_repo("meridian-core")
                .with_related_files(["core/learning.py"]),
            &ctx,
        )
        .await?;
    ws.engine.start(creation.task.id(), &ctx).await?;

    let outcome = ws.engine.complete(creation.task.id(), &ctx).await?;

    let CompletionOutcome::Completed {
        file_violations, ..
    } = outcome
    else {
        bail!("completion should be accepted");
    };
    ensure!(file_violations.is_empty(), "no findings expected");
    ensure!(
        ws.engine.violations(creation.task.id()).await?.is_empty(),
        "nothing should be recorded"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn placement_rule_blocks_until_task_is_cancelled(
    workspace: eyre::Result<Workspace>,
    ctx: WorkContext,
) -> eyre::Result<()> {
    let ws = workspace?;
    ws.governance
        .register_rule(
            RegisterPlacementRuleRequest::new("ProposalManager", "meridian-core")
                .with_location("core/proposals/")
                .with_rationale("framework code lives in core"),
        )
        .await?;

    let creation = ws
        .engine
        .create(
            CreateTaskRequest::new("New ProposalManager", "Scoring hooks", 3)
                .with_proposed_repo("meridian-research"),
            &ctx,
        )
        .await?;
    ensure!(creation.is_blocked(), "task should be blocked");
    let violation = creation
        .violations
        .first()
        .ok_or_else(|| eyre::eyre!("missing violation"))?;
    ensure!(
        violation.fix_required() == "Move to meridian-core/core/proposals/",
        "unexpected fix: {}",
        violation.fix_required()
    );

    let start = ws.engine.start(creation.task.id(), &ctx).await?;
    ensure!(
        matches!(start, StartOutcome::Blocked { .. }),
        "blocked task must not start"
    );
    let still = ws.engine.revalidate(creation.task.id(), &ctx).await?;
    ensure!(
        matches!(still, RevalidationOutcome::StillBlocked { .. }),
        "rule still applies"
    );

    let cancelled = ws.engine.cancel(creation.task.id(), &ctx).await?;
    ensure!(cancelled.status() == TaskStatus::Cancelled, "task cancelled");
    let recorded = ws.engine.violations(creation.task.id()).await?;
    ensure!(recorded.len() == 1, "revalidation must not duplicate");
    ensure!(
        recorded
            .iter()
            .all(|found| found.status() == ViolationStatus::Open),
        "violation stays open"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn classifier_routes_tasks_and_list_filters_by_repository(
    workspace: eyre::Result<Workspace>,
    ctx: WorkContext,
) -> eyre::Result<()> {
    let ws = workspace?;
    ws.engine
        .create(CreateTaskRequest::new("Entry rules", "TDOM strategy entries", 1), &ctx)
        .await?;
    ws.engine
        .create(
            CreateTaskRequest::new("Slow reports", "Investigation into query latency", 1),
            &ctx,
        )
        .await?;
    ws.engine
        .create(CreateTaskRequest::new("Tidy readme", "Fix typos", 1), &ctx)
        .await?;

    let trading = ws
        .engine
        .list(&TaskFilter {
            repo: Some(archwarden::registry::domain::RepoName::new("meridian-trading")?),
            status: None,
        })
        .await?;
    let approved = ws
        .engine
        .list(&TaskFilter {
            repo: None,
            status: Some(TaskStatus::Approved),
        })
        .await?;

    ensure!(trading.len() == 1, "one trading task expected");
    ensure!(approved.len() == 3, "no gates apply without a solution");
    ensure!(ws.evaluator.call_count() == 0, "evaluator must not be called");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_completion_records_grade_and_report(ctx: WorkContext) -> eyre::Result<()> {
    let ws = Workspace::with_evaluator(KeywordEvaluator::default().with_completion_grade(Grade::D))?;
    let creation = ws
        .engine
        .create(
            CreateTaskRequest::new("Cache scores", "Avoid recomputation", 3)
                .with_solution("An in-process LRU map"),
            &ctx,
        )
        .await?;
    let started = ws.engine.start(creation.task.id(), &ctx).await?;

    let outcome = ws.engine.complete(creation.task.id(), &ctx).await?;

    ensure!(
        matches!(outcome, CompletionOutcome::Rejected { .. }),
        "grade D must reject"
    );
    let task = outcome.task();
    ensure!(task.status() == TaskStatus::Blocked, "task should be blocked");
    ensure!(task.plan_grade() == Some(Grade::B), "plan grade kept");
    ensure!(task.completion_grade() == Some(Grade::D), "completion grade kept");
    ensure!(
        task.started_at() == started.task().started_at(),
        "start time untouched"
    );
    ensure!(
        ws.engine.reports(task.id()).await?.len() == 2,
        "plan and completion reports stored"
    );
    Ok(())
}

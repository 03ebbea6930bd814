//! Governance persistence against `PostgreSQL`.

use super::helpers::{clock, isolated_pool};
use archwarden::governance::{
    adapters::postgres::PostgresGovernanceRepository,
    domain::{
        ComponentPlacementRule, Severity, Violation, ViolationDetails, ViolationKind,
        ViolationStatus,
    },
    ports::{GovernanceRepositoryError, PlacementRuleRepository, ViolationRepository},
};
use archwarden::registry::domain::{FilePath, RepoName};
use archwarden::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{Task, TaskDraft},
    ports::TaskRepository,
};
use eyre::ensure;
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rule_patterns_are_unique_ignoring_case(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let repo = PostgresGovernanceRepository::new(pool);
    let first = ComponentPlacementRule::new(
        "VotingSystem",
        RepoName::new("meridian-core")?,
        Some("core/voting/".to_owned()),
        None,
        &clock,
    )?;
    let clash = ComponentPlacementRule::new(
        "votingsystem",
        RepoName::new("meridian-research")?,
        None,
        None,
        &clock,
    )?;
    repo.store_rule(&first).await?;

    let result = repo.store_rule(&clash).await;

    ensure!(
        matches!(result, Err(GovernanceRepositoryError::DuplicatePlacementRule(_))),
        "expected duplicate rule error, got {result:?}"
    );
    let rules = repo.list_rules().await?;
    ensure!(rules.len() == 1, "only the first rule is stored");
    ensure!(
        rules.first().and_then(ComponentPlacementRule::correct_location) == Some("core/voting/"),
        "location persisted"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closing_a_violation_persists_status_and_time(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let tasks = PostgresTaskRepository::new(pool.clone());
    let repo = PostgresGovernanceRepository::new(pool);
    let task = Task::new(
        TaskDraft {
            title: "Owner".to_owned(),
            ..TaskDraft::default()
        },
        &clock,
    )?;
    tasks.store(&task).await?;
    let mut violation = Violation::new(
        task.id(),
        ViolationKind::UnmappedFile,
        Severity::High,
        ViolationDetails {
            message: "File 'core/a.py' is not mapped to any architecture component".to_owned(),
            rule_violated: "Code-to-architecture mapping requirement".to_owned(),
            fix_required: "Map file to component".to_owned(),
            file_path: Some(FilePath::new("core/a.py")?),
        },
        &clock,
    );
    repo.store_violations(std::slice::from_ref(&violation)).await?;

    violation.close(&clock);
    repo.update_violation(&violation).await?;

    let stored = repo.list_for_task(task.id()).await?;
    let found = stored.first().ok_or_else(|| eyre::eyre!("violation missing"))?;
    ensure!(found.status() == ViolationStatus::Fixed, "status persisted");
    ensure!(found.resolved_at().is_some(), "resolution time persisted");
    ensure!(
        found.file_path().map(FilePath::as_str) == Some("core/a.py"),
        "file path persisted"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_an_unknown_violation_is_not_found(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let repo = PostgresGovernanceRepository::new(pool);
    let orphan = Violation::new(
        archwarden::task::domain::TaskId::new(),
        ViolationKind::OverEngineering,
        Severity::High,
        ViolationDetails {
            message: "Over-engineering: kafka for 1 user(s)".to_owned(),
            rule_violated: "Start Small, Scale Smart principle".to_owned(),
            fix_required: "Use Tier 1 solution for 1 users".to_owned(),
            file_path: None,
        },
        &clock,
    );

    let result = repo.update_violation(&orphan).await;

    ensure!(
        matches!(result, Err(GovernanceRepositoryError::ViolationNotFound(id)) if id == orphan.id()),
        "expected not found, got {result:?}"
    );
    Ok(())
}

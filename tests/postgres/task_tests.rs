//! Task and report persistence against `PostgreSQL`.

use super::helpers::{clock, isolated_pool};
use archwarden::evaluation::domain::{EvaluationKind, EvaluationVerdict, Grade};
use archwarden::registry::domain::{FilePath, RepoName};
use archwarden::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{EvaluationReport, Priority, Task, TaskDraft, TaskStatus},
    ports::{EvaluationReportRepository, TaskFilter, TaskRepository, TaskRepositoryError},
};
use eyre::ensure;
use mockable::DefaultClock;
use rstest::rstest;

fn draft(title: &str, repo: &str) -> eyre::Result<TaskDraft> {
    Ok(TaskDraft {
        title: title.to_owned(),
        description: "persisted".to_owned(),
        priority: Priority::High,
        assigned_repo: Some(RepoName::new(repo)?),
        actual_users: 7,
        proposed_solution: Some("SQLite file".to_owned()),
        related_files: vec![FilePath::new("core/a.py")?, FilePath::new("core/b.py")?],
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_task_reads_back_with_files_and_grades(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let repo = PostgresTaskRepository::new(pool);
    let mut task = Task::new(draft("Persist me", "meridian-core")?, &clock)?;
    repo.store(&task).await?;
    let expected = task.version();
    task.record_plan_grade(Grade::OverEngineered, &clock);
    task.block(&clock)?;
    repo.update(&task, expected).await?;

    let found = repo
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task missing"))?;

    ensure!(found.status() == TaskStatus::Blocked, "status persisted");
    ensure!(found.priority() == Priority::High, "priority persisted");
    ensure!(found.plan_grade() == Some(Grade::OverEngineered), "grade persisted");
    ensure!(found.related_files() == task.related_files(), "files persisted in order");
    ensure!(found.version() == task.version(), "version persisted");
    ensure!(found.actual_users() == 7, "user count persisted");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_update_is_a_version_conflict(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let repo = PostgresTaskRepository::new(pool);
    let mut first = Task::new(draft("Race", "workspace")?, &clock)?;
    repo.store(&first).await?;
    let mut second = first.clone();
    let loaded = first.version();
    first.approve(&clock)?;
    repo.update(&first, loaded).await?;

    second.cancel(&clock)?;
    let result = repo.update(&second, loaded).await;

    ensure!(
        matches!(
            result,
            Err(TaskRepositoryError::VersionConflict { expected, actual, .. })
                if expected == loaded && actual == first.version()
        ),
        "expected a version conflict, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_filters_by_repo_and_status(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let repo = PostgresTaskRepository::new(pool);
    let core = Task::new(draft("Core work", "meridian-core")?, &clock)?;
    let mut research = Task::new(draft("Research work", "meridian-research")?, &clock)?;
    repo.store(&core).await?;
    repo.store(&research).await?;
    let loaded = research.version();
    research.approve(&clock)?;
    repo.update(&research, loaded).await?;

    let by_repo = repo
        .list(&TaskFilter {
            repo: Some(RepoName::new("meridian-core")?),
            status: None,
        })
        .await?;
    let approved = repo
        .list(&TaskFilter {
            repo: None,
            status: Some(TaskStatus::Approved),
        })
        .await?;

    ensure!(
        by_repo.iter().map(Task::id).collect::<Vec<_>>() == vec![core.id()],
        "repo filter"
    );
    ensure!(
        approved.iter().map(Task::id).collect::<Vec<_>>() == vec![research.id()],
        "status filter"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reports_keep_verdict_detail_in_order(clock: DefaultClock) -> eyre::Result<()> {
    let Some(pool) = isolated_pool()? else {
        return Ok(());
    };
    let repo = PostgresTaskRepository::new(pool);
    let task = Task::new(draft("Graded", "workspace")?, &clock)?;
    repo.store(&task).await?;
    let mut plan = EvaluationVerdict::graded(Grade::B);
    plan.subscores.insert("simplicity".to_owned(), Grade::A);
    plan.required_fixes.push("add a rollback note".to_owned());
    let mut completion = EvaluationVerdict::graded(Grade::F);
    completion.blockers.push("no tests".to_owned());
    completion.raw_text = "GRADE: F".to_owned();

    repo.store_report(&EvaluationReport::new(
        task.id(),
        EvaluationKind::Plan,
        plan,
        Some(7),
        &clock,
    ))
    .await?;
    repo.store_report(&EvaluationReport::new(
        task.id(),
        EvaluationKind::Completion,
        completion,
        None,
        &clock,
    ))
    .await?;

    let reports = repo.list_reports(task.id()).await?;
    let kinds: Vec<EvaluationKind> = reports.iter().map(EvaluationReport::kind).collect();
    ensure!(
        kinds == vec![EvaluationKind::Plan, EvaluationKind::Completion],
        "reports ordered by evaluation time"
    );
    let first = reports.first().ok_or_else(|| eyre::eyre!("no plan report"))?;
    ensure!(
        first.subscores().get("simplicity") == Some(&Grade::A),
        "subscores persisted"
    );
    ensure!(first.actual_users() == Some(7), "user count persisted");
    let last = reports.last().ok_or_else(|| eyre::eyre!("no completion report"))?;
    ensure!(last.blockers() == ["no tests".to_owned()], "blockers persisted");
    ensure!(last.is_rejection(), "grade F rejects a completion");
    Ok(())
}

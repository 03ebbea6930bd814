//! Then steps for task governance BDD scenarios.

use super::world::{GovernanceWorld, run_async};
use archwarden::governance::domain::{Violation, ViolationKind};
use archwarden::task::{
    domain::TaskStatus,
    services::{CompletionOutcome, StartOutcome},
};
use rstest_bdd_macros::then;

fn recorded(world: &GovernanceWorld) -> Result<Vec<Violation>, eyre::Report> {
    let task_id = world.created()?.task.id();
    let engine = world.engine()?;
    run_async(engine.violations(task_id)).map_err(|err| eyre::eyre!("violations failed: {err}"))
}

#[then(r#"the task is "{status}""#)]
fn task_has_status(world: &mut GovernanceWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str()).map_err(|err| eyre::eyre!("{err}"))?;
    let task_id = world.created()?.task.id();
    let engine = world.engine()?;
    let task = run_async(engine.find(task_id))
        .map_err(|err| eyre::eyre!("lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("task {task_id} missing"))?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"a violation of kind "{kind}" is recorded"#)]
fn violation_recorded(world: &mut GovernanceWorld, kind: String) -> Result<(), eyre::Report> {
    let expected = ViolationKind::try_from(kind.as_str()).map_err(|err| eyre::eyre!("{err}"))?;
    let violations = recorded(world)?;
    if !violations.iter().any(|found| found.kind() == expected) {
        return Err(eyre::eyre!("no {expected} violation in {violations:?}"));
    }
    Ok(())
}

#[then(r#"the violation message mentions "{text}""#)]
fn violation_mentions(world: &mut GovernanceWorld, text: String) -> Result<(), eyre::Report> {
    let violations = recorded(world)?;
    if !violations.iter().any(|found| found.message().contains(&text)) {
        return Err(eyre::eyre!("no violation message mentions '{text}'"));
    }
    Ok(())
}

#[then("the evaluator was not called")]
fn evaluator_not_called(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let calls = world.evaluator.call_count();
    if calls != 0 {
        return Err(eyre::eyre!("evaluator called {calls} times"));
    }
    Ok(())
}

#[then("the evaluator was called {count:usize} times")]
fn evaluator_called(world: &mut GovernanceWorld, count: usize) -> Result<(), eyre::Report> {
    let calls = world.evaluator.call_count();
    if calls != count {
        return Err(eyre::eyre!("expected {count} evaluator calls, found {calls}"));
    }
    Ok(())
}

#[then("the start is refused with {count:usize} open violations")]
fn start_refused(world: &mut GovernanceWorld, count: usize) -> Result<(), eyre::Report> {
    match world.start.as_ref() {
        Some(StartOutcome::Blocked {
            open_violations, ..
        }) if open_violations.len() == count => Ok(()),
        other => Err(eyre::eyre!(
            "expected refusal with {count} violations, got {other:?}"
        )),
    }
}

#[then("the completion is rejected")]
fn completion_rejected(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    if !matches!(world.completion, Some(CompletionOutcome::Rejected { .. })) {
        return Err(eyre::eyre!(
            "expected rejection, got {:?}",
            world.completion
        ));
    }
    Ok(())
}

#[then("the task keeps its start time")]
fn keeps_start_time(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let started = world
        .started
        .as_ref()
        .and_then(|task| task.started_at())
        .ok_or_else(|| eyre::eyre!("task was never started"))?;
    let completion = world
        .completion
        .as_ref()
        .ok_or_else(|| eyre::eyre!("task was never completed"))?;
    if completion.task().started_at() != Some(started) {
        return Err(eyre::eyre!("start time changed after rejection"));
    }
    Ok(())
}

//! When steps for task governance BDD scenarios.

use super::world::{GovernanceWorld, ctx, run_async};
use rstest_bdd_macros::when;

#[when("the task is created")]
fn create_task(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let engine = world.engine()?;
    let creation = run_async(engine.create(world.request(), &ctx()))
        .map_err(|err| eyre::eyre!("creation failed: {err}"))?;
    world.creation = Some(creation);
    Ok(())
}

#[when("the task is started")]
fn start_task(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let engine = world.engine()?;
    let outcome = run_async(engine.start(task_id, &ctx()))
        .map_err(|err| eyre::eyre!("start failed: {err}"))?;
    world.start = Some(outcome);
    Ok(())
}

#[when("the task is completed")]
fn complete_task(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let engine = world.engine()?;
    let outcome = run_async(engine.complete(task_id, &ctx()))
        .map_err(|err| eyre::eyre!("completion failed: {err}"))?;
    world.completion = Some(outcome);
    Ok(())
}

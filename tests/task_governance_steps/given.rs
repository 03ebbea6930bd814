//! Given steps for task governance BDD scenarios.

use std::sync::Arc;

use super::world::{GovernanceWorld, ctx, run_async};
use archwarden::evaluation::{adapters::KeywordEvaluator, domain::Grade};
use archwarden::governance::services::RegisterPlacementRuleRequest;
use archwarden::task::services::StartOutcome;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a task "{title}" for {users:u32} users"#)]
fn a_task_for_users(world: &mut GovernanceWorld, title: String, users: u32) {
    world.pending.title = title;
    world.pending.users = users;
}

#[given(r#"the task proposes "{solution}""#)]
fn the_task_proposes(world: &mut GovernanceWorld, solution: String) {
    world.pending.solution = Some(solution);
}

#[given(r#"the task targets "{repo}""#)]
fn the_task_targets(world: &mut GovernanceWorld, repo: String) {
    world.pending.repo = Some(repo);
}

#[given(r#"the task touches "{path}""#)]
fn the_task_touches(world: &mut GovernanceWorld, path: String) {
    world.pending.files.push(path);
}

#[given(r#"a placement rule sending "{pattern}" to "{repo}""#)]
fn a_placement_rule(
    world: &mut GovernanceWorld,
    pattern: String,
    repo: String,
) -> Result<(), eyre::Report> {
    let governance = world.governance();
    run_async(governance.register_rule(RegisterPlacementRuleRequest::new(pattern, repo)))
        .wrap_err("register placement rule")?;
    Ok(())
}

#[given(r#"the evaluator grades completions "{grade}""#)]
fn evaluator_grades_completions(
    world: &mut GovernanceWorld,
    grade: String,
) -> Result<(), eyre::Report> {
    let parsed = Grade::try_from(grade.as_str()).map_err(|err| eyre::eyre!("{err}"))?;
    world.evaluator = Arc::new(KeywordEvaluator::default().with_completion_grade(parsed));
    Ok(())
}

#[given("the task has been created")]
fn task_has_been_created(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let engine = world.engine()?;
    let creation =
        run_async(engine.create(world.request(), &ctx())).wrap_err("create task for scenario")?;
    world.creation = Some(creation);
    Ok(())
}

#[given("the task has been started")]
fn task_has_been_started(world: &mut GovernanceWorld) -> Result<(), eyre::Report> {
    let task_id = world.created()?.task.id();
    let engine = world.engine()?;
    match run_async(engine.start(task_id, &ctx())).wrap_err("start task for scenario")? {
        StartOutcome::Started(task) => {
            world.started = Some(task);
            Ok(())
        }
        StartOutcome::Blocked { .. } => Err(eyre::eyre!("task unexpectedly blocked at start")),
    }
}

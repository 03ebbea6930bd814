//! Command-line front end for the governance workflow.
//!
//! ```text
//! archwarden [--config <path>] [--verbose] <group> <command> [args]
//! ```
//!
//! Storage is `PostgreSQL` when `database.url` is configured and in-memory
//! otherwise. Task commands need `evaluator.endpoint`.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use archwarden::config::{ArchwardenConfig, EvaluatorConfig};
use archwarden::evaluation::{
    adapters::{HttpEvaluator, HttpEvaluatorConfig},
    ports::Evaluator,
};
use archwarden::governance::{
    adapters::{
        KeywordClassifier, memory::InMemoryGovernanceRepository,
        postgres::PostgresGovernanceRepository,
    },
    ports::{PlacementRuleRepository, ViolationRepository},
    services::{GovernanceService, RegisterPlacementRuleRequest, RuleEngine, ScalePolicy},
};
use archwarden::registry::{
    adapters::{memory::InMemoryRegistryRepository, postgres::PostgresRegistryRepository},
    domain::{
        ArchitectureComponent, ComponentId, ComponentKind, FilePath, MappingKind, RepoName,
        ScopeRules, UnregisteredStatus,
    },
    ports::RegistryRepository,
    services::{
        MapFileRequest, RegisterComponentRequest, RegistryService, ReviewUnregisteredRequest,
    },
};
use archwarden::task::{
    adapters::{memory::InMemoryTaskRepository, postgres::PostgresTaskRepository},
    domain::{Priority, Task, TaskId, TaskStatus},
    ports::{EvaluationReportRepository, TaskFilter, TaskRepository},
    services::{
        CompletionOutcome, CreateTaskRequest, RevalidationOutcome, StartOutcome, WorkContext,
        WorkflowEngine, WorkflowPorts,
    },
};
use clap::{Parser, Subcommand};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use eyre::{WrapErr, eyre};
use mockable::DefaultClock;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const LOG_ENV: &str = "ARCHWARDEN_LOG";

#[derive(Debug, Parser)]
#[command(name = "archwarden", version, about = "Governed task workflow")]
struct Cli {
    /// Configuration file (defaults to `archwarden.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless `ARCHWARDEN_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Who is acting.
    #[arg(long, global = true, default_value = "cli")]
    actor: String,
    /// Repository the caller is working in.
    #[arg(long = "current-repo", global = true)]
    current_repo: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Task lifecycle.
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Architecture components.
    Component {
        #[command(subcommand)]
        command: ComponentCommand,
    },
    /// File-to-component mappings.
    File {
        #[command(subcommand)]
        command: FileCommand,
    },
    /// Files seen without a mapping.
    Unregistered {
        #[command(subcommand)]
        command: UnregisteredCommand,
    },
    /// Component placement rules.
    Rule {
        #[command(subcommand)]
        command: RuleCommand,
    },
    /// Mapping coverage per repository.
    Coverage {
        #[arg(long)]
        repo: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// Creates a task and runs the planning gates.
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 1)]
        users: u32,
        #[arg(long)]
        solution: Option<String>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Target repository; classified from the description when omitted.
        #[arg(long)]
        repo: Option<String>,
        #[arg(long = "file")]
        files: Vec<String>,
    },
    /// Starts work on an approved task.
    Start { id: Uuid },
    /// Completes an in-progress task.
    Complete { id: Uuid },
    /// Cancels a task.
    Cancel { id: Uuid },
    /// Re-runs the planning gates for a blocked task.
    Revalidate { id: Uuid },
    /// Lists tasks.
    List {
        #[arg(long)]
        repo: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
    },
    /// Shows a task with its violations and reports.
    Show { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum ComponentCommand {
    /// Registers a component, merging with an existing one of the same name.
    Register {
        name: String,
        #[arg(long)]
        repo: String,
        #[arg(long, value_parser = parse_kind, default_value = "module")]
        kind: ComponentKind,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "allow")]
        allowed: Vec<String>,
        #[arg(long = "forbid")]
        forbidden: Vec<String>,
    },
    /// Lists components.
    List {
        #[arg(long)]
        repo: Option<String>,
    },
    /// Marks a component deprecated.
    Deprecate { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum FileCommand {
    /// Maps a file to a component.
    Map {
        path: String,
        component: Uuid,
        #[arg(long)]
        reason: String,
        #[arg(long, value_parser = parse_mapping_kind, default_value = "direct")]
        kind: MappingKind,
    },
    /// Checks changed files against the registry.
    Check {
        #[arg(long)]
        repo: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum UnregisteredCommand {
    /// Lists unregistered files (pending ones by default).
    List {
        #[arg(long)]
        repo: Option<String>,
        #[arg(long, value_parser = parse_unregistered_status)]
        status: Option<UnregisteredStatus>,
    },
    /// Records a review decision.
    Review {
        path: String,
        #[arg(value_parser = parse_unregistered_status)]
        status: UnregisteredStatus,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum RuleCommand {
    /// Adds a placement rule.
    Add {
        pattern: String,
        repo: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        rationale: Option<String>,
    },
    /// Lists placement rules.
    List,
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::try_from(raw).map_err(|err| err.to_string())
}

fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    TaskStatus::try_from(raw).map_err(|err| err.to_string())
}

fn parse_kind(raw: &str) -> Result<ComponentKind, String> {
    ComponentKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_mapping_kind(raw: &str) -> Result<MappingKind, String> {
    MappingKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_unregistered_status(raw: &str) -> Result<UnregisteredStatus, String> {
    UnregisteredStatus::try_from(raw).map_err(|err| err.to_string())
}

/// Storage adapters shared by every service.
struct Stores<R, G, T> {
    registry: Arc<R>,
    governance: Arc<G>,
    tasks: Arc<T>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = ArchwardenConfig::load(cli.config.as_deref())?;

    if let Some(url) = config.database.url.as_deref() {
        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(config.database.pool_size)
            .build(manager)
            .wrap_err("failed to connect to PostgreSQL")?;
        let stores = Stores {
            registry: Arc::new(PostgresRegistryRepository::new(pool.clone())),
            governance: Arc::new(PostgresGovernanceRepository::new(pool.clone())),
            tasks: Arc::new(PostgresTaskRepository::new(pool)),
        };
        run(cli, &config, stores).await
    } else {
        warn!("database.url is not set; state will not outlive this process");
        let stores = Stores {
            registry: Arc::new(InMemoryRegistryRepository::new()),
            governance: Arc::new(InMemoryGovernanceRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
        };
        run(cli, &config, stores).await
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run<R, G, T>(
    cli: Cli,
    config: &ArchwardenConfig,
    stores: Stores<R, G, T>,
) -> eyre::Result<()>
where
    R: RegistryRepository + 'static,
    G: PlacementRuleRepository + ViolationRepository + 'static,
    T: TaskRepository + EvaluationReportRepository + 'static,
{
    let clock = Arc::new(DefaultClock);
    let registry = Arc::new(RegistryService::new(
        Arc::clone(&stores.registry),
        Arc::clone(&clock),
    ));
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Task { command } => {
            let ctx = work_context(cli.actor, cli.current_repo)?;
            let rules = RuleEngine::new(
                registry,
                Arc::clone(&stores.governance),
                Arc::new(KeywordClassifier::from_config(&config.classifier)?),
                Arc::clone(&clock),
                ScalePolicy {
                    small_user_limit: config.scale.small_user_limit,
                },
            );
            let ports = WorkflowPorts {
                tasks: Arc::clone(&stores.tasks) as Arc<dyn TaskRepository>,
                reports: Arc::clone(&stores.tasks) as Arc<dyn EvaluationReportRepository>,
                violations: Arc::clone(&stores.governance) as Arc<dyn ViolationRepository>,
                rules: Arc::new(rules),
                evaluator: http_evaluator(&config.evaluator)?,
            };
            let engine = WorkflowEngine::new(ports, config.workflow_settings()?, clock);
            run_task(&engine, command, &ctx, &mut out).await
        }
        Command::Component { command } => run_component(&registry, command, &mut out).await,
        Command::File { command } => run_file(&registry, command, &cli.actor, &mut out).await,
        Command::Unregistered { command } => {
            run_unregistered(&registry, command, &cli.actor, &mut out).await
        }
        Command::Rule { command } => {
            let governance = GovernanceService::new(Arc::clone(&stores.governance), clock);
            run_rule(&governance, command, &mut out).await
        }
        Command::Coverage { repo } => {
            let filter = repo.map(RepoName::new).transpose()?;
            let report = registry.coverage(filter.as_ref()).await?;
            for row in &report.repos {
                writeln!(
                    out,
                    "{}\t{} mapped\t{} unmapped\t{} ignored\t{}%",
                    row.repo,
                    row.mapped,
                    row.unmapped,
                    row.ignored,
                    row.percent()
                )?;
            }
            writeln!(out, "total\t{}%", report.percent())?;
            Ok(())
        }
    }
}

fn work_context(actor: String, current_repo: Option<String>) -> eyre::Result<WorkContext> {
    let ctx = WorkContext::new(actor);
    Ok(match current_repo {
        Some(raw) => ctx.with_current_repo(RepoName::new(raw)?),
        None => ctx,
    })
}

fn http_evaluator(config: &EvaluatorConfig) -> eyre::Result<Arc<dyn Evaluator>> {
    let endpoint = config.endpoint.clone().ok_or_else(|| {
        eyre!("evaluator.endpoint is not set (ARCHWARDEN_EVALUATOR__ENDPOINT)")
    })?;
    let evaluator = HttpEvaluator::new(HttpEvaluatorConfig {
        endpoint,
        api_key: config.api_key.clone(),
        timeout: config.timeout(),
    })?;
    debug!(endpoint = evaluator.endpoint(), "evaluator configured");
    Ok(Arc::new(evaluator))
}

async fn run_task(
    engine: &WorkflowEngine<DefaultClock>,
    command: TaskCommand,
    ctx: &WorkContext,
    out: &mut impl Write,
) -> eyre::Result<()> {
    match command {
        TaskCommand::Create {
            title,
            description,
            users,
            solution,
            priority,
            repo,
            files,
        } => {
            let mut request =
                CreateTaskRequest::new(title, description, users).with_related_files(files);
            if let Some(text) = solution {
                request = request.with_solution(text);
            }
            if let Some(level) = priority {
                request = request.with_priority(level);
            }
            if let Some(name) = repo {
                request = request.with_proposed_repo(name);
            }
            let creation = engine.create(request, ctx).await?;
            write_task(out, &creation.task)?;
            for violation in &creation.violations {
                writeln!(
                    out,
                    "  [{}] {}: {}\n    fix: {}",
                    violation.severity(),
                    violation.kind(),
                    violation.message(),
                    violation.fix_required()
                )?;
            }
            if let Some(report) = &creation.plan_report {
                writeln!(out, "  plan grade: {}", report.grade())?;
            }
        }
        TaskCommand::Start { id } => match engine.start(TaskId::from_uuid(id), ctx).await? {
            StartOutcome::Started(task) => write_task(out, &task)?,
            StartOutcome::Blocked {
                task,
                open_violations,
            } => {
                write_task(out, &task)?;
                writeln!(out, "  blocked by {} open violation(s):", open_violations.len())?;
                for violation in &open_violations {
                    writeln!(out, "  - {}", violation.message())?;
                }
            }
        },
        TaskCommand::Complete { id } => {
            let outcome = engine.complete(TaskId::from_uuid(id), ctx).await?;
            write_task(out, outcome.task())?;
            writeln!(out, "  completion grade: {}", outcome.report().grade())?;
            if let CompletionOutcome::Completed {
                file_violations, ..
            } = &outcome
            {
                for violation in file_violations {
                    writeln!(out, "  warning: {}", violation.message())?;
                }
            }
            for fix in outcome.report().required_fixes() {
                writeln!(out, "  fix: {fix}")?;
            }
        }
        TaskCommand::Cancel { id } => {
            let task = engine.cancel(TaskId::from_uuid(id), ctx).await?;
            write_task(out, &task)?;
        }
        TaskCommand::Revalidate { id } => {
            match engine.revalidate(TaskId::from_uuid(id), ctx).await? {
                RevalidationOutcome::Approved { task, closed } => {
                    write_task(out, &task)?;
                    writeln!(out, "  closed {} violation(s)", closed.len())?;
                }
                RevalidationOutcome::StillBlocked {
                    task, violations, ..
                } => {
                    write_task(out, &task)?;
                    for violation in &violations {
                        writeln!(out, "  - {}", violation.message())?;
                    }
                }
            }
        }
        TaskCommand::List { repo, status } => {
            let filter = TaskFilter {
                repo: repo.map(RepoName::new).transpose()?,
                status,
            };
            for task in engine.list(&filter).await? {
                write_task(out, &task)?;
            }
        }
        TaskCommand::Show { id } => {
            let task_id = TaskId::from_uuid(id);
            let task = engine
                .find(task_id)
                .await?
                .ok_or_else(|| eyre!("task {task_id} not found"))?;
            write_task(out, &task)?;
            if let Some(solution) = task.proposed_solution() {
                writeln!(out, "  solution: {solution}")?;
            }
            for file in task.related_files() {
                writeln!(out, "  file: {file}")?;
            }
            for report in engine.reports(task_id).await? {
                writeln!(out, "  {} evaluation: {}", report.kind(), report.grade())?;
            }
            for violation in engine.violations(task_id).await? {
                writeln!(
                    out,
                    "  {} [{}] {}",
                    violation.status(),
                    violation.kind(),
                    violation.message()
                )?;
            }
        }
    }
    Ok(())
}

fn write_task(out: &mut impl Write, task: &Task) -> io::Result<()> {
    let repo = task.assigned_repo().map_or("-", RepoName::as_str);
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        task.id(),
        task.status(),
        repo,
        task.title()
    )
}

async fn run_component<R: RegistryRepository>(
    registry: &RegistryService<R, DefaultClock>,
    command: ComponentCommand,
    out: &mut impl Write,
) -> eyre::Result<()> {
    match command {
        ComponentCommand::Register {
            name,
            repo,
            kind,
            path,
            description,
            allowed,
            forbidden,
        } => {
            let mut request = RegisterComponentRequest::new(name, kind, repo);
            if let Some(expected) = path {
                request = request.with_expected_path(expected);
            }
            if let Some(text) = description {
                request = request.with_description(text);
            }
            if !allowed.is_empty() || !forbidden.is_empty() {
                request = request.with_scope(ScopeRules::new(allowed, forbidden));
            }
            let component = registry.register_component(request).await?;
            write_component(out, &component)?;
        }
        ComponentCommand::List { repo } => {
            let filter = repo.map(RepoName::new).transpose()?;
            for component in registry.list_components(filter.as_ref()).await? {
                write_component(out, &component)?;
            }
        }
        ComponentCommand::Deprecate { id } => {
            let component = registry
                .deprecate_component(ComponentId::from_uuid(id))
                .await?;
            write_component(out, &component)?;
        }
    }
    Ok(())
}

fn write_component(out: &mut impl Write, component: &ArchitectureComponent) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}",
        component.id(),
        component.name(),
        component.kind(),
        component.repo(),
        component.status()
    )
}

async fn run_file<R: RegistryRepository>(
    registry: &RegistryService<R, DefaultClock>,
    command: FileCommand,
    actor: &str,
    out: &mut impl Write,
) -> eyre::Result<()> {
    match command {
        FileCommand::Map {
            path,
            component,
            reason,
            kind,
        } => {
            let mapping = registry
                .map_file(
                    MapFileRequest::new(path, ComponentId::from_uuid(component), reason)
                        .with_kind(kind)
                        .with_mapped_by(actor),
                )
                .await?;
            writeln!(
                out,
                "{} -> {} ({})",
                mapping.file_path(),
                mapping.component_id(),
                mapping.kind()
            )?;
        }
        FileCommand::Check { repo, paths } => {
            let changed = paths
                .into_iter()
                .map(FilePath::new)
                .collect::<Result<Vec<_>, _>>()?;
            let check = registry
                .check_changed_files(&RepoName::new(repo)?, changed)
                .await?;
            for tracked in &check.tracked {
                writeln!(out, "tracked\t{}\t{}", tracked.file_path, tracked.component_id)?;
                for violation in &tracked.scope_violations {
                    writeln!(out, "  scope: {}", violation.message)?;
                }
            }
            for path in &check.untracked {
                writeln!(out, "untracked\t{path}")?;
            }
            if !check.is_clean() {
                return Err(eyre!(
                    "{} of {} file(s) need attention",
                    check.untracked.len(),
                    check.total_files()
                ));
            }
        }
    }
    Ok(())
}

async fn run_unregistered<R: RegistryRepository>(
    registry: &RegistryService<R, DefaultClock>,
    command: UnregisteredCommand,
    actor: &str,
    out: &mut impl Write,
) -> eyre::Result<()> {
    match command {
        UnregisteredCommand::List { repo, status } => {
            let filter = repo.map(RepoName::new).transpose()?;
            for row in registry.list_unregistered(filter, status).await? {
                writeln!(
                    out,
                    "{}\t{}\t{}\tseen {}x",
                    row.file_path(),
                    row.repo(),
                    row.status(),
                    row.detection_count()
                )?;
            }
        }
        UnregisteredCommand::Review {
            path,
            status,
            notes,
        } => {
            let mut request = ReviewUnregisteredRequest::new(path, status, actor);
            if let Some(text) = notes {
                request = request.with_notes(text);
            }
            let row = registry.review_unregistered(request).await?;
            writeln!(out, "{}\t{}", row.file_path(), row.status())?;
        }
    }
    Ok(())
}

async fn run_rule<G>(
    governance: &GovernanceService<G, DefaultClock>,
    command: RuleCommand,
    out: &mut impl Write,
) -> eyre::Result<()>
where
    G: PlacementRuleRepository + ViolationRepository,
{
    match command {
        RuleCommand::Add {
            pattern,
            repo,
            location,
            rationale,
        } => {
            let mut request = RegisterPlacementRuleRequest::new(pattern, repo);
            if let Some(text) = location {
                request = request.with_location(text);
            }
            if let Some(text) = rationale {
                request = request.with_rationale(text);
            }
            let rule = governance.register_rule(request).await?;
            writeln!(out, "{} -> {}", rule.component_pattern(), rule.destination())?;
        }
        RuleCommand::List => {
            for rule in governance.list_rules().await? {
                writeln!(out, "{} -> {}", rule.component_pattern(), rule.destination())?;
            }
        }
    }
    Ok(())
}

//! The workflow engine: the only component that moves a task between
//! states.
//!
//! Each operation loads the task, runs the governance and evaluator gates
//! that apply to it, records what they found and persists the task with a
//! compare-and-swap on the version it loaded. Rule breaches come back as
//! data inside the outcome types; only infrastructure failures and illegal
//! transitions are errors.

use super::WorkflowSettings;
use crate::evaluation::{
    domain::{EvaluationKind, EvaluationRequest, EvaluationVerdict},
    ports::{Evaluator, EvaluatorError},
};
use crate::governance::{
    domain::Violation,
    ports::{GovernanceError, GovernanceRepositoryError, GovernanceRules, ViolationRepository},
};
use crate::registry::domain::{FilePath, RegistryDomainError, RepoName};
use crate::task::{
    domain::{EvaluationReport, Priority, Task, TaskDomainError, TaskDraft, TaskId, TaskStatus},
    ports::{EvaluationReportRepository, TaskFilter, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Who is acting, and from which repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkContext {
    current_repo: Option<RepoName>,
    actor: String,
}

impl WorkContext {
    /// Creates a context for `actor` with no current repository.
    #[must_use]
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            current_repo: None,
            actor: actor.into(),
        }
    }

    /// Sets the repository the actor is working in.
    #[must_use]
    pub fn with_current_repo(mut self, repo: RepoName) -> Self {
        self.current_repo = Some(repo);
        self
    }

    /// Returns the repository the actor is working in.
    #[must_use]
    pub const fn current_repo(&self) -> Option<&RepoName> {
        self.current_repo.as_ref()
    }

    /// Returns the acting user or agent.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    actual_users: u32,
    proposed_solution: Option<String>,
    priority: Priority,
    proposed_repo: Option<String>,
    related_files: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request sized for `actual_users` users.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, actual_users: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            actual_users,
            proposed_solution: None,
            priority: Priority::default(),
            proposed_repo: None,
            related_files: Vec::new(),
        }
    }

    /// Sets the proposed technical solution.
    #[must_use]
    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.proposed_solution = Some(solution.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Names the repository the task should live in.
    #[must_use]
    pub fn with_proposed_repo(mut self, repo: impl Into<String>) -> Self {
        self.proposed_repo = Some(repo.into());
        self
    }

    /// Sets the files the task touches.
    #[must_use]
    pub fn with_related_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_files = files.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of [`WorkflowEngine::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCreation {
    /// The stored task, either approved or blocked.
    pub task: Task,
    /// Violations recorded during creation.
    pub violations: Vec<Violation>,
    /// The plan verdict, when the plan was evaluated.
    pub plan_report: Option<EvaluationReport>,
}

impl TaskCreation {
    /// Returns `true` when the task was blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.task.status() == TaskStatus::Blocked
    }
}

/// Result of [`WorkflowEngine::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The task is now in progress.
    Started(Task),
    /// The task is blocked and was left unchanged.
    Blocked {
        /// The unchanged task.
        task: Task,
        /// Violations still open against it.
        open_violations: Vec<Violation>,
    },
}

impl StartOutcome {
    /// Returns the task in its current state.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Started(task) | Self::Blocked { task, .. } => task,
        }
    }
}

/// Result of [`WorkflowEngine::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The evaluator accepted the work.
    Completed {
        /// The completed task.
        task: Task,
        /// The completion verdict.
        report: EvaluationReport,
        /// File violations recorded along the way.
        file_violations: Vec<Violation>,
    },
    /// The evaluator rejected the work and the task is blocked.
    Rejected {
        /// The blocked task.
        task: Task,
        /// The completion verdict.
        report: EvaluationReport,
        /// File violations recorded along the way.
        file_violations: Vec<Violation>,
    },
}

impl CompletionOutcome {
    /// Returns the task in its current state.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Completed { task, .. } | Self::Rejected { task, .. } => task,
        }
    }

    /// Returns the completion verdict.
    #[must_use]
    pub const fn report(&self) -> &EvaluationReport {
        match self {
            Self::Completed { report, .. } | Self::Rejected { report, .. } => report,
        }
    }
}

/// Result of [`WorkflowEngine::revalidate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationOutcome {
    /// Every gate passed; the task is approved again.
    Approved {
        /// The approved task.
        task: Task,
        /// Violations closed by this run.
        closed: Vec<Violation>,
    },
    /// A gate still fails; the task stays blocked.
    StillBlocked {
        /// The blocked task.
        task: Task,
        /// Violations found by this run.
        violations: Vec<Violation>,
        /// The plan verdict, when the plan was re-evaluated.
        plan_report: Option<EvaluationReport>,
    },
}

impl RevalidationOutcome {
    /// Returns the task in its current state.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Approved { task, .. } | Self::StillBlocked { task, .. } => task,
        }
    }
}

/// Errors raised by the workflow engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No task has the identifier.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The proposed repository is not a known one.
    #[error("unknown repository: {0}")]
    UnknownRepository(RepoName),
    /// The evaluator did not answer in time.
    #[error("evaluator did not answer within {0:?}")]
    EvaluatorTimeout(Duration),
    /// The evaluator failed.
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
    /// The task rejected the change.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// A repository name or file path was malformed.
    #[error(transparent)]
    InvalidInput(#[from] RegistryDomainError),
    /// Task or report persistence failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Rules or the registry could not be read.
    #[error(transparent)]
    Governance(#[from] GovernanceError),
    /// Violation persistence failed.
    #[error(transparent)]
    Violations(#[from] GovernanceRepositoryError),
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// The ports the workflow engine drives.
#[derive(Clone)]
pub struct WorkflowPorts {
    /// Task persistence.
    pub tasks: Arc<dyn TaskRepository>,
    /// Verdict persistence.
    pub reports: Arc<dyn EvaluationReportRepository>,
    /// Violation persistence.
    pub violations: Arc<dyn ViolationRepository>,
    /// Placement, scale and file rules.
    pub rules: Arc<dyn GovernanceRules>,
    /// The external judge.
    pub evaluator: Arc<dyn Evaluator>,
}

/// Violations and plan verdict from one pass over the create-time gates.
struct GateRun {
    violations: Vec<Violation>,
    plan_report: Option<EvaluationReport>,
}

impl GateRun {
    fn passed(&self) -> bool {
        self.violations.is_empty()
            && self
                .plan_report
                .as_ref()
                .is_none_or(|report| !report.is_rejection())
    }
}

/// Task state machine driven by governance and evaluator gates.
#[derive(Clone)]
pub struct WorkflowEngine<C>
where
    C: Clock + Send + Sync,
{
    ports: WorkflowPorts,
    settings: WorkflowSettings,
    clock: Arc<C>,
}

impl<C> WorkflowEngine<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a workflow engine.
    #[must_use]
    pub const fn new(ports: WorkflowPorts, settings: WorkflowSettings, clock: Arc<C>) -> Self {
        Self {
            ports,
            settings,
            clock,
        }
    }

    /// Returns the settings the engine runs with.
    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Creates a task and runs it through placement, scale and plan gates.
    ///
    /// The task is stored in `planning` before any gate runs, so an
    /// evaluator failure leaves it there.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UnknownRepository`] for a proposed
    /// repository outside the workspace, [`WorkflowError::InvalidInput`] for
    /// malformed names or paths, evaluator failures, and persistence
    /// failures.
    pub async fn create(
        &self,
        request: CreateTaskRequest,
        ctx: &WorkContext,
    ) -> WorkflowResult<TaskCreation> {
        let CreateTaskRequest {
            title,
            description,
            actual_users,
            proposed_solution,
            priority,
            proposed_repo,
            related_files,
        } = request;
        let repo = self.resolve_repo(proposed_repo.as_deref(), &description, ctx)?;
        let related_files = related_files
            .into_iter()
            .map(FilePath::new)
            .collect::<Result<Vec<_>, _>>()?;
        let mut task = Task::new(
            TaskDraft {
                title,
                description,
                priority,
                assigned_repo: Some(repo.clone()),
                actual_users,
                proposed_solution,
                related_files,
            },
            &*self.clock,
        )?;
        self.ports.tasks.store(&task).await?;
        info!(
            task_id = %task.id(),
            repo = %repo,
            actor = ctx.actor(),
            "task created in planning"
        );

        let expected = task.version();
        let gates = self.run_gates(&mut task, &repo).await?;
        self.ports.violations.store_violations(&gates.violations).await?;
        if gates.passed() {
            task.approve(&*self.clock)?;
            info!(task_id = %task.id(), "task approved");
        } else {
            task.block(&*self.clock)?;
            warn!(
                task_id = %task.id(),
                violations = gates.violations.len(),
                plan_grade = ?task.plan_grade(),
                "task blocked at creation"
            );
        }
        self.ports.tasks.update(&task, expected).await?;
        Ok(TaskCreation {
            task,
            violations: gates.violations,
            plan_report: gates.plan_report,
        })
    }

    /// Starts work on a task.
    ///
    /// A blocked task is returned unchanged together with its open
    /// violations.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`], an invalid transition for
    /// tasks that are not planning, approved or blocked, or persistence
    /// failures.
    pub async fn start(&self, task_id: TaskId, ctx: &WorkContext) -> WorkflowResult<StartOutcome> {
        let mut task = self.load(task_id).await?;
        if task.status() == TaskStatus::Blocked {
            let open_violations = self.open_violations(task_id).await?;
            warn!(
                task_id = %task_id,
                open_violations = open_violations.len(),
                actor = ctx.actor(),
                "refused to start blocked task"
            );
            return Ok(StartOutcome::Blocked {
                task,
                open_violations,
            });
        }

        let expected = task.version();
        task.start(&*self.clock)?;
        self.ports.tasks.update(&task, expected).await?;
        info!(task_id = %task_id, actor = ctx.actor(), "task started");
        Ok(StartOutcome::Started(task))
    }

    /// Completes an in-progress task after the file check and the
    /// completion evaluation.
    ///
    /// File violations never block. Breaches not already open are recorded
    /// together with the report once the status change has been stored. A
    /// rejected verdict blocks the task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`], an invalid transition unless
    /// the task is in progress, evaluator failures (the task stays in
    /// progress), and persistence failures.
    pub async fn complete(
        &self,
        task_id: TaskId,
        ctx: &WorkContext,
    ) -> WorkflowResult<CompletionOutcome> {
        let mut task = self.load(task_id).await?;
        task.ensure_transition(TaskStatus::Completed)?;
        let expected = task.version();

        let file_violations = self.ports.rules.validate_task_files(&task).await?;
        let open = self.open_violations(task_id).await?;
        let fresh: Vec<Violation> = file_violations
            .iter()
            .filter(|found| !open.iter().any(|existing| existing.same_breach(found)))
            .cloned()
            .collect();

        let request = EvaluationRequest::completion(
            task.title(),
            task.description(),
            task.assigned_repo().cloned(),
        );
        let verdict = self.evaluate(&request).await?;
        let report = EvaluationReport::new(
            task_id,
            EvaluationKind::Completion,
            verdict,
            Some(task.actual_users()),
            &*self.clock,
        );
        task.record_completion_grade(report.grade(), &*self.clock);

        if report.is_rejection() {
            task.block(&*self.clock)?;
            self.ports.tasks.update(&task, expected).await?;
            self.record_completion(&report, &fresh).await?;
            warn!(
                task_id = %task_id,
                grade = %report.grade(),
                actor = ctx.actor(),
                "completion rejected"
            );
            return Ok(CompletionOutcome::Rejected {
                task,
                report,
                file_violations,
            });
        }

        task.complete(&*self.clock)?;
        self.ports.tasks.update(&task, expected).await?;
        self.record_completion(&report, &fresh).await?;
        info!(
            task_id = %task_id,
            grade = %report.grade(),
            actor = ctx.actor(),
            "task completed"
        );
        Ok(CompletionOutcome::Completed {
            task,
            report,
            file_violations,
        })
    }

    /// Re-runs the creation gates for a blocked task.
    ///
    /// When every gate passes, open placement and scale violations are
    /// closed and the task is approved. File violations recorded at
    /// completion stay open until the file itself is fixed. Otherwise
    /// breaches not already open are recorded and the task stays blocked.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`], an invalid transition
    /// unless the task is blocked, evaluator failures, and persistence
    /// failures.
    pub async fn revalidate(
        &self,
        task_id: TaskId,
        ctx: &WorkContext,
    ) -> WorkflowResult<RevalidationOutcome> {
        let mut task = self.load(task_id).await?;
        if task.status() != TaskStatus::Blocked {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id,
                from: task.status(),
                to: TaskStatus::Approved,
            }
            .into());
        }
        let expected = task.version();
        let repo = task
            .assigned_repo()
            .cloned()
            .unwrap_or_else(|| self.settings.default_repo().clone());
        let gates = self.run_gates(&mut task, &repo).await?;
        let open = self.open_violations(task_id).await?;

        if gates.passed() {
            let mut closed = Vec::new();
            for mut violation in open
                .into_iter()
                .filter(|found| found.kind().is_planning_breach())
            {
                violation.close(&*self.clock);
                self.ports.violations.update_violation(&violation).await?;
                closed.push(violation);
            }
            task.approve(&*self.clock)?;
            self.ports.tasks.update(&task, expected).await?;
            info!(
                task_id = %task_id,
                closed = closed.len(),
                actor = ctx.actor(),
                "blocked task re-approved"
            );
            return Ok(RevalidationOutcome::Approved { task, closed });
        }

        let fresh: Vec<Violation> = gates
            .violations
            .iter()
            .filter(|found| !open.iter().any(|existing| existing.same_breach(found)))
            .cloned()
            .collect();
        self.ports.violations.store_violations(&fresh).await?;
        if task.version() != expected {
            self.ports.tasks.update(&task, expected).await?;
        }
        warn!(
            task_id = %task_id,
            violations = gates.violations.len(),
            new_violations = fresh.len(),
            "task still blocked"
        );
        Ok(RevalidationOutcome::StillBlocked {
            task,
            violations: gates.violations,
            plan_report: gates.plan_report,
        })
    }

    /// Cancels a task that is not yet completed or cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`], an invalid transition for
    /// terminal tasks, or persistence failures.
    pub async fn cancel(&self, task_id: TaskId, ctx: &WorkContext) -> WorkflowResult<Task> {
        let mut task = self.load(task_id).await?;
        let expected = task.version();
        task.cancel(&*self.clock)?;
        self.ports.tasks.update(&task, expected).await?;
        info!(task_id = %task_id, actor = ctx.actor(), "task cancelled");
        Ok(task)
    }

    /// Attaches files to a task that is not yet completed or cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`],
    /// [`WorkflowError::InvalidInput`] for malformed paths,
    /// [`TaskDomainError::TerminalTask`] for terminal tasks, or persistence
    /// failures.
    pub async fn attach_files<I, S>(
        &self,
        task_id: TaskId,
        files: I,
        ctx: &WorkContext,
    ) -> WorkflowResult<Task>
    where
        I: IntoIterator<Item = S> + Send,
        S: Into<String>,
    {
        let paths = files
            .into_iter()
            .map(FilePath::new)
            .collect::<Result<Vec<_>, _>>()?;
        let mut task = self.load(task_id).await?;
        let expected = task.version();
        let added = task.attach_files(paths, &*self.clock)?;
        if added > 0 {
            self.ports.tasks.update(&task, expected).await?;
        }
        debug!(task_id = %task_id, added, actor = ctx.actor(), "files attached");
        Ok(task)
    }

    /// Finds a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the lookup fails.
    pub async fn find(&self, task_id: TaskId) -> WorkflowResult<Option<Task>> {
        Ok(self.ports.tasks.find_by_id(task_id).await?)
    }

    /// Lists tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the query fails.
    pub async fn list(&self, filter: &TaskFilter) -> WorkflowResult<Vec<Task>> {
        Ok(self.ports.tasks.list(filter).await?)
    }

    /// Lists every violation recorded against a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Violations`] when the query fails.
    pub async fn violations(&self, task_id: TaskId) -> WorkflowResult<Vec<Violation>> {
        Ok(self.ports.violations.list_for_task(task_id).await?)
    }

    /// Lists the evaluator verdicts recorded for a task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Repository`] when the query fails.
    pub async fn reports(&self, task_id: TaskId) -> WorkflowResult<Vec<EvaluationReport>> {
        Ok(self.ports.reports.list_reports(task_id).await?)
    }

    fn resolve_repo(
        &self,
        proposed: Option<&str>,
        description: &str,
        ctx: &WorkContext,
    ) -> WorkflowResult<RepoName> {
        if let Some(raw) = proposed {
            let repo = RepoName::new(raw)?;
            if !self.settings.is_known(&repo) {
                return Err(WorkflowError::UnknownRepository(repo));
            }
            return Ok(repo);
        }
        if let Some(repo) = self.ports.rules.determine_repo(description) {
            debug!(repo = %repo, "repository chosen by classifier");
            return Ok(repo);
        }
        let current = ctx
            .current_repo()
            .filter(|repo| self.settings.is_known(repo));
        Ok(current
            .unwrap_or_else(|| self.settings.default_repo())
            .clone())
    }

    async fn run_gates(&self, task: &mut Task, repo: &RepoName) -> WorkflowResult<GateRun> {
        let placement = self.ports.rules.validate_placement(task, repo).await?;
        if !placement.is_empty() {
            return Ok(GateRun {
                violations: placement,
                plan_report: None,
            });
        }

        let Some(solution) = task.proposed_solution().map(str::to_owned) else {
            return Ok(GateRun {
                violations: Vec::new(),
                plan_report: None,
            });
        };
        let scale = self
            .ports
            .rules
            .validate_scale(task, &solution, task.actual_users())
            .await?;
        if !scale.is_empty() {
            return Ok(GateRun {
                violations: scale,
                plan_report: None,
            });
        }

        let request = EvaluationRequest::plan(
            task.title(),
            task.description(),
            task.actual_users(),
            solution,
        )
        .with_repo(Some(repo.clone()));
        let verdict = self.evaluate(&request).await?;
        let report = EvaluationReport::new(
            task.id(),
            EvaluationKind::Plan,
            verdict,
            Some(task.actual_users()),
            &*self.clock,
        );
        self.ports.reports.store_report(&report).await?;
        task.record_plan_grade(report.grade(), &*self.clock);
        Ok(GateRun {
            violations: Vec::new(),
            plan_report: Some(report),
        })
    }

    async fn evaluate(&self, request: &EvaluationRequest) -> WorkflowResult<EvaluationVerdict> {
        let budget = self.settings.evaluator_timeout();
        let Ok(result) = tokio::time::timeout(budget, self.ports.evaluator.evaluate(request)).await
        else {
            warn!(kind = %request.kind(), ?budget, "evaluator timed out");
            return Err(WorkflowError::EvaluatorTimeout(budget));
        };
        result.map_err(|err| {
            warn!(kind = %request.kind(), error = %err, "evaluator failed");
            WorkflowError::Evaluator(err)
        })
    }

    async fn load(&self, task_id: TaskId) -> WorkflowResult<Task> {
        self.ports
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))
    }

    /// Persists what a completion found once its transition has landed.
    async fn record_completion(
        &self,
        report: &EvaluationReport,
        fresh: &[Violation],
    ) -> WorkflowResult<()> {
        self.ports.reports.store_report(report).await?;
        if !fresh.is_empty() {
            self.ports.violations.store_violations(fresh).await?;
            warn!(
                task_id = %report.task_id(),
                violations = fresh.len(),
                "file violations recorded at completion"
            );
        }
        Ok(())
    }

    async fn open_violations(&self, task_id: TaskId) -> WorkflowResult<Vec<Violation>> {
        let mut violations = self.ports.violations.list_for_task(task_id).await?;
        violations.retain(Violation::is_open);
        Ok(violations)
    }
}

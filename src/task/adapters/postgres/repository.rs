//! `PostgreSQL` repository implementation for tasks and evaluation reports.

use super::{
    models::{ReportRow, TaskRow},
    schema::{evaluation_reports, tasks},
};
use crate::evaluation::domain::{EvaluationKind, EvaluationVerdict, Grade};
use crate::registry::domain::{FilePath, RepoName};
use crate::task::{
    domain::{
        EvaluationReport, EvaluationReportId, PersistedReportData, PersistedTaskData, Priority,
        Task, TaskId, TaskStatus,
    },
    ports::{
        EvaluationReportRepository, TaskFilter, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Updates are compare-and-swap on the `version` column.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task, expected_version: u64) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task)?;
        let expected =
            i64::try_from(expected_version).map_err(TaskRepositoryError::invalid_persisted_data)?;

        self.run_blocking(move |connection| {
            let affected = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .filter(tasks::version.eq(expected)),
            )
            .set(&row)
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            if affected > 0 {
                return Ok(());
            }

            let current = tasks::table
                .filter(tasks::id.eq(task_id.into_inner()))
                .select(tasks::version)
                .first::<i64>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            match current {
                None => Err(TaskRepositoryError::NotFound(task_id)),
                Some(actual) => Err(TaskRepositoryError::VersionConflict {
                    task_id,
                    expected: expected_version,
                    actual: u64::try_from(actual)
                        .map_err(TaskRepositoryError::invalid_persisted_data)?,
                }),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let repo = filter.repo.as_ref().map(ToString::to_string);
        let status = filter.status.map(TaskStatus::as_str);

        self.run_blocking(move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed::<Pg>();
            if let Some(repo_name) = repo {
                query = query.filter(tasks::assigned_repo.eq(repo_name));
            }
            if let Some(status_name) = status {
                query = query.filter(tasks::status.eq(status_name));
            }
            let rows = query
                .order(tasks::id.asc())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

#[async_trait]
impl EvaluationReportRepository for PostgresTaskRepository {
    async fn store_report(&self, report: &EvaluationReport) -> TaskRepositoryResult<()> {
        let row = to_report_row(report)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(evaluation_reports::table)
                .values(&row)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_reports(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<EvaluationReport>> {
        self.run_blocking(move |connection| {
            let rows = evaluation_reports::table
                .filter(evaluation_reports::task_id.eq(task_id.into_inner()))
                .order(evaluation_reports::evaluated_at.asc())
                .select(ReportRow::as_select())
                .load::<ReportRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_report).collect()
        })
        .await
    }
}

fn to_task_row(task: &Task) -> TaskRepositoryResult<TaskRow> {
    let related_files = serde_json::to_value(task.related_files())
        .map_err(TaskRepositoryError::persistence)?;
    Ok(TaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        assigned_repo: task.assigned_repo().map(ToString::to_string),
        actual_users: i32::try_from(task.actual_users())
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        proposed_solution: task.proposed_solution().map(str::to_owned),
        related_files,
        plan_grade: task.plan_grade().map(|grade| grade.as_str().to_owned()),
        completion_grade: task
            .completion_grade()
            .map(|grade| grade.as_str().to_owned()),
        started_at: task.started_at(),
        completed_at: task.completed_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        version: i64::try_from(task.version())
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
    })
}

fn parse_grade(value: Option<String>) -> TaskRepositoryResult<Option<Grade>> {
    value
        .map(|raw| Grade::try_from(raw.as_str()))
        .transpose()
        .map_err(TaskRepositoryError::invalid_persisted_data)
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let assigned_repo = row
        .assigned_repo
        .map(RepoName::new)
        .transpose()
        .map_err(TaskRepositoryError::invalid_persisted_data)?;
    let related_files = serde_json::from_value::<Vec<FilePath>>(row.related_files)
        .map_err(TaskRepositoryError::invalid_persisted_data)?;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        status: TaskStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        priority: Priority::try_from(row.priority.as_str())
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        assigned_repo,
        actual_users: u32::try_from(row.actual_users)
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        proposed_solution: row.proposed_solution,
        related_files,
        plan_grade: parse_grade(row.plan_grade)?,
        completion_grade: parse_grade(row.completion_grade)?,
        started_at: row.started_at,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        version: u64::try_from(row.version).map_err(TaskRepositoryError::invalid_persisted_data)?,
    };
    Ok(Task::from_persisted(data))
}

fn to_report_row(report: &EvaluationReport) -> TaskRepositoryResult<ReportRow> {
    let encode = |value: serde_json::Result<serde_json::Value>| {
        value.map_err(TaskRepositoryError::persistence)
    };
    Ok(ReportRow {
        id: report.id().into_inner(),
        task_id: report.task_id().into_inner(),
        kind: report.kind().as_str().to_owned(),
        grade: report.grade().as_str().to_owned(),
        subscores: encode(serde_json::to_value(report.subscores()))?,
        blockers: encode(serde_json::to_value(report.blockers()))?,
        required_fixes: encode(serde_json::to_value(report.required_fixes()))?,
        raw_text: report.raw_text().to_owned(),
        actual_users: report
            .actual_users()
            .map(i32::try_from)
            .transpose()
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        evaluated_at: report.evaluated_at(),
    })
}

fn row_to_report(row: ReportRow) -> TaskRepositoryResult<EvaluationReport> {
    let verdict = EvaluationVerdict {
        grade: Grade::try_from(row.grade.as_str()).map_err(TaskRepositoryError::invalid_persisted_data)?,
        subscores: serde_json::from_value(row.subscores).map_err(TaskRepositoryError::invalid_persisted_data)?,
        blockers: serde_json::from_value(row.blockers).map_err(TaskRepositoryError::invalid_persisted_data)?,
        required_fixes: serde_json::from_value(row.required_fixes).map_err(TaskRepositoryError::invalid_persisted_data)?,
        raw_text: row.raw_text,
    };
    let data = PersistedReportData {
        id: EvaluationReportId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        kind: EvaluationKind::try_from(row.kind.as_str()).map_err(TaskRepositoryError::invalid_persisted_data)?,
        verdict,
        actual_users: row
            .actual_users
            .map(u32::try_from)
            .transpose()
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        evaluated_at: row.evaluated_at,
    };
    Ok(EvaluationReport::from_persisted(data))
}

//! Diesel row models for task persistence.

use super::schema::{evaluation_reports, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Assigned repository.
    pub assigned_repo: Option<String>,
    /// User count.
    pub actual_users: i32,
    /// Proposed solution.
    pub proposed_solution: Option<String>,
    /// Attached file paths as a JSON array.
    pub related_files: Value,
    /// Latest plan grade.
    pub plan_grade: Option<String>,
    /// Latest completion grade.
    pub completion_grade: Option<String>,
    /// First start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency version.
    pub version: i64,
}

/// Query result and insert row for evaluation reports.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = evaluation_reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReportRow {
    /// Report identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Plan or completion.
    pub kind: String,
    /// Overall grade.
    pub grade: String,
    /// Category grades as a JSON object.
    pub subscores: Value,
    /// Blockers as a JSON array.
    pub blockers: Value,
    /// Required fixes as a JSON array.
    pub required_fixes: Value,
    /// Verbatim evaluator text.
    pub raw_text: String,
    /// User count.
    pub actual_users: Option<i32>,
    /// Evaluation time.
    pub evaluated_at: DateTime<Utc>,
}

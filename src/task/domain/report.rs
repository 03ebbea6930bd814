//! Persisted evaluator verdicts.

use super::{EvaluationReportId, TaskId};
use crate::evaluation::domain::{EvaluationKind, EvaluationVerdict, Grade};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An evaluator verdict recorded against a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    id: EvaluationReportId,
    task_id: TaskId,
    kind: EvaluationKind,
    verdict: EvaluationVerdict,
    actual_users: Option<u32>,
    evaluated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReportData {
    /// Persisted report identifier.
    pub id: EvaluationReportId,
    /// Task the report belongs to.
    pub task_id: TaskId,
    /// Evaluation kind.
    pub kind: EvaluationKind,
    /// Decoded verdict.
    pub verdict: EvaluationVerdict,
    /// User count the plan was judged against.
    pub actual_users: Option<u32>,
    /// Evaluation time.
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationReport {
    /// Records a verdict for `task_id`.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        kind: EvaluationKind,
        verdict: EvaluationVerdict,
        actual_users: Option<u32>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: EvaluationReportId::new(),
            task_id,
            kind,
            verdict,
            actual_users,
            evaluated_at: clock.utc(),
        }
    }

    /// Reconstructs a report from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReportData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            kind: data.kind,
            verdict: data.verdict,
            actual_users: data.actual_users,
            evaluated_at: data.evaluated_at,
        }
    }

    /// Returns the report identifier.
    #[must_use]
    pub const fn id(&self) -> EvaluationReportId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the evaluation kind.
    #[must_use]
    pub const fn kind(&self) -> EvaluationKind {
        self.kind
    }

    /// Returns the overall grade.
    #[must_use]
    pub const fn grade(&self) -> Grade {
        self.verdict.grade
    }

    /// Returns the category grades.
    #[must_use]
    pub const fn subscores(&self) -> &BTreeMap<String, Grade> {
        &self.verdict.subscores
    }

    /// Returns the blockers named by the evaluator.
    #[must_use]
    pub fn blockers(&self) -> &[String] {
        &self.verdict.blockers
    }

    /// Returns the fixes the evaluator asked for.
    #[must_use]
    pub fn required_fixes(&self) -> &[String] {
        &self.verdict.required_fixes
    }

    /// Returns the verbatim evaluator text.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.verdict.raw_text
    }

    /// Returns the full verdict.
    #[must_use]
    pub const fn verdict(&self) -> &EvaluationVerdict {
        &self.verdict
    }

    /// Returns the user count the evaluation was made against.
    #[must_use]
    pub const fn actual_users(&self) -> Option<u32> {
        self.actual_users
    }

    /// Returns when the evaluation happened.
    #[must_use]
    pub const fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    /// Returns `true` when the verdict rejects the task.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        self.verdict.rejects(self.kind)
    }
}

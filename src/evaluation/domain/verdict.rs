//! Structured verdict returned by the evaluator.

use super::{EvaluationKind, Grade};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decoded evaluator verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    /// Overall grade.
    pub grade: Grade,
    /// Category grades keyed by category name.
    #[serde(default)]
    pub subscores: BTreeMap<String, Grade>,
    /// Issues that must be resolved before proceeding.
    #[serde(default)]
    pub blockers: Vec<String>,
    /// Concrete fixes the evaluator asks for.
    #[serde(default)]
    pub required_fixes: Vec<String>,
    /// Verbatim evaluator text.
    #[serde(default)]
    pub raw_text: String,
}

impl EvaluationVerdict {
    /// Creates a verdict carrying only an overall grade.
    #[must_use]
    pub const fn graded(grade: Grade) -> Self {
        Self {
            grade,
            subscores: BTreeMap::new(),
            blockers: Vec::new(),
            required_fixes: Vec::new(),
            raw_text: String::new(),
        }
    }

    /// Returns `true` when the verdict rejects an evaluation of `kind`.
    #[must_use]
    pub const fn rejects(&self, kind: EvaluationKind) -> bool {
        self.grade.is_rejection(kind)
    }
}

//! Grades and evaluation kinds.

use super::ParseEvaluationValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stage of a task is being judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    /// The proposed plan, before work starts.
    Plan,
    /// The finished work, before the task is closed.
    Completion,
}

impl EvaluationKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EvaluationKind {
    type Error = ParseEvaluationValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "plan" => Ok(Self::Plan),
            "completion" => Ok(Self::Completion),
            _ => Err(ParseEvaluationValueError::new("evaluation kind", value)),
        }
    }
}

/// Letter grade handed back by the evaluator.
///
/// `OverEngineered` sits outside the letter scale: it says the plan is
/// sized for a load the task does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// Failing.
    #[serde(rename = "F")]
    F,
    /// Poor.
    #[serde(rename = "D")]
    D,
    /// Adequate.
    #[serde(rename = "C")]
    C,
    /// Good.
    #[serde(rename = "B")]
    B,
    /// Excellent.
    #[serde(rename = "A")]
    A,
    /// Solution is heavier than the actual scale warrants.
    #[serde(rename = "OVER_ENGINEERED")]
    OverEngineered,
}

impl Grade {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::F => "F",
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::OverEngineered => "OVER_ENGINEERED",
        }
    }

    /// Returns `true` when this grade rejects an evaluation of `kind`.
    ///
    /// Plans are rejected on F, D and `OVER_ENGINEERED`. Completions are
    /// rejected on F and D only.
    #[must_use]
    pub const fn is_rejection(self, kind: EvaluationKind) -> bool {
        match self {
            Self::F | Self::D => true,
            Self::OverEngineered => matches!(kind, EvaluationKind::Plan),
            Self::C | Self::B | Self::A => false,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Grade {
    type Error = ParseEvaluationValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "F" => Ok(Self::F),
            "D" => Ok(Self::D),
            "C" => Ok(Self::C),
            "B" => Ok(Self::B),
            "A" => Ok(Self::A),
            "OVER_ENGINEERED" | "OVER-ENGINEERED" => Ok(Self::OverEngineered),
            _ => Err(ParseEvaluationValueError::new("grade", value)),
        }
    }
}

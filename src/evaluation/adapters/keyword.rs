//! Deterministic keyword evaluator.
//!
//! This is a test double. It never talks to a real judge and must not be
//! wired into production paths.

use crate::config::{DEFAULT_HEAVY_INFRASTRUCTURE_TERMS, DEFAULT_SMALL_SCALE_USER_LIMIT};
use crate::evaluation::{
    domain::{EvaluationKind, EvaluationRequest, EvaluationVerdict, Grade},
    ports::{Evaluator, EvaluatorError, EvaluatorResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keyword-driven stand-in for the external evaluator.
///
/// Plans mentioning a heavy-infrastructure term for a small user count are
/// graded `OVER_ENGINEERED`; everything else gets `B` unless a grade has
/// been scripted. Every call is counted, including failed ones.
#[derive(Debug)]
pub struct KeywordEvaluator {
    heavy_terms: Vec<String>,
    small_user_limit: u32,
    plan_grade: Option<Grade>,
    completion_grade: Option<Grade>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl Default for KeywordEvaluator {
    fn default() -> Self {
        Self::new(
            DEFAULT_HEAVY_INFRASTRUCTURE_TERMS
                .iter()
                .map(|term| (*term).to_owned())
                .collect(),
            DEFAULT_SMALL_SCALE_USER_LIMIT,
        )
    }
}

impl KeywordEvaluator {
    /// Creates an evaluator with the given vocabulary and user threshold.
    #[must_use]
    pub fn new(heavy_terms: Vec<String>, small_user_limit: u32) -> Self {
        Self {
            heavy_terms: heavy_terms
                .into_iter()
                .map(|term| term.to_lowercase())
                .collect(),
            small_user_limit,
            plan_grade: None,
            completion_grade: None,
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Forces every plan evaluation to return `grade`.
    #[must_use]
    pub const fn with_plan_grade(mut self, grade: Grade) -> Self {
        self.plan_grade = Some(grade);
        self
    }

    /// Forces every completion evaluation to return `grade`.
    #[must_use]
    pub const fn with_completion_grade(mut self, grade: Grade) -> Self {
        self.completion_grade = Some(grade);
        self
    }

    /// Makes every call fail as if the backend were down.
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Returns the number of evaluations requested so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn judge_plan(&self, request: &EvaluationRequest) -> EvaluationVerdict {
        if let Some(grade) = self.plan_grade {
            return EvaluationVerdict::graded(grade);
        }
        let users = request.actual_users().unwrap_or_default();
        let solution = request
            .proposed_solution()
            .unwrap_or_default()
            .to_lowercase();
        let heavy = self
            .heavy_terms
            .iter()
            .any(|term| solution.contains(term.as_str()));
        if heavy && users <= self.small_user_limit {
            return EvaluationVerdict {
                grade: Grade::OverEngineered,
                subscores: BTreeMap::from([("scale_appropriateness".to_owned(), Grade::F)]),
                blockers: vec!["Over-engineering detected".to_owned()],
                required_fixes: vec![format!("Use Tier 1 solution for {users} users")],
                raw_text: format!(
                    "OVER_ENGINEERED\n\nThe plan is sized for far more than {users} user(s)."
                ),
            };
        }
        acceptable()
    }
}

fn acceptable() -> EvaluationVerdict {
    let subscores = ["scale_appropriateness", "deployment_maturity", "portability"]
        .into_iter()
        .map(|name| (name.to_owned(), Grade::B))
        .collect();
    EvaluationVerdict {
        grade: Grade::B,
        subscores,
        blockers: Vec::new(),
        required_fixes: Vec::new(),
        raw_text: "B\n\nNo critical blockers.".to_owned(),
    }
}

#[async_trait]
impl Evaluator for KeywordEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(EvaluatorError::unavailable(std::io::Error::other(
                "keyword evaluator is configured as unavailable",
            )));
        }
        let verdict = match request.kind() {
            EvaluationKind::Plan => self.judge_plan(request),
            EvaluationKind::Completion => self
                .completion_grade
                .map_or_else(acceptable, EvaluationVerdict::graded),
        };
        Ok(verdict)
    }
}

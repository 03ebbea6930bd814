//! Evaluator port.

use crate::evaluation::domain::{EvaluationRequest, EvaluationVerdict};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for evaluator calls.
pub type EvaluatorResult<T> = Result<T, EvaluatorError>;

/// External judge for plans and completed work.
///
/// Implementations must never invent a grade: when the backend cannot be
/// reached or answers with something undecodable, the call fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Grades the request.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError::Unavailable`] when the backend cannot be
    /// reached and [`EvaluatorError::InvalidResponse`] when its answer
    /// cannot be decoded.
    async fn evaluate(&self, request: &EvaluationRequest) -> EvaluatorResult<EvaluationVerdict>;
}

/// Errors returned by evaluator adapters.
#[derive(Debug, Clone, Error)]
pub enum EvaluatorError {
    /// The backend could not be reached or refused the request.
    #[error("evaluator unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The backend answered but the verdict could not be decoded.
    #[error("evaluator returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl EvaluatorError {
    /// Wraps a transport error.
    #[must_use]
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

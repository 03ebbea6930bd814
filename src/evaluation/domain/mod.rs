//! Domain model for plan and completion evaluation.

mod error;
mod grade;
mod request;
mod verdict;

pub use error::ParseEvaluationValueError;
pub use grade::{EvaluationKind, Grade};
pub use request::EvaluationRequest;
pub use verdict::EvaluationVerdict;

//! Port contracts for the evaluator gateway.

mod evaluator;

#[cfg(test)]
pub use evaluator::MockEvaluator;
pub use evaluator::{Evaluator, EvaluatorError, EvaluatorResult};

//! Evaluator adapters.

mod http;
mod keyword;
mod prompt;

pub use http::{HttpEvaluator, HttpEvaluatorConfig};
pub use keyword::KeywordEvaluator;
pub use prompt::{PromptError, PromptRenderer};

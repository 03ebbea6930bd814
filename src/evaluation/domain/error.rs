//! Parse errors for evaluation enumerations.

use thiserror::Error;

/// Error returned while parsing a grade or evaluation kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {type_name}: {value}")]
pub struct ParseEvaluationValueError {
    /// Name of the enumeration being parsed.
    pub type_name: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseEvaluationValueError {
    pub(crate) fn new(type_name: &'static str, value: &str) -> Self {
        Self {
            type_name,
            value: value.to_owned(),
        }
    }
}

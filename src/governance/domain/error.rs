//! Error types for governance domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing governance values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GovernanceDomainError {
    /// The component pattern is empty after trimming.
    #[error("component pattern must not be empty")]
    EmptyComponentPattern,

    /// The component pattern exceeds the 200-character storage limit.
    #[error("component pattern exceeds 200 character limit: {0}")]
    ComponentPatternTooLong(String),
}

/// Error returned while parsing governance enumerations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {type_name}: {value}")]
pub struct ParseGovernanceValueError {
    /// Name of the enumeration being parsed.
    pub type_name: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseGovernanceValueError {
    pub(crate) fn new(type_name: &'static str, value: &str) -> Self {
        Self {
            type_name,
            value: value.to_owned(),
        }
    }
}

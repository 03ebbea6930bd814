//! Error types for registry domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The file path is empty after trimming.
    #[error("file path must not be empty")]
    EmptyFilePath,

    /// The file path exceeds the 500-character storage limit.
    #[error("file path exceeds 500 character limit: {0}")]
    FilePathTooLong(String),

    /// The repository name is empty after trimming.
    #[error("repository name must not be empty")]
    EmptyRepoName,

    /// The repository name contains characters outside `[a-z0-9._-]`.
    #[error(
        "repository name '{0}' contains invalid characters (only lowercase alphanumeric, '-', '_' and '.' allowed)"
    )]
    InvalidRepoName(String),

    /// The repository name exceeds the 100-character storage limit.
    #[error("repository name exceeds 100 character limit: {0}")]
    RepoNameTooLong(String),

    /// The component name is empty after trimming.
    #[error("component name must not be empty")]
    EmptyComponentName,

    /// The component name exceeds the 200-character storage limit.
    #[error("component name exceeds 200 character limit: {0}")]
    ComponentNameTooLong(String),

    /// The mapping reason is empty after trimming.
    #[error("mapping reason must not be empty")]
    EmptyMappingReason,

    /// The requested review status cannot be set by a reviewer.
    #[error("unregistered files can only be reviewed into under_review or ignored, not {0}")]
    InvalidReviewStatus(String),
}

/// Error returned while parsing registry enumerations from persistence or
/// user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {type_name}: {value}")]
pub struct ParseRegistryValueError {
    /// Name of the enumeration being parsed.
    pub type_name: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseRegistryValueError {
    pub(crate) fn new(type_name: &'static str, value: &str) -> Self {
        Self {
            type_name,
            value: value.to_owned(),
        }
    }
}

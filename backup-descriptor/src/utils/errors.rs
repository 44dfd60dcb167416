//! Error types for descriptor construction, persistence and parsing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Empty descriptor document")]
    EmptyInput,

    #[error("Malformed descriptor document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for field {field}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unsupported descriptor version: {0}")]
    UnsupportedVersion(i64),

    #[error("Inconsistent descriptor: {0}")]
    Inconsistent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Descriptor is not set")]
    NotSet,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DescriptorError {
    /// True for errors caused by the stored document rather than by the
    /// caller or the storage medium.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DescriptorError::EmptyInput
                | DescriptorError::Malformed(_)
                | DescriptorError::MissingField(_)
                | DescriptorError::InvalidField { .. }
                | DescriptorError::UnsupportedVersion(_)
                | DescriptorError::Inconsistent(_)
        )
    }

    /// Name of the offending wire field, when the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DescriptorError::MissingField(field) => Some(field),
            DescriptorError::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DescriptorError>;

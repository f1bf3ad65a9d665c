use serde_json::Value;
use thiserror::Error;

/// Everything a field can report. None of these escape a field operation as a
/// hard failure; they are surfaced inline next to the control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// User-correctable input: bad format, oversize, wrong type.
    #[error("{message}")]
    Validation { pointer: String, message: String },

    /// Malformed JSON or date text.
    #[error("{message}")]
    Parse { pointer: String, message: String },

    /// Clipboard or other host collaborator failed.
    #[error("{message}")]
    Resource { pointer: String, message: String },
}

impl FieldError {
    pub fn validation(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError::Validation {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    pub fn parse(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError::Parse {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    pub fn resource(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError::Resource {
            pointer: pointer.into(),
            message: message.into(),
        }
    }

    pub fn pointer(&self) -> &str {
        match self {
            FieldError::Validation { pointer, .. }
            | FieldError::Parse { pointer, .. }
            | FieldError::Resource { pointer, .. } => pointer,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FieldError::Validation { message, .. }
            | FieldError::Parse { message, .. }
            | FieldError::Resource { message, .. } => message,
        }
    }
}

/// Outcome of validating one value. Recomputed on every change, never stored upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<FieldError>,
    pub normalized: Value,
}

impl ValidationResult {
    pub fn valid(normalized: Value) -> Self {
        Self {
            is_valid: true,
            error: None,
            normalized,
        }
    }

    pub fn invalid(error: FieldError, normalized: Value) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
            normalized,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(FieldError::message)
    }
}

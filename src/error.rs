//! Error types for the C to eFlow translator

use thiserror::Error;

/// Result type for translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Translation errors.
///
/// `InputNotFound`, `MalformedDocument` and `MalformedIr` are fatal and
/// abort the run. `UnresolvedReference` and `RegisterCapacityExceeded` are
/// recoverable: the offending function or binding is skipped and the error
/// is collected as a diagnostic while the pipeline continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    #[error("Malformed program document: {message}")]
    MalformedDocument { message: String },

    #[error("Malformed low-level IR: {message}")]
    MalformedIr { message: String },

    #[error("Unresolved reference in {function}: {message}")]
    UnresolvedReference { function: String, message: String },

    #[error("Register capacity exceeded in {function} (core {core}): dropped excess bindings")]
    RegisterCapacityExceeded { function: String, core: usize },
}

impl TranslateError {
    pub fn input_not_found(path: impl Into<String>) -> Self {
        TranslateError::InputNotFound { path: path.into() }
    }

    pub fn malformed_document(msg: impl Into<String>) -> Self {
        TranslateError::MalformedDocument { message: msg.into() }
    }

    pub fn malformed_ir(msg: impl Into<String>) -> Self {
        TranslateError::MalformedIr { message: msg.into() }
    }

    pub fn unresolved(function: impl Into<String>, msg: impl Into<String>) -> Self {
        TranslateError::UnresolvedReference {
            function: function.into(),
            message: msg.into(),
        }
    }

    pub fn capacity(function: impl Into<String>, core: usize) -> Self {
        TranslateError::RegisterCapacityExceeded {
            function: function.into(),
            core,
        }
    }

    /// Whether the pipeline may continue after collecting this error as a
    /// diagnostic.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TranslateError::UnresolvedReference { .. }
                | TranslateError::RegisterCapacityExceeded { .. }
        )
    }
}

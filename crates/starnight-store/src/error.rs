//! Error types for store operations.

use thiserror::Error;

use crate::scope::ScopeName;

/// Primary error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Incoming data did not match the declared scope layout.
    #[error("store shape mismatch: {reason}")]
    ShapeMismatch {
        /// Human-readable description of the mismatch.
        reason: String,
    },
    /// Scope name was not one of the declared scopes.
    #[error("unknown scope '{value}'")]
    UnknownScope {
        /// Scope name supplied by the caller.
        value: String,
    },
    /// Reset action name was not recognised.
    #[error("unknown reset action '{value}'")]
    UnknownReset {
        /// Action name supplied by the caller.
        value: String,
    },
    /// Field was not declared in the scope's schema.
    #[error("unknown field '{field}' in scope '{scope}'")]
    UnknownField {
        /// Scope that was searched.
        scope: ScopeName,
        /// Name of the missing field.
        field: String,
    },
    /// The same field was registered twice in one scope.
    #[error("field '{field}' is already declared in scope '{scope}'")]
    DuplicateField {
        /// Scope holding the conflicting field.
        scope: ScopeName,
        /// Name of the conflicting field.
        field: String,
    },
    /// A field value could not be converted to or from the requested type.
    #[error("field '{field}' in scope '{scope}' has an unexpected type")]
    FieldType {
        /// Scope holding the field.
        scope: ScopeName,
        /// Field being converted.
        field: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A whole scope could not be read as the requested record type.
    #[error("scope '{scope}' does not match the requested record")]
    Record {
        /// Scope being read.
        scope: ScopeName,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A field value failed validation.
    #[error("invalid value for '{field}' in scope '{scope}': {reason}")]
    InvalidField {
        /// Scope holding the field.
        scope: ScopeName,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types for kind registration and entry dispatch

use thiserror::Error;

/// Boxed error returned by versioned entry implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry and dispatch errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Kind not found: {kind}")]
    KindNotFound { kind: String },

    #[error("Invalid version constraint '{constraint}': {reason}")]
    VersionConstraintInvalid { constraint: String, reason: String },

    #[error("{kind} implementation for version '{version}' not found")]
    VersionNotSupported { kind: String, version: String },

    #[error("Payload type mismatch: handler for '{expected}' cannot unmarshal '{actual}' entries")]
    PayloadTypeMismatch { expected: String, actual: String },

    #[error("Failure generating {kind} object for version '{version}'")]
    FactoryFailure { kind: String, version: String },

    #[error("Failed to decode {kind} entry at version '{version}': {source}")]
    DecodeFailure {
        kind: String,
        version: String,
        #[source]
        source: BoxError,
    },
}

impl RegistryError {
    /// Kind the error refers to, when it carries one
    pub fn kind(&self) -> Option<&str> {
        match self {
            RegistryError::KindNotFound { kind }
            | RegistryError::VersionNotSupported { kind, .. }
            | RegistryError::FactoryFailure { kind, .. }
            | RegistryError::DecodeFailure { kind, .. } => Some(kind),
            RegistryError::PayloadTypeMismatch { actual, .. } => Some(actual),
            RegistryError::VersionConstraintInvalid { .. } => None,
        }
    }

    /// Requested version the error refers to, when it carries one
    pub fn version(&self) -> Option<&str> {
        match self {
            RegistryError::VersionNotSupported { version, .. }
            | RegistryError::FactoryFailure { version, .. }
            | RegistryError::DecodeFailure { version, .. } => Some(version),
            _ => None,
        }
    }
}

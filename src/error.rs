//! Errors that abort a conversion.

use thiserror::Error;

/// Root-level failures. Anything below the root degrades to diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// The document is not a map (empty file, a bare list, ...).
    #[error("resource must be a map, found {0}")]
    NotAnObject(&'static str),

    #[error("unsupported apiVersion {found:?}, expected {expected:?}")]
    ApiVersionMismatch { expected: String, found: String },

    #[error("unsupported kind {found:?}, expected {expected:?}")]
    KindMismatch { expected: String, found: String },

    #[error("metadata.name is required")]
    MissingName,
}

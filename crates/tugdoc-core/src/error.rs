//! Error types for the reflection store and wire round-trip.
//!
//! Only malformed or unsupported *input* produces an error. Violated
//! programming invariants (registering an id twice, deferring from inside a
//! deferred callback, leaving the active-reflection stack unbalanced) panic
//! with a descriptive message. Stale cross references inside otherwise valid
//! input degrade to broken links and are reported as
//! [`DeserializeWarning`](crate::serialization::DeserializeWarning)s.

use thiserror::Error;

/// Errors produced while loading or emitting wire documents.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// The document's schema version is not one we can load.
    #[error("unsupported schema version {found:?} (supported: {})", .supported.join(", "))]
    SchemaVersionMismatch {
        found: String,
        supported: Vec<String>,
    },

    /// The document is not valid JSON or does not match the wire schema.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReflectError {
    /// Create a schema version mismatch error against the supported set.
    pub fn version_mismatch(found: impl Into<String>, supported: &[&str]) -> Self {
        ReflectError::SchemaVersionMismatch {
            found: found.into(),
            supported: supported.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result type for store and serialization operations.
pub type Result<T> = std::result::Result<T, ReflectError>;

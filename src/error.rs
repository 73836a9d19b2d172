//! Error types and error code constants for the tugdoc CLI.
//!
//! `TugdocError` is the single error type rendered as JSON output. Errors
//! from the core library and from I/O are bridged into it with `From` impls.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Input errors (file not found, unreadable or unsupported document)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;
use std::io;

use thiserror::Error;

use tugdoc_core::ReflectError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output. These double as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// A named input could not be found or loaded.
    InputError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum TugdocError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The document uses a schema version this build cannot read.
    #[error("unsupported schema version {found} (supported: {})", .supported.join(", "))]
    UnsupportedVersion {
        found: String,
        supported: Vec<String>,
    },

    /// The document is not valid JSON or does not match the wire schema.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// I/O failure reading inputs or writing output.
    #[error("io error: {message}")]
    Io { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl TugdocError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TugdocError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        TugdocError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TugdocError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&TugdocError> for OutputErrorCode {
    fn from(err: &TugdocError) -> Self {
        match err {
            TugdocError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TugdocError::FileNotFound { .. } => OutputErrorCode::InputError,
            TugdocError::UnsupportedVersion { .. } => OutputErrorCode::InputError,
            TugdocError::InvalidDocument { .. } => OutputErrorCode::InputError,
            TugdocError::Io { .. } => OutputErrorCode::InputError,
            TugdocError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TugdocError> for OutputErrorCode {
    fn from(err: TugdocError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<ReflectError> for TugdocError {
    fn from(err: ReflectError) -> Self {
        match err {
            ReflectError::SchemaVersionMismatch { found, supported } => {
                TugdocError::UnsupportedVersion { found, supported }
            }
            ReflectError::Json(e) => TugdocError::InvalidDocument {
                message: e.to_string(),
            },
        }
    }
}

impl From<io::Error> for TugdocError {
    fn from(err: io::Error) -> Self {
        TugdocError::Io {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod code_tests {
        use super::*;

        #[test]
        fn codes_match_exit_values() {
            assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
            assert_eq!(OutputErrorCode::InputError.code(), 3);
            assert_eq!(OutputErrorCode::InternalError.code(), 10);
            assert_eq!(OutputErrorCode::InputError.to_string(), "3");
        }

        #[test]
        fn variants_map_to_codes() {
            assert_eq!(
                TugdocError::invalid_args("x").error_code(),
                OutputErrorCode::InvalidArguments
            );
            assert_eq!(
                TugdocError::file_not_found("a.json").error_code(),
                OutputErrorCode::InputError
            );
            assert_eq!(
                TugdocError::internal("boom").error_code(),
                OutputErrorCode::InternalError
            );
        }
    }

    mod bridge_tests {
        use super::*;

        #[test]
        fn version_mismatch_names_supported_versions() {
            let err: TugdocError = ReflectError::version_mismatch("1.0", &["2.0"]).into();
            assert_eq!(err.error_code(), OutputErrorCode::InputError);
            assert_eq!(
                err.to_string(),
                "unsupported schema version 1.0 (supported: 2.0)"
            );
        }

        #[test]
        fn json_errors_become_invalid_documents() {
            let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            let err: TugdocError = ReflectError::from(json_err).into();
            assert!(matches!(err, TugdocError::InvalidDocument { .. }));
        }

        #[test]
        fn io_errors_are_input_errors() {
            let err: TugdocError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
            assert_eq!(err.error_code(), OutputErrorCode::InputError);
        }
    }
}

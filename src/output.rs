//! JSON response types for CLI output.
//!
//! Every response serializes with `status` as its first key. Output is
//! deterministic: the same inputs produce identical bytes.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use tugdoc_core::serialization::DeserializeWarning;

use crate::error::{OutputErrorCode, TugdocError};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Inspect
// ============================================================================

/// Summary of one loaded document.
#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    /// Input file as given.
    pub file: String,
    /// Root reflection name.
    pub project: String,
    /// `schemaVersion` of the document.
    pub document_version: String,
    pub reflections: usize,
    pub files: usize,
    /// Reflection count per kind name.
    pub kinds: BTreeMap<String, usize>,
    pub warnings: Vec<DeserializeWarning>,
}

impl InspectResponse {
    pub fn new(file: impl Into<String>, project: impl Into<String>, document_version: impl Into<String>) -> Self {
        InspectResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            project: project.into(),
            document_version: document_version.into(),
            reflections: 0,
            files: 0,
            kinds: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }
}

// ============================================================================
// Check
// ============================================================================

/// Result of a load / save / load / save cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    /// Status: "ok" when both serializations match, "mismatch" otherwise.
    pub status: String,
    pub schema_version: String,
    pub file: String,
    /// SHA-256 of the first re-serialization, hex encoded.
    pub first_digest: String,
    /// SHA-256 of the second re-serialization, hex encoded.
    pub second_digest: String,
    pub stable: bool,
    pub warnings: Vec<DeserializeWarning>,
}

impl CheckResponse {
    pub fn new(
        file: impl Into<String>,
        first_digest: String,
        second_digest: String,
        warnings: Vec<DeserializeWarning>,
    ) -> Self {
        let stable = first_digest == second_digest;
        CheckResponse {
            status: if stable { "ok" } else { "mismatch" }.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            first_digest,
            second_digest,
            stable,
            warnings,
        }
    }
}

// ============================================================================
// Merge
// ============================================================================

/// Result of merging several documents.
#[derive(Debug, Clone, Serialize)]
pub struct MergeResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    /// Name of the merged project.
    pub name: String,
    /// Input documents in the order they were merged.
    pub inputs: Vec<String>,
    /// Number of reflections in the merged project, root included.
    pub reflections: usize,
    /// Where the merged document was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// The merged document, when no output file was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<serde_json::Value>,
    pub warnings: Vec<DeserializeWarning>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error information inside an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code; also the process exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Create from a TugdocError.
    pub fn from_error(err: &TugdocError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a TugdocError.
    pub fn from_error(err: &TugdocError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

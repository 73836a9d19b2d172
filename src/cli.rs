//! Command implementations behind the `tugdoc` binary.
//!
//! Each `run_*` function does its own file I/O and returns the response to
//! emit; `main.rs` handles argument parsing, logging and printing.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, debug_span, info};
use walkdir::WalkDir;

use tugdoc_core::serialization::{Deserializer, JsonProject, ReviveOptions, Serializer};
use tugdoc_core::Project;

use crate::config::ResolvedConfig;
use crate::error::TugdocError;
use crate::output::{CheckResponse, InspectResponse, MergeResponse};

// ============================================================================
// Inspect
// ============================================================================

/// Load one document and summarize it.
pub fn run_inspect(config: &ResolvedConfig, file: &Path) -> Result<InspectResponse, TugdocError> {
    let _span = debug_span!("inspect", file = %file.display()).entered();

    let doc = read_document(file)?;
    let mut de = Deserializer::new(config.project_root.value.clone());
    let project = de.revive_project(doc.root.name.clone(), &doc)?;

    let mut response = InspectResponse::new(
        file.display().to_string(),
        project.name(),
        doc.schema_version.clone(),
    );
    response.reflections = project.len();
    response.files = project.files.len();
    response.kinds = kind_counts(&project);
    response.warnings = de.take_warnings();
    Ok(response)
}

fn kind_counts(project: &Project) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for refl in project.reflections() {
        *counts.entry(refl.kind.singular_name().to_string()).or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// Check
// ============================================================================

/// Load, save, reload and save again; compare the two saved digests.
///
/// The input itself is not compared: its ids are renumbered by the first
/// load.
pub fn run_check(config: &ResolvedConfig, file: &Path) -> Result<CheckResponse, TugdocError> {
    let _span = debug_span!("check", file = %file.display()).entered();
    let root = &config.project_root.value;

    let doc = read_document(file)?;
    let name = doc.root.name.clone();
    let mut de = Deserializer::new(root.clone());
    let serializer = Serializer::new(root.clone());

    let first = de.revive_project(name.clone(), &doc)?;
    let first_text = serializer.to_json_string(&first)?;
    let second = de.revive_json_str(name, &first_text)?;
    let second_text = serializer.to_json_string(&second)?;

    let response = CheckResponse::new(
        file.display().to_string(),
        digest(&first_text),
        digest(&second_text),
        de.take_warnings(),
    );
    debug!(stable = response.stable, "round trip checked");
    Ok(response)
}

/// Hex-encoded SHA-256 of `text`.
pub fn digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

// ============================================================================
// Merge
// ============================================================================

/// Merge every input document into one project named `name`.
///
/// With `out`, the merged document is written there; otherwise it is
/// returned inside the response.
pub fn run_merge(
    config: &ResolvedConfig,
    inputs: &[PathBuf],
    name: &str,
    out: Option<&Path>,
) -> Result<MergeResponse, TugdocError> {
    let files = collect_inputs(inputs)?;
    let _span = debug_span!("merge", inputs = files.len()).entered();

    let docs = files
        .iter()
        .map(|f| read_document(f))
        .collect::<Result<Vec<_>, _>>()?;

    let root = &config.project_root.value;
    let mut de = Deserializer::new(root.clone());
    let options = ReviveOptions {
        always_create_entry_point_module: config.always_wrap.value,
    };
    let project = de.revive_projects(name, &docs, options)?;

    let serialized = Serializer::new(root.clone()).project_to_object(&project);
    let (output, document) = match out {
        Some(path) => {
            let text = serde_json::to_string_pretty(&serialized)
                .map_err(|e| TugdocError::internal(e.to_string()))?;
            fs::write(path, text + "\n")?;
            info!(path = %path.display(), "wrote merged document");
            (Some(path.display().to_string()), None)
        }
        None => {
            let value = serde_json::to_value(&serialized)
                .map_err(|e| TugdocError::internal(e.to_string()))?;
            (None, Some(value))
        }
    };

    Ok(MergeResponse {
        status: "ok".to_string(),
        schema_version: crate::output::SCHEMA_VERSION.to_string(),
        name: name.to_string(),
        inputs: files.iter().map(|f| f.display().to_string()).collect(),
        reflections: project.len(),
        output,
        document,
        warnings: de.take_warnings(),
    })
}

/// Expand `inputs` into document paths.
///
/// Files are taken as given. Directories contribute every `*.json` file
/// below them, sorted by path.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, TugdocError> {
    if inputs.is_empty() {
        return Err(TugdocError::invalid_args("merge needs at least one input"));
    }

    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = entry.map_err(io::Error::from)?;
                let path = entry.path();
                if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "json") {
                    found.push(path.to_path_buf());
                }
            }
            found.sort();
            debug!(dir = %input.display(), documents = found.len(), "scanned input directory");
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(TugdocError::file_not_found(input.display().to_string()));
        }
    }

    if files.is_empty() {
        return Err(TugdocError::invalid_args("no .json documents found in the inputs"));
    }
    Ok(files)
}

// ============================================================================
// Helpers
// ============================================================================

fn read_document(path: &Path) -> Result<JsonProject, TugdocError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TugdocError::file_not_found(path.display().to_string()),
        _ => TugdocError::from(e),
    })?;
    Ok(Deserializer::parse_document(&text)?)
}

// ============================================================================
// Tests
// ============================================================================

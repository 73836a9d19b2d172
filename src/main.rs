//! Binary entry point for the tugdoc CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Summarize a document
//! tugdoc inspect docs.json
//!
//! # Check that a document survives load/save cycles unchanged
//! tugdoc check docs.json
//!
//! # Merge several documents (or directories of them) into one
//! tugdoc merge a.json b.json packages/ --name bundle --out merged.json
//! ```
//!
//! All output is JSON on stdout. Logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tugdoc::cli::{run_check, run_inspect, run_merge};
use tugdoc::config::{CliOverrides, ResolvedConfig};
use tugdoc::error::{OutputErrorCode, TugdocError};
use tugdoc::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Load, check and merge reflection documents.
#[derive(Parser, Debug)]
#[command(name = "tugdoc", version, about = "Load, check and merge reflection documents")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Root that file paths in documents are relative to (default: current directory).
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load one document and print a summary.
    Inspect {
        /// Document to load.
        file: PathBuf,
    },
    /// Load, save, reload and save a document; report whether both saves match.
    Check {
        /// Document to check.
        file: PathBuf,
    },
    /// Merge documents into one project.
    Merge {
        /// Documents, or directories searched for `*.json` documents.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Name of the merged project.
        #[arg(long)]
        name: String,
        /// Wrap even a single input in a module.
        #[arg(long)]
        wrap: bool,
        /// Write the merged document here instead of into the response.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Errors go to stdout as JSON, like every other response.
            let error_code = OutputErrorCode::from(&err);
            let _ = emit_response(&ErrorResponse::from_error(&err), &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` wins over `level`.
fn init_tracing(level: &str) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), TugdocError> {
    let current_dir = std::env::current_dir()
        .map_err(|e| TugdocError::internal(format!("failed to get current directory: {}", e)))?;

    let wrap = match &cli.command {
        Command::Merge { wrap: true, .. } => Some(true),
        _ => None,
    };
    let overrides = CliOverrides {
        project_root: cli.global.project_root.clone(),
        always_wrap: wrap,
        log_level: cli
            .global
            .log_level
            .map(|l| l.to_tracing_level().to_string()),
    };
    let config = ResolvedConfig::resolve(&current_dir, &overrides);
    init_tracing(&config.log_level.value);

    match cli.command {
        Command::Inspect { file } => emit(&run_inspect(&config, &file)?),
        Command::Check { file } => emit(&run_check(&config, &file)?),
        Command::Merge {
            inputs, name, out, ..
        } => emit(&run_merge(&config, &inputs, &name, out.as_deref())?),
    }
}

fn emit<T: Serialize>(response: &T) -> Result<(), TugdocError> {
    emit_response(response, &mut io::stdout())?;
    let _ = io::stdout().flush();
    Ok(())
}

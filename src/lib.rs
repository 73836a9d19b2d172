//! tugdoc: reflection graph store with a versioned JSON round trip.
//!
//! The documentation model and its persistence live in `tugdoc-core`, which
//! is re-exported here. This crate adds the CLI front door: configuration,
//! error-to-exit-code mapping, JSON responses and the command
//! implementations behind the `tugdoc` binary.

// Core infrastructure - re-exported from tugdoc-core
pub use tugdoc_core::comment;
pub use tugdoc_core::files;
pub use tugdoc_core::ids;
pub use tugdoc_core::kind;
pub use tugdoc_core::project;
pub use tugdoc_core::reflection;
pub use tugdoc_core::serialization;
pub use tugdoc_core::types;
pub use tugdoc_core::{Project, ReflectError, ReflectionId, ReflectionKind, SomeType};

// Front door
pub mod cli;
pub mod config;
pub mod error;
pub mod output;

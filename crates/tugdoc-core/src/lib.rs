//! Core infrastructure for tugdoc.
//!
//! This crate holds the documentation model and its persistence:
//! - Reflection kinds, flags, and identifiers
//! - The type model and structured comments
//! - Reflection nodes and their traversal order
//! - The file registry for paths and media
//! - The project store: registration, cascading removal, merge, queries
//! - The versioned serializer/deserializer with multi-project merge
//!
//! There is no I/O here; callers hand in and take out strings and values.

pub mod comment;
pub mod error;
pub mod files;
pub mod ids;
pub mod kind;
pub mod project;
pub mod reflection;
pub mod serialization;
pub mod types;

pub use comment::{Comment, CommentDisplayPart, CommentTag, InlineTagTarget};
pub use error::{ReflectError, Result};
pub use files::{FileRegistry, ResolvedFile};
pub use ids::{FileId, ReflectionId, SymbolId};
pub use kind::{ReflectionFlags, ReflectionKind, ReflectionVariant};
pub use project::{Project, SymbolStatus};
pub use reflection::{Reflection, ReflectionData, ReflectionGroup, SourceReference, TraverseProperty};
pub use types::{LiteralValue, ReferenceTarget, ReferenceType, SomeType};

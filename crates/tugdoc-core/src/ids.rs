//! Identifier types shared across the crate.
//!
//! Reflection and file ids are small integers minted by their owning store.
//! They are never reused within a store and are not stable across a
//! save/load cycle: the deserializer always mints fresh ids.
//!
//! [`SymbolId`] is the identity handed to us by the external semantic-analysis
//! engine. Several reflections may describe the same symbol (declaration
//! merging), so it is a key into a 1:N index rather than a reflection id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a reflection within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ReflectionId(pub u32);

impl ReflectionId {
    /// Create a new reflection ID.
    pub fn new(id: u32) -> Self {
        ReflectionId(id)
    }
}

impl fmt::Display for ReflectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refl_{}", self.0)
    }
}

/// Unique identifier for a path or media file in the file registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// External symbol identity supplied by the semantic-analysis engine.
///
/// Two declarations of the same symbol (for example an interface declared in
/// two places) carry equal `SymbolId`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolId {
    /// Package the symbol was declared in.
    pub package_name: String,
    /// Path of the declaring file, relative to the package root.
    pub package_path: String,
    /// Dotted name of the symbol within its file.
    pub qualified_name: String,
}

impl SymbolId {
    /// Create a new symbol identity.
    pub fn new(
        package_name: impl Into<String>,
        package_path: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        SymbolId {
            package_name: package_name.into(),
            package_path: package_path.into(),
            qualified_name: qualified_name.into(),
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}#{}",
            self.package_name, self.package_path, self.qualified_name
        )
    }
}

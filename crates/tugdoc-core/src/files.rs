//! File registry: deduplicated paths and media referenced from comments.
//!
//! Every distinct absolute path gets one small [`FileId`]. Anchors
//! (`guide.md#install`) are stripped before dedup and handed back to the
//! caller. A path may additionally be associated with a reflection:
//!
//! - [`FileRegistry::register_reflection`] makes the path the reflection's
//!   canonical source (one path per reflection) and resolves the path to it.
//! - [`FileRegistry::register_reflection_path`] only resolves the path to the
//!   reflection. Many paths may resolve to the same reflection this way.
//!
//! Output file names are computed lazily by [`FileRegistry::get_name`] and are
//! unique across the registry: the first use of a base name stays bare, later
//! uses get a `-N` suffix before the extension.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::ids::{FileId, ReflectionId};

/// What a file id resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFile<'a> {
    Reflection(ReflectionId),
    Path(&'a Path),
}

/// Deduplicating path/media table.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    next_id: u32,
    media_to_path: BTreeMap<FileId, PathBuf>,
    path_to_media: HashMap<PathBuf, FileId>,
    media_to_reflection: BTreeMap<FileId, ReflectionId>,
    reflection_to_path: HashMap<ReflectionId, FileId>,
    names: HashMap<FileId, String>,
    name_usage: HashMap<String, u32>,
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRegistry {
    /// Create an empty registry. File ids start at 1.
    pub fn new() -> Self {
        FileRegistry {
            next_id: 1,
            media_to_path: BTreeMap::new(),
            path_to_media: HashMap::new(),
            media_to_reflection: BTreeMap::new(),
            reflection_to_path: HashMap::new(),
            names: HashMap::new(),
            name_usage: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register an absolute path, possibly carrying a `#anchor`.
    ///
    /// Returns the (deduplicated) id and the anchor, if any.
    pub fn register_absolute(&mut self, path: &str) -> (FileId, Option<String>) {
        let (path, anchor) = match path.split_once('#') {
            Some((p, a)) => (p, Some(a.to_string())),
            None => (path, None),
        };
        let path = normalize(Path::new(path));

        if let Some(id) = self.path_to_media.get(&path) {
            return (*id, anchor);
        }

        let id = FileId::new(self.next_id);
        self.next_id += 1;
        self.path_to_media.insert(path.clone(), id);
        self.media_to_path.insert(id, path);
        (id, anchor)
    }

    /// Register `relative` as written in a comment of `source_path`.
    pub fn register(&mut self, source_path: &Path, relative: &str) -> (FileId, Option<String>) {
        let base = source_path.parent().unwrap_or_else(|| Path::new(""));
        let joined = base.join(relative);
        self.register_absolute(&joined.to_string_lossy())
    }

    /// Make `path` the canonical file of `reflection`.
    pub fn register_reflection(&mut self, path: &str, reflection: ReflectionId) -> FileId {
        let (id, _) = self.register_absolute(path);
        self.reflection_to_path.insert(reflection, id);
        self.media_to_reflection.insert(id, reflection);
        id
    }

    /// Resolve `path` to `reflection` without making it canonical.
    pub fn register_reflection_path(&mut self, path: &str, reflection: ReflectionId) -> FileId {
        let (id, _) = self.register_absolute(path);
        self.media_to_reflection.insert(id, reflection);
        id
    }

    /// Resolve an already registered file id to `reflection`.
    pub fn link_reflection(&mut self, id: FileId, reflection: ReflectionId) {
        self.media_to_reflection.insert(id, reflection);
    }

    /// Drop every association with `reflection`. Paths stay registered.
    pub fn remove_reflection(&mut self, reflection: ReflectionId) {
        self.reflection_to_path.remove(&reflection);
        let before = self.media_to_reflection.len();
        self.media_to_reflection.retain(|_, r| *r != reflection);
        if before != self.media_to_reflection.len() {
            debug!(reflection = %reflection, "dropped file associations");
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Resolve a file id to its reflection if it has one, otherwise its path.
    pub fn resolve(&self, id: FileId) -> Option<ResolvedFile<'_>> {
        if let Some(refl) = self.media_to_reflection.get(&id) {
            return Some(ResolvedFile::Reflection(*refl));
        }
        self.media_to_path
            .get(&id)
            .map(|p| ResolvedFile::Path(p.as_path()))
    }

    pub fn get_path(&self, id: FileId) -> Option<&Path> {
        self.media_to_path.get(&id).map(PathBuf::as_path)
    }

    pub fn get_id(&self, path: &Path) -> Option<FileId> {
        self.path_to_media.get(&normalize(path)).copied()
    }

    /// Canonical file of `reflection`.
    pub fn get_reflection_path(&self, reflection: ReflectionId) -> Option<&Path> {
        self.reflection_to_path
            .get(&reflection)
            .and_then(|id| self.get_path(*id))
    }

    /// All registered paths in id order.
    pub fn entries(&self) -> impl Iterator<Item = (FileId, &Path)> {
        self.media_to_path.iter().map(|(id, p)| (*id, p.as_path()))
    }

    /// All path to reflection associations in id order.
    pub fn reflection_entries(&self) -> impl Iterator<Item = (FileId, ReflectionId)> + '_ {
        self.media_to_reflection.iter().map(|(f, r)| (*f, *r))
    }

    pub fn len(&self) -> usize {
        self.media_to_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media_to_path.is_empty()
    }

    /// Unique output name for `id`, computed on first request.
    pub fn get_name(&mut self, id: FileId) -> Option<String> {
        if let Some(name) = self.names.get(&id) {
            return Some(name.clone());
        }

        let file = self
            .media_to_path
            .get(&id)?
            .file_name()?
            .to_string_lossy()
            .into_owned();

        let name = match self.name_usage.get(&file).copied() {
            None => {
                self.name_usage.insert(file.clone(), 1);
                file
            }
            Some(usage) => {
                let (stem, ext) = match file.rfind('.') {
                    Some(dot) if dot > 0 => file.split_at(dot),
                    _ => (file.as_str(), ""),
                };
                let mut counter = usage + 1;
                let mut candidate = format!("{}-{}{}", stem, counter, ext);
                while self.name_usage.contains_key(&candidate) {
                    counter += 1;
                    candidate = format!("{}-{}{}", stem, counter, ext);
                }
                self.name_usage.insert(file.clone(), counter);
                self.name_usage.insert(candidate.clone(), 1);
                candidate
            }
        };

        self.names.insert(id, name.clone());
        Some(name)
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

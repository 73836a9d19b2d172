//! The reflection graph store.
//!
//! [`Project`] owns every reflection of one documentation project and keeps
//! the indexes over them consistent:
//!
//! - `reflections`: id → reflection (the root included)
//! - `reflection_children`: parent id → child ids in registration order
//! - `symbol_to_reflection_ids` / `reflection_id_to_symbol_id`: the 1:N
//!   external symbol index and its inverse
//! - `removed_symbol_ids`: tombstones for symbols whose last reflection was
//!   removed, distinct from symbols that were never seen
//! - `reference_graph`: target id → ids of reference reflections pointing at
//!   it; built on first use and discarded on every registration
//! - `files`: the file registry
//!
//! Registration and removal are the only mutation paths for these indexes.
//! Removal cascades: structural children whose `parent` still points at the
//! removed reflection go with it, and so does every reference reflection
//! that resolves to it.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::comment::CommentDisplayPart;
use crate::files::FileRegistry;
use crate::ids::{ReflectionId, SymbolId};
use crate::kind::{ReflectionKind, ReflectionVariant};
use crate::reflection::{
    DocumentData, Reflection, ReflectionData, ReflectionGroup, ReferenceData, TraverseProperty,
};
use crate::types::{ReferenceTarget, SomeType};

/// State of a symbol in the symbol index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStatus {
    /// At least one reflection describes the symbol.
    Registered,
    /// Every reflection of the symbol was removed.
    Removed,
    /// The symbol was never registered.
    Unseen,
}

/// Reflection graph store for one project.
#[derive(Debug)]
pub struct Project {
    root: ReflectionId,
    next_reflection_id: u32,
    reflections: BTreeMap<ReflectionId, Reflection>,
    reflection_children: HashMap<ReflectionId, Vec<ReflectionId>>,
    symbol_to_reflection_ids: HashMap<SymbolId, Vec<ReflectionId>>,
    reflection_id_to_symbol_id: HashMap<ReflectionId, SymbolId>,
    removed_symbol_ids: HashSet<SymbolId>,
    reference_graph: OnceCell<HashMap<ReflectionId, Vec<ReflectionId>>>,
    /// Paths and media referenced by this project.
    pub files: FileRegistry,
}

impl Project {
    /// Create a project with an empty root reflection named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_files(name, FileRegistry::new())
    }

    /// Create a project that takes ownership of an existing file registry.
    pub fn with_files(name: impl Into<String>, files: FileRegistry) -> Self {
        let root = ReflectionId::new(1);
        let mut reflections = BTreeMap::new();
        reflections.insert(
            root,
            Reflection::new(
                root,
                name,
                ReflectionKind::PROJECT,
                None,
                ReflectionData::empty(ReflectionVariant::Project),
            ),
        );
        Project {
            root,
            next_reflection_id: 2,
            reflections,
            reflection_children: HashMap::new(),
            symbol_to_reflection_ids: HashMap::new(),
            reflection_id_to_symbol_id: HashMap::new(),
            removed_symbol_ids: HashSet::new(),
            reference_graph: OnceCell::new(),
            files,
        }
    }

    /// Id of the project root.
    pub fn root(&self) -> ReflectionId {
        self.root
    }

    pub fn root_reflection(&self) -> &Reflection {
        &self.reflections[&self.root]
    }

    pub fn root_reflection_mut(&mut self) -> &mut Reflection {
        let root = self.root;
        self.get_mut(root)
            .unwrap_or_else(|| unreachable!("project root is never removed"))
    }

    pub fn name(&self) -> &str {
        &self.root_reflection().name
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Mint a fresh reflection id. Ids are never reused.
    pub fn next_reflection_id(&mut self) -> ReflectionId {
        let id = ReflectionId::new(self.next_reflection_id);
        self.next_reflection_id += 1;
        id
    }

    /// Register a reflection with the store.
    ///
    /// Appends the id to its parent's children index, optionally indexes it
    /// by `symbol` (first-seen order is kept), and optionally makes
    /// `file_path` its canonical file. The reflection is *not* placed in any
    /// typed slot of the parent; callers do that (see the `add_*` helpers).
    ///
    /// # Panics
    ///
    /// If the id is already registered, or the parent is not.
    pub fn register_reflection(
        &mut self,
        reflection: Reflection,
        symbol: Option<SymbolId>,
        file_path: Option<&str>,
    ) {
        let id = reflection.id;
        assert!(
            !self.reflections.contains_key(&id),
            "reflection {} registered twice",
            id
        );

        if let Some(parent) = reflection.parent {
            assert!(
                self.reflections.contains_key(&parent),
                "parent {} of {} is not registered",
                parent,
                id
            );
            self.reflection_children
                .entry(parent)
                .or_default()
                .push(id);
        }

        if let Some(symbol) = symbol {
            self.register_symbol_id(id, symbol);
        }

        if let Some(path) = file_path {
            self.files.register_reflection(path, id);
        }

        debug!(id = %id, name = %reflection.name, kind = %reflection.kind, "registered reflection");
        self.reflections.insert(id, reflection);
        self.reference_graph = OnceCell::new();
    }

    /// Associate an already registered reflection with `symbol`.
    pub fn register_symbol_id(&mut self, id: ReflectionId, symbol: SymbolId) {
        let ids = self
            .symbol_to_reflection_ids
            .entry(symbol.clone())
            .or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self.removed_symbol_ids.remove(&symbol);
        self.reflection_id_to_symbol_id.insert(id, symbol);
        self.reference_graph = OnceCell::new();
    }

    // ------------------------------------------------------------------------
    // Convenience constructors
    // ------------------------------------------------------------------------

    fn add_child(
        &mut self,
        parent: ReflectionId,
        name: impl Into<String>,
        kind: ReflectionKind,
        data: ReflectionData,
        property: TraverseProperty,
        symbol: Option<SymbolId>,
    ) -> ReflectionId {
        let id = self.next_reflection_id();
        // Attach first so a bad slot panics before any index is touched.
        let attached = self
            .reflections
            .get_mut(&parent)
            .is_some_and(|p| p.attach(id, property));
        assert!(attached, "{} has no {:?} slot", parent, property);
        self.register_reflection(Reflection::new(id, name, kind, Some(parent), data), symbol, None);
        id
    }

    /// Add a declaration as a child of a project or declaration.
    pub fn add_declaration(
        &mut self,
        parent: ReflectionId,
        name: impl Into<String>,
        kind: ReflectionKind,
        symbol: Option<SymbolId>,
    ) -> ReflectionId {
        self.add_child(
            parent,
            name,
            kind,
            ReflectionData::empty(ReflectionVariant::Declaration),
            TraverseProperty::Children,
            symbol,
        )
    }

    /// Add a signature to a declaration. The slot follows from `kind`.
    pub fn add_signature(
        &mut self,
        parent: ReflectionId,
        name: impl Into<String>,
        kind: ReflectionKind,
    ) -> ReflectionId {
        let property = if kind == ReflectionKind::GET_SIGNATURE {
            TraverseProperty::GetSignature
        } else if kind == ReflectionKind::SET_SIGNATURE {
            TraverseProperty::SetSignature
        } else if kind == ReflectionKind::INDEX_SIGNATURE {
            TraverseProperty::IndexSignature
        } else {
            TraverseProperty::Signatures
        };
        self.add_child(
            parent,
            name,
            kind,
            ReflectionData::empty(ReflectionVariant::Signature),
            property,
            None,
        )
    }

    /// Add a parameter to a signature.
    pub fn add_parameter(
        &mut self,
        signature: ReflectionId,
        name: impl Into<String>,
        ty: Option<SomeType>,
    ) -> ReflectionId {
        let id = self.add_child(
            signature,
            name,
            ReflectionKind::PARAMETER,
            ReflectionData::empty(ReflectionVariant::Param),
            TraverseProperty::Parameters,
            None,
        );
        if ty.is_some() {
            self.set_type(id, ty);
        }
        id
    }

    /// Add a type parameter to a declaration or signature.
    pub fn add_type_parameter(
        &mut self,
        parent: ReflectionId,
        name: impl Into<String>,
    ) -> ReflectionId {
        self.add_child(
            parent,
            name,
            ReflectionKind::TYPE_PARAMETER,
            ReflectionData::empty(ReflectionVariant::TypeParam),
            TraverseProperty::TypeParameter,
            None,
        )
    }

    /// Add a re-export alias pointing at `target`.
    pub fn add_reference(
        &mut self,
        parent: ReflectionId,
        name: impl Into<String>,
        target: ReferenceTarget,
        symbol: Option<SymbolId>,
    ) -> ReflectionId {
        self.add_child(
            parent,
            name,
            ReflectionKind::REFERENCE,
            ReflectionData::Reference(ReferenceData { target }),
            TraverseProperty::Children,
            symbol,
        )
    }

    /// Add a document under a project, declaration, or document.
    pub fn add_document(
        &mut self,
        parent: ReflectionId,
        name: impl Into<String>,
        content: Vec<CommentDisplayPart>,
    ) -> ReflectionId {
        self.add_child(
            parent,
            name,
            ReflectionKind::DOCUMENT,
            ReflectionData::Document(DocumentData {
                content,
                ..DocumentData::default()
            }),
            TraverseProperty::Documents,
            None,
        )
    }

    /// Replace `owner`'s type with a fresh embedded type literal and return
    /// the literal's id. Declarations embedded in the old type are removed.
    pub fn add_type_literal(&mut self, owner: ReflectionId) -> ReflectionId {
        self.set_type(owner, None);
        self.add_child(
            owner,
            "__type",
            ReflectionKind::TYPE_LITERAL,
            ReflectionData::empty(ReflectionVariant::Declaration),
            TraverseProperty::TypeLiteral,
            None,
        )
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Remove every declaration embedded in `ty`.
    pub fn remove_type_reflections(&mut self, ty: &SomeType) {
        for declaration in ty.embedded_declarations() {
            self.remove_reflection(declaration);
        }
    }

    /// Overwrite `owner`'s primary type slot.
    ///
    /// Declarations embedded in the previous type are removed first. Returns
    /// `false` if `owner` is unknown or has no type slot.
    pub fn set_type(&mut self, owner: ReflectionId, ty: Option<SomeType>) -> bool {
        let old = match self.reflections.get_mut(&owner).and_then(|r| r.type_slot_mut()) {
            Some(slot) => slot.take(),
            None => return false,
        };
        if let Some(old) = old {
            self.remove_type_reflections(&old);
        }
        if let Some(slot) = self.reflections.get_mut(&owner).and_then(|r| r.type_slot_mut()) {
            *slot = ty;
        }
        true
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a reflection and everything that depends on it.
    ///
    /// Returns `false` (and does nothing) if `id` is not registered.
    ///
    /// # Panics
    ///
    /// If `id` is the project root.
    pub fn remove_reflection(&mut self, id: ReflectionId) -> bool {
        assert!(id != self.root, "the project root cannot be removed");
        let Some(parent) = self.reflections.get(&id).map(|r| r.parent) else {
            return false;
        };

        if let Some(parent) = parent {
            if let Some(siblings) = self.reflection_children.get_mut(&parent) {
                siblings.retain(|c| *c != id);
            }
            if let Some(owner) = self.reflections.get_mut(&parent) {
                let properties: Vec<TraverseProperty> = owner
                    .slots()
                    .into_iter()
                    .filter(|(child, _)| *child == id)
                    .map(|(_, property)| property)
                    .collect();
                for property in properties {
                    owner.detach(id, property);
                }
            }
        }

        self.remove_cascade(id);
        true
    }

    /// Delete `id` and its dependents. The caller has already detached `id`
    /// from its parent.
    fn remove_cascade(&mut self, id: ReflectionId) {
        if !self.reflections.contains_key(&id) {
            return;
        }
        debug!(id = %id, "removing reflection");

        self.files.remove_reflection(id);

        let referrers = self
            .reference_graph()
            .get(&id)
            .cloned()
            .unwrap_or_default();
        for referrer in referrers {
            if referrer != id {
                self.remove_reflection(referrer);
            }
        }
        if let Some(graph) = self.reference_graph.get_mut() {
            graph.remove(&id);
        }

        let structural: Vec<ReflectionId> = self
            .reflections
            .get(&id)
            .map(|r| r.slots().into_iter().map(|(child, _)| child).collect())
            .unwrap_or_default();
        for child in structural {
            if self.parent_of(child) == Some(id) {
                self.remove_cascade(child);
            }
        }

        // Registered children that never made it into a typed slot.
        if let Some(indexed) = self.reflection_children.remove(&id) {
            for child in indexed {
                if self.parent_of(child) == Some(id) {
                    self.remove_cascade(child);
                }
            }
        }

        if let Some(symbol) = self.reflection_id_to_symbol_id.remove(&id) {
            if let Some(ids) = self.symbol_to_reflection_ids.get_mut(&symbol) {
                ids.retain(|r| *r != id);
                if ids.is_empty() {
                    self.symbol_to_reflection_ids.remove(&symbol);
                    debug!(symbol = %symbol, "symbol tombstoned");
                    self.removed_symbol_ids.insert(symbol);
                }
            }
        }

        self.reflections.remove(&id);
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// Move `source`'s own children and documents to `target`, then remove
    /// `source`.
    ///
    /// Only entries whose `parent` is `source` move; entries borrowed from
    /// elsewhere stay put and are dropped from the graph with `source`'s
    /// slots. `target`'s cached groups are cleared. Returns `false` if either
    /// reflection is unknown or they are the same.
    pub fn merge_reflections(&mut self, source: ReflectionId, target: ReflectionId) -> bool {
        if source == target
            || !self.reflections.contains_key(&source)
            || !self.reflections.contains_key(&target)
        {
            return false;
        }

        let moving: Vec<(ReflectionId, TraverseProperty)> = self.reflections[&source]
            .slots()
            .into_iter()
            .filter(|(child, property)| {
                matches!(
                    property,
                    TraverseProperty::Children | TraverseProperty::Documents
                ) && self.parent_of(*child) == Some(source)
            })
            .collect();

        for (child, property) in moving {
            if let Some(owner) = self.reflections.get_mut(&source) {
                owner.detach(child, property);
            }
            if let Some(siblings) = self.reflection_children.get_mut(&source) {
                siblings.retain(|c| *c != child);
            }

            let attached = self
                .reflections
                .get_mut(&target)
                .is_some_and(|t| t.attach(child, property));
            if !attached {
                // Target cannot hold it; leave it with source so it cascades.
                if let Some(owner) = self.reflections.get_mut(&source) {
                    owner.attach(child, property);
                }
                continue;
            }
            if let Some(moved) = self.reflections.get_mut(&child) {
                moved.parent = Some(target);
            }
            self.reflection_children
                .entry(target)
                .or_default()
                .push(child);
        }

        debug!(source = %source, target = %target, "merged reflections");
        self.remove_reflection(source);

        if let Some(container) = self.reflections.get_mut(&target).and_then(|t| t.container_mut()) {
            container.groups = None;
        }
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: ReflectionId) -> Option<&Reflection> {
        self.reflections.get(&id)
    }

    /// Mutable access to a reflection's fields.
    ///
    /// `parent` and the structural slots are maintained by the store; change
    /// them only through registration, removal, and merge. Reference targets
    /// may change through this handle, so the reference graph is discarded.
    pub fn get_mut(&mut self, id: ReflectionId) -> Option<&mut Reflection> {
        self.reference_graph = OnceCell::new();
        self.reflections.get_mut(&id)
    }

    pub fn contains(&self, id: ReflectionId) -> bool {
        self.reflections.contains_key(&id)
    }

    /// Number of registered reflections, the root included.
    pub fn len(&self) -> usize {
        self.reflections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflections.is_empty()
    }

    /// All reflections in id order.
    pub fn reflections(&self) -> impl Iterator<Item = &Reflection> {
        self.reflections.values()
    }

    pub fn parent_of(&self, id: ReflectionId) -> Option<ReflectionId> {
        self.reflections.get(&id).and_then(|r| r.parent)
    }

    /// Registered children of `id`, in registration order.
    pub fn children_of(&self, id: ReflectionId) -> &[ReflectionId] {
        self.reflection_children
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reflections whose kind intersects `mask`, in id order.
    pub fn get_reflections_by_kind(&self, mask: ReflectionKind) -> Vec<&Reflection> {
        self.reflections
            .values()
            .filter(|r| r.kind.is(mask))
            .collect()
    }

    /// Reflections describing `symbol`, in registration order.
    pub fn get_reflections_from_symbol_id(&self, symbol: &SymbolId) -> Vec<&Reflection> {
        self.symbol_to_reflection_ids
            .get(symbol)
            .into_iter()
            .flatten()
            .filter_map(|id| self.reflections.get(id))
            .collect()
    }

    pub fn get_symbol_id_from_reflection(&self, id: ReflectionId) -> Option<&SymbolId> {
        self.reflection_id_to_symbol_id.get(&id)
    }

    /// Whether `symbol` is live, tombstoned, or unknown.
    pub fn symbol_status(&self, symbol: &SymbolId) -> SymbolStatus {
        if self.symbol_to_reflection_ids.contains_key(symbol) {
            SymbolStatus::Registered
        } else if self.removed_symbol_ids.contains(symbol) {
            SymbolStatus::Removed
        } else {
            SymbolStatus::Unseen
        }
    }

    /// Reflection → symbol pairs in reflection id order.
    pub fn symbol_id_entries(&self) -> Vec<(ReflectionId, &SymbolId)> {
        let mut entries: Vec<_> = self
            .reflection_id_to_symbol_id
            .iter()
            .map(|(id, symbol)| (*id, symbol))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Resolve a reference target to a registered reflection.
    ///
    /// Symbol targets resolve to the first reflection registered for the
    /// symbol.
    pub fn resolve_reference_target(&self, target: &ReferenceTarget) -> Option<ReflectionId> {
        match target {
            ReferenceTarget::Reflection(id) => self.contains(*id).then_some(*id),
            ReferenceTarget::Symbol(symbol) => self
                .symbol_to_reflection_ids
                .get(symbol)
                .and_then(|ids| ids.first().copied()),
            ReferenceTarget::Broken => None,
        }
    }

    /// Target id → ids of reference reflections resolving to it.
    pub fn reference_graph(&self) -> &HashMap<ReflectionId, Vec<ReflectionId>> {
        self.reference_graph.get_or_init(|| {
            let mut graph: HashMap<ReflectionId, Vec<ReflectionId>> = HashMap::new();
            for refl in self.reflections.values() {
                if let Some(reference) = refl.as_reference() {
                    if let Some(target) = self.resolve_reference_target(&reference.target) {
                        graph.entry(target).or_default().push(refl.id);
                    }
                }
            }
            graph
        })
    }

    /// Depth-first, pre-order walk over `start` and its structural
    /// descendants. Slots borrowed from other parents are not followed.
    pub fn walk<F>(&self, start: ReflectionId, mut visit: F)
    where
        F: FnMut(&Reflection),
    {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(refl) = self.reflections.get(&id) else {
                continue;
            };
            visit(refl);
            let slots = refl.slots();
            for (child, _) in slots.into_iter().rev() {
                if self.parent_of(child) == Some(id) {
                    stack.push(child);
                }
            }
        }
    }

    /// Dotted name from the outermost non-root ancestor down to `id`.
    pub fn full_name(&self, id: ReflectionId) -> String {
        let mut parts = Vec::new();
        let mut current = self.reflections.get(&id);
        while let Some(refl) = current {
            if refl.is_project() {
                break;
            }
            parts.push(refl.name.as_str());
            current = refl.parent.and_then(|p| self.reflections.get(&p));
        }
        parts.reverse();
        parts.join(".")
    }

    /// Groups of a container's children, computed and cached on first use.
    pub fn groups(&mut self, id: ReflectionId) -> Option<&[ReflectionGroup]> {
        let needs_compute = self
            .reflections
            .get(&id)?
            .container()?
            .groups
            .is_none();

        if needs_compute {
            let computed = self.compute_groups(id);
            if let Some(container) = self.reflections.get_mut(&id)?.container_mut() {
                container.groups = Some(computed);
            }
        }

        self.reflections
            .get(&id)?
            .container()?
            .groups
            .as_deref()
    }

    fn compute_groups(&self, id: ReflectionId) -> Vec<ReflectionGroup> {
        let Some(container) = self.reflections.get(&id).and_then(|r| r.container()) else {
            return Vec::new();
        };

        let mut by_kind: BTreeMap<(usize, u32), Vec<ReflectionId>> = BTreeMap::new();
        for child in container.children.iter().chain(container.documents.iter()) {
            if let Some(refl) = self.reflections.get(child) {
                by_kind
                    .entry((refl.kind.group_rank(), refl.kind.bits()))
                    .or_default()
                    .push(*child);
            }
        }

        by_kind
            .into_iter()
            .map(|((_, bits), children)| ReflectionGroup {
                title: ReflectionKind::from_bits_retain(bits).plural_name().to_string(),
                children,
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ReflectionFlags;

    fn sym(name: &str) -> SymbolId {
        SymbolId::new("pkg", "src/index.ts", name)
    }

    /// Every indexed child points back at its parent and vice versa.
    fn assert_children_consistent(project: &Project) {
        for refl in project.reflections() {
            if let Some(parent) = refl.parent {
                assert!(
                    project.children_of(parent).contains(&refl.id),
                    "{} missing from children of {}",
                    refl.id,
                    parent
                );
            }
            for child in project.children_of(refl.id) {
                assert_eq!(project.parent_of(*child), Some(refl.id));
            }
        }
    }

    mod registration_tests {
        use super::*;

        #[test]
        fn root_is_registered_with_first_id() {
            let project = Project::new("demo");
            assert_eq!(project.root(), ReflectionId::new(1));
            assert_eq!(project.len(), 1);
            assert!(project.root_reflection().is_project());
            assert_eq!(project.name(), "demo");
        }

        #[test]
        fn ids_are_monotonic_and_never_reused() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "a", ReflectionKind::VARIABLE, None);
            project.remove_reflection(a);
            let b = project.add_declaration(root, "b", ReflectionKind::VARIABLE, None);
            assert!(b.0 > a.0);
        }

        #[test]
        fn registration_appends_to_children_index() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "a", ReflectionKind::MODULE, None);
            let b = project.add_declaration(root, "b", ReflectionKind::MODULE, None);
            assert_eq!(project.children_of(root), &[a, b]);
            assert_eq!(
                project.root_reflection().container().unwrap().children,
                vec![a, b]
            );
            assert_children_consistent(&project);
        }

        #[test]
        #[should_panic(expected = "registered twice")]
        fn duplicate_registration_panics() {
            let mut project = Project::new("demo");
            let root = project.root();
            let id = project.next_reflection_id();
            let make = || {
                Reflection::new(
                    id,
                    "x",
                    ReflectionKind::VARIABLE,
                    Some(root),
                    ReflectionData::empty(ReflectionVariant::Declaration),
                )
            };
            project.register_reflection(make(), None, None);
            project.register_reflection(make(), None, None);
        }

        #[test]
        fn canonical_file_path_registered() {
            let mut project = Project::new("demo");
            let id = project.next_reflection_id();
            let root = project.root();
            project.register_reflection(
                Reflection::new(
                    id,
                    "guide",
                    ReflectionKind::DOCUMENT,
                    Some(root),
                    ReflectionData::empty(ReflectionVariant::Document),
                ),
                None,
                Some("/docs/guide.md"),
            );
            assert_eq!(
                project.files.get_reflection_path(id),
                Some(std::path::Path::new("/docs/guide.md"))
            );
            project.remove_reflection(id);
            assert_eq!(project.files.get_reflection_path(id), None);
        }

        #[test]
        fn signature_slots_follow_kind() {
            let mut project = Project::new("demo");
            let root = project.root();
            let accessor = project.add_declaration(root, "x", ReflectionKind::ACCESSOR, None);
            let get = project.add_signature(accessor, "x", ReflectionKind::GET_SIGNATURE);
            let set = project.add_signature(accessor, "x", ReflectionKind::SET_SIGNATURE);
            let decl = project.get(accessor).unwrap().as_declaration().unwrap();
            assert_eq!(decl.get_signature, Some(get));
            assert_eq!(decl.set_signature, Some(set));
            assert!(decl.signatures.is_empty());
        }
    }

    mod symbol_tests {
        use super::*;

        #[test]
        fn merged_declarations_share_a_symbol() {
            let mut project = Project::new("demo");
            let root = project.root();
            let first = project.add_declaration(root, "Foo", ReflectionKind::INTERFACE, Some(sym("Foo")));
            let second =
                project.add_declaration(root, "Foo", ReflectionKind::INTERFACE, Some(sym("Foo")));

            let ids: Vec<_> = project
                .get_reflections_from_symbol_id(&sym("Foo"))
                .iter()
                .map(|r| r.id)
                .collect();
            assert_eq!(ids, vec![first, second]);

            project.remove_reflection(first);
            let ids: Vec<_> = project
                .get_reflections_from_symbol_id(&sym("Foo"))
                .iter()
                .map(|r| r.id)
                .collect();
            assert_eq!(ids, vec![second]);
            assert_eq!(project.symbol_status(&sym("Foo")), SymbolStatus::Registered);

            project.remove_reflection(second);
            assert!(project.get_reflections_from_symbol_id(&sym("Foo")).is_empty());
            assert_eq!(project.symbol_status(&sym("Foo")), SymbolStatus::Removed);
            assert_eq!(project.symbol_status(&sym("Bar")), SymbolStatus::Unseen);
        }

        #[test]
        fn reregistering_clears_tombstone() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "Foo", ReflectionKind::CLASS, Some(sym("Foo")));
            project.remove_reflection(a);
            project.add_declaration(root, "Foo", ReflectionKind::CLASS, Some(sym("Foo")));
            assert_eq!(project.symbol_status(&sym("Foo")), SymbolStatus::Registered);
        }
    }

    mod removal_tests {
        use super::*;

        #[test]
        fn removal_cascades_to_descendants() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "A", ReflectionKind::NAMESPACE, None);
            let b = project.add_declaration(a, "B", ReflectionKind::CLASS, None);

            assert!(project.remove_reflection(a));
            assert!(!project.contains(a));
            assert!(!project.contains(b));
            assert!(!project.children_of(root).contains(&a));
            assert!(project.root_reflection().container().unwrap().children.is_empty());
            assert_children_consistent(&project);
        }

        #[test]
        fn removing_absent_id_is_noop() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "A", ReflectionKind::CLASS, None);
            assert!(project.remove_reflection(a));
            let before = project.len();
            assert!(!project.remove_reflection(a));
            assert!(!project.remove_reflection(ReflectionId::new(999)));
            assert_eq!(project.len(), before);
        }

        #[test]
        fn referrers_are_removed_with_target() {
            let mut project = Project::new("demo");
            let root = project.root();
            let m = project.add_declaration(root, "m", ReflectionKind::MODULE, None);
            let target = project.add_declaration(m, "Foo", ReflectionKind::CLASS, Some(sym("Foo")));
            let direct = project.add_reference(
                root,
                "Foo",
                ReferenceTarget::Reflection(target),
                None,
            );
            let by_symbol =
                project.add_reference(root, "Alias", ReferenceTarget::Symbol(sym("Foo")), None);
            assert_eq!(
                project.reference_graph().get(&target),
                Some(&vec![direct, by_symbol])
            );

            project.remove_reflection(target);
            assert!(!project.contains(direct));
            assert!(!project.contains(by_symbol));
            assert_eq!(project.children_of(root), &[m]);
            assert_children_consistent(&project);
        }

        #[test]
        fn reference_graph_rebuilt_after_registration() {
            let mut project = Project::new("demo");
            let root = project.root();
            let target = project.add_declaration(root, "Foo", ReflectionKind::CLASS, None);
            assert!(project.reference_graph().is_empty());
            let r = project.add_reference(root, "F", ReferenceTarget::Reflection(target), None);
            assert_eq!(project.reference_graph().get(&target), Some(&vec![r]));
        }

        #[test]
        fn reference_graph_picks_up_late_symbol_declarations() {
            let mut project = Project::new("demo");
            let root = project.root();
            let r = project.add_reference(root, "Alias", ReferenceTarget::Symbol(sym("Late")), None);
            assert!(project.reference_graph().is_empty());

            let late = project.add_declaration(root, "Late", ReflectionKind::CLASS, Some(sym("Late")));
            assert_eq!(project.reference_graph().get(&late), Some(&vec![r]));
        }

        #[test]
        fn bad_slot_leaves_project_untouched() {
            let mut project = Project::new("demo");
            let root = project.root();
            let f = project.add_declaration(root, "f", ReflectionKind::FUNCTION, None);
            let sig = project.add_signature(f, "f", ReflectionKind::CALL_SIGNATURE);
            let param = project.add_parameter(sig, "x", None);
            let before = project.len();

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                project.add_declaration(param, "nested", ReflectionKind::PROPERTY, None)
            }));
            assert!(result.is_err());
            assert_eq!(project.len(), before);
            assert!(project.children_of(param).is_empty());
            assert_children_consistent(&project);
        }

        #[test]
        fn removing_type_literal_leaves_object_placeholder() {
            let mut project = Project::new("demo");
            let root = project.root();
            let var = project.add_declaration(root, "opts", ReflectionKind::VARIABLE, None);
            let literal = project.add_type_literal(var);
            let field = project.add_declaration(literal, "x", ReflectionKind::PROPERTY, None);

            project.remove_reflection(literal);
            assert!(!project.contains(field));
            assert_eq!(
                project.get(var).unwrap().type_slot().unwrap().as_ref(),
                Some(&SomeType::intrinsic("Object"))
            );
        }

        #[test]
        fn set_type_removes_embedded_declarations() {
            let mut project = Project::new("demo");
            let root = project.root();
            let var = project.add_declaration(root, "opts", ReflectionKind::VARIABLE, None);
            let literal = project.add_type_literal(var);
            assert!(project.set_type(var, Some(SomeType::intrinsic("string"))));
            assert!(!project.contains(literal));
            assert!(project.children_of(var).is_empty());
        }

        #[test]
        fn signature_parameters_go_with_signature() {
            let mut project = Project::new("demo");
            let root = project.root();
            let f = project.add_declaration(root, "f", ReflectionKind::FUNCTION, None);
            let sig = project.add_signature(f, "f", ReflectionKind::CALL_SIGNATURE);
            let p = project.add_parameter(sig, "x", Some(SomeType::intrinsic("number")));
            let tp = project.add_type_parameter(sig, "T");

            project.remove_reflection(sig);
            assert!(!project.contains(p));
            assert!(!project.contains(tp));
            assert!(project.get(f).unwrap().as_declaration().unwrap().signatures.is_empty());
            assert_children_consistent(&project);
        }

        #[test]
        #[should_panic(expected = "project root")]
        fn root_cannot_be_removed() {
            let mut project = Project::new("demo");
            let root = project.root();
            project.remove_reflection(root);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn merge_moves_owned_children_and_removes_source() {
            let mut project = Project::new("demo");
            let root = project.root();
            let source = project.add_declaration(root, "ns", ReflectionKind::NAMESPACE, None);
            let target = project.add_declaration(root, "ns", ReflectionKind::NAMESPACE, None);
            let a = project.add_declaration(source, "a", ReflectionKind::FUNCTION, None);
            let doc = project.add_document(source, "guide", Vec::new());
            let existing = project.add_declaration(target, "b", ReflectionKind::FUNCTION, None);

            // Prime the cache so the merge has something to clear.
            assert!(project.groups(target).is_some());

            assert!(project.merge_reflections(source, target));
            assert!(!project.contains(source));
            assert_eq!(project.parent_of(a), Some(target));
            assert_eq!(project.parent_of(doc), Some(target));

            let container = project.get(target).unwrap().container().unwrap();
            assert_eq!(container.children, vec![existing, a]);
            assert_eq!(container.documents, vec![doc]);
            assert!(container.groups.is_none());
            assert_children_consistent(&project);
        }

        #[test]
        fn merge_with_unknown_reflection_is_rejected() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "a", ReflectionKind::MODULE, None);
            assert!(!project.merge_reflections(a, ReflectionId::new(77)));
            assert!(!project.merge_reflections(a, a));
            assert!(project.contains(a));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn groups_follow_kind_order() {
            let mut project = Project::new("demo");
            let root = project.root();
            let f = project.add_declaration(root, "f", ReflectionKind::FUNCTION, None);
            let c = project.add_declaration(root, "C", ReflectionKind::CLASS, None);
            let g = project.add_declaration(root, "g", ReflectionKind::FUNCTION, None);

            let groups = project.groups(root).unwrap().to_vec();
            let titles: Vec<_> = groups.iter().map(|g| g.title.as_str()).collect();
            assert_eq!(titles, vec!["Classes", "Functions"]);
            assert_eq!(groups[0].children, vec![c]);
            assert_eq!(groups[1].children, vec![f, g]);
        }

        #[test]
        fn walk_and_full_name() {
            let mut project = Project::new("demo");
            let root = project.root();
            let m = project.add_declaration(root, "m", ReflectionKind::MODULE, None);
            let c = project.add_declaration(m, "C", ReflectionKind::CLASS, None);
            let x = project.add_declaration(c, "x", ReflectionKind::PROPERTY, None);
            project.get_mut(x).unwrap().flags |= ReflectionFlags::READONLY;

            let mut order = Vec::new();
            project.walk(root, |r| order.push(r.id));
            assert_eq!(order, vec![root, m, c, x]);
            assert_eq!(project.full_name(x), "m.C.x");
            assert_eq!(project.get_reflections_by_kind(ReflectionKind::CLASS_OR_INTERFACE).len(), 1);
        }

        #[test]
        fn resolve_targets() {
            let mut project = Project::new("demo");
            let root = project.root();
            let a = project.add_declaration(root, "A", ReflectionKind::CLASS, Some(sym("A")));
            assert_eq!(
                project.resolve_reference_target(&ReferenceTarget::Symbol(sym("A"))),
                Some(a)
            );
            assert_eq!(
                project.resolve_reference_target(&ReferenceTarget::Reflection(ReflectionId::new(50))),
                None
            );
            assert_eq!(project.resolve_reference_target(&ReferenceTarget::Broken), None);
        }
    }
}

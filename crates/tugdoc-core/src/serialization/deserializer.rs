//! Wire document → live graph.
//!
//! Revival runs in two phases per input document:
//!
//! 1. **Skeleton.** Each reflection object becomes a live reflection, is
//!    registered immediately (minting a fresh id), and its wire id is
//!    recorded in `old_id_to_new_id`. Scalar fields are copied, nested
//!    reflections revived, and file ids remapped through
//!    `old_file_id_to_new_file_id`. Cross references in types and comments
//!    still carry wire ids at this point.
//! 2. **Deferred.** Callbacks queued with [`ReviveContext::defer`] run once,
//!    in queue order, with the complete id map. The built-in callbacks
//!    rewrite cross references to the new ids; a wire id with no revived
//!    reflection becomes a broken link and a warning.
//!
//! [`Deserializer::revive_projects`] merges several documents under one new
//! root. Each input is revived as a module with its own id map and deferred
//! scope. Every schema version is checked before anything is revived.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::comment::{Comment, CommentDisplayPart, CommentTag, InlineTagTarget};
use crate::error::{ReflectError, Result};
use crate::ids::{FileId, ReflectionId};
use crate::kind::{ReflectionKind, ReflectionVariant};
use crate::project::Project;
use crate::reflection::{Reflection, ReflectionData, ReflectionGroup, TraverseProperty};
use crate::types::{ReferenceTarget, ReferenceType, SomeType};

use super::components::{insert_by_priority, DeserializerComponent};
use super::schema::{
    JsonComment, JsonDisplayPart, JsonFileRegistry, JsonInlineTarget, JsonProject, JsonReflection,
    JsonTarget, JsonType, SUPPORTED_SCHEMA_VERSIONS,
};

// ============================================================================
// Warnings
// ============================================================================

/// Category of a non-fatal revival problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// A cross reference names a wire id that was not revived.
    UnresolvedReference,
    /// The symbol map names a reflection that is not in the document.
    SymbolNotPartOfProject,
    /// A project object appeared below the root.
    NestedProject,
    /// A file id is not in the document's file table.
    UnknownFileId,
    /// A map key that should be a numeric id is not one.
    InvalidId,
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningCode::UnresolvedReference => "unresolved_reference",
            WarningCode::SymbolNotPartOfProject => "symbol_not_part_of_project",
            WarningCode::NestedProject => "nested_project",
            WarningCode::UnknownFileId => "unknown_file_id",
            WarningCode::InvalidId => "invalid_id",
        };
        f.write_str(s)
    }
}

/// A non-fatal problem found while reviving a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeserializeWarning {
    pub code: WarningCode,
    pub message: String,
}

/// Options for [`Deserializer::revive_projects`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviveOptions {
    /// Wrap even a single input in a module below a fresh root.
    pub always_create_entry_point_module: bool,
}

type Deferred = Box<dyn FnOnce(&mut ReviveContext<'_>)>;

// ============================================================================
// Revive Context
// ============================================================================

/// State for reviving one input document into a project.
pub struct ReviveContext<'a> {
    project: &'a mut Project,
    project_root: &'a Path,
    components: &'a [Box<dyn DeserializerComponent>],
    old_id_to_new_id: HashMap<u32, ReflectionId>,
    old_file_id_to_new_file_id: HashMap<u32, FileId>,
    active_reflections: Vec<ReflectionId>,
    deferred: Vec<Deferred>,
    deferring_closed: bool,
    warnings: Vec<DeserializeWarning>,
}

impl<'a> ReviveContext<'a> {
    fn new(
        project: &'a mut Project,
        project_root: &'a Path,
        components: &'a [Box<dyn DeserializerComponent>],
    ) -> Self {
        ReviveContext {
            project,
            project_root,
            components,
            old_id_to_new_id: HashMap::new(),
            old_file_id_to_new_file_id: HashMap::new(),
            active_reflections: Vec::new(),
            deferred: Vec::new(),
            deferring_closed: false,
            warnings: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Public surface for components
    // ------------------------------------------------------------------------

    pub fn project(&self) -> &Project {
        self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        self.project
    }

    /// New id of the reflection that had wire id `old`.
    pub fn new_id(&self, old: u32) -> Option<ReflectionId> {
        self.old_id_to_new_id.get(&old).copied()
    }

    /// New id of the file that had wire id `old`.
    pub fn new_file_id(&self, old: u32) -> Option<FileId> {
        self.old_file_id_to_new_file_id.get(&old).copied()
    }

    /// The reflection currently being populated.
    pub fn active_reflection(&self) -> Option<ReflectionId> {
        self.active_reflections.last().copied()
    }

    /// Queue `callback` to run after every reflection of the input exists.
    ///
    /// # Panics
    ///
    /// If called from inside a deferred callback.
    pub fn defer<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut ReviveContext<'_>) + 'static,
    {
        assert!(
            !self.deferring_closed,
            "defer called from within a deferred callback"
        );
        self.deferred.push(Box::new(callback));
    }

    /// Record a warning and emit it through the log.
    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>) {
        let message = message.into();
        warn!(code = %code, "{}", message);
        self.warnings.push(DeserializeWarning { code, message });
    }

    // ------------------------------------------------------------------------
    // Driving
    // ------------------------------------------------------------------------

    /// Run every deferred callback once and hand back the warnings.
    fn finish(mut self) -> Vec<DeserializeWarning> {
        let queue = std::mem::take(&mut self.deferred);
        debug!(callbacks = queue.len(), "running deferred pass");
        self.deferring_closed = true;
        for callback in queue {
            callback(&mut self);
        }
        assert!(
            self.active_reflections.is_empty(),
            "active reflection stack not empty after revival: {:?}",
            self.active_reflections
        );
        self.warnings
    }

    fn revive_files(&mut self, files: &JsonFileRegistry) {
        for (old, path) in &files.entries {
            let Ok(old) = old.parse::<u32>() else {
                self.warn(WarningCode::InvalidId, format!("file id {:?} is not a number", old));
                continue;
            };
            let absolute = self.project_root.join(path);
            let (new, _) = self
                .project
                .files
                .register_absolute(&absolute.to_string_lossy());
            self.old_file_id_to_new_file_id.insert(old, new);
        }

        let links: Vec<(String, u32)> = files
            .reflections
            .iter()
            .map(|(file, refl)| (file.clone(), *refl))
            .collect();
        self.defer(move |ctx| {
            for (file, old_refl) in links {
                let file_id = file.parse::<u32>().ok().and_then(|f| ctx.new_file_id(f));
                let Some(file_id) = file_id else {
                    ctx.warn(
                        WarningCode::UnknownFileId,
                        format!("file {} is not in the file table", file),
                    );
                    continue;
                };
                match ctx.new_id(old_refl) {
                    Some(refl) => ctx.project.files.link_reflection(file_id, refl),
                    None => ctx.warn(
                        WarningCode::UnresolvedReference,
                        format!("file {} points at missing reflection {}", file, old_refl),
                    ),
                }
            }
        });
    }

    fn revive_symbol_map(&mut self, doc: &JsonProject) {
        let entries: Vec<_> = doc
            .symbol_id_map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.defer(move |ctx| {
            for (old, symbol) in entries {
                let new = old.parse::<u32>().ok().and_then(|o| ctx.new_id(o));
                match new {
                    Some(id) => ctx.project.register_symbol_id(id, symbol),
                    None => ctx.warn(
                        WarningCode::SymbolNotPartOfProject,
                        format!("symbol {} maps to reflection {} which is not part of the project", symbol, old),
                    ),
                }
            }
        });
    }

    // ------------------------------------------------------------------------
    // Skeleton construction
    // ------------------------------------------------------------------------

    /// Create, register, and populate the reflection described by `obj`.
    fn construct(&mut self, parent: ReflectionId, obj: &JsonReflection) -> ReflectionId {
        let (variant, kind) = match obj.variant {
            ReflectionVariant::Project => {
                self.warn(
                    WarningCode::NestedProject,
                    format!("nested project {:?} revived as a module", obj.name),
                );
                (ReflectionVariant::Declaration, ReflectionKind::MODULE)
            }
            v => (v, obj.kind),
        };

        let id = self.project.next_reflection_id();
        let refl = Reflection::new(id, obj.name.clone(), kind, Some(parent), ReflectionData::empty(variant));
        self.project.register_reflection(refl, None, None);
        self.old_id_to_new_id.insert(obj.id, id);
        self.populate(id, obj);
        id
    }

    /// Construct `obj` and place it in `parent`'s `property` slot.
    fn revive_child(&mut self, parent: ReflectionId, obj: &JsonReflection, property: TraverseProperty) {
        let id = self.construct(parent, obj);
        let attached = self
            .project
            .get_mut(parent)
            .is_some_and(|p| p.attach(id, property));
        if !attached {
            debug!(parent = %parent, child = %id, ?property, "no slot for revived reflection");
        }
    }

    fn revive_children(&mut self, parent: ReflectionId, objs: Option<&Vec<JsonReflection>>, property: TraverseProperty) {
        for obj in objs.into_iter().flatten() {
            self.revive_child(parent, obj, property);
        }
    }

    /// Copy `obj`'s fields into the already registered reflection `id`.
    fn populate(&mut self, id: ReflectionId, obj: &JsonReflection) {
        self.active_reflections.push(id);
        self.defer(move |ctx| ctx.remap_links(id));

        let comment = obj.comment.as_ref().map(|c| self.revive_comment(c));
        if let Some(refl) = self.project.get_mut(id) {
            refl.flags = obj.flags;
            refl.comment = comment;
            refl.sources = obj.sources.clone().unwrap_or_default();
        }

        let variant = self.project.get(id).map(Reflection::variant);
        match variant {
            Some(ReflectionVariant::Project) => {
                let readme = obj.readme.as_ref().map(|r| self.revive_parts(r));
                if let Some(ReflectionData::Project(p)) = self.project.get_mut(id).map(|r| &mut r.data) {
                    p.package_name = obj.package_name.clone();
                    p.package_version = obj.package_version.clone();
                    p.readme = readme;
                }
                self.populate_container(id, obj);
            }
            Some(ReflectionVariant::Declaration) => {
                self.revive_children(id, obj.signatures.as_ref(), TraverseProperty::Signatures);
                if let Some(sig) = &obj.get_signature {
                    self.revive_child(id, sig, TraverseProperty::GetSignature);
                }
                if let Some(sig) = &obj.set_signature {
                    self.revive_child(id, sig, TraverseProperty::SetSignature);
                }
                self.revive_children(id, obj.type_parameters.as_ref(), TraverseProperty::TypeParameter);
                self.revive_children(id, obj.index_signatures.as_ref(), TraverseProperty::IndexSignature);

                let type_ = self.revive_optional_type(id, obj.type_.as_ref());
                let overwrites = self.revive_optional_type(id, obj.overwrites.as_ref());
                let inherited_from = self.revive_optional_type(id, obj.inherited_from.as_ref());
                let implementation_of = self.revive_optional_type(id, obj.implementation_of.as_ref());
                let extended = self.revive_types(id, obj.extended_types.as_ref());
                let implemented = self.revive_types(id, obj.implemented_types.as_ref());
                // A project merged in as a module keeps its readme as the
                // module comment.
                let readme_comment = obj
                    .readme
                    .as_ref()
                    .map(|r| Comment::new(self.revive_parts(r)));

                if let Some(refl) = self.project.get_mut(id) {
                    if refl.comment.is_none() {
                        refl.comment = readme_comment;
                    }
                    if let Some(d) = refl.as_declaration_mut() {
                        d.type_ = type_;
                        d.default_value = obj.default_value.clone();
                        d.overwrites = overwrites;
                        d.inherited_from = inherited_from;
                        d.implementation_of = implementation_of;
                        d.extended_types = extended;
                        d.implemented_types = implemented;
                        d.package_version = obj.package_version.clone();
                    }
                }
                self.populate_container(id, obj);
            }
            Some(ReflectionVariant::Signature) => {
                self.revive_children(id, obj.parameters.as_ref(), TraverseProperty::Parameters);
                self.revive_children(id, obj.type_parameters.as_ref(), TraverseProperty::TypeParameter);
                let type_ = self.revive_optional_type(id, obj.type_.as_ref());
                let overwrites = self.revive_optional_type(id, obj.overwrites.as_ref());
                let inherited_from = self.revive_optional_type(id, obj.inherited_from.as_ref());
                let implementation_of = self.revive_optional_type(id, obj.implementation_of.as_ref());
                if let Some(ReflectionData::Signature(s)) = self.project.get_mut(id).map(|r| &mut r.data) {
                    s.type_ = type_;
                    s.overwrites = overwrites;
                    s.inherited_from = inherited_from;
                    s.implementation_of = implementation_of;
                }
            }
            Some(ReflectionVariant::Param) => {
                let type_ = self.revive_optional_type(id, obj.type_.as_ref());
                if let Some(ReflectionData::Parameter(p)) = self.project.get_mut(id).map(|r| &mut r.data) {
                    p.type_ = type_;
                    p.default_value = obj.default_value.clone();
                }
            }
            Some(ReflectionVariant::TypeParam) => {
                let type_ = self.revive_optional_type(id, obj.type_.as_ref());
                let default = self.revive_optional_type(id, obj.default.as_ref());
                if let Some(ReflectionData::TypeParameter(t)) = self.project.get_mut(id).map(|r| &mut r.data) {
                    t.type_ = type_;
                    t.default = default;
                    t.variance_modifier = obj.variance_modifier.clone();
                }
            }
            Some(ReflectionVariant::Document) => {
                let content = obj
                    .content
                    .as_ref()
                    .map(|c| self.revive_parts(c))
                    .unwrap_or_default();
                if let Some(ReflectionData::Document(d)) = self.project.get_mut(id).map(|r| &mut r.data) {
                    d.content = content;
                    d.frontmatter = obj.frontmatter.clone().unwrap_or_default();
                }
                self.revive_children(id, obj.children.as_ref(), TraverseProperty::Documents);
            }
            Some(ReflectionVariant::Reference) => {
                let target = obj
                    .target
                    .as_ref()
                    .map(wire_target)
                    .unwrap_or(ReferenceTarget::Broken);
                if let Some(ReflectionData::Reference(r)) = self.project.get_mut(id).map(|r| &mut r.data) {
                    r.target = target;
                }
            }
            None => {}
        }

        let components = self.components;
        for component in components {
            let supported = self
                .project
                .get(id)
                .is_some_and(|refl| component.supports(refl, obj));
            if supported {
                component.from_object(self, id, obj);
            }
        }

        self.active_reflections.pop();
    }

    fn populate_container(&mut self, id: ReflectionId, obj: &JsonReflection) {
        self.revive_children(id, obj.children.as_ref(), TraverseProperty::Children);
        self.revive_children(id, obj.documents.as_ref(), TraverseProperty::Documents);

        // Group members are wire ids until the deferred pass.
        let groups = obj.groups.as_ref().map(|groups| {
            groups
                .iter()
                .map(|g| ReflectionGroup {
                    title: g.title.clone(),
                    children: g.children.iter().map(|c| ReflectionId::new(*c)).collect(),
                })
                .collect()
        });
        if let Some(container) = self.project.get_mut(id).and_then(|r| r.container_mut()) {
            container.groups = groups;
        }
    }

    // ------------------------------------------------------------------------
    // Types and comments
    // ------------------------------------------------------------------------

    fn revive_optional_type(&mut self, owner: ReflectionId, ty: Option<&JsonType>) -> Option<SomeType> {
        ty.map(|t| self.revive_type(owner, t))
    }

    fn revive_types(&mut self, owner: ReflectionId, types: Option<&Vec<JsonType>>) -> Vec<SomeType> {
        types
            .into_iter()
            .flatten()
            .map(|t| self.revive_type(owner, t))
            .collect()
    }

    /// Revive a type tree. Embedded declarations are constructed with
    /// `owner` as their parent.
    fn revive_type(&mut self, owner: ReflectionId, ty: &JsonType) -> SomeType {
        let boxed = |ctx: &mut Self, t: &JsonType| Box::new(ctx.revive_type(owner, t));

        match ty {
            JsonType::Array { element_type } => SomeType::Array {
                element_type: boxed(self, element_type),
            },
            JsonType::Conditional {
                check_type,
                extends_type,
                true_type,
                false_type,
            } => SomeType::Conditional {
                check_type: boxed(self, check_type),
                extends_type: boxed(self, extends_type),
                true_type: boxed(self, true_type),
                false_type: boxed(self, false_type),
            },
            JsonType::IndexedAccess {
                object_type,
                index_type,
            } => SomeType::IndexedAccess {
                object_type: boxed(self, object_type),
                index_type: boxed(self, index_type),
            },
            JsonType::Inferred { name, constraint } => SomeType::Inferred {
                name: name.clone(),
                constraint: constraint.as_deref().map(|c| boxed(self, c)),
            },
            JsonType::Intersection { types } => SomeType::Intersection {
                types: self.revive_list(owner, types),
            },
            JsonType::Intrinsic { name } => SomeType::Intrinsic { name: name.clone() },
            JsonType::Literal { value } => SomeType::Literal {
                value: value.clone(),
            },
            JsonType::Mapped {
                parameter,
                parameter_type,
                template_type,
                readonly_modifier,
                optional_modifier,
                name_type,
            } => SomeType::Mapped {
                parameter: parameter.clone(),
                parameter_type: boxed(self, parameter_type),
                template_type: boxed(self, template_type),
                readonly_modifier: *readonly_modifier,
                optional_modifier: *optional_modifier,
                name_type: name_type.as_deref().map(|n| boxed(self, n)),
            },
            JsonType::NamedTupleMember {
                name,
                is_optional,
                element,
            } => SomeType::NamedTupleMember {
                name: name.clone(),
                is_optional: *is_optional,
                element: boxed(self, element),
            },
            JsonType::Optional { element_type } => SomeType::Optional {
                element_type: boxed(self, element_type),
            },
            JsonType::Predicate {
                name,
                asserts,
                target_type,
            } => SomeType::Predicate {
                name: name.clone(),
                asserts: *asserts,
                target_type: target_type.as_deref().map(|t| boxed(self, t)),
            },
            JsonType::Query { query_type } => SomeType::Query {
                query_type: boxed(self, query_type),
            },
            JsonType::Reference {
                name,
                target,
                type_arguments,
                package,
                external_url,
                qualified_name,
                refers_to_type_parameter,
                prefer_values,
            } => SomeType::Reference(ReferenceType {
                name: name.clone(),
                target: wire_target(target),
                type_arguments: self.revive_list(owner, type_arguments),
                package: package.clone(),
                external_url: external_url.clone(),
                qualified_name: qualified_name.clone(),
                refers_to_type_parameter: *refers_to_type_parameter,
                prefer_values: *prefer_values,
            }),
            JsonType::Reflection { declaration } => SomeType::Reflection {
                declaration: self.construct(owner, declaration),
            },
            JsonType::Rest { element_type } => SomeType::Rest {
                element_type: boxed(self, element_type),
            },
            JsonType::TemplateLiteral { head, tail } => SomeType::TemplateLiteral {
                head: head.clone(),
                tail: tail
                    .iter()
                    .map(|(t, text)| (self.revive_type(owner, t), text.clone()))
                    .collect(),
            },
            JsonType::Tuple { elements } => SomeType::Tuple {
                elements: self.revive_list(owner, elements),
            },
            JsonType::TypeOperator { operator, target } => SomeType::TypeOperator {
                operator: operator.clone(),
                target: boxed(self, target),
            },
            JsonType::Union { types } => SomeType::Union {
                types: self.revive_list(owner, types),
            },
            JsonType::Unknown { name } => SomeType::Unknown { name: name.clone() },
        }
    }

    fn revive_list(&mut self, owner: ReflectionId, types: &[JsonType]) -> Vec<SomeType> {
        types.iter().map(|t| self.revive_type(owner, t)).collect()
    }

    fn revive_comment(&mut self, comment: &JsonComment) -> Comment {
        Comment {
            summary: self.revive_parts(&comment.summary),
            block_tags: comment
                .block_tags
                .iter()
                .map(|tag| CommentTag {
                    tag: tag.tag.clone(),
                    name: tag.name.clone(),
                    content: self.revive_parts(&tag.content),
                })
                .collect(),
            modifier_tags: comment.modifier_tags.iter().cloned().collect(),
        }
    }

    /// Revive display parts. File ids are remapped now; reflection targets
    /// keep their wire ids until the deferred pass.
    fn revive_parts(&mut self, parts: &[JsonDisplayPart]) -> Vec<CommentDisplayPart> {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            let revived = match part {
                JsonDisplayPart::Text { text } => CommentDisplayPart::Text { text: text.clone() },
                JsonDisplayPart::Code { text } => CommentDisplayPart::Code { text: text.clone() },
                JsonDisplayPart::InlineTag { tag, text, target } => CommentDisplayPart::InlineTag {
                    tag: tag.clone(),
                    text: text.clone(),
                    target: target.as_ref().map(|t| match t {
                        JsonInlineTarget::Reflection(r) => InlineTagTarget::Reflection(wire_target(r)),
                        JsonInlineTarget::Url(url) => InlineTagTarget::Url(url.clone()),
                    }),
                },
                JsonDisplayPart::RelativeLink {
                    text,
                    target,
                    target_anchor,
                } => {
                    let target = match target {
                        Some(old) => {
                            let new = self.new_file_id(*old);
                            if new.is_none() {
                                self.warn(
                                    WarningCode::UnknownFileId,
                                    format!("relative link {:?} names unknown file {}", text, old),
                                );
                            }
                            new
                        }
                        None => None,
                    };
                    CommentDisplayPart::RelativeLink {
                        text: text.clone(),
                        target,
                        target_anchor: target_anchor.clone(),
                    }
                }
            };
            out.push(revived);
        }
        out
    }

    // ------------------------------------------------------------------------
    // Deferred fixups
    // ------------------------------------------------------------------------

    /// Rewrite every wire id held by reflection `id` to its new id.
    fn remap_links(&mut self, id: ReflectionId) {
        let mut misses = Vec::new();
        {
            let ReviveContext {
                project,
                old_id_to_new_id,
                ..
            } = self;
            let map: &HashMap<u32, ReflectionId> = old_id_to_new_id;
            let Some(refl) = project.get_mut(id) else {
                return;
            };

            for ty in refl.types_mut() {
                ty.walk_mut(&mut |node| {
                    if let SomeType::Reference(r) = node {
                        remap_target(map, &mut misses, &mut r.target);
                    }
                });
            }

            if let Some(comment) = refl.comment.as_mut() {
                for part in comment.display_parts_mut() {
                    remap_part(map, &mut misses, part);
                }
            }

            match &mut refl.data {
                ReflectionData::Reference(r) => {
                    remap_target(map, &mut misses, &mut r.target);
                }
                ReflectionData::Document(d) => {
                    for part in d.content.iter_mut() {
                        remap_part(map, &mut misses, part);
                    }
                }
                ReflectionData::Project(p) => {
                    for part in p.readme.iter_mut().flatten() {
                        remap_part(map, &mut misses, part);
                    }
                }
                _ => {}
            }

            if let Some(groups) = refl.container_mut().and_then(|c| c.groups.as_mut()) {
                for group in groups.iter_mut() {
                    group.children = group
                        .children
                        .iter()
                        .filter_map(|old| map.get(&old.0).copied())
                        .collect();
                }
            }
        }

        for old in misses {
            self.warn(
                WarningCode::UnresolvedReference,
                format!("reflection {} references missing reflection {}", id, old),
            );
        }
    }
}

/// Wire target with the wire id kept as-is.
fn wire_target(target: &JsonTarget) -> ReferenceTarget {
    match target {
        JsonTarget::Id(n) => match u32::try_from(*n) {
            Ok(old) => ReferenceTarget::Reflection(ReflectionId::new(old)),
            Err(_) => ReferenceTarget::Broken,
        },
        JsonTarget::Symbol(symbol) => ReferenceTarget::Symbol(symbol.clone()),
    }
}

fn remap_target(map: &HashMap<u32, ReflectionId>, misses: &mut Vec<u32>, target: &mut ReferenceTarget) {
    if let ReferenceTarget::Reflection(old) = target {
        match map.get(&old.0) {
            Some(new) => *target = ReferenceTarget::Reflection(*new),
            None => {
                misses.push(old.0);
                *target = ReferenceTarget::Broken;
            }
        }
    }
}

fn remap_part(map: &HashMap<u32, ReflectionId>, misses: &mut Vec<u32>, part: &mut CommentDisplayPart) {
    if let CommentDisplayPart::InlineTag {
        target: Some(InlineTagTarget::Reflection(target)),
        ..
    } = part
    {
        remap_target(map, misses, target);
    }
}

// ============================================================================
// Deserializer
// ============================================================================

/// Revives [`JsonProject`] documents into [`Project`]s.
pub struct Deserializer {
    project_root: PathBuf,
    components: Vec<Box<dyn DeserializerComponent>>,
    warnings: Vec<DeserializeWarning>,
}

impl Deserializer {
    /// Create a deserializer resolving file paths against `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Deserializer {
            project_root: project_root.into(),
            components: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_component(&mut self, component: Box<dyn DeserializerComponent>) {
        insert_by_priority(&mut self.components, component, |c| c.priority());
    }

    /// Warnings collected by every revival so far.
    pub fn warnings(&self) -> &[DeserializeWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<DeserializeWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Parse a document without reviving it.
    pub fn parse_document(text: &str) -> Result<JsonProject> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse and revive a single document.
    pub fn revive_json_str(&mut self, name: impl Into<String>, text: &str) -> Result<Project> {
        let doc = Self::parse_document(text)?;
        self.revive_project(name, &doc)
    }

    /// Revive one document as a project named `name`.
    pub fn revive_project(&mut self, name: impl Into<String>, doc: &JsonProject) -> Result<Project> {
        check_version(doc)?;

        let mut project = Project::new(name);
        let root = project.root();
        debug!(project = %project.name(), "reviving project");

        let mut ctx = ReviveContext::new(&mut project, &self.project_root, &self.components);
        ctx.revive_files(&doc.files);
        ctx.old_id_to_new_id.insert(doc.root.id, root);
        ctx.populate(root, &doc.root);
        ctx.revive_symbol_map(doc);
        let warnings = ctx.finish();
        self.warnings.extend(warnings);

        debug!(project = %project.name(), reflections = project.len(), "revived project");
        Ok(project)
    }

    /// Revive several documents into one project.
    ///
    /// A single document without `always_create_entry_point_module` is
    /// revived as-is. Otherwise each document becomes a module below a new
    /// root named `name`. Fails before reviving anything if any document has
    /// an unsupported schema version.
    pub fn revive_projects(
        &mut self,
        name: impl Into<String>,
        docs: &[JsonProject],
        options: ReviveOptions,
    ) -> Result<Project> {
        if let [single] = docs {
            if !options.always_create_entry_point_module {
                return self.revive_project(name, single);
            }
        }

        for doc in docs {
            check_version(doc)?;
        }

        let mut project = Project::new(name);
        let root = project.root();
        debug!(project = %project.name(), inputs = docs.len(), "merging projects");

        for doc in docs {
            let module = project.add_declaration(root, doc.root.name.clone(), ReflectionKind::MODULE, None);

            let mut ctx = ReviveContext::new(&mut project, &self.project_root, &self.components);
            ctx.revive_files(&doc.files);
            ctx.old_id_to_new_id.insert(doc.root.id, module);
            ctx.populate(module, &doc.root);
            ctx.revive_symbol_map(doc);
            let warnings = ctx.finish();
            self.warnings.extend(warnings);
            debug!(
                module = %doc.root.name,
                version = doc.root.package_version.as_deref().unwrap_or("-"),
                "merged module"
            );
        }

        Ok(project)
    }
}

fn check_version(doc: &JsonProject) -> Result<()> {
    if SUPPORTED_SCHEMA_VERSIONS.contains(&doc.schema_version.as_str()) {
        Ok(())
    } else {
        Err(ReflectError::version_mismatch(
            doc.schema_version.clone(),
            SUPPORTED_SCHEMA_VERSIONS,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SymbolId;
    use crate::kind::ReflectionFlags;
    use crate::serialization::schema::JsonGroup;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> JsonProject {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> JsonProject {
        doc(json!({
            "schemaVersion": "2.0",
            "id": 0,
            "name": "sample",
            "variant": "project",
            "kind": 1,
            "flags": {},
            "children": [
                {
                    "id": 40, "name": "Foo", "variant": "declaration", "kind": 128,
                    "flags": {"isAbstract": true},
                    "comment": {"summary": [
                        {"kind": "text", "text": "See "},
                        {"kind": "inline-tag", "tag": "@link", "text": "bar", "target": 41},
                        {"kind": "relative-link", "text": "guide", "target": 7}
                    ]}
                },
                {
                    "id": 41, "name": "bar", "variant": "declaration", "kind": 64,
                    "flags": {},
                    "signatures": [{
                        "id": 42, "name": "bar", "variant": "signature", "kind": 4096, "flags": {},
                        "parameters": [{
                            "id": 43, "name": "x", "variant": "param", "kind": 32768, "flags": {},
                            "type": {"type": "reference", "name": "Foo", "target": 40}
                        }],
                        "type": {"type": "reference", "name": "Gone", "target": 999}
                    }]
                },
                {
                    "id": 44, "name": "FooAlias", "variant": "reference", "kind": 4194304,
                    "flags": {}, "target": 40
                }
            ],
            "groups": [{"title": "Classes", "children": [40, 1234]}],
            "symbolIdMap": {
                "40": {"packageName": "sample", "packagePath": "src/foo.ts", "qualifiedName": "Foo"},
                "77": {"packageName": "sample", "packagePath": "src/x.ts", "qualifiedName": "X"}
            },
            "files": {"entries": {"7": "docs/guide.md"}, "reflections": {"7": 40}}
        }))
    }

    fn child_named<'p>(project: &'p Project, name: &str) -> &'p Reflection {
        project
            .reflections()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no reflection named {}", name))
    }

    mod revive_tests {
        use super::*;

        #[test]
        fn cross_references_are_remapped() {
            let mut de = Deserializer::new("/repo");
            let project = de.revive_project("sample", &sample()).unwrap();

            let foo = child_named(&project, "Foo");
            assert!(foo.flags.contains(ReflectionFlags::ABSTRACT));
            let bar = child_named(&project, "bar");
            let x = child_named(&project, "x");
            match x.type_slot().unwrap() {
                Some(SomeType::Reference(r)) => {
                    assert_eq!(r.target, ReferenceTarget::Reflection(foo.id))
                }
                other => panic!("unexpected type {:?}", other),
            }

            let summary = &foo.comment.as_ref().unwrap().summary;
            assert!(matches!(
                &summary[1],
                CommentDisplayPart::InlineTag {
                    target: Some(InlineTagTarget::Reflection(ReferenceTarget::Reflection(id))),
                    ..
                } if *id == bar.id
            ));

            let alias = child_named(&project, "FooAlias");
            assert_eq!(
                alias.as_reference().unwrap().target,
                ReferenceTarget::Reflection(foo.id)
            );
            assert_eq!(project.reference_graph().get(&foo.id), Some(&vec![alias.id]));
        }

        #[test]
        fn unresolved_ids_become_broken_with_warning() {
            let mut de = Deserializer::new("/repo");
            let project = de.revive_project("sample", &sample()).unwrap();

            let sig = project
                .get_reflections_by_kind(ReflectionKind::CALL_SIGNATURE)
                .pop()
                .unwrap();
            match sig.type_slot().unwrap() {
                Some(SomeType::Reference(r)) => assert!(r.target.is_broken()),
                other => panic!("unexpected type {:?}", other),
            }
            assert!(de
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::UnresolvedReference && w.message.contains("999")));
        }

        #[test]
        fn symbols_files_and_groups_are_restored() {
            let mut de = Deserializer::new("/repo");
            let project = de.revive_project("sample", &sample()).unwrap();
            let foo = child_named(&project, "Foo").id;

            let symbol = SymbolId::new("sample", "src/foo.ts", "Foo");
            assert_eq!(project.get_symbol_id_from_reflection(foo), Some(&symbol));
            assert!(de
                .warnings()
                .iter()
                .any(|w| w.code == WarningCode::SymbolNotPartOfProject));

            let file = project
                .files
                .get_id(Path::new("/repo/docs/guide.md"))
                .unwrap();
            assert_eq!(
                project.files.resolve(file),
                Some(crate::files::ResolvedFile::Reflection(foo))
            );

            let summary = &project.get(foo).unwrap().comment.as_ref().unwrap().summary;
            assert!(matches!(
                &summary[2],
                CommentDisplayPart::RelativeLink { target: Some(f), .. } if *f == file
            ));

            let groups = project
                .root_reflection()
                .container()
                .unwrap()
                .groups
                .clone()
                .unwrap();
            assert_eq!(
                groups,
                vec![ReflectionGroup {
                    title: "Classes".into(),
                    children: vec![foo]
                }]
            );
        }

        #[test]
        fn children_index_matches_parents() {
            let mut de = Deserializer::new("/repo");
            let project = de.revive_project("sample", &sample()).unwrap();
            for refl in project.reflections() {
                if let Some(parent) = refl.parent {
                    assert!(project.children_of(parent).contains(&refl.id));
                }
            }
            assert_eq!(project.len(), 6);
        }

        #[test]
        fn unsupported_version_is_fatal() {
            let mut bad = sample();
            bad.schema_version = "1.0".into();
            let err = Deserializer::new("/").revive_project("x", &bad).unwrap_err();
            assert!(matches!(err, ReflectError::SchemaVersionMismatch { .. }));
        }

        #[test]
        fn nested_project_becomes_module() {
            let mut input = sample();
            let mut nested = JsonReflection::new(90, "inner", ReflectionVariant::Project, ReflectionKind::PROJECT);
            nested.groups = Some(vec![JsonGroup {
                title: "Nothing".into(),
                children: vec![],
            }]);
            input.root.children.get_or_insert_with(Vec::new).push(nested);

            let mut de = Deserializer::new("/");
            let project = de.revive_project("x", &input).unwrap();
            let inner = child_named(&project, "inner");
            assert_eq!(inner.kind, ReflectionKind::MODULE);
            assert!(inner.as_declaration().is_some());
            assert!(de.warnings().iter().any(|w| w.code == WarningCode::NestedProject));
        }
    }

    mod defer_tests {
        use super::*;

        #[test]
        #[should_panic(expected = "defer called from within a deferred callback")]
        fn defer_inside_deferred_panics() {
            let mut project = Project::new("x");
            let root = PathBuf::from("/");
            let components: Vec<Box<dyn DeserializerComponent>> = Vec::new();
            let mut ctx = ReviveContext::new(&mut project, &root, &components);
            ctx.defer(|ctx| ctx.defer(|_| {}));
            ctx.finish();
        }

        #[test]
        #[should_panic(expected = "active reflection stack not empty")]
        fn unbalanced_stack_panics() {
            let mut project = Project::new("x");
            let root = PathBuf::from("/");
            let components: Vec<Box<dyn DeserializerComponent>> = Vec::new();
            let mut ctx = ReviveContext::new(&mut project, &root, &components);
            ctx.active_reflections.push(ReflectionId::new(1));
            ctx.finish();
        }

        #[test]
        fn deferred_callbacks_run_in_order() {
            let mut project = Project::new("x");
            let root = PathBuf::from("/");
            let components: Vec<Box<dyn DeserializerComponent>> = Vec::new();
            let mut ctx = ReviveContext::new(&mut project, &root, &components);
            ctx.defer(|ctx| ctx.warn(WarningCode::InvalidId, "first"));
            ctx.defer(|ctx| ctx.warn(WarningCode::InvalidId, "second"));
            let warnings = ctx.finish();
            let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();
            assert_eq!(messages, vec!["first", "second"]);
        }
    }
}

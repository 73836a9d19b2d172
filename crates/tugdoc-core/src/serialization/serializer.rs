//! Live graph → wire document.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::comment::{Comment, CommentDisplayPart, InlineTagTarget};
use crate::error::Result;
use crate::ids::ReflectionId;
use crate::project::Project;
use crate::reflection::{ContainerData, Reflection, ReflectionData, ReflectionGroup};
use crate::types::{ReferenceTarget, SomeType};

use super::components::{insert_by_priority, SerializerComponent};
use super::schema::{
    JsonComment, JsonCommentTag, JsonDisplayPart, JsonFileRegistry, JsonGroup, JsonInlineTarget,
    JsonProject, JsonReflection, JsonTarget, JsonType, BROKEN_TARGET, SCHEMA_VERSION,
};

/// Converts a [`Project`] into a [`JsonProject`].
pub struct Serializer {
    project_root: PathBuf,
    components: Vec<Box<dyn SerializerComponent>>,
}

impl Serializer {
    /// Create a serializer writing file paths relative to `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Serializer {
            project_root: project_root.into(),
            components: Vec::new(),
        }
    }

    pub fn add_component(&mut self, component: Box<dyn SerializerComponent>) {
        insert_by_priority(&mut self.components, component, |c| c.priority());
    }

    /// Serialize the whole project.
    pub fn project_to_object(&self, project: &Project) -> JsonProject {
        let root = self.reflection_to_object(project, project.root_reflection());

        let symbol_id_map = project
            .symbol_id_entries()
            .into_iter()
            .filter(|(id, _)| project.contains(*id))
            .map(|(id, symbol)| (id.0.to_string(), symbol.clone()))
            .collect();

        let mut files = JsonFileRegistry::default();
        for (id, path) in project.files.entries() {
            files
                .entries
                .insert(id.0.to_string(), self.wire_path(path));
        }
        for (file, reflection) in project.files.reflection_entries() {
            if project.contains(reflection) {
                files.reflections.insert(file.0.to_string(), reflection.0);
            }
        }

        debug!(
            project = %project.name(),
            reflections = project.len(),
            files = files.entries.len(),
            "serialized project"
        );

        JsonProject {
            schema_version: SCHEMA_VERSION.to_string(),
            root,
            symbol_id_map,
            files,
        }
    }

    /// Serialize the project as pretty-printed JSON.
    pub fn to_json_string(&self, project: &Project) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.project_to_object(project))?)
    }

    /// Serialize one reflection and everything in its structural slots.
    pub fn reflection_to_object(&self, project: &Project, refl: &Reflection) -> JsonReflection {
        let mut out = JsonReflection::new(refl.id.0, refl.name.clone(), refl.variant(), refl.kind);
        out.flags = refl.flags;
        out.comment = refl.comment.as_ref().map(|c| self.comment_to_object(project, c));
        if !refl.sources.is_empty() {
            out.sources = Some(refl.sources.clone());
        }

        match &refl.data {
            ReflectionData::Project(p) => {
                self.container_to_object(project, &p.container, &mut out);
                out.package_name = p.package_name.clone();
                out.package_version = p.package_version.clone();
                out.readme = p
                    .readme
                    .as_ref()
                    .map(|parts| self.parts_to_object(project, parts));
            }
            ReflectionData::Declaration(d) => {
                out.signatures = self.objects(project, &d.signatures);
                out.index_signatures = self.objects(project, &d.index_signatures);
                out.get_signature = self.object(project, d.get_signature);
                out.set_signature = self.object(project, d.set_signature);
                out.type_parameters = self.objects(project, &d.type_parameters);
                out.type_ = self.optional_type(project, d.type_.as_ref());
                out.default_value = d.default_value.clone();
                out.overwrites = self.optional_type(project, d.overwrites.as_ref());
                out.inherited_from = self.optional_type(project, d.inherited_from.as_ref());
                out.implementation_of = self.optional_type(project, d.implementation_of.as_ref());
                out.extended_types = self.types(project, &d.extended_types);
                out.implemented_types = self.types(project, &d.implemented_types);
                out.package_version = d.package_version.clone();
                self.container_to_object(project, &d.container, &mut out);
            }
            ReflectionData::Signature(s) => {
                out.parameters = self.objects(project, &s.parameters);
                out.type_parameters = self.objects(project, &s.type_parameters);
                out.type_ = self.optional_type(project, s.type_.as_ref());
                out.overwrites = self.optional_type(project, s.overwrites.as_ref());
                out.inherited_from = self.optional_type(project, s.inherited_from.as_ref());
                out.implementation_of = self.optional_type(project, s.implementation_of.as_ref());
            }
            ReflectionData::Parameter(p) => {
                out.type_ = self.optional_type(project, p.type_.as_ref());
                out.default_value = p.default_value.clone();
            }
            ReflectionData::TypeParameter(t) => {
                out.type_ = self.optional_type(project, t.type_.as_ref());
                out.default = self.optional_type(project, t.default.as_ref());
                out.variance_modifier = t.variance_modifier.clone();
            }
            ReflectionData::Document(d) => {
                out.content = Some(self.parts_to_object(project, &d.content));
                if !d.frontmatter.is_empty() {
                    out.frontmatter = Some(d.frontmatter.clone());
                }
                out.children = self.objects(project, &d.children);
            }
            ReflectionData::Reference(r) => {
                out.target = Some(self.target_to_object(project, &r.target));
            }
        }

        for component in &self.components {
            if component.supports(refl) {
                component.to_object(refl, project, &mut out);
            }
        }

        out
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn container_to_object(&self, project: &Project, container: &ContainerData, out: &mut JsonReflection) {
        out.children = self.objects(project, &container.children);
        out.documents = self.objects(project, &container.documents);
        out.groups = container
            .groups
            .as_ref()
            .filter(|groups| !groups.is_empty())
            .map(|groups| groups.iter().map(|g| self.group_to_object(project, g)).collect());
    }

    fn group_to_object(&self, project: &Project, group: &ReflectionGroup) -> JsonGroup {
        JsonGroup {
            title: group.title.clone(),
            children: group
                .children
                .iter()
                .filter(|id| project.contains(**id))
                .map(|id| id.0)
                .collect(),
        }
    }

    fn object(&self, project: &Project, id: Option<ReflectionId>) -> Option<Box<JsonReflection>> {
        let refl = project.get(id?)?;
        Some(Box::new(self.reflection_to_object(project, refl)))
    }

    /// Serialize the reflections behind `ids`; `None` when there are none.
    fn objects(&self, project: &Project, ids: &[ReflectionId]) -> Option<Vec<JsonReflection>> {
        let objects: Vec<_> = ids
            .iter()
            .filter_map(|id| project.get(*id))
            .map(|refl| self.reflection_to_object(project, refl))
            .collect();
        (!objects.is_empty()).then_some(objects)
    }

    fn types(&self, project: &Project, types: &[SomeType]) -> Option<Vec<JsonType>> {
        (!types.is_empty()).then(|| types.iter().map(|t| self.type_to_object(project, t)).collect())
    }

    fn optional_type(&self, project: &Project, ty: Option<&SomeType>) -> Option<JsonType> {
        ty.map(|t| self.type_to_object(project, t))
    }

    /// Serialize a type tree. Embedded declarations are written inline.
    pub fn type_to_object(&self, project: &Project, ty: &SomeType) -> JsonType {
        let boxed = |t: &SomeType| Box::new(self.type_to_object(project, t));
        let list = |ts: &[SomeType]| -> Vec<JsonType> {
            ts.iter().map(|t| self.type_to_object(project, t)).collect()
        };

        match ty {
            SomeType::Array { element_type } => JsonType::Array {
                element_type: boxed(element_type),
            },
            SomeType::Conditional {
                check_type,
                extends_type,
                true_type,
                false_type,
            } => JsonType::Conditional {
                check_type: boxed(check_type),
                extends_type: boxed(extends_type),
                true_type: boxed(true_type),
                false_type: boxed(false_type),
            },
            SomeType::IndexedAccess {
                object_type,
                index_type,
            } => JsonType::IndexedAccess {
                object_type: boxed(object_type),
                index_type: boxed(index_type),
            },
            SomeType::Inferred { name, constraint } => JsonType::Inferred {
                name: name.clone(),
                constraint: constraint.as_deref().map(boxed),
            },
            SomeType::Intersection { types } => JsonType::Intersection { types: list(types) },
            SomeType::Intrinsic { name } => JsonType::Intrinsic { name: name.clone() },
            SomeType::Literal { value } => JsonType::Literal {
                value: value.clone(),
            },
            SomeType::Mapped {
                parameter,
                parameter_type,
                template_type,
                readonly_modifier,
                optional_modifier,
                name_type,
            } => JsonType::Mapped {
                parameter: parameter.clone(),
                parameter_type: boxed(parameter_type),
                template_type: boxed(template_type),
                readonly_modifier: *readonly_modifier,
                optional_modifier: *optional_modifier,
                name_type: name_type.as_deref().map(boxed),
            },
            SomeType::NamedTupleMember {
                name,
                is_optional,
                element,
            } => JsonType::NamedTupleMember {
                name: name.clone(),
                is_optional: *is_optional,
                element: boxed(element),
            },
            SomeType::Optional { element_type } => JsonType::Optional {
                element_type: boxed(element_type),
            },
            SomeType::Predicate {
                name,
                asserts,
                target_type,
            } => JsonType::Predicate {
                name: name.clone(),
                asserts: *asserts,
                target_type: target_type.as_deref().map(boxed),
            },
            SomeType::Query { query_type } => JsonType::Query {
                query_type: boxed(query_type),
            },
            SomeType::Reference(r) => JsonType::Reference {
                name: r.name.clone(),
                target: self.target_to_object(project, &r.target),
                type_arguments: list(&r.type_arguments),
                package: r.package.clone(),
                external_url: r.external_url.clone(),
                qualified_name: r.qualified_name.clone(),
                refers_to_type_parameter: r.refers_to_type_parameter,
                prefer_values: r.prefer_values,
            },
            SomeType::Reflection { declaration } => match project.get(*declaration) {
                Some(refl) => JsonType::Reflection {
                    declaration: Box::new(self.reflection_to_object(project, refl)),
                },
                None => JsonType::Intrinsic {
                    name: "Object".to_string(),
                },
            },
            SomeType::Rest { element_type } => JsonType::Rest {
                element_type: boxed(element_type),
            },
            SomeType::TemplateLiteral { head, tail } => JsonType::TemplateLiteral {
                head: head.clone(),
                tail: tail
                    .iter()
                    .map(|(t, text)| (self.type_to_object(project, t), text.clone()))
                    .collect(),
            },
            SomeType::Tuple { elements } => JsonType::Tuple {
                elements: list(elements),
            },
            SomeType::TypeOperator { operator, target } => JsonType::TypeOperator {
                operator: operator.clone(),
                target: boxed(target),
            },
            SomeType::Union { types } => JsonType::Union { types: list(types) },
            SomeType::Unknown { name } => JsonType::Unknown { name: name.clone() },
        }
    }

    /// Reflection targets are written as ids; symbols that resolve inside
    /// the project are written as the resolved id.
    fn target_to_object(&self, project: &Project, target: &ReferenceTarget) -> JsonTarget {
        match target {
            ReferenceTarget::Symbol(symbol) => match project.resolve_reference_target(target) {
                Some(id) => JsonTarget::Id(i64::from(id.0)),
                None => JsonTarget::Symbol(symbol.clone()),
            },
            _ => match project.resolve_reference_target(target) {
                Some(id) => JsonTarget::Id(i64::from(id.0)),
                None => JsonTarget::Id(BROKEN_TARGET),
            },
        }
    }

    fn comment_to_object(&self, project: &Project, comment: &Comment) -> JsonComment {
        JsonComment {
            summary: self.parts_to_object(project, &comment.summary),
            block_tags: comment
                .block_tags
                .iter()
                .map(|tag| JsonCommentTag {
                    tag: tag.tag.clone(),
                    name: tag.name.clone(),
                    content: self.parts_to_object(project, &tag.content),
                })
                .collect(),
            modifier_tags: comment.modifier_tags.iter().cloned().collect(),
        }
    }

    fn parts_to_object(&self, project: &Project, parts: &[CommentDisplayPart]) -> Vec<JsonDisplayPart> {
        parts
            .iter()
            .map(|part| match part {
                CommentDisplayPart::Text { text } => JsonDisplayPart::Text { text: text.clone() },
                CommentDisplayPart::Code { text } => JsonDisplayPart::Code { text: text.clone() },
                CommentDisplayPart::InlineTag { tag, text, target } => JsonDisplayPart::InlineTag {
                    tag: tag.clone(),
                    text: text.clone(),
                    target: target.as_ref().map(|t| match t {
                        InlineTagTarget::Reflection(r) => {
                            JsonInlineTarget::Reflection(self.target_to_object(project, r))
                        }
                        InlineTagTarget::Url(url) => JsonInlineTarget::Url(url.clone()),
                    }),
                },
                CommentDisplayPart::RelativeLink {
                    text,
                    target,
                    target_anchor,
                } => JsonDisplayPart::RelativeLink {
                    text: text.clone(),
                    target: target.map(|f| f.0),
                    target_anchor: target_anchor.clone(),
                },
            })
            .collect()
    }

    /// `path` relative to the project root, `/`-separated. Paths outside the
    /// root climb out of it with `..`.
    fn wire_path(&self, path: &Path) -> String {
        relative_path(&self.project_root, path).join("/")
    }
}

/// Components leading from `base` to `path`.
fn relative_path(base: &Path, path: &Path) -> Vec<String> {
    let base: Vec<Component<'_>> = base.components().filter(|c| *c != Component::CurDir).collect();
    let path: Vec<Component<'_>> = path.components().filter(|c| *c != Component::CurDir).collect();

    // A relative path has nothing in common with an absolute root and is
    // already written relative to it.
    if path.first().map(|c| c.as_os_str()) != base.first().map(|c| c.as_os_str())
        && matches!(path.first(), Some(Component::Normal(_) | Component::ParentDir))
    {
        return path.iter().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    }

    let common = base
        .iter()
        .zip(&path)
        .take_while(|(a, b)| a == b)
        .count();
    let climb = base[common..]
        .iter()
        .filter(|c| matches!(c, Component::Normal(_)))
        .map(|_| "..".to_string());
    let descend = path[common..].iter().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        Component::ParentDir => Some("..".to_string()),
        _ => None,
    });
    climb.chain(descend).collect()
}

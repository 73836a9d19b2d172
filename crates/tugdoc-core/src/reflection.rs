//! Reflection nodes: the vertices of the documentation graph.
//!
//! A [`Reflection`] holds the fields every node shares (id, name, kind,
//! flags, parent link, comment, sources) plus a variant-specific payload in
//! [`ReflectionData`]. Structural edges are stored as ids in typed slots
//! (children, signatures, parameters, ...); the reflections themselves live in
//! the project store.
//!
//! [`Reflection::traverse`] visits structural slots in a fixed order:
//!
//! 1. signatures, then get signature, then set signature
//! 2. parameters
//! 3. type parameters
//! 4. index signatures
//! 5. type literal (a declaration embedded in the `type` slot)
//! 6. children
//! 7. documents
//!
//! Removal, merge, and serialization all rely on this order.

use serde::{Deserialize, Serialize};

use crate::comment::{Comment, CommentDisplayPart};
use crate::ids::ReflectionId;
use crate::kind::{ReflectionFlags, ReflectionKind, ReflectionVariant};
use crate::types::{ReferenceTarget, SomeType};

// ============================================================================
// Supporting Types
// ============================================================================

/// Which structural slot of the parent holds a visited reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraverseProperty {
    Children,
    Documents,
    Signatures,
    GetSignature,
    SetSignature,
    IndexSignature,
    Parameters,
    TypeParameter,
    TypeLiteral,
}

/// Where in the source tree a reflection was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    /// Path relative to the project root.
    pub file_name: String,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub character: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SourceReference {
    pub fn new(file_name: impl Into<String>, line: u32, character: u32) -> Self {
        SourceReference {
            file_name: file_name.into(),
            line,
            character,
            url: None,
        }
    }
}

/// A titled group of children, computed from child kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionGroup {
    pub title: String,
    pub children: Vec<ReflectionId>,
}

// ============================================================================
// Variant Payloads
// ============================================================================

/// Slots shared by reflections that contain other declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerData {
    pub children: Vec<ReflectionId>,
    pub documents: Vec<ReflectionId>,
    /// Cached groups; `None` means "not computed yet".
    pub groups: Option<Vec<ReflectionGroup>>,
}

/// Payload of the project root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectData {
    pub container: ContainerData,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub readme: Option<Vec<CommentDisplayPart>>,
}

/// Payload of a declaration (module, class, function, property, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationData {
    pub container: ContainerData,
    pub signatures: Vec<ReflectionId>,
    pub index_signatures: Vec<ReflectionId>,
    pub get_signature: Option<ReflectionId>,
    pub set_signature: Option<ReflectionId>,
    pub type_parameters: Vec<ReflectionId>,
    pub type_: Option<SomeType>,
    pub default_value: Option<String>,
    pub overwrites: Option<SomeType>,
    pub inherited_from: Option<SomeType>,
    pub implementation_of: Option<SomeType>,
    pub extended_types: Vec<SomeType>,
    pub implemented_types: Vec<SomeType>,
    /// Version of the package a merged-in module was built from.
    pub package_version: Option<String>,
}

/// Payload of a call, construct, index, get, or set signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureData {
    pub parameters: Vec<ReflectionId>,
    pub type_parameters: Vec<ReflectionId>,
    /// Return type.
    pub type_: Option<SomeType>,
    pub overwrites: Option<SomeType>,
    pub inherited_from: Option<SomeType>,
    pub implementation_of: Option<SomeType>,
}

/// Payload of a signature parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterData {
    pub type_: Option<SomeType>,
    pub default_value: Option<String>,
}

/// Payload of a type parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeParameterData {
    /// Constraint (`T extends X`).
    pub type_: Option<SomeType>,
    pub default: Option<SomeType>,
    /// `in`, `out`, or `in out`.
    pub variance_modifier: Option<String>,
}

/// Payload of a standalone document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentData {
    pub content: Vec<CommentDisplayPart>,
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    /// Child documents.
    pub children: Vec<ReflectionId>,
}

/// Payload of a re-export alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    pub target: ReferenceTarget,
}

/// Variant-specific payload of a reflection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectionData {
    Project(ProjectData),
    Declaration(DeclarationData),
    Signature(SignatureData),
    Parameter(ParameterData),
    TypeParameter(TypeParameterData),
    Document(DocumentData),
    Reference(ReferenceData),
}

impl ReflectionData {
    /// Variant discriminator of this payload.
    pub fn variant(&self) -> ReflectionVariant {
        match self {
            ReflectionData::Project(_) => ReflectionVariant::Project,
            ReflectionData::Declaration(_) => ReflectionVariant::Declaration,
            ReflectionData::Signature(_) => ReflectionVariant::Signature,
            ReflectionData::Parameter(_) => ReflectionVariant::Param,
            ReflectionData::TypeParameter(_) => ReflectionVariant::TypeParam,
            ReflectionData::Document(_) => ReflectionVariant::Document,
            ReflectionData::Reference(_) => ReflectionVariant::Reference,
        }
    }

    /// Empty payload for `variant`. References start out broken.
    pub fn empty(variant: ReflectionVariant) -> Self {
        match variant {
            ReflectionVariant::Project => ReflectionData::Project(ProjectData::default()),
            ReflectionVariant::Declaration => {
                ReflectionData::Declaration(DeclarationData::default())
            }
            ReflectionVariant::Signature => ReflectionData::Signature(SignatureData::default()),
            ReflectionVariant::Param => ReflectionData::Parameter(ParameterData::default()),
            ReflectionVariant::TypeParam => {
                ReflectionData::TypeParameter(TypeParameterData::default())
            }
            ReflectionVariant::Document => ReflectionData::Document(DocumentData::default()),
            ReflectionVariant::Reference => ReflectionData::Reference(ReferenceData {
                target: ReferenceTarget::Broken,
            }),
        }
    }
}

// ============================================================================
// Reflection
// ============================================================================

/// A node in the documentation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Reflection {
    pub id: ReflectionId,
    pub name: String,
    pub kind: ReflectionKind,
    pub flags: ReflectionFlags,
    /// Non-owning back link; `None` only for the project root.
    pub parent: Option<ReflectionId>,
    pub comment: Option<Comment>,
    pub sources: Vec<SourceReference>,
    pub data: ReflectionData,
}

impl Reflection {
    /// Create a reflection with no comment, flags, or sources.
    pub fn new(
        id: ReflectionId,
        name: impl Into<String>,
        kind: ReflectionKind,
        parent: Option<ReflectionId>,
        data: ReflectionData,
    ) -> Self {
        Reflection {
            id,
            name: name.into(),
            kind,
            flags: ReflectionFlags::empty(),
            parent,
            comment: None,
            sources: Vec::new(),
            data,
        }
    }

    pub fn variant(&self) -> ReflectionVariant {
        self.data.variant()
    }

    pub fn kind_of(&self, mask: ReflectionKind) -> bool {
        self.kind.is(mask)
    }

    pub fn is_project(&self) -> bool {
        matches!(self.data, ReflectionData::Project(_))
    }

    pub fn as_declaration(&self) -> Option<&DeclarationData> {
        match &self.data {
            ReflectionData::Declaration(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_declaration_mut(&mut self) -> Option<&mut DeclarationData> {
        match &mut self.data {
            ReflectionData::Declaration(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<&SignatureData> {
        match &self.data {
            ReflectionData::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceData> {
        match &self.data {
            ReflectionData::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&DocumentData> {
        match &self.data {
            ReflectionData::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Child/document container, for project and declaration reflections.
    pub fn container(&self) -> Option<&ContainerData> {
        match &self.data {
            ReflectionData::Project(p) => Some(&p.container),
            ReflectionData::Declaration(d) => Some(&d.container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match &mut self.data {
            ReflectionData::Project(p) => Some(&mut p.container),
            ReflectionData::Declaration(d) => Some(&mut d.container),
            _ => None,
        }
    }

    /// The primary `type` slot, for variants that have one.
    pub fn type_slot(&self) -> Option<&Option<SomeType>> {
        match &self.data {
            ReflectionData::Declaration(d) => Some(&d.type_),
            ReflectionData::Signature(s) => Some(&s.type_),
            ReflectionData::Parameter(p) => Some(&p.type_),
            ReflectionData::TypeParameter(t) => Some(&t.type_),
            _ => None,
        }
    }

    pub fn type_slot_mut(&mut self) -> Option<&mut Option<SomeType>> {
        match &mut self.data {
            ReflectionData::Declaration(d) => Some(&mut d.type_),
            ReflectionData::Signature(s) => Some(&mut s.type_),
            ReflectionData::Parameter(p) => Some(&mut p.type_),
            ReflectionData::TypeParameter(t) => Some(&mut t.type_),
            _ => None,
        }
    }

    /// Every type tree held by this reflection, primary slot first.
    pub fn types(&self) -> Vec<&SomeType> {
        let mut out = Vec::new();
        match &self.data {
            ReflectionData::Declaration(d) => {
                out.extend(d.type_.as_ref());
                out.extend(d.overwrites.as_ref());
                out.extend(d.inherited_from.as_ref());
                out.extend(d.implementation_of.as_ref());
                out.extend(d.extended_types.iter());
                out.extend(d.implemented_types.iter());
            }
            ReflectionData::Signature(s) => {
                out.extend(s.type_.as_ref());
                out.extend(s.overwrites.as_ref());
                out.extend(s.inherited_from.as_ref());
                out.extend(s.implementation_of.as_ref());
            }
            ReflectionData::Parameter(p) => out.extend(p.type_.as_ref()),
            ReflectionData::TypeParameter(t) => {
                out.extend(t.type_.as_ref());
                out.extend(t.default.as_ref());
            }
            ReflectionData::Project(_)
            | ReflectionData::Document(_)
            | ReflectionData::Reference(_) => {}
        }
        out
    }

    pub fn types_mut(&mut self) -> Vec<&mut SomeType> {
        let mut out = Vec::new();
        match &mut self.data {
            ReflectionData::Declaration(d) => {
                out.extend(d.type_.as_mut());
                out.extend(d.overwrites.as_mut());
                out.extend(d.inherited_from.as_mut());
                out.extend(d.implementation_of.as_mut());
                out.extend(d.extended_types.iter_mut());
                out.extend(d.implemented_types.iter_mut());
            }
            ReflectionData::Signature(s) => {
                out.extend(s.type_.as_mut());
                out.extend(s.overwrites.as_mut());
                out.extend(s.inherited_from.as_mut());
                out.extend(s.implementation_of.as_mut());
            }
            ReflectionData::Parameter(p) => out.extend(p.type_.as_mut()),
            ReflectionData::TypeParameter(t) => {
                out.extend(t.type_.as_mut());
                out.extend(t.default.as_mut());
            }
            ReflectionData::Project(_)
            | ReflectionData::Document(_)
            | ReflectionData::Reference(_) => {}
        }
        out
    }

    /// Structural slots in traversal order.
    pub fn slots(&self) -> Vec<(ReflectionId, TraverseProperty)> {
        use TraverseProperty as P;

        let mut out = Vec::new();
        let tag = |ids: &[ReflectionId], p: P, out: &mut Vec<_>| {
            out.extend(ids.iter().map(|id| (*id, p)));
        };
        let type_literal = |ty: &Option<SomeType>, out: &mut Vec<_>| {
            if let Some(SomeType::Reflection { declaration }) = ty {
                out.push((*declaration, P::TypeLiteral));
            }
        };

        match &self.data {
            ReflectionData::Project(p) => {
                tag(&p.container.children, P::Children, &mut out);
                tag(&p.container.documents, P::Documents, &mut out);
            }
            ReflectionData::Declaration(d) => {
                tag(&d.signatures, P::Signatures, &mut out);
                out.extend(d.get_signature.map(|id| (id, P::GetSignature)));
                out.extend(d.set_signature.map(|id| (id, P::SetSignature)));
                tag(&d.type_parameters, P::TypeParameter, &mut out);
                tag(&d.index_signatures, P::IndexSignature, &mut out);
                type_literal(&d.type_, &mut out);
                tag(&d.container.children, P::Children, &mut out);
                tag(&d.container.documents, P::Documents, &mut out);
            }
            ReflectionData::Signature(s) => {
                tag(&s.parameters, P::Parameters, &mut out);
                tag(&s.type_parameters, P::TypeParameter, &mut out);
                type_literal(&s.type_, &mut out);
            }
            ReflectionData::Parameter(p) => type_literal(&p.type_, &mut out),
            ReflectionData::Document(d) => tag(&d.children, P::Documents, &mut out),
            ReflectionData::TypeParameter(_) | ReflectionData::Reference(_) => {}
        }
        out
    }

    /// Visit structural slots in order. The visitor returns `false` to stop.
    ///
    /// Returns `false` if the walk was stopped early.
    pub fn traverse<F>(&self, mut visitor: F) -> bool
    where
        F: FnMut(ReflectionId, TraverseProperty) -> bool,
    {
        for (id, property) in self.slots() {
            if !visitor(id, property) {
                return false;
            }
        }
        true
    }

    /// Remove `child` from `property`. A type literal is replaced by the
    /// `Object` placeholder. Returns whether anything changed.
    pub fn detach(&mut self, child: ReflectionId, property: TraverseProperty) -> bool {
        use TraverseProperty as P;

        fn drop_id(ids: &mut Vec<ReflectionId>, child: ReflectionId) -> bool {
            let before = ids.len();
            ids.retain(|id| *id != child);
            ids.len() != before
        }
        fn clear(slot: &mut Option<ReflectionId>, child: ReflectionId) -> bool {
            if *slot == Some(child) {
                *slot = None;
                true
            } else {
                false
            }
        }

        match property {
            P::Children => {
                return self
                    .container_mut()
                    .is_some_and(|c| drop_id(&mut c.children, child))
            }
            P::Documents if !matches!(self.data, ReflectionData::Document(_)) => {
                return self
                    .container_mut()
                    .is_some_and(|c| drop_id(&mut c.documents, child))
            }
            _ => {}
        }

        match (&mut self.data, property) {
            (ReflectionData::Document(d), P::Documents) => drop_id(&mut d.children, child),
            (ReflectionData::Declaration(d), P::Signatures) => drop_id(&mut d.signatures, child),
            (ReflectionData::Declaration(d), P::GetSignature) => {
                clear(&mut d.get_signature, child)
            }
            (ReflectionData::Declaration(d), P::SetSignature) => {
                clear(&mut d.set_signature, child)
            }
            (ReflectionData::Declaration(d), P::IndexSignature) => {
                drop_id(&mut d.index_signatures, child)
            }
            (ReflectionData::Declaration(d), P::TypeParameter) => {
                drop_id(&mut d.type_parameters, child)
            }
            (ReflectionData::Signature(s), P::TypeParameter) => {
                drop_id(&mut s.type_parameters, child)
            }
            (ReflectionData::Signature(s), P::Parameters) => drop_id(&mut s.parameters, child),
            (ReflectionData::Declaration(DeclarationData { type_: slot, .. }), P::TypeLiteral)
            | (ReflectionData::Signature(SignatureData { type_: slot, .. }), P::TypeLiteral)
            | (ReflectionData::Parameter(ParameterData { type_: slot, .. }), P::TypeLiteral) => {
                let embedded = matches!(
                    slot,
                    Some(SomeType::Reflection { declaration }) if *declaration == child
                );
                if embedded {
                    *slot = Some(SomeType::object_placeholder());
                }
                embedded
            }
            _ => false,
        }
    }

    /// Place `child` in `property`. Returns `false` if this variant has no
    /// such slot.
    pub fn attach(&mut self, child: ReflectionId, property: TraverseProperty) -> bool {
        use TraverseProperty as P;

        match property {
            P::Children => {
                return match self.container_mut() {
                    Some(c) => {
                        c.children.push(child);
                        true
                    }
                    None => false,
                }
            }
            P::Documents if !matches!(self.data, ReflectionData::Document(_)) => {
                return match self.container_mut() {
                    Some(c) => {
                        c.documents.push(child);
                        true
                    }
                    None => false,
                }
            }
            _ => {}
        }

        match (&mut self.data, property) {
            (ReflectionData::Document(d), P::Documents) => d.children.push(child),
            (ReflectionData::Declaration(d), P::Signatures) => d.signatures.push(child),
            (ReflectionData::Declaration(d), P::GetSignature) => d.get_signature = Some(child),
            (ReflectionData::Declaration(d), P::SetSignature) => d.set_signature = Some(child),
            (ReflectionData::Declaration(d), P::IndexSignature) => {
                d.index_signatures.push(child)
            }
            (ReflectionData::Declaration(d), P::TypeParameter) => d.type_parameters.push(child),
            (ReflectionData::Signature(s), P::TypeParameter) => s.type_parameters.push(child),
            (ReflectionData::Signature(s), P::Parameters) => s.parameters.push(child),
            (ReflectionData::Declaration(DeclarationData { type_: slot, .. }), P::TypeLiteral)
            | (ReflectionData::Signature(SignatureData { type_: slot, .. }), P::TypeLiteral)
            | (ReflectionData::Parameter(ParameterData { type_: slot, .. }), P::TypeLiteral) => {
                *slot = Some(SomeType::reflection(child))
            }
            _ => return false,
        }
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(n: u32) -> ReflectionId {
        ReflectionId::new(n)
    }

    fn function_decl() -> Reflection {
        let mut refl = Reflection::new(
            rid(10),
            "f",
            ReflectionKind::FUNCTION,
            Some(rid(1)),
            ReflectionData::empty(ReflectionVariant::Declaration),
        );
        refl.attach(rid(11), TraverseProperty::Children);
        refl.attach(rid(12), TraverseProperty::Signatures);
        refl.attach(rid(13), TraverseProperty::TypeParameter);
        refl.attach(rid(14), TraverseProperty::TypeLiteral);
        refl.attach(rid(15), TraverseProperty::GetSignature);
        refl.attach(rid(16), TraverseProperty::Documents);
        refl.attach(rid(17), TraverseProperty::IndexSignature);
        refl
    }

    mod traverse_tests {
        use super::*;

        #[test]
        fn visits_in_fixed_order() {
            let refl = function_decl();
            let mut seen = Vec::new();
            assert!(refl.traverse(|id, p| {
                seen.push((id.0, p));
                true
            }));
            assert_eq!(
                seen,
                vec![
                    (12, TraverseProperty::Signatures),
                    (15, TraverseProperty::GetSignature),
                    (13, TraverseProperty::TypeParameter),
                    (17, TraverseProperty::IndexSignature),
                    (14, TraverseProperty::TypeLiteral),
                    (11, TraverseProperty::Children),
                    (16, TraverseProperty::Documents),
                ]
            );
        }

        #[test]
        fn visitor_can_stop_early() {
            let refl = function_decl();
            let mut count = 0;
            let completed = refl.traverse(|_, _| {
                count += 1;
                count < 2
            });
            assert!(!completed);
            assert_eq!(count, 2);
        }

        #[test]
        fn type_literal_only_for_reflection_types() {
            let mut refl = function_decl();
            *refl.type_slot_mut().unwrap() = Some(SomeType::intrinsic("string"));
            assert!(refl
                .slots()
                .iter()
                .all(|(_, p)| *p != TraverseProperty::TypeLiteral));
        }
    }

    mod slot_tests {
        use super::*;

        #[test]
        fn detach_type_literal_leaves_placeholder() {
            let mut refl = function_decl();
            assert!(refl.detach(rid(14), TraverseProperty::TypeLiteral));
            assert_eq!(
                refl.type_slot().unwrap().as_ref(),
                Some(&SomeType::intrinsic("Object"))
            );
            assert!(!refl.detach(rid(14), TraverseProperty::TypeLiteral));
        }

        #[test]
        fn detach_removes_from_named_slot_only() {
            let mut refl = function_decl();
            assert!(!refl.detach(rid(12), TraverseProperty::Children));
            assert!(refl.detach(rid(12), TraverseProperty::Signatures));
            assert!(refl.detach(rid(15), TraverseProperty::GetSignature));
            let decl = refl.as_declaration().unwrap();
            assert!(decl.signatures.is_empty());
            assert!(decl.get_signature.is_none());
        }

        #[test]
        fn attach_rejects_missing_slots() {
            let mut param = Reflection::new(
                rid(2),
                "x",
                ReflectionKind::PARAMETER,
                Some(rid(1)),
                ReflectionData::empty(ReflectionVariant::Param),
            );
            assert!(!param.attach(rid(3), TraverseProperty::Children));
            assert!(param.attach(rid(3), TraverseProperty::TypeLiteral));
        }

        #[test]
        fn types_lists_every_type_tree() {
            let mut refl = function_decl();
            if let Some(d) = refl.as_declaration_mut() {
                d.extended_types.push(SomeType::intrinsic("Base"));
                d.overwrites = Some(SomeType::intrinsic("Other"));
            }
            assert_eq!(refl.types().len(), 3);
        }
    }
}

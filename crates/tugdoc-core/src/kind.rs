//! Reflection kinds, flags, and variant discriminators.
//!
//! - [`ReflectionKind`]: bitmask describing the semantic role of a reflection
//!   (module, class, function, ...). Composite masks such as
//!   [`ReflectionKind::CLASS_OR_INTERFACE`] support kind queries.
//! - [`ReflectionFlags`]: modifiers attached to a reflection (private, static,
//!   optional, ...).
//! - [`ReflectionVariant`]: the discriminator selecting the concrete shape of a
//!   reflection. This is the `variant` field of the wire schema.
//!
//! On the wire, kinds are plain numbers and flags are objects of booleans
//! (`{"isPrivate": true}`).

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// ============================================================================
// Reflection Kind
// ============================================================================

bitflags! {
    /// Semantic role of a reflection.
    ///
    /// Every reflection carries exactly one of the single-bit kinds. The
    /// composite constants are masks for queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ReflectionKind: u32 {
        const PROJECT = 0x1;
        const MODULE = 0x2;
        const NAMESPACE = 0x4;
        const ENUM = 0x8;
        const ENUM_MEMBER = 0x10;
        const VARIABLE = 0x20;
        const FUNCTION = 0x40;
        const CLASS = 0x80;
        const INTERFACE = 0x100;
        const CONSTRUCTOR = 0x200;
        const PROPERTY = 0x400;
        const METHOD = 0x800;
        const CALL_SIGNATURE = 0x1000;
        const INDEX_SIGNATURE = 0x2000;
        const CONSTRUCTOR_SIGNATURE = 0x4000;
        const PARAMETER = 0x8000;
        const TYPE_LITERAL = 0x10000;
        const TYPE_PARAMETER = 0x20000;
        const ACCESSOR = 0x40000;
        const GET_SIGNATURE = 0x80000;
        const SET_SIGNATURE = 0x100000;
        const TYPE_ALIAS = 0x200000;
        const REFERENCE = 0x400000;
        const DOCUMENT = 0x800000;

        const CLASS_OR_INTERFACE = Self::CLASS.bits() | Self::INTERFACE.bits();
        const VARIABLE_OR_PROPERTY = Self::VARIABLE.bits() | Self::PROPERTY.bits();
        const FUNCTION_OR_METHOD = Self::FUNCTION.bits() | Self::METHOD.bits();
        const SOME_MODULE = Self::MODULE.bits() | Self::NAMESPACE.bits();
        const SOME_SIGNATURE = Self::CALL_SIGNATURE.bits()
            | Self::INDEX_SIGNATURE.bits()
            | Self::CONSTRUCTOR_SIGNATURE.bits()
            | Self::GET_SIGNATURE.bits()
            | Self::SET_SIGNATURE.bits();
        const SOME_EXPORT = Self::SOME_MODULE.bits()
            | Self::ENUM.bits()
            | Self::VARIABLE.bits()
            | Self::FUNCTION.bits()
            | Self::CLASS_OR_INTERFACE.bits()
            | Self::TYPE_ALIAS.bits()
            | Self::REFERENCE.bits();
    }
}

/// Order in which kinds are grouped when computing container groups.
const GROUP_ORDER: &[ReflectionKind] = &[
    ReflectionKind::DOCUMENT,
    ReflectionKind::PROJECT,
    ReflectionKind::MODULE,
    ReflectionKind::NAMESPACE,
    ReflectionKind::ENUM,
    ReflectionKind::ENUM_MEMBER,
    ReflectionKind::CLASS,
    ReflectionKind::INTERFACE,
    ReflectionKind::TYPE_ALIAS,
    ReflectionKind::CONSTRUCTOR,
    ReflectionKind::PROPERTY,
    ReflectionKind::VARIABLE,
    ReflectionKind::FUNCTION,
    ReflectionKind::ACCESSOR,
    ReflectionKind::METHOD,
    ReflectionKind::REFERENCE,
];

impl ReflectionKind {
    /// True when this kind shares at least one bit with `mask`.
    pub fn is(self, mask: ReflectionKind) -> bool {
        self.intersects(mask)
    }

    /// Human-readable singular name ("Class", "Type Alias", ...).
    pub fn singular_name(self) -> &'static str {
        match self {
            k if k == Self::PROJECT => "Project",
            k if k == Self::MODULE => "Module",
            k if k == Self::NAMESPACE => "Namespace",
            k if k == Self::ENUM => "Enumeration",
            k if k == Self::ENUM_MEMBER => "Enumeration Member",
            k if k == Self::VARIABLE => "Variable",
            k if k == Self::FUNCTION => "Function",
            k if k == Self::CLASS => "Class",
            k if k == Self::INTERFACE => "Interface",
            k if k == Self::CONSTRUCTOR => "Constructor",
            k if k == Self::PROPERTY => "Property",
            k if k == Self::METHOD => "Method",
            k if k == Self::CALL_SIGNATURE => "Call Signature",
            k if k == Self::INDEX_SIGNATURE => "Index Signature",
            k if k == Self::CONSTRUCTOR_SIGNATURE => "Constructor Signature",
            k if k == Self::PARAMETER => "Parameter",
            k if k == Self::TYPE_LITERAL => "Type Literal",
            k if k == Self::TYPE_PARAMETER => "Type Parameter",
            k if k == Self::ACCESSOR => "Accessor",
            k if k == Self::GET_SIGNATURE => "Get Signature",
            k if k == Self::SET_SIGNATURE => "Set Signature",
            k if k == Self::TYPE_ALIAS => "Type Alias",
            k if k == Self::REFERENCE => "Reference",
            k if k == Self::DOCUMENT => "Document",
            _ => "Unknown",
        }
    }

    /// Human-readable plural name, used as a group title.
    pub fn plural_name(self) -> &'static str {
        match self {
            k if k == Self::PROJECT => "Projects",
            k if k == Self::MODULE => "Modules",
            k if k == Self::NAMESPACE => "Namespaces",
            k if k == Self::ENUM => "Enumerations",
            k if k == Self::ENUM_MEMBER => "Enumeration Members",
            k if k == Self::VARIABLE => "Variables",
            k if k == Self::FUNCTION => "Functions",
            k if k == Self::CLASS => "Classes",
            k if k == Self::INTERFACE => "Interfaces",
            k if k == Self::CONSTRUCTOR => "Constructors",
            k if k == Self::PROPERTY => "Properties",
            k if k == Self::METHOD => "Methods",
            k if k == Self::ACCESSOR => "Accessors",
            k if k == Self::TYPE_ALIAS => "Type Aliases",
            k if k == Self::REFERENCE => "References",
            k if k == Self::DOCUMENT => "Documents",
            _ => "Other",
        }
    }

    /// Position of this kind in the group ordering. Unlisted kinds sort last.
    pub fn group_rank(self) -> usize {
        GROUP_ORDER
            .iter()
            .position(|k| *k == self)
            .unwrap_or(GROUP_ORDER.len())
    }
}

impl fmt::Display for ReflectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular_name())
    }
}

impl Serialize for ReflectionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for ReflectionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(ReflectionKind::from_bits_retain)
    }
}

// ============================================================================
// Reflection Flags
// ============================================================================

bitflags! {
    /// Modifiers attached to a reflection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReflectionFlags: u32 {
        const PRIVATE = 0x1;
        const PROTECTED = 0x2;
        const PUBLIC = 0x4;
        const STATIC = 0x8;
        const EXTERNAL = 0x10;
        const OPTIONAL = 0x20;
        const REST = 0x40;
        const ABSTRACT = 0x80;
        const CONST = 0x100;
        const READONLY = 0x200;
        const INHERITED = 0x400;
    }
}

impl Default for ReflectionFlags {
    fn default() -> Self {
        ReflectionFlags::empty()
    }
}

/// Wire names for each flag, in serialization order.
const FLAG_NAMES: &[(&str, ReflectionFlags)] = &[
    ("isPrivate", ReflectionFlags::PRIVATE),
    ("isProtected", ReflectionFlags::PROTECTED),
    ("isPublic", ReflectionFlags::PUBLIC),
    ("isStatic", ReflectionFlags::STATIC),
    ("isExternal", ReflectionFlags::EXTERNAL),
    ("isOptional", ReflectionFlags::OPTIONAL),
    ("isRest", ReflectionFlags::REST),
    ("isAbstract", ReflectionFlags::ABSTRACT),
    ("isConst", ReflectionFlags::CONST),
    ("isReadonly", ReflectionFlags::READONLY),
    ("isInherited", ReflectionFlags::INHERITED),
];

impl Serialize for ReflectionFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, flag) in FLAG_NAMES {
            if self.contains(*flag) {
                map.serialize_entry(name, &true)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ReflectionFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
        let mut flags = ReflectionFlags::empty();
        for (name, flag) in FLAG_NAMES {
            if raw.get(*name).copied().unwrap_or(false) {
                flags |= *flag;
            }
        }
        Ok(flags)
    }
}

// ============================================================================
// Reflection Variant
// ============================================================================

/// Discriminator selecting which concrete shape a reflection has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReflectionVariant {
    Project,
    Declaration,
    Signature,
    Param,
    TypeParam,
    Document,
    Reference,
}

impl ReflectionVariant {
    /// Wire name of the variant.
    pub fn as_str(self) -> &'static str {
        match self {
            ReflectionVariant::Project => "project",
            ReflectionVariant::Declaration => "declaration",
            ReflectionVariant::Signature => "signature",
            ReflectionVariant::Param => "param",
            ReflectionVariant::TypeParam => "typeParam",
            ReflectionVariant::Document => "document",
            ReflectionVariant::Reference => "reference",
        }
    }
}

impl fmt::Display for ReflectionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod kind_tests {
        use super::*;

        #[test]
        fn composite_masks_match_members() {
            assert!(ReflectionKind::CLASS.is(ReflectionKind::CLASS_OR_INTERFACE));
            assert!(ReflectionKind::INTERFACE.is(ReflectionKind::CLASS_OR_INTERFACE));
            assert!(!ReflectionKind::FUNCTION.is(ReflectionKind::CLASS_OR_INTERFACE));
            assert!(ReflectionKind::GET_SIGNATURE.is(ReflectionKind::SOME_SIGNATURE));
        }

        #[test]
        fn kind_serializes_as_number() {
            let json = serde_json::to_string(&ReflectionKind::CLASS).unwrap();
            assert_eq!(json, "128");
            let back: ReflectionKind = serde_json::from_str("128").unwrap();
            assert_eq!(back, ReflectionKind::CLASS);
        }

        #[test]
        fn group_rank_orders_documents_first() {
            assert!(ReflectionKind::DOCUMENT.group_rank() < ReflectionKind::CLASS.group_rank());
            assert!(ReflectionKind::CLASS.group_rank() < ReflectionKind::FUNCTION.group_rank());
            assert_eq!(
                ReflectionKind::PARAMETER.group_rank(),
                GROUP_ORDER.len(),
                "ungrouped kinds sort last"
            );
        }
    }

    mod flag_tests {
        use super::*;

        #[test]
        fn flags_serialize_as_boolean_object() {
            let flags = ReflectionFlags::PRIVATE | ReflectionFlags::STATIC;
            let json = serde_json::to_string(&flags).unwrap();
            assert_eq!(json, r#"{"isPrivate":true,"isStatic":true}"#);
        }

        #[test]
        fn flags_ignore_false_and_unknown_entries() {
            let flags: ReflectionFlags =
                serde_json::from_str(r#"{"isOptional":true,"isRest":false,"isShiny":true}"#)
                    .unwrap();
            assert_eq!(flags, ReflectionFlags::OPTIONAL);
        }
    }

    #[test]
    fn variant_wire_names() {
        let json = serde_json::to_string(&ReflectionVariant::TypeParam).unwrap();
        assert_eq!(json, r#""typeParam""#);
        assert_eq!(ReflectionVariant::Param.as_str(), "param");
    }
}

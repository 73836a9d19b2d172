//! Wire schema: the versioned JSON shape of a serialized project.
//!
//! The top-level object is the root reflection's fields plus
//! `schemaVersion`, `symbolIdMap`, and `files`. Every reflection object
//! carries `variant`; every type object carries `type`. Ids on the wire are
//! the ids of the producing store and mean nothing to the reader beyond
//! linking objects within one document.
//!
//! Keys the schema does not know are preserved in [`JsonReflection::extra`]
//! so extension components can read and write them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::SymbolId;
use crate::kind::{ReflectionFlags, ReflectionKind, ReflectionVariant};
use crate::reflection::SourceReference;
use crate::types::{LiteralValue, MappedModifier};

/// Schema version written by the serializer.
pub const SCHEMA_VERSION: &str = "2.0";

/// Schema versions the deserializer accepts.
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &[SCHEMA_VERSION];

/// Wire value of a broken reference target.
pub const BROKEN_TARGET: i64 = -1;

// ============================================================================
// Project
// ============================================================================

/// A serialized project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonProject {
    pub schema_version: String,
    #[serde(flatten)]
    pub root: JsonReflection,
    /// Reflection id (as a string key) → symbol identity.
    #[serde(default)]
    pub symbol_id_map: BTreeMap<String, SymbolId>,
    #[serde(default)]
    pub files: JsonFileRegistry,
}

/// Serialized file registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonFileRegistry {
    /// File id → path relative to the project root, `/`-separated.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
    /// File id → reflection id.
    #[serde(default)]
    pub reflections: BTreeMap<String, u32>,
}

// ============================================================================
// Reflections
// ============================================================================

/// A serialized reflection of any variant.
///
/// Fields that do not apply to a variant are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReflection {
    pub id: u32,
    pub name: String,
    pub variant: ReflectionVariant,
    pub kind: ReflectionKind,
    #[serde(default)]
    pub flags: ReflectionFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<JsonComment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceReference>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<JsonGroup>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_signatures: Option<Vec<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_signature: Option<Box<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_signature: Option<Box<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_parameters: Option<Vec<JsonReflection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<JsonReflection>>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<JsonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance_modifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<JsonTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrites: Option<JsonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<JsonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_of: Option<JsonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_types: Option<Vec<JsonType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implemented_types: Option<Vec<JsonType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<JsonDisplayPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<Vec<JsonDisplayPart>>,

    /// Keys not covered above, kept for extension components.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JsonReflection {
    /// Object with only the shared fields set.
    pub fn new(id: u32, name: impl Into<String>, variant: ReflectionVariant, kind: ReflectionKind) -> Self {
        JsonReflection {
            id,
            name: name.into(),
            variant,
            kind,
            flags: ReflectionFlags::empty(),
            comment: None,
            sources: None,
            children: None,
            documents: None,
            groups: None,
            signatures: None,
            index_signatures: None,
            get_signature: None,
            set_signature: None,
            type_parameters: None,
            parameters: None,
            type_: None,
            default_value: None,
            default: None,
            variance_modifier: None,
            target: None,
            overwrites: None,
            inherited_from: None,
            implementation_of: None,
            extended_types: None,
            implemented_types: None,
            content: None,
            frontmatter: None,
            package_name: None,
            package_version: None,
            readme: None,
            extra: BTreeMap::new(),
        }
    }
}

/// A serialized group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonGroup {
    pub title: String,
    #[serde(default)]
    pub children: Vec<u32>,
}

/// Reference target: a reflection id, [`BROKEN_TARGET`], or an external
/// symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTarget {
    Id(i64),
    Symbol(SymbolId),
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonComment {
    #[serde(default)]
    pub summary: Vec<JsonDisplayPart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_tags: Vec<JsonCommentTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifier_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCommentTag {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Vec<JsonDisplayPart>,
}

/// A serialized display part, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum JsonDisplayPart {
    Text {
        text: String,
    },
    Code {
        text: String,
    },
    InlineTag {
        tag: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<JsonInlineTarget>,
    },
    RelativeLink {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_anchor: Option<String>,
    },
}

/// Inline tag target: a reflection target or a URL string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonInlineTarget {
    Reflection(JsonTarget),
    Url(String),
}

// ============================================================================
// Types
// ============================================================================

/// A serialized type node, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum JsonType {
    Array {
        element_type: Box<JsonType>,
    },
    Conditional {
        check_type: Box<JsonType>,
        extends_type: Box<JsonType>,
        true_type: Box<JsonType>,
        false_type: Box<JsonType>,
    },
    IndexedAccess {
        object_type: Box<JsonType>,
        index_type: Box<JsonType>,
    },
    Inferred {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<Box<JsonType>>,
    },
    Intersection {
        types: Vec<JsonType>,
    },
    Intrinsic {
        name: String,
    },
    Literal {
        value: LiteralValue,
    },
    Mapped {
        parameter: String,
        parameter_type: Box<JsonType>,
        template_type: Box<JsonType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        readonly_modifier: Option<MappedModifier>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        optional_modifier: Option<MappedModifier>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name_type: Option<Box<JsonType>>,
    },
    NamedTupleMember {
        name: String,
        #[serde(default)]
        is_optional: bool,
        element: Box<JsonType>,
    },
    Optional {
        element_type: Box<JsonType>,
    },
    Predicate {
        name: String,
        #[serde(default)]
        asserts: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_type: Option<Box<JsonType>>,
    },
    Query {
        query_type: Box<JsonType>,
    },
    Reference {
        name: String,
        target: JsonTarget,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_arguments: Vec<JsonType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        qualified_name: Option<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        refers_to_type_parameter: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        prefer_values: bool,
    },
    Reflection {
        declaration: Box<JsonReflection>,
    },
    Rest {
        element_type: Box<JsonType>,
    },
    TemplateLiteral {
        head: String,
        #[serde(default)]
        tail: Vec<(JsonType, String)>,
    },
    Tuple {
        #[serde(default)]
        elements: Vec<JsonType>,
    },
    TypeOperator {
        operator: String,
        target: Box<JsonType>,
    },
    Union {
        types: Vec<JsonType>,
    },
    Unknown {
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_nodes_are_tagged_by_type() {
        let ty = JsonType::Array {
            element_type: Box::new(JsonType::Intrinsic {
                name: "string".into(),
            }),
        };
        assert_eq!(
            serde_json::to_value(&ty).unwrap(),
            json!({"type": "array", "elementType": {"type": "intrinsic", "name": "string"}})
        );
    }

    #[test]
    fn reference_targets_parse_all_shapes() {
        let by_id: JsonType =
            serde_json::from_value(json!({"type": "reference", "name": "A", "target": 4})).unwrap();
        let broken: JsonType =
            serde_json::from_value(json!({"type": "reference", "name": "B", "target": -1})).unwrap();
        let symbol: JsonType = serde_json::from_value(json!({
            "type": "reference",
            "name": "C",
            "target": {"packageName": "p", "packagePath": "a.ts", "qualifiedName": "C"}
        }))
        .unwrap();

        assert!(matches!(by_id, JsonType::Reference { target: JsonTarget::Id(4), .. }));
        assert!(matches!(broken, JsonType::Reference { target: JsonTarget::Id(BROKEN_TARGET), .. }));
        assert!(matches!(symbol, JsonType::Reference { target: JsonTarget::Symbol(_), .. }));
    }

    #[test]
    fn display_parts_use_kebab_kinds() {
        let part: JsonDisplayPart = serde_json::from_value(json!({
            "kind": "relative-link",
            "text": "guide",
            "target": 2,
            "targetAnchor": "intro"
        }))
        .unwrap();
        assert_eq!(
            part,
            JsonDisplayPart::RelativeLink {
                text: "guide".into(),
                target: Some(2),
                target_anchor: Some("intro".into()),
            }
        );

        let url: JsonDisplayPart = serde_json::from_value(json!({
            "kind": "inline-tag", "tag": "@link", "text": "x", "target": "https://example.com"
        }))
        .unwrap();
        assert!(matches!(
            url,
            JsonDisplayPart::InlineTag { target: Some(JsonInlineTarget::Url(_)), .. }
        ));
    }

    #[test]
    fn project_document_keeps_unknown_keys() {
        let doc: JsonProject = serde_json::from_value(json!({
            "schemaVersion": "2.0",
            "id": 0,
            "name": "demo",
            "variant": "project",
            "kind": 1,
            "flags": {},
            "customPlugin": {"enabled": true},
            "symbolIdMap": {},
            "files": {"entries": {}, "reflections": {}}
        }))
        .unwrap();
        assert_eq!(doc.schema_version, "2.0");
        assert_eq!(doc.root.name, "demo");
        assert_eq!(doc.root.extra.get("customPlugin"), Some(&json!({"enabled": true})));
        assert!(!doc.root.extra.contains_key("schemaVersion"));
    }
}

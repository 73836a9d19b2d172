//! Type model: recursive, value-like type nodes attached to reflections.
//!
//! [`SomeType`] is a tagged union covering every type shape the semantic
//! engine can describe. Type trees are plain values owned by the reflection
//! whose slot holds them. The one exception is [`SomeType::Reflection`]: it
//! embeds a declaration (an object or function type literal) that lives in the
//! project store and is referenced here by id. Whoever overwrites a type slot
//! must first remove those embedded declarations
//! (see `Project::remove_type_reflections`).
//!
//! Cross references from types to reflections go through [`ReferenceTarget`],
//! which is either a reflection id, an external symbol that is resolved
//! lazily through the symbol index, or broken.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ReflectionId, SymbolId};

// ============================================================================
// Supporting Types
// ============================================================================

/// What a reference (type or reflection) points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    /// A reflection in the same project.
    Reflection(ReflectionId),
    /// An external symbol, resolved through the project's symbol index.
    Symbol(SymbolId),
    /// The target was removed or never existed.
    Broken,
}

impl ReferenceTarget {
    /// The reflection id if this target points directly at one.
    pub fn reflection_id(&self) -> Option<ReflectionId> {
        match self {
            ReferenceTarget::Reflection(id) => Some(*id),
            _ => None,
        }
    }

    /// True if the target is known to be broken.
    pub fn is_broken(&self) -> bool {
        matches!(self, ReferenceTarget::Broken)
    }
}

/// Value of a literal type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt { negative: bool, value: String },
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::String(s) => write!(f, "{:?}", s),
            LiteralValue::BigInt { negative, value } => {
                write!(f, "{}{}n", if *negative { "-" } else { "" }, value)
            }
        }
    }
}

/// `+` / `-` modifiers on mapped types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappedModifier {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Remove,
}

impl MappedModifier {
    fn as_str(self) -> &'static str {
        match self {
            MappedModifier::Add => "+",
            MappedModifier::Remove => "-",
        }
    }
}

/// A named reference to another type, optionally with type arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceType {
    /// Name as written at the use site.
    pub name: String,
    /// What the reference resolves to.
    pub target: ReferenceTarget,
    /// Generic arguments.
    pub type_arguments: Vec<SomeType>,
    /// Package the target was declared in, for external references.
    pub package: Option<String>,
    /// Documentation URL for external references.
    pub external_url: Option<String>,
    /// Fully qualified name of the target.
    pub qualified_name: Option<String>,
    /// The name refers to a type parameter in scope.
    pub refers_to_type_parameter: bool,
    /// Links should prefer the value meaning of the name.
    pub prefer_values: bool,
}

impl ReferenceType {
    /// Create a reference with no type arguments.
    pub fn new(name: impl Into<String>, target: ReferenceTarget) -> Self {
        ReferenceType {
            name: name.into(),
            target,
            type_arguments: Vec::new(),
            package: None,
            external_url: None,
            qualified_name: None,
            refers_to_type_parameter: false,
            prefer_values: false,
        }
    }

    /// Attach generic type arguments.
    pub fn with_type_arguments(mut self, args: Vec<SomeType>) -> Self {
        self.type_arguments = args;
        self
    }

    /// Attach the declaring package.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }
}

// ============================================================================
// SomeType
// ============================================================================

/// A node in a type tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SomeType {
    /// `T[]`
    Array { element_type: Box<SomeType> },
    /// `C extends E ? T : F`
    Conditional {
        check_type: Box<SomeType>,
        extends_type: Box<SomeType>,
        true_type: Box<SomeType>,
        false_type: Box<SomeType>,
    },
    /// `O[I]`
    IndexedAccess {
        object_type: Box<SomeType>,
        index_type: Box<SomeType>,
    },
    /// `infer N extends C`
    Inferred {
        name: String,
        constraint: Option<Box<SomeType>>,
    },
    /// `A & B`
    Intersection { types: Vec<SomeType> },
    /// `string`, `number`, `Object`, ...
    Intrinsic { name: String },
    /// `"a"`, `1`, `true`, `null`, `1n`
    Literal { value: LiteralValue },
    /// `{ [K in P]: T }`
    Mapped {
        parameter: String,
        parameter_type: Box<SomeType>,
        template_type: Box<SomeType>,
        readonly_modifier: Option<MappedModifier>,
        optional_modifier: Option<MappedModifier>,
        name_type: Option<Box<SomeType>>,
    },
    /// `[name?: T]` element of a tuple.
    NamedTupleMember {
        name: String,
        is_optional: bool,
        element: Box<SomeType>,
    },
    /// `T?` element of a tuple.
    Optional { element_type: Box<SomeType> },
    /// `x is T` / `asserts x`
    Predicate {
        name: String,
        asserts: bool,
        target_type: Option<Box<SomeType>>,
    },
    /// `typeof x`
    Query { query_type: Box<SomeType> },
    /// A named reference.
    Reference(ReferenceType),
    /// An object or function type literal embedding a declaration.
    Reflection { declaration: ReflectionId },
    /// `...T` element of a tuple.
    Rest { element_type: Box<SomeType> },
    /// `` `head${T}tail` ``
    TemplateLiteral {
        head: String,
        tail: Vec<(SomeType, String)>,
    },
    /// `[A, B]`
    Tuple { elements: Vec<SomeType> },
    /// `keyof T`, `unique T`, `readonly T`
    TypeOperator {
        operator: String,
        target: Box<SomeType>,
    },
    /// `A | B`
    Union { types: Vec<SomeType> },
    /// A type the engine could not describe; `name` holds its source text.
    Unknown { name: String },
}

impl SomeType {
    /// Create an intrinsic type.
    pub fn intrinsic(name: impl Into<String>) -> Self {
        SomeType::Intrinsic { name: name.into() }
    }

    /// Create a reference type.
    pub fn reference(name: impl Into<String>, target: ReferenceTarget) -> Self {
        SomeType::Reference(ReferenceType::new(name, target))
    }

    /// Create an array type.
    pub fn array(element: SomeType) -> Self {
        SomeType::Array {
            element_type: Box::new(element),
        }
    }

    /// Create a union type.
    pub fn union(types: Vec<SomeType>) -> Self {
        SomeType::Union { types }
    }

    /// Create an intersection type.
    pub fn intersection(types: Vec<SomeType>) -> Self {
        SomeType::Intersection { types }
    }

    /// Create a literal type.
    pub fn literal(value: LiteralValue) -> Self {
        SomeType::Literal { value }
    }

    /// Create a tuple type.
    pub fn tuple(elements: Vec<SomeType>) -> Self {
        SomeType::Tuple { elements }
    }

    /// Create an unknown type carrying its source text.
    pub fn unknown(name: impl Into<String>) -> Self {
        SomeType::Unknown { name: name.into() }
    }

    /// Create a reflection type embedding `declaration`.
    pub fn reflection(declaration: ReflectionId) -> Self {
        SomeType::Reflection { declaration }
    }

    /// Placeholder used when an embedded type literal is removed.
    pub fn object_placeholder() -> Self {
        SomeType::intrinsic("Object")
    }

    /// Wire discriminator of this node.
    pub fn type_name(&self) -> &'static str {
        match self {
            SomeType::Array { .. } => "array",
            SomeType::Conditional { .. } => "conditional",
            SomeType::IndexedAccess { .. } => "indexedAccess",
            SomeType::Inferred { .. } => "inferred",
            SomeType::Intersection { .. } => "intersection",
            SomeType::Intrinsic { .. } => "intrinsic",
            SomeType::Literal { .. } => "literal",
            SomeType::Mapped { .. } => "mapped",
            SomeType::NamedTupleMember { .. } => "namedTupleMember",
            SomeType::Optional { .. } => "optional",
            SomeType::Predicate { .. } => "predicate",
            SomeType::Query { .. } => "query",
            SomeType::Reference(_) => "reference",
            SomeType::Reflection { .. } => "reflection",
            SomeType::Rest { .. } => "rest",
            SomeType::TemplateLiteral { .. } => "templateLiteral",
            SomeType::Tuple { .. } => "tuple",
            SomeType::TypeOperator { .. } => "typeOperator",
            SomeType::Union { .. } => "union",
            SomeType::Unknown { .. } => "unknown",
        }
    }

    /// Direct child type nodes, in declaration order.
    pub fn children(&self) -> Vec<&SomeType> {
        match self {
            SomeType::Array { element_type }
            | SomeType::Optional { element_type }
            | SomeType::Rest { element_type } => vec![element_type.as_ref()],
            SomeType::Conditional {
                check_type,
                extends_type,
                true_type,
                false_type,
            } => vec![check_type, extends_type, true_type, false_type]
                .into_iter()
                .map(|t| t.as_ref())
                .collect(),
            SomeType::IndexedAccess {
                object_type,
                index_type,
            } => vec![object_type.as_ref(), index_type.as_ref()],
            SomeType::Inferred { constraint, .. } => constraint.as_deref().into_iter().collect(),
            SomeType::Intersection { types } | SomeType::Union { types } => types.iter().collect(),
            SomeType::Tuple { elements } => elements.iter().collect(),
            SomeType::Mapped {
                parameter_type,
                template_type,
                name_type,
                ..
            } => {
                let mut out = vec![parameter_type.as_ref(), template_type.as_ref()];
                out.extend(name_type.as_deref());
                out
            }
            SomeType::NamedTupleMember { element, .. } => vec![element.as_ref()],
            SomeType::Predicate { target_type, .. } => {
                target_type.as_deref().into_iter().collect()
            }
            SomeType::Query { query_type } => vec![query_type.as_ref()],
            SomeType::Reference(r) => r.type_arguments.iter().collect(),
            SomeType::TemplateLiteral { tail, .. } => tail.iter().map(|(t, _)| t).collect(),
            SomeType::TypeOperator { target, .. } => vec![target.as_ref()],
            SomeType::Intrinsic { .. }
            | SomeType::Literal { .. }
            | SomeType::Reflection { .. }
            | SomeType::Unknown { .. } => Vec::new(),
        }
    }

    /// Direct child type nodes, mutably.
    pub fn children_mut(&mut self) -> Vec<&mut SomeType> {
        match self {
            SomeType::Array { element_type }
            | SomeType::Optional { element_type }
            | SomeType::Rest { element_type } => vec![element_type.as_mut()],
            SomeType::Conditional {
                check_type,
                extends_type,
                true_type,
                false_type,
            } => vec![
                check_type.as_mut(),
                extends_type.as_mut(),
                true_type.as_mut(),
                false_type.as_mut(),
            ],
            SomeType::IndexedAccess {
                object_type,
                index_type,
            } => vec![object_type.as_mut(), index_type.as_mut()],
            SomeType::Inferred { constraint, .. } => {
                constraint.as_deref_mut().into_iter().collect()
            }
            SomeType::Intersection { types } | SomeType::Union { types } => {
                types.iter_mut().collect()
            }
            SomeType::Tuple { elements } => elements.iter_mut().collect(),
            SomeType::Mapped {
                parameter_type,
                template_type,
                name_type,
                ..
            } => {
                let mut out = vec![parameter_type.as_mut(), template_type.as_mut()];
                out.extend(name_type.as_deref_mut());
                out
            }
            SomeType::NamedTupleMember { element, .. } => vec![element.as_mut()],
            SomeType::Predicate { target_type, .. } => {
                target_type.as_deref_mut().into_iter().collect()
            }
            SomeType::Query { query_type } => vec![query_type.as_mut()],
            SomeType::Reference(r) => r.type_arguments.iter_mut().collect(),
            SomeType::TemplateLiteral { tail, .. } => tail.iter_mut().map(|(t, _)| t).collect(),
            SomeType::TypeOperator { target, .. } => vec![target.as_mut()],
            SomeType::Intrinsic { .. }
            | SomeType::Literal { .. }
            | SomeType::Reflection { .. }
            | SomeType::Unknown { .. } => Vec::new(),
        }
    }

    /// Pre-order walk over this node and every descendant.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a SomeType)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Pre-order walk with mutable access.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut SomeType)) {
        f(self);
        for child in self.children_mut() {
            child.walk_mut(f);
        }
    }

    /// Ids of every declaration embedded anywhere in this tree.
    pub fn embedded_declarations(&self) -> Vec<ReflectionId> {
        let mut out = Vec::new();
        self.walk(&mut |t| {
            if let SomeType::Reflection { declaration } = t {
                out.push(*declaration);
            }
        });
        out
    }

    /// True if rendering this node inside an array or operator needs parens.
    fn needs_parens(&self) -> bool {
        matches!(
            self,
            SomeType::Union { .. }
                | SomeType::Intersection { .. }
                | SomeType::Conditional { .. }
                | SomeType::TypeOperator { .. }
                | SomeType::Inferred { .. }
        )
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[SomeType], sep: &str) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

impl fmt::Display for SomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SomeType::Array { element_type } => {
                if element_type.needs_parens() {
                    write!(f, "({})[]", element_type)
                } else {
                    write!(f, "{}[]", element_type)
                }
            }
            SomeType::Conditional {
                check_type,
                extends_type,
                true_type,
                false_type,
            } => write!(
                f,
                "{} extends {} ? {} : {}",
                check_type, extends_type, true_type, false_type
            ),
            SomeType::IndexedAccess {
                object_type,
                index_type,
            } => write!(f, "{}[{}]", object_type, index_type),
            SomeType::Inferred { name, constraint } => match constraint {
                Some(c) => write!(f, "infer {} extends {}", name, c),
                None => write!(f, "infer {}", name),
            },
            SomeType::Intersection { types } => write_joined(f, types, " & "),
            SomeType::Intrinsic { name } | SomeType::Unknown { name } => f.write_str(name),
            SomeType::Literal { value } => write!(f, "{}", value),
            SomeType::Mapped {
                parameter,
                parameter_type,
                template_type,
                readonly_modifier,
                optional_modifier,
                name_type,
            } => {
                f.write_str("{ ")?;
                if let Some(m) = readonly_modifier {
                    write!(f, "{}readonly ", m.as_str())?;
                }
                write!(f, "[{} in {}", parameter, parameter_type)?;
                if let Some(n) = name_type {
                    write!(f, " as {}", n)?;
                }
                f.write_str("]")?;
                if let Some(m) = optional_modifier {
                    write!(f, "{}?", m.as_str())?;
                }
                write!(f, ": {} }}", template_type)
            }
            SomeType::NamedTupleMember {
                name,
                is_optional,
                element,
            } => write!(
                f,
                "{}{}: {}",
                name,
                if *is_optional { "?" } else { "" },
                element
            ),
            SomeType::Optional { element_type } => write!(f, "{}?", element_type),
            SomeType::Predicate {
                name,
                asserts,
                target_type,
            } => {
                if *asserts {
                    f.write_str("asserts ")?;
                }
                f.write_str(name)?;
                if let Some(t) = target_type {
                    write!(f, " is {}", t)?;
                }
                Ok(())
            }
            SomeType::Query { query_type } => write!(f, "typeof {}", query_type),
            SomeType::Reference(r) => {
                f.write_str(&r.name)?;
                if !r.type_arguments.is_empty() {
                    f.write_str("<")?;
                    write_joined(f, &r.type_arguments, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            SomeType::Reflection { .. } => f.write_str("Object"),
            SomeType::Rest { element_type } => write!(f, "...{}", element_type),
            SomeType::TemplateLiteral { head, tail } => {
                write!(f, "`{}", head)?;
                for (t, text) in tail {
                    write!(f, "${{{}}}{}", t, text)?;
                }
                f.write_str("`")
            }
            SomeType::Tuple { elements } => {
                f.write_str("[")?;
                write_joined(f, elements, ", ")?;
                f.write_str("]")
            }
            SomeType::TypeOperator { operator, target } => {
                write!(f, "{} {}", operator, target)
            }
            SomeType::Union { types } => write_joined(f, types, " | "),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> SomeType {
        SomeType::intrinsic("string")
    }

    mod display_tests {
        use super::*;

        #[test]
        fn array_of_union_is_parenthesized() {
            let t = SomeType::array(SomeType::union(vec![
                string(),
                SomeType::intrinsic("number"),
            ]));
            assert_eq!(t.to_string(), "(string | number)[]");
        }

        #[test]
        fn reference_with_arguments() {
            let t = SomeType::Reference(
                ReferenceType::new("Map", ReferenceTarget::Broken)
                    .with_type_arguments(vec![string(), SomeType::intrinsic("boolean")]),
            );
            assert_eq!(t.to_string(), "Map<string, boolean>");
        }

        #[test]
        fn literals_render_like_source() {
            assert_eq!(
                SomeType::literal(LiteralValue::String("a".into())).to_string(),
                "\"a\""
            );
            assert_eq!(SomeType::literal(LiteralValue::Number(1.0)).to_string(), "1");
            assert_eq!(
                SomeType::literal(LiteralValue::BigInt {
                    negative: true,
                    value: "12".into()
                })
                .to_string(),
                "-12n"
            );
        }

        #[test]
        fn conditional_and_template() {
            let cond = SomeType::Conditional {
                check_type: Box::new(SomeType::intrinsic("T")),
                extends_type: Box::new(string()),
                true_type: Box::new(SomeType::literal(LiteralValue::Boolean(true))),
                false_type: Box::new(SomeType::literal(LiteralValue::Boolean(false))),
            };
            assert_eq!(cond.to_string(), "T extends string ? true : false");

            let tpl = SomeType::TemplateLiteral {
                head: "a".into(),
                tail: vec![(string(), "b".into())],
            };
            assert_eq!(tpl.to_string(), "`a${string}b`");
        }
    }

    mod walk_tests {
        use super::*;

        #[test]
        fn embedded_declarations_found_at_any_depth() {
            let t = SomeType::union(vec![
                SomeType::reflection(ReflectionId::new(4)),
                SomeType::array(SomeType::reflection(ReflectionId::new(9))),
                string(),
            ]);
            assert_eq!(
                t.embedded_declarations(),
                vec![ReflectionId::new(4), ReflectionId::new(9)]
            );
        }

        #[test]
        fn walk_mut_rewrites_reference_targets() {
            let mut t = SomeType::tuple(vec![
                SomeType::reference("A", ReferenceTarget::Reflection(ReflectionId::new(1))),
                SomeType::Rest {
                    element_type: Box::new(SomeType::reference(
                        "B",
                        ReferenceTarget::Reflection(ReflectionId::new(2)),
                    )),
                },
            ]);
            t.walk_mut(&mut |node| {
                if let SomeType::Reference(r) = node {
                    r.target = ReferenceTarget::Broken;
                }
            });
            let mut broken = 0;
            t.walk(&mut |node| {
                if let SomeType::Reference(r) = node {
                    assert!(r.target.is_broken());
                    broken += 1;
                }
            });
            assert_eq!(broken, 2);
        }

        #[test]
        fn leaves_have_no_children() {
            assert!(string().children().is_empty());
            assert!(SomeType::reflection(ReflectionId::new(1)).children().is_empty());
            assert_eq!(SomeType::unknown("???").type_name(), "unknown");
        }
    }
}

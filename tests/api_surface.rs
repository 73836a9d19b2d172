//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Model Types
// ============================================================================

// ids and kinds
use tugdoc::ids::{FileId, ReflectionId, SymbolId};
use tugdoc::kind::{ReflectionFlags, ReflectionKind, ReflectionVariant};

// type model and comments
use tugdoc::comment::{Comment, CommentDisplayPart, CommentTag, InlineTagTarget};
use tugdoc::types::{LiteralValue, ReferenceTarget, ReferenceType, SomeType};

// reflections and the store
use tugdoc::files::{FileRegistry, ResolvedFile};
use tugdoc::project::{Project, SymbolStatus};
use tugdoc::reflection::{
    ContainerData, DeclarationData, Reflection, ReflectionData, ReflectionGroup, SourceReference,
    TraverseProperty,
};

// ============================================================================
// Serialization
// ============================================================================

use tugdoc::serialization::schema::{JsonFileRegistry, JsonTarget, BROKEN_TARGET};
use tugdoc::serialization::{
    DeserializeWarning, Deserializer, DeserializerComponent, JsonProject, JsonReflection,
    JsonType, ReviveContext, ReviveOptions, Serializer, SerializerComponent, WarningCode,
    SCHEMA_VERSION as WIRE_SCHEMA_VERSION, SUPPORTED_SCHEMA_VERSIONS,
};
use tugdoc::ReflectError;

// ============================================================================
// Front Door
// ============================================================================

use tugdoc::cli::{collect_inputs, digest, run_check, run_inspect, run_merge};
use tugdoc::config::{CliOverrides, ConfigSource, ConfigValue, ResolvedConfig};
use tugdoc::error::{OutputErrorCode, TugdocError};
use tugdoc::output::{
    emit_response, CheckResponse, ErrorInfo, ErrorResponse, InspectResponse, MergeResponse,
    SCHEMA_VERSION,
};

// ============================================================================
// Test
// ============================================================================

#[test]
fn api_surface_compiles() {
    // The imports above form the public API contract.
    // Any change that breaks these imports is a breaking change.
    let _ = std::any::type_name::<Project>();
    let _ = std::any::type_name::<Reflection>();
    let _ = std::any::type_name::<Serializer>();
    let _ = std::any::type_name::<Deserializer>();
    let _ = std::any::type_name::<TugdocError>();
    let _ = std::any::type_name::<ResolvedConfig>();
}

#[test]
fn schema_versions_are_stable() {
    assert_eq!(SCHEMA_VERSION, "1");
    assert_eq!(WIRE_SCHEMA_VERSION, "2.0");
    assert_eq!(SUPPORTED_SCHEMA_VERSIONS, &["2.0"]);
}

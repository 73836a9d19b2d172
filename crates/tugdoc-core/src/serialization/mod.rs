//! Versioned wire round-trip for projects.
//!
//! - [`schema`]: the JSON shape (`serde` types) and supported versions
//! - [`Serializer`]: live graph → [`JsonProject`]
//! - [`Deserializer`]: [`JsonProject`] → live graph, with id remapping, a
//!   deferred fixup pass, and multi-project merge
//! - [`SerializerComponent`] / [`DeserializerComponent`]: priority-ordered
//!   extension hooks

pub mod components;
pub mod deserializer;
pub mod schema;
pub mod serializer;

pub use components::{DeserializerComponent, SerializerComponent};
pub use deserializer::{DeserializeWarning, Deserializer, ReviveContext, ReviveOptions, WarningCode};
pub use schema::{JsonProject, JsonReflection, JsonType, SCHEMA_VERSION, SUPPORTED_SCHEMA_VERSIONS};
pub use serializer::Serializer;

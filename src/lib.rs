//! # propbag-codec
//!
//! Text codecs for property bag values, keyed by type name.
//!
//! `propbag-codec` converts runtime values to a canonical text form and back,
//! choosing the conversion by a type-name string such as `System.Int32`
//! rather than by a static type. It is meant to sit underneath a property
//! container that stores heterogeneous values as plain text and needs to
//! reconstruct them later from the same type name.
//!
//! ## Key Features
//!
//! - **Dedicated codecs**: Common scalars (numbers, booleans, characters,
//!   date-times, durations, GUIDs) have fixed, locale-independent text forms
//! - **Case-insensitive names**: `System.Int32` and `SYSTEM.INT32` are the same type
//! - **Structured fallback**: Arrays, records, property bags and the null
//!   marker are written as stripped XML by a codec built once per type
//! - **Thread-safe**: The registry is immutable after construction and the
//!   codec cache publishes exactly one codec per type under concurrent use
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use propbag_codec::{Registry, SerializationError, TimeSpan, Value};
//!
//! fn main() -> Result<(), SerializationError> {
//!     let registry = Registry::new();
//!
//!     // Scalars use their dedicated text forms
//!     assert_eq!(registry.serialize(&Value::Int64(-42), "System.Int64")?, "-42");
//!     assert_eq!(registry.serialize(&Value::Char('A'), "System.Char")?, "65");
//!
//!     let span = Value::TimeSpan(TimeSpan::from_ticks(12345));
//!     assert_eq!(registry.serialize(&span, "System.TimeSpan")?, "12345");
//!
//!     // Reading back needs the same type name, in any casing
//!     assert_eq!(registry.deserialize("TRUE", "system.boolean")?, Value::Boolean(true));
//!     assert_eq!(registry.deserialize("12345", "System.TimeSpan")?, span);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Property Bags
//!
//! ```rust
//! use propbag_codec::{PropertyBag, Registry, SerializationError, Value};
//!
//! fn main() -> Result<(), SerializationError> {
//!     let registry = Registry::new();
//!
//!     let mut bag = PropertyBag::new();
//!     bag.insert("Caption", "System.String", "core-router-01");
//!     bag.insert("Status", "System.Int16", 1i16);
//!
//!     let type_name = "SolarWinds.InformationService.PropertyBag";
//!     let text = registry.serialize(&Value::PropertyBag(bag.clone()), type_name)?;
//!     assert!(text.starts_with("<PropertyBag>"));
//!
//!     assert_eq!(registry.deserialize(&text, type_name)?, Value::PropertyBag(bag));
//!     Ok(())
//! }
//! ```
//!
//! ### Records
//!
//! Types outside the built-in table are resolved through a [`TypeResolver`].
//! The built-in resolver accepts record schemas registered up front.
//!
//! ```rust
//! use propbag_codec::{
//!     BuiltinTypeResolver, ObjectSchema, PrimitiveKind, Registry, SerializationError,
//!     TypeDescriptor, Value,
//! };
//! use std::collections::BTreeMap;
//!
//! fn main() -> Result<(), SerializationError> {
//!     let schema = ObjectSchema::new("Acme.Interface")
//!         .field("Index", TypeDescriptor::Primitive(PrimitiveKind::Int32))
//!         .field("Name", TypeDescriptor::Primitive(PrimitiveKind::String));
//!     let registry = Registry::builder()
//!         .resolver(BuiltinTypeResolver::new().with_schema(schema))
//!         .build();
//!
//!     let mut fields = BTreeMap::new();
//!     fields.insert("Index".to_string(), Value::Int32(3));
//!     fields.insert("Name".to_string(), Value::from("eth0"));
//!     let value = Value::Object(fields);
//!
//!     let text = registry.serialize(&value, "Acme.Interface")?;
//!     assert_eq!(text, "<Interface><Index>3</Index><Name>eth0</Name></Interface>");
//!     assert_eq!(registry.deserialize(&text, "acme.interface")?, value);
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use propbag_codec::{deserialize, SerializationError};
//!
//! match deserialize("yes", "System.Boolean") {
//!     Ok(value) => println!("Value: {:?}", value),
//!     Err(SerializationError::MalformedValue { text, type_name, .. }) => {
//!         println!("'{}' is not a {}", text, type_name)
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! match deserialize("1", "Not.A.Real.Type") {
//!     Err(SerializationError::TypeResolution { type_name }) => {
//!         println!("Unknown type {}", type_name)
//!     }
//!     other => println!("Unexpected: {:?}", other),
//! }
//! ```

mod cache;
mod descriptor;
mod error;
pub mod primitives;
mod registry;
mod type_name;
mod value;
mod xml;

#[cfg(test)]
mod primitive_tests;

pub use cache::{CodecCache, CodecFactory, SharedCodec, StructuredCodec};
pub use descriptor::{
    BuiltinTypeResolver, FieldSchema, ObjectSchema, PrimitiveKind, TypeDescriptor, TypeResolver,
};
pub use error::{Result, SerializationError};
pub use registry::{Registry, RegistryBuilder};
pub use type_name::{names, CanonicalTypeName};
pub use value::{Property, PropertyBag, TimeSpan, Value};
pub use xml::{XmlCodec, XmlCodecFactory};

use once_cell::sync::Lazy;

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry used by [`serialize`] and [`deserialize`]
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Converts `value` to text using the default registry
///
/// # Errors
///
/// See [`Registry::serialize`].
pub fn serialize(value: &Value, type_name: &str) -> Result<String> {
    DEFAULT_REGISTRY.serialize(value, type_name)
}

/// Reads text back into a value using the default registry
///
/// # Errors
///
/// See [`Registry::deserialize`].
pub fn deserialize(text: &str, type_name: &str) -> Result<Value> {
    DEFAULT_REGISTRY.deserialize(text, type_name)
}

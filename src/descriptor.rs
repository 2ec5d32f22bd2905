use crate::type_name::{names, CanonicalTypeName};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The closed set of scalar kinds with a dedicated text form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Guid,
    Int16,
    Int32,
    Int64,
    Byte,
    Decimal,
    Double,
    DateTime,
    Boolean,
    Char,
    DbNull,
    TimeSpan,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 13] = [
        PrimitiveKind::String,
        PrimitiveKind::Guid,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Byte,
        PrimitiveKind::Decimal,
        PrimitiveKind::Double,
        PrimitiveKind::DateTime,
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
        PrimitiveKind::DbNull,
        PrimitiveKind::TimeSpan,
    ];

    /// The canonical type name for this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => names::STRING,
            PrimitiveKind::Guid => names::GUID,
            PrimitiveKind::Int16 => names::INT16,
            PrimitiveKind::Int32 => names::INT32,
            PrimitiveKind::Int64 => names::INT64,
            PrimitiveKind::Byte => names::BYTE,
            PrimitiveKind::Decimal => names::DECIMAL,
            PrimitiveKind::Double => names::DOUBLE,
            PrimitiveKind::DateTime => names::DATE_TIME,
            PrimitiveKind::Boolean => names::BOOLEAN,
            PrimitiveKind::Char => names::CHAR,
            PrimitiveKind::DbNull => names::DB_NULL,
            PrimitiveKind::TimeSpan => names::TIME_SPAN,
        }
    }
}

/// One named field of an [`ObjectSchema`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSchema {
    pub name: String,
    pub descriptor: TypeDescriptor,
}

/// Shape of a record type, registered with the resolver in place of
/// runtime reflection.
///
/// # Examples
///
/// ```
/// use propbag_codec::{ObjectSchema, PrimitiveKind, TypeDescriptor};
///
/// let schema = ObjectSchema::new("Orion.Node")
///     .field("NodeID", TypeDescriptor::Primitive(PrimitiveKind::Int32))
///     .field("Caption", TypeDescriptor::Primitive(PrimitiveKind::String));
///
/// assert_eq!(schema.fields().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectSchema {
    name: String,
    fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    /// Schema for the record type `name`, with no fields yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field; fields are written in the order they are added
    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            descriptor,
        });
        self
    }

    /// Full type name of the record
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

/// Runtime description of a type, used to key and build structured codecs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// A byte sequence (`System.Byte[]`), carried as one base64 blob
    Bytes,
    Array(Box<TypeDescriptor>),
    PropertyBag,
    Object(Arc<ObjectSchema>),
    /// A type known by name only, with no structure to encode
    Opaque(String),
}

impl TypeDescriptor {
    /// Array descriptor for the given element, mapping `Byte` to [`TypeDescriptor::Bytes`]
    pub fn array_of(element: TypeDescriptor) -> TypeDescriptor {
        match element {
            TypeDescriptor::Primitive(PrimitiveKind::Byte) => TypeDescriptor::Bytes,
            other => TypeDescriptor::Array(Box::new(other)),
        }
    }

    /// The canonical type name this descriptor was resolved from
    pub fn type_name(&self) -> String {
        match self {
            TypeDescriptor::Primitive(kind) => kind.type_name().to_string(),
            TypeDescriptor::Bytes => format!("{}{}", names::BYTE, names::ARRAY_SUFFIX),
            TypeDescriptor::Array(element) => {
                format!("{}{}", element.type_name(), names::ARRAY_SUFFIX)
            }
            TypeDescriptor::PropertyBag => names::PROPERTY_BAG.to_string(),
            TypeDescriptor::Object(schema) => schema.name().to_string(),
            TypeDescriptor::Opaque(name) => name.clone(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Maps a type name to a runtime type descriptor
pub trait TypeResolver: Send + Sync {
    fn resolve_type(&self, name: &str) -> Option<TypeDescriptor>;
}

/// Resolver for the built-in types plus any schemas registered at build time.
///
/// Names are matched without regard to case, and `T[]` resolves for every
/// resolvable `T`.
#[derive(Debug, Clone)]
pub struct BuiltinTypeResolver {
    types: HashMap<CanonicalTypeName, TypeDescriptor>,
}

impl BuiltinTypeResolver {
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for kind in PrimitiveKind::ALL {
            types.insert(
                CanonicalTypeName::new(kind.type_name()),
                TypeDescriptor::Primitive(kind),
            );
        }
        types.insert(
            CanonicalTypeName::new(names::PROPERTY_BAG),
            TypeDescriptor::PropertyBag,
        );
        Self { types }
    }

    /// Makes a record type resolvable under its schema name
    pub fn with_schema(mut self, schema: ObjectSchema) -> Self {
        let name = CanonicalTypeName::new(schema.name());
        self.types
            .insert(name, TypeDescriptor::Object(Arc::new(schema)));
        self
    }

    /// Makes a name resolvable without giving it any structure
    pub fn with_opaque(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.types
            .insert(CanonicalTypeName::new(name.as_str()), TypeDescriptor::Opaque(name));
        self
    }
}

impl Default for BuiltinTypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeResolver for BuiltinTypeResolver {
    fn resolve_type(&self, name: &str) -> Option<TypeDescriptor> {
        let name = CanonicalTypeName::new(name);
        if let Some(descriptor) = self.types.get(&name) {
            return Some(descriptor.clone());
        }
        let element = name.element_name()?;
        self.resolve_type(element).map(TypeDescriptor::array_of)
    }
}

use crate::cache::{CodecCache, CodecFactory};
use crate::descriptor::{BuiltinTypeResolver, PrimitiveKind, TypeDescriptor, TypeResolver};
use crate::error::{Result, SerializationError};
use crate::primitives::{decode_null_marker, decode_primitive, encode_primitive};
use crate::type_name::CanonicalTypeName;
use crate::value::Value;
use crate::xml::XmlCodecFactory;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

type EncodeFn = fn(&Value, &TypeDescriptor, &CodecCache) -> Result<String>;
type DecodeFn = fn(&str, &TypeDescriptor, &CodecCache) -> Result<Value>;

/// Dedicated conversion for one registered type name
struct CodecEntry {
    descriptor: TypeDescriptor,
    encode: EncodeFn,
    decode: DecodeFn,
}

fn encode_scalar(value: &Value, descriptor: &TypeDescriptor, cache: &CodecCache) -> Result<String> {
    match descriptor {
        TypeDescriptor::Primitive(kind) => encode_primitive(*kind, value),
        _ => encode_structured(value, descriptor, cache),
    }
}

fn decode_scalar(text: &str, descriptor: &TypeDescriptor, cache: &CodecCache) -> Result<Value> {
    match descriptor {
        TypeDescriptor::Primitive(kind) => decode_primitive(*kind, text),
        _ => decode_structured(text, descriptor, cache),
    }
}

fn encode_structured(
    value: &Value,
    descriptor: &TypeDescriptor,
    cache: &CodecCache,
) -> Result<String> {
    cache.get_codec(descriptor)?.encode_structured(value, cache)
}

fn decode_structured(text: &str, descriptor: &TypeDescriptor, cache: &CodecCache) -> Result<Value> {
    cache.get_codec(descriptor)?.decode_structured(text, cache)
}

fn decode_db_null(text: &str, _: &TypeDescriptor, _: &CodecCache) -> Result<Value> {
    Ok(decode_null_marker(text))
}

fn insert_entry(
    entries: &mut HashMap<CanonicalTypeName, CodecEntry>,
    descriptor: TypeDescriptor,
    encode: EncodeFn,
    decode: DecodeFn,
) {
    let name = CanonicalTypeName::new(descriptor.type_name());
    entries.insert(
        name,
        CodecEntry {
            descriptor,
            encode,
            decode,
        },
    );
}

fn builtin_entries() -> HashMap<CanonicalTypeName, CodecEntry> {
    let mut entries = HashMap::new();

    for kind in PrimitiveKind::ALL {
        let descriptor = TypeDescriptor::Primitive(kind);
        match kind {
            PrimitiveKind::DbNull => {
                insert_entry(&mut entries, descriptor, encode_structured, decode_db_null)
            }
            _ => insert_entry(&mut entries, descriptor, encode_scalar, decode_scalar),
        }
    }

    let arrays = [
        PrimitiveKind::String,
        PrimitiveKind::Byte,
        PrimitiveKind::Int32,
        PrimitiveKind::Int16,
        PrimitiveKind::Int64,
        PrimitiveKind::DateTime,
        PrimitiveKind::Boolean,
        PrimitiveKind::Double,
    ];
    for kind in arrays {
        let descriptor = TypeDescriptor::array_of(TypeDescriptor::Primitive(kind));
        insert_entry(&mut entries, descriptor, encode_structured, decode_structured);
    }

    insert_entry(
        &mut entries,
        TypeDescriptor::PropertyBag,
        encode_structured,
        decode_structured,
    );
    entries
}

/// Converts values to text and back, keyed by type name.
///
/// Well-known type names have dedicated codecs; everything else is resolved
/// to a [`TypeDescriptor`] and handled by a cached structured codec. The
/// table of dedicated codecs is fixed when the registry is built.
///
/// # Examples
///
/// ```
/// use propbag_codec::{Registry, SerializationError, Value};
///
/// let registry = Registry::new();
///
/// let text = registry.serialize(&Value::Boolean(true), "System.Boolean")?;
/// assert_eq!(text, "true");
///
/// let value = registry.deserialize("65", "SYSTEM.CHAR")?;
/// assert_eq!(value, Value::Char('A'));
///
/// let ints = Value::Array(vec![Value::Int32(1), Value::Int32(2)]);
/// let text = registry.serialize(&ints, "System.Int32[]")?;
/// assert_eq!(text, "<ArrayOfInt><int>1</int><int>2</int></ArrayOfInt>");
///
/// match registry.serialize(&ints, "Not.A.Real.Type") {
///     Err(SerializationError::TypeResolution { type_name }) => {
///         assert_eq!(type_name, "Not.A.Real.Type")
///     }
///     other => panic!("unexpected result: {:?}", other),
/// }
/// # Ok::<(), SerializationError>(())
/// ```
pub struct Registry {
    entries: HashMap<CanonicalTypeName, CodecEntry>,
    resolver: Arc<dyn TypeResolver>,
    cache: CodecCache,
}

impl Registry {
    /// Creates a registry with the built-in resolver and XML structured codec
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a registry with a custom resolver or codec factory
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Converts `value` to the text form of `type_name`
    ///
    /// # Errors
    ///
    /// - `SerializationError::TypeResolution` if the name is neither registered nor resolvable
    /// - `SerializationError::TypeMismatch` if `value` is not of the named kind
    /// - `SerializationError::UnsupportedType` if the structured codec cannot represent the type
    pub fn serialize(&self, value: &Value, type_name: &str) -> Result<String> {
        if let Some(entry) = self.entries.get(&CanonicalTypeName::new(type_name)) {
            return (entry.encode)(value, &entry.descriptor, &self.cache);
        }
        let descriptor = self.resolve(type_name)?;
        trace!(type_name, "serializing through structured codec");
        self.cache
            .get_codec(&descriptor)?
            .encode_structured(value, &self.cache)
    }

    /// Reads text produced by [`Registry::serialize`] for the same type name
    ///
    /// # Errors
    ///
    /// - `SerializationError::TypeResolution` if the name is neither registered nor resolvable
    /// - `SerializationError::MalformedValue` if the text is not in the form of the type
    /// - `SerializationError::UnsupportedType` if the structured codec cannot represent the type
    pub fn deserialize(&self, text: &str, type_name: &str) -> Result<Value> {
        if let Some(entry) = self.entries.get(&CanonicalTypeName::new(type_name)) {
            return (entry.decode)(text, &entry.descriptor, &self.cache);
        }
        let descriptor = self.resolve(type_name)?;
        trace!(type_name, "deserializing through structured codec");
        self.cache
            .get_codec(&descriptor)?
            .decode_structured(text, &self.cache)
    }

    /// Whether `type_name` has a dedicated entry
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.entries.contains_key(&CanonicalTypeName::new(type_name))
    }

    /// Canonical spellings of every type name with a dedicated entry
    pub fn registered_type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(CanonicalTypeName::as_str)
    }

    /// Resolver used for names without a dedicated entry
    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    /// Structured codecs built so far
    pub fn cache(&self) -> &CodecCache {
        &self.cache
    }

    fn resolve(&self, type_name: &str) -> Result<TypeDescriptor> {
        self.resolver.resolve_type(type_name).ok_or_else(|| {
            debug!(type_name, "type name did not resolve");
            SerializationError::TypeResolution {
                type_name: type_name.to_string(),
            }
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Configures the collaborators of a [`Registry`].
///
/// # Examples
///
/// ```
/// use propbag_codec::{
///     BuiltinTypeResolver, ObjectSchema, PrimitiveKind, Registry, TypeDescriptor, TypeResolver,
/// };
///
/// let resolver = BuiltinTypeResolver::new().with_schema(
///     ObjectSchema::new("Acme.Point").field("X", TypeDescriptor::Primitive(PrimitiveKind::Int32)),
/// );
/// let registry = Registry::builder().resolver(resolver).build();
///
/// assert!(!registry.is_registered("Acme.Point"));
/// assert!(registry.resolver().resolve_type("acme.point").is_some());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    resolver: Option<Arc<dyn TypeResolver>>,
    factory: Option<Arc<dyn CodecFactory>>,
}

impl RegistryBuilder {
    /// Resolver for names without a dedicated entry. Defaults to [`BuiltinTypeResolver`].
    pub fn resolver<R: TypeResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Factory for structured codecs. Defaults to [`XmlCodecFactory`] over the resolver.
    pub fn codec_factory<F: CodecFactory + 'static>(mut self, factory: F) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Builds the registry. The dedicated entry table is the same for every
    /// registry; only the fallback collaborators differ.
    pub fn build(self) -> Registry {
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(BuiltinTypeResolver::new()));
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(XmlCodecFactory::new(Arc::clone(&resolver))));
        Registry {
            entries: builtin_entries(),
            resolver,
            cache: CodecCache::new(factory),
        }
    }
}

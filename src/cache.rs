use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::value::Value;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A codec that converts values of one type to and from structured text.
///
/// `cache` is the cache the codec was taken from. Codecs whose values nest
/// values of other types (property bag entries) fetch the codecs for those
/// types from it.
pub trait StructuredCodec: Send + Sync {
    /// # Errors
    ///
    /// Returns `SerializationError::TypeMismatch` if `value` is not of the
    /// codec's type.
    fn encode_structured(&self, value: &Value, cache: &CodecCache) -> Result<String>;

    /// # Errors
    ///
    /// Returns `SerializationError::MalformedValue` if `text` is not in the
    /// codec's form.
    fn decode_structured(&self, text: &str, cache: &CodecCache) -> Result<Value>;
}

/// Builds structured codecs for type descriptors.
///
/// Building is assumed to be expensive, which is why the results are cached.
/// Implementations must not call back into the [`CodecCache`] that owns them.
pub trait CodecFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns `SerializationError::UnsupportedType` if the descriptor has a
    /// shape this factory cannot represent.
    fn build_codec(&self, descriptor: &TypeDescriptor) -> Result<Box<dyn StructuredCodec>>;
}

pub type SharedCodec = Arc<dyn StructuredCodec>;

/// Lazily built structured codecs, one per type descriptor.
///
/// The first request for a descriptor builds its codec and publishes it;
/// every later request, including ones racing the first, gets the same
/// `Arc`. Build failures are stored too, so an unsupported type is never
/// rebuilt. Entries are never evicted.
pub struct CodecCache {
    factory: Arc<dyn CodecFactory>,
    codecs: DashMap<TypeDescriptor, Result<SharedCodec>>,
}

impl CodecCache {
    /// Creates an empty cache whose codecs are built by `factory`
    pub fn new(factory: Arc<dyn CodecFactory>) -> Self {
        Self {
            factory,
            codecs: DashMap::new(),
        }
    }

    /// Returns the codec for `descriptor`, building it on first use
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::UnsupportedType` if the factory cannot
    /// build a codec for this descriptor, now or on any earlier attempt.
    pub fn get_codec(&self, descriptor: &TypeDescriptor) -> Result<SharedCodec> {
        if let Some(cached) = self.codecs.get(descriptor) {
            return cached.value().clone();
        }

        // The shard stays write-locked until the closure returns, so only
        // one build runs per descriptor.
        let entry = self.codecs.entry(descriptor.clone()).or_insert_with(|| {
            let built: Result<SharedCodec> =
                self.factory.build_codec(descriptor).map(Arc::from);
            match &built {
                Ok(_) => debug!(%descriptor, "built structured codec"),
                Err(error) => debug!(%descriptor, %error, "structured codec unavailable"),
            }
            built
        });
        entry.value().clone()
    }

    /// Whether a codec (or a build failure) is stored for `descriptor`
    pub fn contains(&self, descriptor: &TypeDescriptor) -> bool {
        self.codecs.contains_key(descriptor)
    }

    /// Number of descriptors with a stored codec or build failure
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether nothing has been requested yet
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for CodecCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecCache")
            .field("entries", &self.codecs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PrimitiveKind;
    use crate::error::SerializationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoCodec;

    impl StructuredCodec for EchoCodec {
        fn encode_structured(&self, value: &Value, _: &CodecCache) -> Result<String> {
            Ok(format!("{value:?}"))
        }

        fn decode_structured(&self, text: &str, _: &CodecCache) -> Result<Value> {
            Ok(Value::String(text.to_string()))
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
    }

    impl CodecFactory for CountingFactory {
        fn build_codec(&self, descriptor: &TypeDescriptor) -> Result<Box<dyn StructuredCodec>> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            match descriptor {
                TypeDescriptor::Opaque(name) => {
                    Err(SerializationError::unsupported(name, "opaque"))
                }
                _ => Ok(Box::new(EchoCodec)),
            }
        }
    }

    #[test]
    fn builds_each_descriptor_once() {
        let factory = Arc::new(CountingFactory::default());
        let cache = CodecCache::new(factory.clone());
        let descriptor =
            TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Int32)));

        let first = cache.get_codec(&descriptor).unwrap();
        let second = cache.get_codec(&descriptor).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&descriptor));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn build_failures_are_not_retried() {
        let factory = Arc::new(CountingFactory::default());
        let cache = CodecCache::new(factory.clone());
        let descriptor = TypeDescriptor::Opaque("Acme.Handle".to_string());

        for _ in 0..3 {
            let result = cache.get_codec(&descriptor);
            assert!(matches!(result, Err(SerializationError::UnsupportedType { .. })));
        }
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }
}

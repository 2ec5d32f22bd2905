use propbag_codec::{
    names, BuiltinTypeResolver, CodecCache, CodecFactory, PrimitiveKind, PropertyBag, Registry,
    SerializationError, StructuredCodec, TypeDescriptor, Value, XmlCodecFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Wraps the XML factory, counting builds and pausing to widen races
struct SlowFactory {
    inner: XmlCodecFactory,
    builds: Arc<AtomicUsize>,
}

impl SlowFactory {
    fn new(builds: Arc<AtomicUsize>) -> Self {
        Self::with_resolver(builds, BuiltinTypeResolver::new())
    }

    fn with_resolver(builds: Arc<AtomicUsize>, resolver: BuiltinTypeResolver) -> Self {
        Self {
            inner: XmlCodecFactory::new(Arc::new(resolver)),
            builds,
        }
    }
}

impl CodecFactory for SlowFactory {
    fn build_codec(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Box<dyn StructuredCodec>, SerializationError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.inner.build_codec(descriptor)
    }
}

fn guid_array() -> TypeDescriptor {
    TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Guid)))
}

#[test]
fn test_concurrent_first_use_publishes_one_codec() {
    let builds = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(CodecCache::new(Arc::new(SlowFactory::new(builds.clone()))));
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get_codec(&guid_array()).unwrap()
            })
        })
        .collect();

    let codecs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for codec in &codecs[1..] {
        assert!(Arc::ptr_eq(&codecs[0], codec));
    }
    assert!(Arc::ptr_eq(&codecs[0], &cache.get_codec(&guid_array()).unwrap()));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_distinct_descriptors_get_distinct_codecs() {
    let builds = Arc::new(AtomicUsize::new(0));
    let cache = CodecCache::new(Arc::new(SlowFactory::new(builds.clone())));

    let ints = TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Int32)));
    let a = cache.get_codec(&ints).unwrap();
    let b = cache.get_codec(&guid_array()).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert!(cache.contains(&ints));
    assert!(!cache.contains(&TypeDescriptor::Bytes));
}

#[test]
fn test_registry_shared_across_threads() {
    let builds = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(
        Registry::builder()
            .codec_factory(SlowFactory::new(builds.clone()))
            .build(),
    );
    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> Result<(), SerializationError> {
                let value = Value::Array(vec![Value::Int32(i as i32)]);
                barrier.wait();
                let text = registry.serialize(&value, "System.Int32[]")?;
                assert_eq!(registry.deserialize(&text, "SYSTEM.INT32[]")?, value);
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_property_bag_entries_are_built_once() -> Result<(), SerializationError> {
    let builds = Arc::new(AtomicUsize::new(0));
    let registry = Registry::builder()
        .codec_factory(SlowFactory::new(builds.clone()))
        .build();

    let mut bag = PropertyBag::new();
    bag.insert("Ids", "System.Guid[]", Value::Array(vec![Value::Guid(uuid::Uuid::nil())]));
    bag.insert("Count", names::INT32, 3);
    let value = Value::PropertyBag(bag);

    for _ in 0..3 {
        let text = registry.serialize(&value, names::PROPERTY_BAG)?;
        assert_eq!(registry.deserialize(&text, names::PROPERTY_BAG)?, value);
    }

    // The bag, its Guid[] entry and its Int32 entry
    assert_eq!(builds.load(Ordering::SeqCst), 3);
    assert!(registry.cache().contains(&guid_array()));
    assert!(registry
        .cache()
        .contains(&TypeDescriptor::Primitive(PrimitiveKind::Int32)));
    Ok(())
}

#[test]
fn test_unsupported_bag_entry_type_is_built_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let resolver = BuiltinTypeResolver::new().with_opaque("Acme.Handle");
    let registry = Registry::builder()
        .codec_factory(SlowFactory::with_resolver(builds.clone(), resolver))
        .build();

    let mut bag = PropertyBag::new();
    bag.insert("Handle", "Acme.Handle", 1);
    let value = Value::PropertyBag(bag);

    for _ in 0..3 {
        let result = registry.serialize(&value, names::PROPERTY_BAG);
        assert!(matches!(result, Err(SerializationError::UnsupportedType { .. })));
    }
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert!(registry
        .cache()
        .contains(&TypeDescriptor::Opaque("Acme.Handle".to_string())));
}

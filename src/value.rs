use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A runtime value that can be converted to text by the registry.
///
/// Each variant corresponds to one family of type names. The dedicated
/// primitive codecs read the scalar variants directly; `Bytes`, `Array`,
/// `Object`, `PropertyBag` and `DbNull` go through the structured codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Guid(Uuid),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Byte(u8),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
    Char(char),
    DateTime(DateTime<Utc>),
    TimeSpan(TimeSpan),
    /// The database null marker. There is only one.
    DbNull,
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Field values of a record type described by an `ObjectSchema`
    Object(BTreeMap<String, Value>),
    PropertyBag(PropertyBag),
}

impl Value {
    /// Short name of the variant, used in mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Guid(_) => "guid",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Byte(_) => "byte",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::Boolean(_) => "boolean",
            Value::Char(_) => "char",
            Value::DateTime(_) => "date-time",
            Value::TimeSpan(_) => "time-span",
            Value::DbNull => "db-null",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::PropertyBag(_) => "property-bag",
        }
    }

    pub fn is_db_null(&self) -> bool {
        matches!(self, Value::DbNull)
    }

    /// Widens any integer variant to `i64`.
    pub(crate) fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Byte(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    String => String,
    Uuid => Guid,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Byte,
    f64 => Double,
    Decimal => Decimal,
    bool => Boolean,
    char => Char,
    DateTime<Utc> => DateTime,
    TimeSpan => TimeSpan,
    Vec<u8> => Bytes,
    PropertyBag => PropertyBag,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// A signed duration counted in 100-nanosecond ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan(i64);

impl TimeSpan {
    pub const TICKS_PER_SECOND: i64 = 10_000_000;
    const NANOS_PER_TICK: i64 = 100;

    pub const fn from_ticks(ticks: i64) -> Self {
        TimeSpan(ticks)
    }

    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Converts a `TimeDelta`, truncating below tick precision.
    ///
    /// Returns `None` if the delta does not fit in an `i64` tick count.
    pub fn from_time_delta(delta: TimeDelta) -> Option<Self> {
        let seconds = delta.num_seconds().checked_mul(Self::TICKS_PER_SECOND)?;
        let sub_ticks = i64::from(delta.subsec_nanos()) / Self::NANOS_PER_TICK;
        seconds.checked_add(sub_ticks).map(TimeSpan)
    }

    pub fn to_time_delta(&self) -> TimeDelta {
        let seconds = self.0.div_euclid(Self::TICKS_PER_SECOND);
        let nanos = self.0.rem_euclid(Self::TICKS_PER_SECOND) * Self::NANOS_PER_TICK;
        TimeDelta::seconds(seconds) + TimeDelta::nanoseconds(nanos)
    }
}

/// One named, typed entry of a [`PropertyBag`]
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_name: String,
    pub value: Value,
}

/// An ordered bag of named values, each tagged with the type name used to
/// convert it to text.
///
/// # Examples
///
/// ```
/// use propbag_codec::{PropertyBag, Value};
///
/// let mut bag = PropertyBag::new();
/// bag.insert("Port", "System.Int32", 17778);
/// bag.insert("Host", "System.String", "localhost");
///
/// assert_eq!(bag.get("Port"), Some(&Value::Int32(17778)));
/// assert_eq!(bag.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyBag {
    entries: Vec<Property>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any existing entry with the same name
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<Value>,
    ) {
        let property = Property {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
        };
        match self.entries.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.entries.push(property),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.property(name).map(|p| &p.value)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.entries.iter().find(|p| p.name == name)
    }

    /// Removes an entry, returning `true` if it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p.name != name);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_span_converts_to_and_from_time_delta() {
        let span = TimeSpan::from_ticks(-12_345_678);
        let delta = span.to_time_delta();
        assert_eq!(delta, TimeDelta::nanoseconds(-1_234_567_800));
        assert_eq!(TimeSpan::from_time_delta(delta), Some(span));
    }

    #[test]
    fn property_bag_insert_replaces_by_name() {
        let mut bag = PropertyBag::new();
        bag.insert("a", "System.Int32", 1);
        bag.insert("b", "System.Boolean", true);
        bag.insert("a", "System.String", "one");

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("a"), Some(&Value::from("one")));
        assert_eq!(bag.property("a").map(|p| p.type_name.as_str()), Some("System.String"));
        assert!(bag.remove("b"));
        assert!(!bag.remove("b"));
    }
}

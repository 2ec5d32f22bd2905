use std::fmt;
use std::hash::{Hash, Hasher};

/// Well-known type names understood by the built-in registry
pub mod names {
    pub const STRING: &str = "System.String";
    pub const GUID: &str = "System.Guid";
    pub const INT16: &str = "System.Int16";
    pub const INT32: &str = "System.Int32";
    pub const INT64: &str = "System.Int64";
    pub const BYTE: &str = "System.Byte";
    pub const DECIMAL: &str = "System.Decimal";
    pub const DOUBLE: &str = "System.Double";
    pub const DATE_TIME: &str = "System.DateTime";
    pub const BOOLEAN: &str = "System.Boolean";
    pub const CHAR: &str = "System.Char";
    pub const DB_NULL: &str = "System.DBNull";
    pub const TIME_SPAN: &str = "System.TimeSpan";
    pub const PROPERTY_BAG: &str = "SolarWinds.InformationService.PropertyBag";

    /// Suffix marking an array-of-T type name
    pub const ARRAY_SUFFIX: &str = "[]";
}

/// A type name compared without regard to case.
///
/// The spelling it was created with is kept for display; equality and
/// hashing use the case-folded form.
#[derive(Clone)]
pub struct CanonicalTypeName {
    original: String,
    folded: String,
}

impl CanonicalTypeName {
    /// Wraps `name`, keeping its spelling for display
    pub fn new(name: impl Into<String>) -> Self {
        let original = name.into();
        let folded = original.to_lowercase();
        Self { original, folded }
    }

    /// The name as originally spelled
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Element name if this names an array type (`T[]` gives `T`)
    pub fn element_name(&self) -> Option<&str> {
        self.original
            .strip_suffix(names::ARRAY_SUFFIX)
            .filter(|element| !element.is_empty())
    }

    /// Name of the array type whose elements are of this type
    pub fn array_of(&self) -> CanonicalTypeName {
        CanonicalTypeName::new(format!("{}{}", self.original, names::ARRAY_SUFFIX))
    }
}

impl PartialEq for CanonicalTypeName {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for CanonicalTypeName {}

impl Hash for CanonicalTypeName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl fmt::Debug for CanonicalTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.original)
    }
}

impl fmt::Display for CanonicalTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl From<&str> for CanonicalTypeName {
    fn from(name: &str) -> Self {
        CanonicalTypeName::new(name)
    }
}

impl From<String> for CanonicalTypeName {
    fn from(name: String) -> Self {
        CanonicalTypeName::new(name)
    }
}

use thiserror::Error;

/// Errors that can occur when converting values to and from text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// The type name does not resolve to any known type
    #[error("type name '{type_name}' does not resolve to a known type")]
    TypeResolution { type_name: String },

    /// The text does not have the lexical form expected for the target type
    #[error("cannot read '{text}' as {type_name}: {reason}")]
    MalformedValue {
        text: String,
        type_name: String,
        reason: String,
    },

    /// The structured codec cannot represent the requested type
    #[error("type {type_name} is not supported by the structured codec: {reason}")]
    UnsupportedType { type_name: String, reason: String },

    /// The supplied value is not of the kind named by the type name
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl SerializationError {
    pub(crate) fn malformed(
        text: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        SerializationError::MalformedValue {
            text: text.into(),
            type_name: type_name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SerializationError::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, SerializationError>;

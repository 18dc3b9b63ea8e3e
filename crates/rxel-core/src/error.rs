//! Error types for configuration, attribute decoding and serialization.

use thiserror::Error;

/// Class configuration was invalid or arrived too late.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field identifier must be a string, got symbol #{id}")]
    NonStringField { id: u64 },

    #[error("field name must not be empty")]
    EmptyField,

    #[error("attribute `{attribute}` is declared by both `{first}` and `{second}`")]
    DuplicateAttribute {
        attribute: String,
        first: String,
        second: String,
    },

    #[error("class `{class}` is sealed; cannot change field `{field}`")]
    Sealed { class: String, field: String },
}

/// A value had no string representation to write into an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot serialize {type_name} value to an attribute string")]
pub struct SerializationError {
    pub type_name: String,
}

impl SerializationError {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

/// An attribute string could not be turned into a property value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON attribute `{raw}`: {source}")]
    Json {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL attribute `{raw}`: {source}")]
    Url {
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{converter} converter rejected `{raw}`: {message}")]
    Custom {
        converter: String,
        raw: String,
        message: String,
    },
}

/// A property effect failed while handling a change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("effect `{effect}` failed for field `{field}`: {message}")]
    Failed {
        effect: &'static str,
        field: String,
        message: String,
    },
}

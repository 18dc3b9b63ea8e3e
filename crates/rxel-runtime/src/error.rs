//! Errors returned by element entry points.

use rxel_core::{ConfigError, DecodeError, EffectError};

/// Umbrella error for [`Element`](crate::Element) operations.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("`{class}` declares no property `{name}`")]
    UnknownProperty { class: String, name: String },
}

impl ElementError {
    pub(crate) fn unknown_property(class: &str, name: &str) -> Self {
        Self::UnknownProperty {
            class: class.to_owned(),
            name: name.to_owned(),
        }
    }
}

/// Result alias for element operations.
pub type Result<T> = std::result::Result<T, ElementError>;

#![forbid(unsafe_code)]

//! Core: property values, attribute codec, class configuration and effects.
//!
//! Everything in this crate is free of instance state. The per-instance
//! reactive machinery lives in `rxel-runtime`.

pub mod codec;
pub mod config;
pub mod effects;
pub mod error;
mod logging;
pub mod naming;
pub mod value;

pub use codec::{AttributeConverter, Converter, decode, encode};
pub use config::{ComponentClass, ComponentConfig, FieldConfig, FieldKey, observed_attribute_names};
pub use effects::{EffectRegistry, EffectTarget, NotifyEffect, PropertyEffect, ReflectEffect};
pub use error::{ConfigError, DecodeError, EffectError, SerializationError};
pub use naming::{to_camel_case, to_kebab_case};
pub use value::{HostObject, Value};

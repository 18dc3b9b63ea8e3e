//! Attribute codec: attribute strings <-> property values.
//!
//! Both directions are pure functions of their inputs and the field's
//! [`Converter`].
//!
//! # Decoding
//!
//! | Converter | Rule |
//! |-----------|------|
//! | `Flag`    | `raw != "null"` (presence reading) |
//! | `Url`     | `Url::parse(raw)` |
//! | `Custom`  | converter's `parse` |
//! | `Default`, `Json` | JSON if the text looks like JSON, else the raw string |
//!
//! "Looks like JSON" means: exactly `null`, `true` or `false`; starts with
//! `[`, `{` or `"`; or contains an ASCII digit. The digit rule is deliberately
//! loose: `"123abc"` is handed to the JSON parser and fails, it is not
//! returned as text.
//!
//! # Encoding
//!
//! | Converter | Rule |
//! |-----------|------|
//! | `Json`    | JSON text |
//! | `Url`     | href of URL values |
//! | `Custom`  | converter's `stringify` |
//! | otherwise | string form of falsy values, else the value's string conversion |

use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;
use url::Url;

use crate::config::FieldConfig;
use crate::error::{DecodeError, SerializationError};
use crate::logging::trace;
use crate::value::Value;

/// A user-supplied parse/stringify pair.
pub trait AttributeConverter: fmt::Debug {
    /// Converter name for diagnostics.
    fn name(&self) -> &str;

    /// Attribute string to property value.
    fn parse(&self, raw: &str) -> Result<Value, DecodeError>;

    /// Property value to attribute string.
    fn stringify(&self, value: &Value) -> Result<String, SerializationError>;
}

/// How a field's attribute text maps to its property value.
#[derive(Debug, Clone, Default)]
pub enum Converter {
    /// JSON when the text looks like JSON, plain text otherwise.
    #[default]
    Default,
    /// Like `Default` when decoding; always JSON text when encoding.
    Json,
    /// Boolean presence flag: only the literal `null` reads as false.
    Flag,
    /// Absolute URL.
    Url,
    /// User-supplied converter.
    Custom(Rc<dyn AttributeConverter>),
}

impl Converter {
    /// Wrap a custom converter.
    #[must_use]
    pub fn custom(converter: impl AttributeConverter + 'static) -> Self {
        Self::Custom(Rc::new(converter))
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::Json => "json",
            Self::Flag => "flag",
            Self::Url => "url",
            Self::Custom(c) => c.name(),
        }
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Default, Self::Default)
            | (Self::Json, Self::Json)
            | (Self::Flag, Self::Flag)
            | (Self::Url, Self::Url) => true,
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Decode an attribute string into a property value.
pub fn decode(raw: &str, config: &FieldConfig) -> Result<Value, DecodeError> {
    trace!(field = config.name(), converter = config.converter().name(), "attribute.decode");
    match config.converter() {
        Converter::Flag => Ok(Value::from(raw != "null")),
        Converter::Url => Url::parse(raw).map(Value::Url).map_err(|source| DecodeError::Url {
            raw: raw.to_owned(),
            source,
        }),
        Converter::Custom(converter) => converter.parse(raw),
        Converter::Default | Converter::Json => decode_text(raw),
    }
}

fn looks_like_json(raw: &str) -> bool {
    matches!(raw, "null" | "false" | "true")
        || raw.starts_with(['[', '{', '"'])
        || raw.bytes().any(|b| b.is_ascii_digit())
}

fn decode_text(raw: &str) -> Result<Value, DecodeError> {
    if !looks_like_json(raw) {
        return Ok(Value::from(raw));
    }
    serde_json::from_str::<Json>(raw)
        .map(Value::Json)
        .map_err(|source| DecodeError::Json {
            raw: raw.to_owned(),
            source,
        })
}

/// Encode a property value as an attribute string.
pub fn encode(value: &Value, config: &FieldConfig) -> Result<String, SerializationError> {
    match (config.converter(), value) {
        (Converter::Json, _) => value.to_json_text(),
        (Converter::Url, Value::Url(url)) => Ok(url.as_str().to_owned()),
        (Converter::Custom(converter), _) => converter.stringify(value),
        _ if !value.is_truthy() => Ok(value
            .to_attribute_string()
            .unwrap_or_else(|| value.type_name().to_owned())),
        _ => value
            .to_attribute_string()
            .ok_or_else(|| SerializationError::new(value.type_name())),
    }
}

//! Dynamic property values.
//!
//! A [`Value`] is what a field cell stores and what flows through the change
//! feed. It covers the three shapes an attribute can decode into (JSON data,
//! plain text, URLs) plus opaque host objects that a caller assigns directly.
//!
//! # Equality
//!
//! JSON data and URLs compare structurally, with numbers compared by value
//! (`1` equals `1.0`). Host objects compare by reference:
//! two handles are equal only if they point at the same allocation. This is the
//! equality the change feed uses to collapse consecutive duplicate writes.
//!
//! # String conversion
//!
//! [`Value::to_attribute_string`] follows the usual script-host rules:
//! `undefined`, `null`, booleans and numbers print as their literal text,
//! arrays join their elements with `,`, plain objects print as
//! `[object Object]`, and host objects supply their own conversion (or none).

use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;
use url::Url;

use crate::error::SerializationError;

/// An object owned by the host that can be stored in a field.
pub trait HostObject: fmt::Debug {
    /// String conversion used when the value is written to an attribute.
    ///
    /// Return `None` when the object has no string representation.
    fn to_attribute_string(&self) -> Option<String>;

    /// Name used in diagnostics.
    fn type_name(&self) -> &str {
        "object"
    }
}

/// A property value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// The field has never been written.
    #[default]
    Undefined,
    /// JSON data: null, booleans, numbers, strings, arrays and objects.
    Json(Json),
    /// A parsed URL.
    Url(Url),
    /// An opaque host object, compared by reference.
    Object(Rc<dyn HostObject>),
}

impl Value {
    /// The JSON `null` value.
    pub const NULL: Value = Value::Json(Json::Null);

    /// Wrap a host object.
    #[must_use]
    pub fn object(object: impl HostObject + 'static) -> Self {
        Self::Object(Rc::new(object))
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(Json::Null))
    }

    /// Borrow the JSON payload, if any.
    #[must_use]
    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Self::Json(json) => Some(json),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Json::as_str)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(Json::as_bool)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(Json::as_f64)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(Json::as_i64)
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Kind name for diagnostics and serialization errors.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Undefined => "undefined",
            Self::Json(Json::Null) => "null",
            Self::Json(Json::Bool(_)) => "boolean",
            Self::Json(Json::Number(_)) => "number",
            Self::Json(Json::String(_)) => "string",
            Self::Json(Json::Array(_)) => "array",
            Self::Json(Json::Object(_)) => "object",
            Self::Url(_) => "url",
            Self::Object(object) => object.type_name(),
        }
    }

    /// Whether the value counts as true in a boolean context.
    ///
    /// `undefined`, `null`, `false`, `0` and `""` are falsy; everything else,
    /// including empty arrays and objects, is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Json(Json::Null) => false,
            Self::Json(Json::Bool(b)) => *b,
            Self::Json(Json::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Self::Json(Json::String(s)) => !s.is_empty(),
            Self::Json(_) | Self::Url(_) | Self::Object(_) => true,
        }
    }

    /// String conversion of the value, or `None` if it has none.
    #[must_use]
    pub fn to_attribute_string(&self) -> Option<String> {
        match self {
            Self::Undefined => Some("undefined".to_owned()),
            Self::Json(json) => Some(json_to_string(json)),
            Self::Url(url) => Some(url.as_str().to_owned()),
            Self::Object(object) => object.to_attribute_string(),
        }
    }

    /// JSON text of the value.
    ///
    /// `undefined` encodes as the bare word `undefined`; URLs encode as their
    /// quoted href; host objects encode as their quoted string conversion.
    pub fn to_json_text(&self) -> Result<String, SerializationError> {
        match self {
            Self::Undefined => Ok("undefined".to_owned()),
            Self::Json(json) => Ok(json.to_string()),
            Self::Url(url) => Ok(Json::String(url.as_str().to_owned()).to_string()),
            Self::Object(object) => object
                .to_attribute_string()
                .map(|s| Json::String(s).to_string())
                .ok_or_else(|| SerializationError::new(object.type_name())),
        }
    }
}

fn json_to_string(json: &Json) -> String {
    match json {
        Json::Null => "null".to_owned(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => f.to_string(),
            (None, None, None) => n.to_string(),
        },
        Json::String(s) => s.clone(),
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::Null => String::new(),
                other => json_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Json::Object(_) => "[object Object]".to_owned(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Json(a), Self::Json(b)) => json_eq(a, b),
            (Self::Url(a), Self::Url(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// JSON equality with numbers compared by numeric value, so `1` equals `1.0`.
fn json_eq(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Json::Array(xs), Json::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Json::Object(xs), Json::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Self::Json(json)
    }
}

impl From<Url> for Value {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Json(Json::Bool(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Json(Json::String(s.to_owned()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Json(Json::String(s))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Json(Json::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Json(Json::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Json(Json::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Json(Json::from(n))
    }
}

/// Non-finite floats become `null`, as in JSON.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Json(serde_json::Number::from_f64(n).map_or(Json::Null, Json::Number))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_attribute_string() {
            Some(s) => f.write_str(&s),
            None => write!(f, "[{}]", self.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Named(Option<&'static str>);

    impl HostObject for Named {
        fn to_attribute_string(&self) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    #[test]
    fn falsy_values() {
        for v in [
            Value::Undefined,
            Value::NULL,
            Value::from(false),
            Value::from(0),
            Value::from(0.0),
            Value::from(""),
        ] {
            assert!(!v.is_truthy(), "{v:?} should be falsy");
        }
    }

    #[test]
    fn truthy_values() {
        for v in [
            Value::from(true),
            Value::from(-1),
            Value::from("0"),
            Value::from(json!([])),
            Value::from(json!({})),
            Value::object(Named(None)),
        ] {
            assert!(v.is_truthy(), "{v:?} should be truthy");
        }
    }

    #[test]
    fn string_forms() {
        assert_eq!(Value::Undefined.to_attribute_string().as_deref(), Some("undefined"));
        assert_eq!(Value::NULL.to_attribute_string().as_deref(), Some("null"));
        assert_eq!(Value::from(1.5).to_attribute_string().as_deref(), Some("1.5"));
        assert_eq!(Value::from(2.0).to_attribute_string().as_deref(), Some("2"));
        assert_eq!(
            Value::from(json!([1, null, "a", [2, 3]]))
                .to_attribute_string()
                .as_deref(),
            Some("1,,a,2,3")
        );
        assert_eq!(
            Value::from(json!({"a": 1})).to_attribute_string().as_deref(),
            Some("[object Object]")
        );
    }

    #[test]
    fn objects_compare_by_reference() {
        let shared: Rc<dyn HostObject> = Rc::new(Named(Some("x")));
        let a = Value::Object(Rc::clone(&shared));
        let b = Value::Object(shared);
        let c = Value::object(Named(Some("x")));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn json_compares_structurally() {
        assert_eq!(Value::from(json!({"a": [1, 2]})), Value::from(json!({"a": [1, 2]})));
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::Undefined, Value::NULL);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_eq!(Value::from(1.0), Value::from(1u64));
        assert_ne!(Value::from(1), Value::from(1.5));
        assert_eq!(Value::from(-3), Value::from(-3.0));
        assert_eq!(
            Value::from(json!({"n": [1, {"m": 2}]})),
            Value::from(json!({"n": [1.0, {"m": 2.0}]}))
        );
        assert_ne!(Value::from(json!({"n": 1})), Value::from(json!({"n": 1, "m": 1})));
        assert_ne!(Value::from(json!([1])), Value::from(json!([1, 1])));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert!(Value::from(f64::INFINITY).is_null());
    }

    #[test]
    fn json_text_of_objects_without_string_conversion_fails() {
        let err = Value::object(Named(None)).to_json_text().unwrap_err();
        assert_eq!(err.type_name, "object");
    }
}

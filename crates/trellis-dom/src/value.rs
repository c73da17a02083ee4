//! Property values carried by document nodes.
//!
//! [`DomValue`] is deliberately close to a JSON value with an extra binary
//! variant, which is what the scripting bridge hands over for node
//! properties and call-function parameters.

use std::fmt;

use crate::collections::map::HashMap;

/// String-keyed property bag stored on every node.
pub type PropertyMap = HashMap<String, DomValue>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DomValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(PropertyMap),
    Array(Vec<DomValue>),
    Buffer(Vec<u8>),
}

impl DomValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DomValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DomValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DomValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DomValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            DomValue::Object(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DomValue]> {
        match self {
            DomValue::Array(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self {
            DomValue::Buffer(value) => Some(value),
            _ => None,
        }
    }

    /// Short name of the variant, used in log output.
    pub fn type_name(&self) -> &'static str {
        match self {
            DomValue::Null => "null",
            DomValue::Boolean(_) => "boolean",
            DomValue::Number(_) => "number",
            DomValue::String(_) => "string",
            DomValue::Object(_) => "object",
            DomValue::Array(_) => "array",
            DomValue::Buffer(_) => "buffer",
        }
    }
}

impl fmt::Display for DomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomValue::Null => f.write_str("null"),
            DomValue::Boolean(value) => write!(f, "{value}"),
            DomValue::Number(value) => write!(f, "{value}"),
            DomValue::String(value) => write!(f, "{value:?}"),
            DomValue::Object(value) => write!(f, "{{object; {} keys}}", value.len()),
            DomValue::Array(value) => write!(f, "[array; {} items]", value.len()),
            DomValue::Buffer(value) => write!(f, "<buffer; {} bytes>", value.len()),
        }
    }
}

impl From<bool> for DomValue {
    fn from(value: bool) -> Self {
        DomValue::Boolean(value)
    }
}

impl From<f64> for DomValue {
    fn from(value: f64) -> Self {
        DomValue::Number(value)
    }
}

impl From<i32> for DomValue {
    fn from(value: i32) -> Self {
        DomValue::Number(f64::from(value))
    }
}

impl From<&str> for DomValue {
    fn from(value: &str) -> Self {
        DomValue::String(value.to_owned())
    }
}

impl From<String> for DomValue {
    fn from(value: String) -> Self {
        DomValue::String(value)
    }
}

impl From<PropertyMap> for DomValue {
    fn from(value: PropertyMap) -> Self {
        DomValue::Object(value)
    }
}

impl From<Vec<DomValue>> for DomValue {
    fn from(value: Vec<DomValue>) -> Self {
        DomValue::Array(value)
    }
}

impl From<Vec<u8>> for DomValue {
    fn from(value: Vec<u8>) -> Self {
        DomValue::Buffer(value)
    }
}

impl<T: Into<DomValue>> From<Option<T>> for DomValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DomValue::Null, Into::into)
    }
}

/// Builds a [`PropertyMap`] from key/value pairs.
///
/// ```
/// use trellis_dom::{props, DomValue};
///
/// let map = props([("color", DomValue::from("red")), ("opacity", DomValue::Number(0.5))]);
/// assert_eq!(map.len(), 2);
/// ```
pub fn props<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> PropertyMap
where
    K: Into<String>,
    V: Into<DomValue>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(feature = "serde_json")]
mod json {
    use super::{DomValue, PropertyMap};

    impl From<serde_json::Value> for DomValue {
        fn from(value: serde_json::Value) -> Self {
            match value {
                serde_json::Value::Null => DomValue::Null,
                serde_json::Value::Bool(value) => DomValue::Boolean(value),
                serde_json::Value::Number(value) => {
                    value.as_f64().map_or(DomValue::Null, DomValue::Number)
                }
                serde_json::Value::String(value) => DomValue::String(value),
                serde_json::Value::Array(items) => {
                    DomValue::Array(items.into_iter().map(DomValue::from).collect())
                }
                serde_json::Value::Object(entries) => DomValue::Object(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key, DomValue::from(value)))
                        .collect::<PropertyMap>(),
                ),
            }
        }
    }

    // Buffers have no JSON form; they become arrays of byte values.
    impl From<DomValue> for serde_json::Value {
        fn from(value: DomValue) -> Self {
            match value {
                DomValue::Null => serde_json::Value::Null,
                DomValue::Boolean(value) => serde_json::Value::Bool(value),
                DomValue::Number(value) => serde_json::Number::from_f64(value)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
                DomValue::String(value) => serde_json::Value::String(value),
                DomValue::Array(items) => {
                    serde_json::Value::Array(items.into_iter().map(Into::into).collect())
                }
                DomValue::Object(entries) => serde_json::Value::Object(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key, value.into()))
                        .collect(),
                ),
                DomValue::Buffer(bytes) => serde_json::Value::Array(
                    bytes.into_iter().map(serde_json::Value::from).collect(),
                ),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/value_tests.rs"]
mod tests;

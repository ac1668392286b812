//! Values held by an execution context
//!
//! A context value is either plain JSON or an opaque object exposing named
//! zero-argument accessors. Pattern evaluation walks accessor chains such as
//! `${global.addr.city}` by calling `getCity` on whatever `addr` holds.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::Accessor;
use crate::error::VariableEvaluationError;

/// An object whose named accessors can be invoked by pattern evaluation
pub trait ContextObject: fmt::Debug + Send + Sync {
    /// Type name reported when an accessor is missing
    fn type_name(&self) -> &str;

    /// Whether the type exposes an accessor with this name (e.g. `getCity`)
    fn has_accessor(&self, accessor: &str) -> bool;

    /// Invoke an accessor. Returns `None` when the accessor yields nothing.
    fn invoke(&self, accessor: &str) -> Option<ContextValue>;

    /// JSON rendering used for interpolation and exported results
    fn to_json(&self) -> JsonValue;
}

/// A value stored under a key in the `run` or `global` store
#[derive(Debug, Clone)]
pub enum ContextValue {
    Json(JsonValue),
    Object(Arc<dyn ContextObject>),
}

impl ContextValue {
    /// Name of the value's type as reported in evaluation errors
    pub fn type_name(&self) -> &str {
        match self {
            ContextValue::Json(value) => json_type_name(value),
            ContextValue::Object(object) => object.type_name(),
        }
    }

    pub fn as_json(&self) -> JsonValue {
        match self {
            ContextValue::Json(value) => value.clone(),
            ContextValue::Object(object) => object.to_json(),
        }
    }

    /// JSON `null`, which evaluation reads the same as an absent value
    pub fn is_null(&self) -> bool {
        matches!(self, ContextValue::Json(JsonValue::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Json(JsonValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ContextValue::Json(value) => value.as_i64(),
            ContextValue::Object(_) => None,
        }
    }

    /// Text form used when substituting a value into a template. Strings
    /// are emitted without quotes.
    pub fn render(&self) -> String {
        match self {
            ContextValue::Json(JsonValue::String(s)) => s.clone(),
            other => other.as_json().to_string(),
        }
    }

    /// Apply one accessor of a cached chain to this value
    pub(crate) fn call(
        &self,
        accessor: &Accessor,
    ) -> Result<Option<ContextValue>, VariableEvaluationError> {
        let missing = || VariableEvaluationError::MissingAccessor {
            accessor: accessor.method.clone(),
            type_name: self.type_name().to_string(),
        };

        match self {
            ContextValue::Object(object) => {
                if !object.has_accessor(&accessor.method) {
                    return Err(missing());
                }
                Ok(object.invoke(&accessor.method))
            }
            ContextValue::Json(JsonValue::Object(map)) => {
                // Exact key first, then any key sharing the accessor name, as Record does
                let field = map.get(&accessor.attribute).or_else(|| {
                    map.iter()
                        .find(|(key, _)| accessor_name(key) == accessor.method)
                        .map(|(_, value)| value)
                });
                match field {
                    Some(JsonValue::Null) => Ok(None),
                    Some(value) => Ok(Some(ContextValue::Json(value.clone()))),
                    None => Err(missing()),
                }
            }
            ContextValue::Json(_) => Err(missing()),
        }
    }
}

impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContextValue::Json(a), ContextValue::Json(b)) => a == b,
            (ContextValue::Object(a), ContextValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<JsonValue> for ContextValue {
    fn from(value: JsonValue) -> Self {
        ContextValue::Json(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Json(JsonValue::String(value.to_string()))
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Json(JsonValue::String(value))
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Json(value.into())
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Json(value.into())
    }
}

impl From<u64> for ContextValue {
    fn from(value: u64) -> Self {
        ContextValue::Json(value.into())
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Json(value.into())
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Json(value.into())
    }
}

impl From<Record> for ContextValue {
    fn from(record: Record) -> Self {
        ContextValue::Object(Arc::new(record))
    }
}

impl From<Arc<dyn ContextObject>> for ContextValue {
    fn from(object: Arc<dyn ContextObject>) -> Self {
        ContextValue::Object(object)
    }
}

/// Accessor name derived from an attribute segment: `city` -> `getCity`
pub fn accessor_name(attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
        None => "get".to_string(),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// A named object type backed by a field table. Every field `foo` is exposed
/// through the accessor `getFoo`; fields declared empty exist but yield
/// nothing.
#[derive(Debug, Clone)]
pub struct Record {
    type_name: String,
    fields: BTreeMap<String, Option<ContextValue>>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_empty_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    pub fn field(&self, name: &str) -> Option<&ContextValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    fn lookup(&self, accessor: &str) -> Option<&Option<ContextValue>> {
        self.fields
            .iter()
            .find(|(name, _)| accessor_name(name) == accessor)
            .map(|(_, value)| value)
    }
}

impl ContextObject for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn has_accessor(&self, accessor: &str) -> bool {
        self.lookup(accessor).is_some()
    }

    fn invoke(&self, accessor: &str) -> Option<ContextValue> {
        self.lookup(accessor).cloned().flatten()
    }

    fn to_json(&self) -> JsonValue {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| {
                let json = value.as_ref().map(ContextValue::as_json).unwrap_or(JsonValue::Null);
                (name.clone(), json)
            })
            .collect();
        JsonValue::Object(fields)
    }
}

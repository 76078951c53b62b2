//! Document payload types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single payload field value.
///
/// Closed set of shapes a document field can take. Serialized untagged, so
/// JSON reads naturally: `"text"`, `2021`, `0.5`, `["a", "b"]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text (title, abstract, venue, url...).
    Text(String),
    /// Integral number (year, citation count...).
    Integer(i64),
    /// Non-integral number.
    Float(f64),
    /// List of strings (authors, keywords...).
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is an `Integer` value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as `f64` for either numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns the items if this is a `List` value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts an arbitrary JSON value.
    ///
    /// Returns `None` for `null`. Booleans and nested objects become text,
    /// non-string array items are stringified.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Text(b.to_string())),
            Value::String(s) => Some(Self::Text(s)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::Array(items) => Some(Self::List(
                items
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Value::Object(map) => Some(Self::Text(Value::Object(map).to_string())),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Ordered field-name → value map attached to one document.
///
/// Field order is preserved through serialization. The index never looks
/// inside a payload; it is handed back unchanged on retrieval.
///
/// # Example
/// ```
/// use simsearch::DocumentPayload;
///
/// let payload = DocumentPayload::new()
///     .with("title", "Attention Is All You Need")
///     .with("year", 2017)
///     .with("authors", vec!["Vaswani", "Shazeer"]);
///
/// assert_eq!(payload.text("title"), Some("Attention Is All You Need"));
/// let json = serde_json::to_string(&payload).unwrap();
/// assert!(json.starts_with(r#"{"title":"#));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPayload {
    fields: IndexMap<String, FieldValue>,
}

impl DocumentPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts or replaces a field, keeping its original position on replace.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Field value by name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Text field by name.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field holding a NaN or infinite `Float`, if any.
    ///
    /// JSON has no encoding for such values, so payloads carrying one cannot
    /// be persisted.
    pub fn non_finite_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, v)| matches!(v, FieldValue::Float(x) if !x.is_finite()))
            .map(|(k, _)| k.as_str())
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a payload from a JSON object, converting values with
    /// [`FieldValue::from_json`] and dropping nulls.
    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .filter_map(|(k, v)| FieldValue::from_json(v).map(|v| (k, v)))
            .collect();
        Self { fields }
    }
}

impl FromIterator<(String, FieldValue)> for DocumentPayload {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

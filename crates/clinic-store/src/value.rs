//! Record, key and field value types
//!
//! Records deserialize directly from the JSON objects served by seed sources;
//! field order is preserved as inserted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a record within its store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key (generated keys are always integers)
    Int(i64),
    /// String key
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Text(value)
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Text
    Text(String),
    /// List of values (e.g. prescribed medicine ids)
    List(Vec<Value>),
}

impl Value {
    /// Interpret value as a record key
    ///
    /// Integers, integral floats and text convert; everything else does not.
    #[must_use]
    pub fn as_key(&self) -> Option<Key> {
        match self {
            Value::Int(i) => Some(Key::Int(*i)),
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(Key::Int(*f as i64)),
            Value::Text(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }

    /// Borrow text content
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow list content
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Check for null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality used by index lookups: key-like values compare as keys
    #[must_use]
    pub fn index_eq(&self, other: &Value) -> bool {
        match (self.as_key(), other.as_key()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Key> for Value {
    fn from(value: Key) -> Self {
        match value {
            Key::Int(i) => Value::Int(i),
            Key::Text(s) => Value::Text(s),
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// One persisted entity instance
///
/// Field order follows insertion. Equality ignores order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With field set
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get field value
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get field as text
    #[inline]
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Remove field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Check if field is present
    #[inline]
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Read key stored under `key_field`
    #[must_use]
    pub fn key(&self, key_field: &str) -> Option<Key> {
        self.get(key_field).and_then(Value::as_key)
    }

    /// Iterate fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only the listed fields
    pub fn retain_fields(&mut self, keep: &[String]) {
        self.fields.retain(|name, _| keep.iter().any(|k| k == name));
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if record has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_as_key() {
        assert_eq!(Value::Int(3).as_key(), Some(Key::Int(3)));
        assert_eq!(Value::Float(3.0).as_key(), Some(Key::Int(3)));
        assert_eq!(Value::Float(3.5).as_key(), None);
        assert_eq!(Value::from("P-1").as_key(), Some(Key::from("P-1")));
        assert_eq!(Value::Null.as_key(), None);
        assert_eq!(Value::Bool(true).as_key(), None);
    }

    #[test]
    fn index_eq_treats_integral_floats_as_ints() {
        assert!(Value::Int(1).index_eq(&Value::Float(1.0)));
        assert!(!Value::Int(1).index_eq(&Value::from("1")));
        assert!(Value::Bool(true).index_eq(&Value::Bool(true)));
    }

    #[test]
    fn record_deserializes_from_json_object() {
        let record: Record =
            serde_json::from_str(r#"{"id": 1, "First": "John", "medicines": [2, 3], "DOB": null}"#)
                .unwrap();
        assert_eq!(record.key("id"), Some(Key::Int(1)));
        assert_eq!(record.text("First"), Some("John"));
        assert_eq!(
            record.get("medicines"),
            Some(&Value::List(vec![Value::Int(2), Value::Int(3)]))
        );
        assert_eq!(record.get("DOB"), Some(&Value::Null));
    }

    #[test]
    fn record_preserves_field_order() {
        let record = Record::new().with("b", 1).with("a", 2).with("c", 3);
        let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn record_equality_ignores_order() {
        let a = Record::new().with("x", 1).with("y", "two");
        let b = Record::new().with("y", "two").with("x", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn retain_fields_projects() {
        let mut record = Record::new()
            .with("id", 7)
            .with("Drug", "Aspirin")
            .with("Dosage", "75mg");
        record.retain_fields(&["id".to_string(), "Drug".to_string()]);
        assert_eq!(record.len(), 2);
        assert!(!record.contains("Dosage"));
    }

    #[test]
    fn list_display_joins_items() {
        let value = Value::List(vec![Value::Int(2), Value::from("x")]);
        assert_eq!(value.to_string(), "2, x");
    }
}

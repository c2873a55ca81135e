//! Value type for tree node payloads.
//!
//! This module defines the `Value` enum which represents any value a tree
//! node can hold. Only `Value::Map` is composite from the tree's point of
//! view: it is the one shape that decomposes into child values by segment
//! name. Lists are leaves for propagation purposes.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// String-keyed composite payload. A `BTreeMap` keeps composite iteration
/// deterministic, which matters for stable emission order.
pub type ValueMap = BTreeMap<String, Value>;

/// A value held by a tree node.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered list of values; a leaf for propagation purposes
    List(Vec<Value>),
    /// String-keyed composite; the only shape that decomposes into children
    Map(ValueMap),
}

impl Value {
    /// Creates a composite value from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value can be decomposed by segment name.
    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns the boolean value if this is a Bool, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Float, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns a slice of the elements if this is a List, None otherwise.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Returns the composite entries if this is a Map, None otherwise.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a key in a composite value.
    ///
    /// Returns None for non-composite values as well as missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns a copy of this value with `key` replaced by `value`.
    ///
    /// This is the structural merge used by upward aggregation: a composite
    /// keeps all its other keys; any non-composite receiver (including Null,
    /// i.e. an uninitialized parent) is replaced by a fresh single-entry
    /// composite.
    pub fn with_key(&self, key: impl Into<String>, value: Value) -> Value {
        let mut map = match self {
            Value::Map(map) => map.clone(),
            _ => ValueMap::new(),
        };
        map.insert(key.into(), value);
        Value::Map(map)
    }

    /// Inserts a key into a composite value in place.
    ///
    /// Turns a non-composite receiver into a single-entry composite.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        match self {
            Value::Map(map) => {
                map.insert(key.into(), value);
            }
            _ => {
                let mut map = ValueMap::new();
                map.insert(key.into(), value);
                *self = Value::Map(map);
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(String::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::Int(7).as_str(), None);
    }

    #[test]
    fn test_value_composite() {
        let v = Value::map([("a", Value::Int(1)), ("b", Value::Null)]);
        assert!(v.is_composite());
        assert_eq!(v.get("a"), Some(&Value::Int(1)));
        assert_eq!(v.get("missing"), None);
        assert!(!Value::List(vec![Value::Int(1)]).is_composite());
        assert_eq!(Value::Int(1).get("a"), None);
    }

    #[test]
    fn test_with_key_replaces() {
        let v = Value::map([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let next = v.with_key("a", Value::Int(10));

        assert_eq!(next.get("a"), Some(&Value::Int(10)));
        assert_eq!(next.get("b"), Some(&Value::Int(2)));
        // Original untouched
        assert_eq!(v.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_with_key_on_scalar_starts_fresh() {
        let next = Value::Int(3).with_key("a", Value::Int(1));
        assert_eq!(next, Value::map([("a", Value::Int(1))]));

        let next = Value::Null.with_key("a", Value::Int(1));
        assert_eq!(next, Value::map([("a", Value::Int(1))]));
    }

    #[test]
    fn test_insert_in_place() {
        let mut v = Value::map([("a", Value::Int(1))]);
        v.insert("b", Value::Int(2));
        assert_eq!(v.get("b"), Some(&Value::Int(2)));

        let mut scalar = Value::Int(5);
        scalar.insert("x", Value::Bool(true));
        assert_eq!(scalar, Value::map([("x", Value::Bool(true))]));
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(
            Value::map([("a", Value::Int(1))]),
            Value::map([("a", Value::Int(1))])
        );
        assert_ne!(
            Value::map([("a", Value::Int(1))]),
            Value::map([("a", Value::Int(2))])
        );
    }
}

//! The generic document value.
//!
//! Every parsed document, schema default tree and serializer output is a
//! [`Value`]. Mappings keep insertion order; keys starting with
//! [`ATTRIBUTE_PREFIX`](crate::base::constants::ATTRIBUTE_PREFIX) are XML
//! attributes. A key missing from a mapping is distinct from a key mapped
//! to [`Value::Null`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

use crate::base::{FieldPath, PathSegment};

/// Insertion-ordered key → value mapping.
pub type Mapping = IndexMap<String, Value>;

/// A parsed or to-be-serialized document node.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// An empty mapping.
    pub fn mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    /// Type a raw text scalar the way the XML reader does.
    ///
    /// `"true"`/`"false"` become booleans and canonical numbers become
    /// numbers. A number is canonical only if printing it back yields the
    /// same text, so `"007"` or `"1e3"` stay strings and re-serialization is
    /// lossless.
    pub fn from_text(text: &str) -> Self {
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match canonical_number(text) {
                Some(n) => Value::Number(n),
                None => Value::String(text.to_string()),
            },
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Sequence(_) | Value::Mapping(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a sequence, or the value itself under the
    /// single-occurrence convention. `Null` has no elements.
    pub fn as_list(&self) -> Vec<&Value> {
        match self {
            Value::Sequence(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    /// Member lookup on a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Text form of a scalar (`None` for sequences and mappings).
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }

    /// Boolean reading of a scalar, accepting `"true"`/`"false"` text.
    pub fn coerce_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric reading of a scalar, accepting numeric text.
    pub fn coerce_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(n.clone()),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Some(Number::from(i));
                }
                if let Ok(u) = trimmed.parse::<u64>() {
                    return Some(Number::from(u));
                }
                trimmed.parse::<f64>().ok().and_then(Number::from_f64)
            }
            _ => None,
        }
    }

    /// Follow `path` through mappings (keys) and sequences (indices).
    ///
    /// A key segment applied to a non-sequence value at an index step is not
    /// resolved; a bare (non-sequence) value answers index `0`, matching the
    /// single-occurrence XML convention.
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        let mut current = self;
        for segment in path {
            current = match (segment, current) {
                (PathSegment::Key(k), Value::Mapping(m)) => m.get(k)?,
                (PathSegment::Index(i), Value::Sequence(s)) => s.get(*i)?,
                (PathSegment::Index(0), other) if !other.is_null() => other,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable variant of [`Value::get_path`] without the bare-value rule.
    pub fn get_path_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        let mut current = self;
        for segment in path {
            current = match (segment, current) {
                (PathSegment::Key(k), Value::Mapping(m)) => m.get_mut(k)?,
                (PathSegment::Index(i), Value::Sequence(s)) => s.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Store `value` at `path`, creating intermediate mappings for missing
    /// keys. Indices must already exist.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) -> Result<(), String> {
        let Some((last, parents)) = path.segments().split_last() else {
            *self = value;
            return Ok(());
        };
        let mut current = self;
        for segment in parents {
            current = match segment {
                PathSegment::Key(k) => {
                    if current.is_null() {
                        *current = Value::mapping();
                    }
                    let map = current
                        .as_mapping_mut()
                        .ok_or_else(|| format!("'{k}' is not inside a mapping"))?;
                    map.entry(k.clone()).or_insert(Value::Null)
                }
                PathSegment::Index(i) => current
                    .as_sequence_mut()
                    .and_then(|s| s.get_mut(*i))
                    .ok_or_else(|| format!("index {i} is out of range"))?,
            };
        }
        match last {
            PathSegment::Key(k) => {
                if current.is_null() {
                    *current = Value::mapping();
                }
                let map = current
                    .as_mapping_mut()
                    .ok_or_else(|| format!("'{k}' is not inside a mapping"))?;
                map.insert(k.clone(), value);
            }
            PathSegment::Index(i) => {
                let slot = current
                    .as_sequence_mut()
                    .and_then(|s| s.get_mut(*i))
                    .ok_or_else(|| format!("index {i} is out of range"))?;
                *slot = value;
            }
        }
        Ok(())
    }
}

/// Parse `text` as a number only if it is already in canonical printed form.
fn canonical_number(text: &str) -> Option<Number> {
    let first = text.as_bytes().first()?;
    if !(first.is_ascii_digit() || *first == b'-') {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        let n = Number::from(i);
        return (n.to_string() == text).then_some(n);
    }
    if let Ok(u) = text.parse::<u64>() {
        let n = Number::from(u);
        return (n.to_string() == text).then_some(n);
    }
    let f = text.parse::<f64>().ok()?;
    let n = Number::from_f64(f)?;
    (n.to_string() == text).then_some(n)
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Number(Number::from(u))
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_typing() {
        assert_eq!(Value::from_text("true"), Value::Bool(true));
        assert_eq!(Value::from_text("5"), Value::from(5i64));
        assert_eq!(Value::from_text("-12"), Value::from(-12i64));
        assert!(matches!(Value::from_text("1.5"), Value::Number(_)));
        assert_eq!(Value::from_text("007"), Value::from("007"));
        assert_eq!(Value::from_text("1e3"), Value::from("1e3"));
        assert_eq!(Value::from_text("14720B"), Value::from("14720B"));
        assert_eq!(Value::from_text("TRUE"), Value::from("TRUE"));
        assert_eq!(Value::from_text(""), Value::from(""));
    }

    #[test]
    fn test_from_text_is_lossless() {
        for text in ["0", "42", "-7", "0.25", "007", "+5", "1.0", "auto", "30 s"] {
            let value = Value::from_text(text);
            assert_eq!(value.to_text().as_deref(), Some(text), "text {text}");
        }
    }

    #[test]
    fn test_get_path_bare_value_answers_index_zero() {
        let mut inner = Mapping::new();
        inner.insert("@_address".into(), Value::from("10.0.0.1"));
        let mut peers = Mapping::new();
        peers.insert("Peer".into(), Value::Mapping(inner));
        let value = Value::Mapping(peers);

        let found = value.get_path(&FieldPath::parse("Peer/0/@_address"));
        assert_eq!(found, Some(&Value::from("10.0.0.1")));
        assert_eq!(value.get_path(&FieldPath::parse("Peer/1/@_address")), None);
    }

    #[test]
    fn test_set_path_creates_mappings() {
        let mut value = Value::Null;
        value
            .set_path(&FieldPath::parse("a/b/c"), Value::from(1i64))
            .unwrap();
        assert_eq!(
            value.get_path(&FieldPath::parse("a/b/c")),
            Some(&Value::from(1i64))
        );
    }

    #[test]
    fn test_set_path_rejects_missing_index() {
        let mut value = Value::Sequence(vec![]);
        let err = value
            .set_path(&FieldPath::parse("0"), Value::Null)
            .unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(Value::from("TRUE").coerce_bool(), Some(true));
        assert_eq!(Value::from("x").coerce_bool(), None);
        assert_eq!(
            Value::from(" 12 ").coerce_number(),
            Some(Number::from(12i64))
        );
        assert_eq!(Value::from("ab").coerce_number(), None);
    }

    #[test]
    fn test_json_conversion_preserves_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"z":1,"a":[true,null]}"#).unwrap();
        let value = Value::from(json.clone());
        let keys: Vec<_> = value.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(serde_json::Value::from(&value), json);
    }
}

//! One schema tree plus the annotations that drive field building.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::base::FieldPath;
use crate::document::Value;

/// What to emit for an included array field whose item list ends up empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyArrayPolicy {
    /// Leave the key out.
    #[default]
    Omit,
    /// Emit an empty sequence (`[]` in JSON).
    Empty,
    /// Emit a fixed placeholder value.
    Sentinel(Value),
}

/// Declared array path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArraySpec {
    /// Shape of one item; overrides the schema's first example element.
    pub template: Option<Value>,
    /// Behaviour for an included but empty list.
    pub empty: EmptyArrayPolicy,
}

/// Inclusive numeric bounds for a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// A default document tree with its annotations.
///
/// Annotation keys are `/`-joined paths without array indices
/// (see [`FieldPath::schema_key`]).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSection {
    /// The canonical default tree.
    pub defaults: Value,
    /// Paths that are arrays regardless of how many items a document holds.
    pub arrays: IndexMap<String, ArraySpec>,
    /// Paths rendered as `select` fields, with their options.
    pub selects: IndexMap<String, Vec<String>>,
    /// Paths that must carry a value.
    pub required: Vec<String>,
    /// Numeric bounds checked by field validation.
    pub ranges: IndexMap<String, NumericRange>,
}

static OMIT: EmptyArrayPolicy = EmptyArrayPolicy::Omit;

impl SchemaSection {
    /// A section holding only a default tree.
    pub fn from_defaults(defaults: Value) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn array_spec(&self, path: &FieldPath) -> Option<&ArraySpec> {
        self.arrays.get(&path.schema_key())
    }

    pub fn is_declared_array(&self, path: &FieldPath) -> bool {
        self.arrays.contains_key(&path.schema_key())
    }

    pub fn select_options(&self, path: &FieldPath) -> Option<&[String]> {
        self.selects.get(&path.schema_key()).map(Vec::as_slice)
    }

    pub fn is_required(&self, path: &FieldPath) -> bool {
        let key = path.schema_key();
        self.required.iter().any(|r| *r == key)
    }

    pub fn range(&self, path: &FieldPath) -> Option<&NumericRange> {
        self.ranges.get(&path.schema_key())
    }

    pub fn empty_policy(&self, path: &FieldPath) -> &EmptyArrayPolicy {
        self.array_spec(path).map_or(&OMIT, |spec| &spec.empty)
    }

    /// Item template for the array at `path`.
    ///
    /// Declared template first, then the schema's first example element,
    /// then the first element of the document's own list.
    pub fn item_template(&self, path: &FieldPath, schema: &Value, data: &Value) -> Option<Value> {
        if let Some(template) = self.array_spec(path).and_then(|s| s.template.as_ref()) {
            return Some(template.clone());
        }
        let first = |v: &Value| match v {
            Value::Sequence(items) => items.first().cloned(),
            Value::Mapping(_) => Some(v.clone()),
            _ => None,
        };
        first(schema).or_else(|| first(data))
    }

    /// Wrap bare values found at declared array paths into sequences.
    ///
    /// XML writes a single repeated element without any array marker, so a
    /// one-item list arrives as a bare value. Blank values become empty lists.
    pub fn normalize_arity(&self, value: &mut Value) {
        if self.arrays.is_empty() {
            return;
        }
        self.normalize_at(value, &FieldPath::root());
    }

    fn normalize_at(&self, value: &mut Value, path: &FieldPath) {
        match value {
            Value::Mapping(map) => {
                for (key, child) in map.iter_mut() {
                    let child_path = path.child(key);
                    if self.is_declared_array(&child_path) && !matches!(child, Value::Sequence(_)) {
                        let item = std::mem::take(child);
                        *child = if item.is_blank() {
                            Value::Sequence(Vec::new())
                        } else {
                            Value::Sequence(vec![item])
                        };
                    }
                    self.normalize_at(child, &child_path);
                }
            }
            Value::Sequence(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.normalize_at(item, &path.index(i));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, JsonCodec};

    fn section() -> SchemaSection {
        json5::from_str(
            r#"{
                defaults: { Peers: { Peer: [] }, Mode: "a" },
                arrays: { "Peers/Peer": { template: { "@_address": "" } } },
                selects: { Mode: ["a", "b"] },
                required: ["Mode"],
                ranges: { Port: { min: 1, max: 10 } },
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_annotation_lookup_ignores_indices() {
        let s = section();
        assert!(s.is_declared_array(&FieldPath::parse("Peers/Peer")));
        assert_eq!(
            s.select_options(&FieldPath::parse("Mode")),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert!(s.is_required(&FieldPath::parse("Mode")));
        assert!(s.range(&FieldPath::parse("Port")).unwrap().contains(10.0));
        assert!(!s.range(&FieldPath::parse("Port")).unwrap().contains(11.0));
        assert_eq!(s.empty_policy(&FieldPath::parse("Other")), &EmptyArrayPolicy::Omit);
    }

    #[test]
    fn test_normalize_wraps_bare_item() {
        let s = section();
        let mut value = JsonCodec
            .parse(r#"{"Peers": {"Peer": {"@_address": "10.0.0.1"}}}"#)
            .unwrap();
        s.normalize_arity(&mut value);
        let peers = value.get_path(&FieldPath::parse("Peers/Peer")).unwrap();
        assert_eq!(peers.as_sequence().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn test_normalize_blank_becomes_empty_list() {
        let s = section();
        let mut value = JsonCodec.parse(r#"{"Peers": {"Peer": ""}}"#).unwrap();
        s.normalize_arity(&mut value);
        assert_eq!(
            value.get_path(&FieldPath::parse("Peers/Peer")),
            Some(&Value::Sequence(vec![]))
        );
    }

    #[test]
    fn test_item_template_precedence() {
        let s = section();
        let declared = s
            .item_template(&FieldPath::parse("Peers/Peer"), &Value::Null, &Value::Null)
            .unwrap();
        assert!(declared.get("@_address").is_some());

        let schema = JsonCodec.parse(r#"[{"a": 1}]"#).unwrap();
        let data = JsonCodec.parse(r#"[{"b": 2}]"#).unwrap();
        let from_schema = s.item_template(&FieldPath::parse("X"), &schema, &data).unwrap();
        assert!(from_schema.get("a").is_some());
        let from_data = s
            .item_template(&FieldPath::parse("X"), &Value::Sequence(vec![]), &data)
            .unwrap();
        assert!(from_data.get("b").is_some());
    }
}

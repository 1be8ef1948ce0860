//! Field tree → generic value.

use serde::{Deserialize, Serialize};

use crate::base::FieldPath;
use crate::document::{Mapping, Value};
use crate::schema::{EmptyArrayPolicy, SchemaSection};

use super::builder::bind_item;
use super::model::Field;
use super::snapshot::FieldSnapshot;

/// Which fields the serializer emits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Only fields that differ from their default, existed in the upload,
    /// were modified, or are force-included.
    #[default]
    Minimal,
    /// Every field.
    Full,
}

/// Inputs to [`serialize_fields`] besides the fields themselves.
#[derive(Clone, Copy, Debug)]
pub struct SerializeOptions<'a> {
    pub mode: OutputMode,
    /// The normalized upload, used for the "existed in the original" rule.
    pub uploaded: Option<&'a Value>,
    pub snapshot: Option<&'a FieldSnapshot>,
    /// Supplies the empty-array policy per path.
    pub section: &'a SchemaSection,
}

impl<'a> SerializeOptions<'a> {
    pub fn new(mode: OutputMode, section: &'a SchemaSection) -> Self {
        Self {
            mode,
            uploaded: None,
            snapshot: None,
            section,
        }
    }

    pub fn with_uploaded(mut self, uploaded: Option<&'a Value>) -> Self {
        self.uploaded = uploaded;
        self
    }

    pub fn with_snapshot(mut self, snapshot: &'a FieldSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    fn minimal(&self) -> bool {
        self.mode == OutputMode::Minimal
    }

    fn existed(&self, path: &FieldPath) -> bool {
        self.uploaded
            .is_some_and(|uploaded| uploaded.get_path(path).is_some())
    }

    fn modified(&self, field: &Field) -> bool {
        self.snapshot
            .is_some_and(|snapshot| snapshot.is_modified(&field.path, &field.current_value()))
    }

    fn full(self) -> Self {
        Self {
            mode: OutputMode::Full,
            ..self
        }
    }
}

/// Serialize a field list into a mapping.
pub fn serialize_fields(fields: &[Field], options: &SerializeOptions<'_>) -> Mapping {
    let mut out = Mapping::new();
    for field in fields {
        if let Some(value) = serialize_field(field, options) {
            out.insert(field.name.clone(), value);
        }
    }
    out
}

fn serialize_field(field: &Field, options: &SerializeOptions<'_>) -> Option<Value> {
    if options.minimal() && field.force_include == Some(false) {
        return None;
    }
    if field.is_object() {
        serialize_object(field, options)
    } else if field.is_array() {
        serialize_array(field, options)
    } else {
        serialize_scalar(field, options)
    }
}

fn serialize_scalar(field: &Field, options: &SerializeOptions<'_>) -> Option<Value> {
    if !options.minimal() || field.force_include == Some(true) {
        return Some(field.value.clone());
    }
    if field.value.is_blank() && !field.required {
        return None;
    }
    let include = field.value != field.default_value
        || options.existed(&field.path)
        || options.modified(field);
    include.then(|| field.value.clone())
}

fn serialize_object(field: &Field, options: &SerializeOptions<'_>) -> Option<Value> {
    let children = serialize_fields(&field.fields, options);
    let include = !options.minimal()
        || !children.is_empty()
        || field.force_include == Some(true)
        || options.existed(&field.path)
        || options.modified(field);
    include.then_some(Value::Mapping(children))
}

fn serialize_array(field: &Field, options: &SerializeOptions<'_>) -> Option<Value> {
    let forced = field.force_include == Some(true);
    let items = if field.is_object_array() {
        serialize_object_items(field, options)
    } else {
        field
            .items()
            .iter()
            .filter(|item| !item.is_blank())
            .cloned()
            .collect()
    };

    let include = !options.minimal()
        || forced
        || options.existed(&field.path)
        || options.modified(field)
        || if field.is_object_array() {
            !items.is_empty()
        } else {
            let defaults: Vec<&Value> = field
                .default_value
                .as_sequence()
                .unwrap_or(&[])
                .iter()
                .filter(|item| !item.is_blank())
                .collect();
            items.iter().ne(defaults.into_iter())
        };
    if !include {
        return None;
    }
    if !items.is_empty() {
        return Some(Value::Sequence(items));
    }
    match options.section.empty_policy(&field.path) {
        EmptyArrayPolicy::Omit => None,
        EmptyArrayPolicy::Empty => Some(Value::Sequence(Vec::new())),
        EmptyArrayPolicy::Sentinel(value) => Some(value.clone()),
    }
}

fn serialize_object_items(field: &Field, options: &SerializeOptions<'_>) -> Vec<Value> {
    let array_forced = field.force_include == Some(true);
    let mut out = Vec::new();
    for (index, item) in field.items().iter().enumerate() {
        if !matches!(item, Value::Mapping(_)) {
            if !item.is_blank() {
                out.push(item.clone());
            }
            continue;
        }
        let Some(bound) = bind_item(field, index) else {
            continue;
        };
        let item_forced = field.item_overrides.get(index, "") == Some(true);
        if options.minimal() && field.item_overrides.get(index, "") == Some(false) {
            continue;
        }
        let serialized = if item_forced {
            serialize_fields(&bound, &options.full())
        } else {
            serialize_fields(&bound, options)
        };
        if serialized.is_empty() && !(item_forced || array_forced) && options.minimal() {
            continue;
        }
        out.push(Value::Mapping(serialized));
    }
    out
}

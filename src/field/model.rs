//! The editable field tree.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::base::constants::ATTRIBUTE_PREFIX;
use crate::base::{FieldPath, PathSegment};
use crate::document::{Mapping, Value};

/// Widget-level type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Select,
    Array,
    Object,
}

/// Per-item force-include flags of an array-of-object field.
///
/// Keyed by item index, then by the `/`-joined path relative to the item
/// (the empty string addresses the item itself). Flags live here rather
/// than on the shared template so that one item's override never leaks
/// into its siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemOverrides(BTreeMap<usize, BTreeMap<String, bool>>);

impl ItemOverrides {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize, relative: &str) -> Option<bool> {
        self.0.get(&index).and_then(|m| m.get(relative)).copied()
    }

    pub fn set(&mut self, index: usize, relative: String, flag: bool) {
        self.0.entry(index).or_default().insert(relative, flag);
    }

    /// Drop an entry, and the item's map once it is empty.
    pub fn remove(&mut self, index: usize, relative: &str) {
        if let Some(map) = self.0.get_mut(&index) {
            map.remove(relative);
            if map.is_empty() {
                self.0.remove(&index);
            }
        }
    }

    /// All flags recorded for one item.
    pub fn item(&self, index: usize) -> Option<&BTreeMap<String, bool>> {
        self.0.get(&index)
    }

    /// Whether any flag of the item is `true`.
    pub fn any_forced(&self, index: usize) -> bool {
        self.item(index).is_some_and(|m| m.values().any(|f| *f))
    }

    /// Forget item `nested` of the array at `relative` inside item `index`,
    /// shifting later nested items down by one.
    pub fn remove_nested_item(&mut self, index: usize, relative: &FieldPath, nested: usize) {
        let Some(map) = self.0.get_mut(&index) else {
            return;
        };
        let shifted = std::mem::take(map)
            .into_iter()
            .filter_map(|(key, flag)| {
                let path = FieldPath::parse(&key);
                let Some(rest) = path.strip_prefix(relative) else {
                    return Some((key, flag));
                };
                match rest.segments().first().and_then(PathSegment::as_index) {
                    Some(i) if i == nested => None,
                    Some(i) if i > nested => {
                        let mut segments = relative.segments().to_vec();
                        segments.push(PathSegment::Index(i - 1));
                        segments.extend_from_slice(&rest.segments()[1..]);
                        Some((FieldPath::new(segments).to_string(), flag))
                    }
                    _ => Some((key, flag)),
                }
            })
            .collect();
        *map = shifted;
        if map.is_empty() {
            self.0.remove(&index);
        }
    }

    /// Forget item `index` and shift later items down by one.
    pub fn remove_item(&mut self, index: usize) {
        let shifted = std::mem::take(&mut self.0)
            .into_iter()
            .filter(|(i, _)| *i != index)
            .map(|(i, m)| if i > index { (i - 1, m) } else { (i, m) })
            .collect();
        self.0 = shifted;
    }
}

/// A node of the editable form tree.
///
/// `path` is the parent's path plus `name`; realized array items insert an
/// index segment. For `Object` fields `value` is not authoritative, use
/// [`Field::current_value`]. For `Array` fields `value` holds the item list
/// and `fields` holds the item template, not realized items.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value: Value,
    pub default_value: Value,
    pub path: FieldPath,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_include: Option<bool>,
    #[serde(skip_serializing_if = "ItemOverrides::is_empty")]
    pub item_overrides: ItemOverrides,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, path: FieldPath) -> Self {
        let name = name.into();
        Self {
            label: label_for(&name),
            name,
            field_type,
            value: Value::Null,
            default_value: Value::Null,
            path,
            required: false,
            options: Vec::new(),
            fields: Vec::new(),
            force_include: None,
            item_overrides: ItemOverrides::default(),
        }
    }

    pub fn is_object(&self) -> bool {
        self.field_type == FieldType::Object
    }

    pub fn is_array(&self) -> bool {
        self.field_type == FieldType::Array
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_object() && !self.is_array()
    }

    /// Array whose items are mappings (has an item template).
    pub fn is_object_array(&self) -> bool {
        self.is_array() && !self.fields.is_empty()
    }

    /// The field's value, materializing objects from their children.
    pub fn current_value(&self) -> Value {
        match self.field_type {
            FieldType::Object => Value::Mapping(
                self.fields
                    .iter()
                    .map(|f| (f.name.clone(), f.current_value()))
                    .collect(),
            ),
            _ => self.value.clone(),
        }
    }

    /// Default for this field (objects materialize from children).
    pub fn current_default(&self) -> Value {
        match self.field_type {
            FieldType::Object => Value::Mapping(
                self.fields
                    .iter()
                    .map(|f| (f.name.clone(), f.current_default()))
                    .collect(),
            ),
            _ => self.default_value.clone(),
        }
    }

    /// Items of an array field.
    pub fn items(&self) -> &[Value] {
        self.value.as_sequence().unwrap_or(&[])
    }

    /// The template materialized as one default item.
    pub fn template_item(&self) -> Value {
        Value::Mapping(
            self.fields
                .iter()
                .map(|f| (f.name.clone(), f.current_default()))
                .collect::<Mapping>(),
        )
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

/// Human label from an element/attribute name.
///
/// `MaxMessageSize` → `Max Message Size`, `@_Id` → `Id`,
/// `transport_id` → `Transport Id`.
pub fn label_for(name: &str) -> String {
    let name = name.strip_prefix(ATTRIBUTE_PREFIX).unwrap_or(name);
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
        let boundary = match prev {
            Some(p) if c.is_uppercase() => p.is_lowercase() || p.is_ascii_digit() || (p.is_uppercase() && next_lower),
            _ => false,
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find a field by exact path, descending through object children only.
pub fn find_field<'a>(fields: &'a [Field], path: &FieldPath) -> Option<&'a Field> {
    let mut current = fields;
    let mut found = None;
    for segment in path {
        let PathSegment::Key(name) = segment else {
            return None;
        };
        let field = current.iter().find(|f| &f.name == name)?;
        current = &field.fields;
        found = Some(field);
    }
    found
}

/// Mutable variant of [`find_field`].
pub fn find_field_mut<'a>(fields: &'a mut [Field], path: &FieldPath) -> Option<&'a mut Field> {
    let (first, rest) = path.segments().split_first()?;
    let name = first.as_key()?;
    let field = fields.iter_mut().find(|f| f.name == name)?;
    if rest.is_empty() {
        Some(field)
    } else {
        find_field_mut(&mut field.fields, &FieldPath::new(rest.to_vec()))
    }
}

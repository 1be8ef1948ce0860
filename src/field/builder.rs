//! Merged document → field tree, and the template binding step.

use std::collections::BTreeMap;

use crate::base::FieldPath;
use crate::document::{Mapping, Value};
use crate::schema::SchemaSection;

use super::model::{Field, FieldType, ItemOverrides};

/// Build the fields for every key of `merged` and `schema`.
///
/// Schema keys come first in schema order, then keys only the document
/// has. `schema` supplies each field's `default_value`, independent of what
/// the document holds at that path.
pub fn build_fields(
    merged: &Value,
    schema: &Value,
    path: &FieldPath,
    section: &SchemaSection,
) -> Vec<Field> {
    let mut keys: Vec<&str> = Vec::new();
    for map in [schema.as_mapping(), merged.as_mapping()].into_iter().flatten() {
        for key in map.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
    }

    keys.into_iter()
        .map(|key| {
            build_field(
                key,
                merged.get(key),
                schema.get(key),
                &path.child(key),
                section,
            )
        })
        .collect()
}

fn build_field(
    name: &str,
    data: Option<&Value>,
    schema: Option<&Value>,
    path: &FieldPath,
    section: &SchemaSection,
) -> Field {
    let resolved = data.or(schema).unwrap_or(&Value::Null);
    let field_type = resolve_type(resolved, schema, path, section);
    let mut field = Field::new(name, field_type, path.clone());
    field.required = section.is_required(path);

    match field_type {
        FieldType::Object => {
            field.fields =
                build_fields(resolved, schema.unwrap_or(&Value::Null), path, section);
        }
        FieldType::Array => {
            let items = to_sequence(resolved);
            let schema_items = schema.map(to_sequence).unwrap_or_default();
            let template = section.item_template(
                path,
                schema.unwrap_or(&Value::Null),
                &Value::Sequence(items.clone()),
            );
            if let Some(template @ Value::Mapping(_)) = template {
                field.fields = build_fields(&template, &template, path, section);
            }
            field.value = Value::Sequence(items);
            field.default_value = Value::Sequence(schema_items);
        }
        FieldType::Select => {
            field.options = section
                .select_options(path)
                .map(<[String]>::to_vec)
                .unwrap_or_default();
            field.value = coerce_to(field_type, resolved);
            field.default_value = coerce_to(field_type, schema.unwrap_or(&Value::Null));
        }
        _ => {
            field.value = bind_scalar(field_type, resolved);
            field.default_value = schema
                .map(|s| coerce_to(field_type, s))
                .unwrap_or_default();
        }
    }
    field
}

/// Declared arrays and runtime shape decide containers; scalar types
/// follow a typed schema default, then the data.
fn resolve_type(
    resolved: &Value,
    schema: Option<&Value>,
    path: &FieldPath,
    section: &SchemaSection,
) -> FieldType {
    if section.is_declared_array(path) || matches!(resolved, Value::Sequence(_)) {
        return FieldType::Array;
    }
    if matches!(resolved, Value::Mapping(_)) {
        return FieldType::Object;
    }
    if section.select_options(path).is_some() {
        return FieldType::Select;
    }
    match schema {
        Some(Value::Bool(_)) => FieldType::Boolean,
        Some(Value::Number(_)) => FieldType::Number,
        Some(Value::String(s)) if !s.is_empty() => FieldType::Text,
        _ => shape_type(resolved),
    }
}

fn shape_type(value: &Value) -> FieldType {
    match value {
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(_) => FieldType::Number,
        Value::Sequence(_) => FieldType::Array,
        Value::Mapping(_) => FieldType::Object,
        Value::Null | Value::String(_) => FieldType::Text,
    }
}

fn to_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Sequence(items) => items.clone(),
        v if v.is_blank() => Vec::new(),
        v => vec![v.clone()],
    }
}

/// Coerce a scalar toward the declared type.
///
/// Values that do not convert are kept as they are so the user can see and
/// correct them; validation reports the mismatch.
pub fn coerce_to(field_type: FieldType, value: &Value) -> Value {
    match field_type {
        FieldType::Number if !value.is_blank() => value
            .coerce_number()
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        FieldType::Boolean if !value.is_blank() => value
            .coerce_bool()
            .map(Value::Bool)
            .unwrap_or_else(|| value.clone()),
        FieldType::Select => match value.to_text() {
            Some(text) => Value::String(text),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Loaded booleans spelled other than `true`/`false` keep their text until
/// edited.
fn bind_scalar(field_type: FieldType, value: &Value) -> Value {
    match value {
        Value::String(text)
            if field_type == FieldType::Boolean
                && text != "true"
                && text != "false"
                && value.coerce_bool().is_some() =>
        {
            value.clone()
        }
        _ => coerce_to(field_type, value),
    }
}

/// Realize the sub-fields of item `index` of an array-of-object field.
///
/// Clones the shared template, rebinds every value from the item, applies
/// the item's override flags and appends fields for item keys the template
/// does not know. Returns `None` if the index is out of range.
pub fn bind_item(array: &Field, index: usize) -> Option<Vec<Field>> {
    let item = array.items().get(index)?;
    let base = array.path.index(index);
    let overrides = array.item_overrides.item(index);
    Some(bind_fields(
        &array.fields,
        item,
        &base,
        &FieldPath::root(),
        overrides,
    ))
}

fn bind_fields(
    template: &[Field],
    item: &Value,
    base: &FieldPath,
    relative: &FieldPath,
    overrides: Option<&BTreeMap<String, bool>>,
) -> Vec<Field> {
    let mut bound = Vec::with_capacity(template.len());
    for shape in template {
        let rel = relative.child(&shape.name);
        let data = item.get(&shape.name);
        let mut field = shape.clone();
        field.path = base.join(&rel);
        field.force_include = overrides.and_then(|o| o.get(&rel.to_string()).copied());
        match shape.field_type {
            FieldType::Object => {
                field.fields =
                    bind_fields(&shape.fields, data.unwrap_or(&Value::Null), base, &rel, overrides);
            }
            FieldType::Array => {
                field.value = data.map_or_else(|| shape.default_value.clone(), |d| {
                    Value::Sequence(to_sequence(d))
                });
                field.item_overrides = nested_overrides(overrides, &rel);
            }
            field_type => {
                field.value = data.map_or_else(
                    || shape.default_value.clone(),
                    |d| bind_scalar(field_type, d),
                );
            }
        }
        bound.push(field);
    }

    if let Value::Mapping(map) = item {
        let path = base.join(relative);
        let extras: Mapping = map
            .iter()
            .filter(|(key, _)| !template.iter().any(|t| &t.name == *key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !extras.is_empty() {
            let mut fields = build_fields(
                &Value::Mapping(extras),
                &Value::Null,
                &path,
                &SchemaSection::default(),
            );
            for field in &mut fields {
                let rel = relative.child(&field.name);
                field.force_include = overrides.and_then(|o| o.get(&rel.to_string()).copied());
            }
            bound.extend(fields);
        }
    }
    bound
}

/// Overrides of a nested array, re-keyed from `rel/<i>/rest` to `i → rest`.
fn nested_overrides(overrides: Option<&BTreeMap<String, bool>>, rel: &FieldPath) -> ItemOverrides {
    let mut nested = ItemOverrides::default();
    let Some(overrides) = overrides else {
        return nested;
    };
    for (key, flag) in overrides {
        let Some(rest) = FieldPath::parse(key).strip_prefix(rel) else {
            continue;
        };
        let Some((first, tail)) = rest.segments().split_first() else {
            continue;
        };
        if let Some(index) = first.as_index() {
            nested.set(index, FieldPath::new(tail.to_vec()).to_string(), *flag);
        }
    }
    nested
}

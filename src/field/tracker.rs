//! Modification status and force-include overrides.
//!
//! Edits address fields by [`FieldPath`]. A path without index segments
//! names a field of the tree itself; a path with an index segment names a
//! realized array item (or something inside one), whose values live in the
//! array field's item list and whose flags live in the array's
//! [`ItemOverrides`](super::ItemOverrides).

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::base::{FieldPath, PathSegment};
use crate::document::Value;

use super::builder::{bind_item, coerce_to};
use super::model::{Field, FieldType, find_field, find_field_mut};
use super::snapshot::FieldSnapshot;

/// Errors raised by field edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("No field at '{0}'")]
    NotFound(FieldPath),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: FieldPath, reason: String },
}

impl FieldError {
    fn invalid(path: &FieldPath, reason: impl Into<String>) -> Self {
        FieldError::InvalidPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

/// Per-field status consumed by the rendering layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldStatus {
    pub path: FieldPath,
    pub modified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_include: Option<bool>,
}

/// Whether `field` differs from the snapshot (or is new).
pub fn is_modified(field: &Field, snapshot: &FieldSnapshot) -> bool {
    snapshot.is_modified(&field.path, &field.current_value())
}

/// An address split at its first index segment.
struct ItemAddress {
    array: FieldPath,
    index: usize,
    relative: FieldPath,
}

fn split_item_path(path: &FieldPath) -> Option<ItemAddress> {
    let position = path.first_index_position()?;
    let segments = path.segments();
    Some(ItemAddress {
        array: FieldPath::new(segments[..position].to_vec()),
        index: segments[position].as_index()?,
        relative: FieldPath::new(segments[position + 1..].to_vec()),
    })
}

fn array_mut<'a>(fields: &'a mut [Field], path: &FieldPath) -> Result<&'a mut Field, FieldError> {
    let field = find_field_mut(fields, path).ok_or_else(|| FieldError::NotFound(path.clone()))?;
    if !field.is_array() {
        return Err(FieldError::invalid(path, "not an array field"));
    }
    Ok(field)
}

/// Resolve any path, realizing array items on the way.
pub fn resolve_field(fields: &[Field], path: &FieldPath) -> Option<Field> {
    let Some(address) = split_item_path(path) else {
        return find_field(fields, path).cloned();
    };
    let array = find_field(fields, &address.array)?;
    if !array.is_array() {
        return None;
    }
    if address.relative.is_empty() {
        let item = array.items().get(address.index)?;
        let mut field = Field::new(address.index.to_string(), FieldType::Object, path.clone());
        if array.is_object_array() {
            field.fields = bind_item(array, address.index)?;
        } else {
            field.field_type = FieldType::Text;
            field.value = item.clone();
        }
        field.force_include = array.item_overrides.get(address.index, "");
        return Some(field);
    }
    let bound = bind_item(array, address.index)?;
    resolve_field(&bound, &address.relative)
}

/// Set a field's value, coercing it toward the declared type.
pub fn set_value(fields: &mut [Field], path: &FieldPath, value: Value) -> Result<(), FieldError> {
    let Some(address) = split_item_path(path) else {
        let field = find_field_mut(fields, path).ok_or_else(|| FieldError::NotFound(path.clone()))?;
        match field.field_type {
            FieldType::Object => {
                return Err(FieldError::invalid(path, "objects are edited through their fields"));
            }
            FieldType::Array => {
                if !matches!(value, Value::Sequence(_)) {
                    return Err(FieldError::invalid(path, "array value must be a sequence"));
                }
                field.value = value;
            }
            field_type => field.value = coerce_to(field_type, &value),
        }
        trace!("Set '{path}'");
        return Ok(());
    };

    let coerced = match resolve_field(fields, path) {
        Some(target) if target.is_scalar() => coerce_to(target.field_type, &value),
        _ => value,
    };

    let array = array_mut(fields, &address.array)?;
    let item = array
        .value
        .as_sequence_mut()
        .and_then(|items| items.get_mut(address.index))
        .ok_or_else(|| FieldError::invalid(path, "array index out of range"))?;
    item.set_path(&address.relative, coerced)
        .map_err(|reason| FieldError::invalid(path, reason))?;
    trace!("Set item '{path}'");
    Ok(())
}

fn parent_of(path: &FieldPath) -> FieldPath {
    path.parent().unwrap_or_default()
}

/// Toggle force-include on a plain field, an array item (or a field inside
/// one), or a whole array.
///
/// Turning the flag off clears the override, so the field falls back to
/// the default inclusion rules. Uploaded or edited values stay in minimal
/// output. An explicit `Some(false)` suppression can only be set on the
/// field itself.
pub fn set_force_include(
    fields: &mut [Field],
    path: &FieldPath,
    force: bool,
) -> Result<(), FieldError> {
    let Some(address) = split_item_path(path) else {
        let field = find_field_mut(fields, path).ok_or_else(|| FieldError::NotFound(path.clone()))?;
        field.force_include = force.then_some(true);
        trace!("Force include '{path}' = {:?}", field.force_include);
        return Ok(());
    };

    if resolve_field(fields, path).is_none() {
        return Err(FieldError::NotFound(path.clone()));
    }
    let array = array_mut(fields, &address.array)?;
    let relative = address.relative.to_string();
    if force {
        array.item_overrides.set(address.index, relative, true);
    } else {
        array.item_overrides.remove(address.index, &relative);
    }
    trace!("Force include item '{path}' = {force}");
    Ok(())
}

/// Append a default item to the array at `path`; returns the new index.
pub fn add_array_item(fields: &mut [Field], path: &FieldPath) -> Result<usize, FieldError> {
    let array = resolve_field(fields, path).ok_or_else(|| FieldError::NotFound(path.clone()))?;
    if !array.is_array() {
        return Err(FieldError::invalid(path, "not an array field"));
    }
    let item = if array.is_object_array() {
        array.template_item()
    } else {
        Value::from("")
    };
    let index = array.items().len();

    match split_item_path(path) {
        None => {
            let field = array_mut(fields, path)?;
            match field.value.as_sequence_mut() {
                Some(items) => items.push(item),
                None => field.value = Value::Sequence(vec![item]),
            }
        }
        Some(address) => {
            let outer = array_mut(fields, &address.array)?;
            let holder = outer
                .value
                .as_sequence_mut()
                .and_then(|items| items.get_mut(address.index))
                .ok_or_else(|| FieldError::invalid(path, "array index out of range"))?;
            let mut items = array.items().to_vec();
            items.push(item);
            holder
                .set_path(&address.relative, Value::Sequence(items))
                .map_err(|reason| FieldError::invalid(path, reason))?;
        }
    }
    trace!("Added item {index} to '{path}'");
    Ok(index)
}

/// Remove the array item addressed by `path` (which ends in an index).
pub fn remove_array_item(fields: &mut [Field], path: &FieldPath) -> Result<(), FieldError> {
    let Some(PathSegment::Index(index)) = path.last().cloned() else {
        return Err(FieldError::invalid(path, "path does not end in an item index"));
    };
    let array_path = parent_of(path);
    let array = resolve_field(fields, &array_path)
        .ok_or_else(|| FieldError::NotFound(array_path.clone()))?;
    if !array.is_array() {
        return Err(FieldError::invalid(&array_path, "not an array field"));
    }
    if index >= array.items().len() {
        return Err(FieldError::invalid(path, "array index out of range"));
    }

    match split_item_path(&array_path) {
        None => {
            let field = array_mut(fields, &array_path)?;
            if let Some(items) = field.value.as_sequence_mut() {
                items.remove(index);
            }
            field.item_overrides.remove_item(index);
        }
        Some(address) => {
            let outer = array_mut(fields, &address.array)?;
            let mut items = array.items().to_vec();
            items.remove(index);
            let holder = outer
                .value
                .as_sequence_mut()
                .and_then(|items| items.get_mut(address.index))
                .ok_or_else(|| FieldError::invalid(path, "array index out of range"))?;
            holder
                .set_path(&address.relative, Value::Sequence(items))
                .map_err(|reason| FieldError::invalid(path, reason))?;
            outer
                .item_overrides
                .remove_nested_item(address.index, &address.relative, index);
        }
    }
    trace!("Removed '{path}'");
    Ok(())
}

/// Status of every field, including realized array-item fields.
pub fn field_statuses(fields: &[Field], snapshot: &FieldSnapshot) -> Vec<FieldStatus> {
    let mut out = Vec::new();
    collect_statuses(fields, snapshot, &mut out);
    out
}

fn collect_statuses(fields: &[Field], snapshot: &FieldSnapshot, out: &mut Vec<FieldStatus>) {
    for field in fields {
        out.push(FieldStatus {
            path: field.path.clone(),
            modified: is_modified(field, snapshot),
            force_include: field.force_include,
        });
        if field.is_object() {
            collect_statuses(&field.fields, snapshot, out);
        } else if field.is_object_array() {
            for index in 0..field.items().len() {
                if let Some(bound) = bind_item(field, index) {
                    collect_statuses(&bound, snapshot, out);
                }
            }
        }
    }
}

/// Paths of modified leaf fields (scalars and arrays), in tree order.
pub fn modified_paths(fields: &[Field], snapshot: &FieldSnapshot) -> Vec<FieldPath> {
    let mut leaves = Vec::new();
    collect_leaves(fields, &mut leaves);
    leaves
        .into_iter()
        .filter(|f| is_modified(f, snapshot))
        .map(|f| f.path)
        .collect()
}

fn collect_leaves(fields: &[Field], out: &mut Vec<Field>) {
    for field in fields {
        if field.is_object() {
            collect_leaves(&field.fields, out);
        } else {
            out.push(field.clone());
            if field.is_object_array() {
                for index in 0..field.items().len() {
                    if let Some(bound) = bind_item(field, index) {
                        collect_leaves(&bound, out);
                    }
                }
            }
        }
    }
}

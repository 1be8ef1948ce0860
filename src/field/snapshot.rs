//! Immutable baseline of a field tree.

use rustc_hash::FxHashMap;

use crate::base::FieldPath;
use crate::document::Value;

use super::builder::bind_item;
use super::model::Field;

/// Path → value capture of a field tree taken at load/create time.
///
/// Every field is recorded, including the realized sub-fields of each
/// array item, so item paths with index segments resolve even after items
/// are added or removed on the live tree. A snapshot is never mutated;
/// a new load or create replaces it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSnapshot {
    values: FxHashMap<FieldPath, Value>,
}

impl FieldSnapshot {
    pub fn capture(fields: &[Field]) -> Self {
        let mut values = FxHashMap::default();
        record(fields, &mut values);
        Self { values }
    }

    /// The captured value at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.values.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A value is modified if no field existed at its path or the values
    /// differ.
    pub fn is_modified(&self, path: &FieldPath, current: &Value) -> bool {
        self.values.get(path).is_none_or(|original| original != current)
    }
}

fn record(fields: &[Field], values: &mut FxHashMap<FieldPath, Value>) {
    for field in fields {
        values.insert(field.path.clone(), field.current_value());
        if field.is_object() {
            record(&field.fields, values);
        } else if field.is_object_array() {
            for index in 0..field.items().len() {
                if let Some(bound) = bind_item(field, index) {
                    values.insert(field.path.index(index), field.items()[index].clone());
                    record(&bound, values);
                }
            }
        }
    }
}

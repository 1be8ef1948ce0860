//! A field tree together with everything needed to edit and serialize it.

use std::sync::Arc;

use crate::base::FieldPath;
use crate::document::{Mapping, Value};
use crate::merge::merge_document;
use crate::schema::SchemaSection;

use super::builder::build_fields;
use super::model::Field;
use super::serializer::{OutputMode, SerializeOptions, serialize_fields};
use super::snapshot::FieldSnapshot;
use super::tracker::{self, FieldError, FieldStatus};

/// One independently edited tree: the whole document for CycloneDDS and
/// Zenoh, one profile or the `log` block for Fast DDS.
#[derive(Clone, Debug)]
pub struct FieldRegion {
    fields: Vec<Field>,
    snapshot: FieldSnapshot,
    uploaded: Option<Value>,
    section: Arc<SchemaSection>,
}

impl FieldRegion {
    /// Merge an uploaded value into the section defaults and build the tree.
    pub fn from_upload(uploaded: &Value, section: Arc<SchemaSection>) -> Self {
        let document = merge_document(uploaded, &section);
        let fields = build_fields(&document.merged, &section.defaults, &FieldPath::root(), &section);
        let snapshot = FieldSnapshot::capture(&fields);
        Self {
            fields,
            snapshot,
            uploaded: Some(document.uploaded),
            section,
        }
    }

    /// A fresh tree holding only the section defaults.
    pub fn from_defaults(section: Arc<SchemaSection>) -> Self {
        let fields = build_fields(
            &section.defaults,
            &section.defaults,
            &FieldPath::root(),
            &section,
        );
        let snapshot = FieldSnapshot::capture(&fields);
        Self {
            fields,
            snapshot,
            uploaded: None,
            section,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn snapshot(&self) -> &FieldSnapshot {
        &self.snapshot
    }

    /// The upload with declared arrays normalized, if the region was loaded.
    pub fn uploaded(&self) -> Option<&Value> {
        self.uploaded.as_ref()
    }

    pub fn section(&self) -> &SchemaSection {
        &self.section
    }

    /// Any field, including realized array-item fields.
    pub fn field(&self, path: &FieldPath) -> Option<Field> {
        tracker::resolve_field(&self.fields, path)
    }

    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<(), FieldError> {
        tracker::set_value(&mut self.fields, path, value)
    }

    pub fn set_force_include(&mut self, path: &FieldPath, force: bool) -> Result<(), FieldError> {
        tracker::set_force_include(&mut self.fields, path, force)
    }

    pub fn add_array_item(&mut self, path: &FieldPath) -> Result<usize, FieldError> {
        tracker::add_array_item(&mut self.fields, path)
    }

    pub fn remove_array_item(&mut self, path: &FieldPath) -> Result<(), FieldError> {
        tracker::remove_array_item(&mut self.fields, path)
    }

    pub fn is_modified(&self, path: &FieldPath) -> bool {
        self.field(path)
            .is_none_or(|field| tracker::is_modified(&field, &self.snapshot))
    }

    pub fn field_statuses(&self) -> Vec<FieldStatus> {
        tracker::field_statuses(&self.fields, &self.snapshot)
    }

    pub fn modified_paths(&self) -> Vec<FieldPath> {
        tracker::modified_paths(&self.fields, &self.snapshot)
    }

    /// Serialize the tree.
    pub fn serialize(&self, mode: OutputMode) -> Mapping {
        let options = SerializeOptions::new(mode, &self.section)
            .with_uploaded(self.uploaded.as_ref())
            .with_snapshot(&self.snapshot);
        serialize_fields(&self.fields, &options)
    }
}

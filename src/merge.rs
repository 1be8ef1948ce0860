//! Merge engine: fold an uploaded document into a schema default tree.
//!
//! The schema is a floor, not a ceiling: every schema path exists in the
//! result (from the upload where present, else the default), and every
//! upload path absent from the schema is kept.

use tracing::trace;

use crate::base::constants::is_attribute_key;
use crate::document::Value;
use crate::schema::SchemaSection;

/// Deep-merge `uploaded` into a clone of `schema`.
///
/// Sequences replace the schema value wholesale; mappings merge key by key;
/// scalars replace. An empty scalar where the schema holds a mapping (an
/// empty XML element such as `<General/>`) keeps the schema mapping.
///
/// Merging the result against the same schema again yields the same result.
pub fn merge_into_schema(uploaded: &Value, schema: &Value) -> Value {
    let mut result = schema.clone();
    merge_value(&mut result, uploaded);
    result
}

fn merge_value(base: &mut Value, overlay: &Value) {
    match overlay {
        Value::Mapping(overlay_map) => {
            if !matches!(base, Value::Mapping(_)) {
                *base = Value::mapping();
            }
            let Value::Mapping(base_map) = base else {
                return;
            };
            for (key, value) in overlay_map {
                if is_attribute_key(key) {
                    base_map.insert(key.clone(), value.clone());
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        trace!("Keeping non-schema key '{key}'");
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Value::Sequence(_) => *base = overlay.clone(),
        scalar => {
            if scalar.is_blank() && matches!(base, Value::Mapping(_)) {
                return;
            }
            *base = scalar.clone();
        }
    }
}

/// Result of merging an upload against a schema section.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedDocument {
    /// The upload with declared arrays normalized; used to decide which
    /// paths "existed" in the original document.
    pub uploaded: Value,
    /// The schema defaults overlaid with the upload.
    pub merged: Value,
}

/// Normalize array arity in `uploaded` and merge it into `section.defaults`.
pub fn merge_document(uploaded: &Value, section: &SchemaSection) -> MergedDocument {
    let mut normalized = uploaded.clone();
    section.normalize_arity(&mut normalized);
    let merged = merge_into_schema(&normalized, &section.defaults);
    MergedDocument {
        uploaded: normalized,
        merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FieldPath;
    use crate::document::{DocumentFormat, JsonCodec, XmlCodec};

    fn json(text: &str) -> Value {
        JsonCodec.parse(text).unwrap()
    }

    #[test]
    fn test_scalar_replaces_and_defaults_fill() {
        let schema = json(r#"{"a": 1, "b": {"c": "x", "d": true}}"#);
        let upload = json(r#"{"b": {"c": "y"}}"#);
        let merged = merge_into_schema(&upload, &schema);
        assert_eq!(merged, json(r#"{"a": 1, "b": {"c": "y", "d": true}}"#));
    }

    #[test]
    fn test_sequences_replace_wholesale() {
        let schema = json(r#"{"list": [1, 2, 3]}"#);
        let upload = json(r#"{"list": [9]}"#);
        assert_eq!(merge_into_schema(&upload, &schema), json(r#"{"list": [9]}"#));
    }

    #[test]
    fn test_extra_keys_are_kept() {
        let schema = json(r#"{"a": 1}"#);
        let upload = json(r#"{"z": {"deep": [1]}}"#);
        assert_eq!(
            merge_into_schema(&upload, &schema),
            json(r#"{"a": 1, "z": {"deep": [1]}}"#)
        );
    }

    #[test]
    fn test_empty_element_keeps_schema_mapping() {
        let schema = json(r#"{"General": {"DontRoute": false}}"#);
        let upload = json(r#"{"General": ""}"#);
        assert_eq!(merge_into_schema(&upload, &schema), schema);
    }

    #[test]
    fn test_attribute_keys_copied_verbatim() {
        let schema = json(r#"{"Domain": {"@_Id": "any", "Tag": ""}}"#);
        let upload = XmlCodec::default().parse(r#"<Domain Id="5"/>"#).unwrap();
        let merged = merge_into_schema(&upload, &schema);
        assert_eq!(
            merged.get_path(&FieldPath::parse("Domain/@_Id")),
            Some(&Value::from(5i64))
        );
        assert_eq!(
            merged.get_path(&FieldPath::parse("Domain/Tag")),
            Some(&Value::from(""))
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let schema = json(r#"{"a": {"b": [1], "c": {"d": 2}}, "e": "x"}"#);
        let upload = json(r#"{"a": {"b": [5, 6], "c": "", "new": 1}, "f": [{"g": 1}]}"#);
        let once = merge_into_schema(&upload, &schema);
        let twice = merge_into_schema(&once, &schema);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_upload_yields_schema() {
        let schema = json(r#"{"a": {"b": 1}}"#);
        assert_eq!(merge_into_schema(&Value::mapping(), &schema), schema);
        assert_eq!(merge_into_schema(&Value::Null, &schema), schema);
    }

    #[test]
    fn test_merge_document_normalizes_single_item() {
        let section: SchemaSection = json5::from_str(
            r#"{ defaults: { list: { item: [] } }, arrays: { "list/item": {} } }"#,
        )
        .unwrap();
        let upload = json(r#"{"list": {"item": {"x": 1}}}"#);
        let doc = merge_document(&upload, &section);
        let items = doc
            .merged
            .get_path(&FieldPath::parse("list/item"))
            .and_then(Value::as_sequence)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            doc.uploaded.get_path(&FieldPath::parse("list/item")),
            Some(Value::Sequence(_))
        ));
    }
}

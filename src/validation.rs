//! Field-level and structural validation.
//!
//! Field issues are attached to a path and never block editing or
//! generation. Structural rules look at the assembled document; a rule
//! that fails internally is logged and contributes nothing.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

use crate::base::FieldPath;
use crate::document::Value;
use crate::field::{Field, FieldRegion, FieldType, bind_item};
use crate::schema::SchemaSection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem with one field's value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldIssue {
    pub path: FieldPath,
    pub severity: Severity,
    pub message: String,
}

/// Check every field of a region (realized array items included) against
/// the section's required, range and option annotations.
pub fn field_issues(region: &FieldRegion) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    check_fields(region.fields(), region.section(), &mut issues);
    issues
}

fn check_fields(fields: &[Field], section: &SchemaSection, issues: &mut Vec<FieldIssue>) {
    for field in fields {
        match field.field_type {
            FieldType::Object => check_fields(&field.fields, section, issues),
            FieldType::Array => {
                if field.is_object_array() {
                    for index in 0..field.items().len() {
                        if let Some(bound) = bind_item(field, index) {
                            check_fields(&bound, section, issues);
                        }
                    }
                }
            }
            _ => check_scalar(field, section, issues),
        }
    }
}

fn check_scalar(field: &Field, section: &SchemaSection, issues: &mut Vec<FieldIssue>) {
    let mut push = |severity, message: String| {
        issues.push(FieldIssue {
            path: field.path.clone(),
            severity,
            message,
        })
    };

    if field.value.is_blank() {
        if field.required {
            push(Severity::Error, format!("{} is required", field.label));
        }
        return;
    }

    match field.field_type {
        FieldType::Number => match field.value.as_f64() {
            None => push(Severity::Error, format!("{} must be a number", field.label)),
            Some(number) => {
                if let Some(range) = section.range(&field.path) {
                    if !range.contains(number) {
                        push(Severity::Error, range_message(&field.label, range.min, range.max));
                    }
                }
            }
        },
        FieldType::Boolean if field.value.coerce_bool().is_none() => {
            push(Severity::Error, format!("{} must be true or false", field.label));
        }
        FieldType::Select => {
            let text = field.value.to_text().unwrap_or_default();
            if !field.options.is_empty() && !field.options.contains(&text) {
                push(
                    Severity::Warning,
                    format!("'{text}' is not a known value for {}", field.label),
                );
            }
        }
        _ => {}
    }
}

fn range_message(label: &str, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{label} must be between {min} and {max}"),
        (Some(min), None) => format!("{label} must be at least {min}"),
        (None, Some(max)) => format!("{label} must be at most {max}"),
        (None, None) => format!("{label} is out of range"),
    }
}

/// Structural findings for an assembled document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// A cross-field consistency check over an assembled document.
pub trait StructuralRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Err` means the rule itself failed, not that the document is invalid.
    fn check(&self, document: &Value) -> Result<ValidationReport, String>;
}

/// Run every rule; a rule that fails or panics is logged and produces no
/// findings.
pub fn run_rules(rules: &[Box<dyn StructuralRule>], document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    for rule in rules {
        match panic::catch_unwind(AssertUnwindSafe(|| rule.check(document))) {
            Ok(Ok(findings)) => report.merge(findings),
            Ok(Err(e)) => warn!("Validation rule '{}' failed: {e}", rule.name()),
            Err(payload) => warn!(
                "Validation rule '{}' panicked: {}",
                rule.name(),
                panic_message(payload.as_ref())
            ),
        }
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Participants must only reference declared transport descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportReferenceRule;

impl StructuralRule for TransportReferenceRule {
    fn name(&self) -> &'static str {
        "transport-references"
    }

    fn check(&self, document: &Value) -> Result<ValidationReport, String> {
        let mut report = ValidationReport::default();
        let Some(profiles) = document.get("profiles") else {
            return Ok(report);
        };
        if !matches!(profiles, Value::Mapping(_)) {
            return Err(format!("'profiles' is a {}", profiles.kind()));
        }

        let mut declared = FxHashSet::default();
        let descriptors = profiles
            .get("transport_descriptors")
            .and_then(|d| d.get("transport_descriptor"))
            .map(Value::as_list)
            .unwrap_or_default();
        for descriptor in descriptors {
            let Some(id) = descriptor.get("transport_id").and_then(Value::to_text) else {
                report.error("Transport descriptor without a transport_id");
                continue;
            };
            if !declared.insert(id.clone()) {
                report.error(format!("Duplicate transport_id '{id}'"));
            }
        }

        let participants = profiles
            .get("participant")
            .map(Value::as_list)
            .unwrap_or_default();
        for participant in participants {
            let name = participant
                .get("@_profile_name")
                .and_then(Value::to_text)
                .unwrap_or_default();
            let rtps = participant.get("rtps");
            let references = rtps
                .and_then(|r| r.get("userTransports"))
                .and_then(|u| u.get("transport_id"))
                .map(Value::as_list)
                .unwrap_or_default();
            for reference in &references {
                let id = reference.to_text().unwrap_or_default();
                if !declared.contains(&id) {
                    report.error(format!(
                        "Participant '{name}' references unknown transport '{id}'"
                    ));
                }
            }
            let builtin_disabled = rtps
                .and_then(|r| r.get("useBuiltinTransports"))
                .and_then(Value::coerce_bool)
                == Some(false);
            if builtin_disabled && references.is_empty() {
                report.warning(format!(
                    "Participant '{name}' disables builtin transports without user transports"
                ));
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, JsonCodec};
    use std::sync::Arc;

    fn json(text: &str) -> Value {
        JsonCodec.parse(text).unwrap()
    }

    fn region(upload: &str) -> FieldRegion {
        let section: SchemaSection = json5::from_str(
            r#"{
                defaults: { type: "UDPv4", TTL: 1, enabled: true, id: "" },
                selects: { type: ["UDPv4", "SHM"] },
                required: ["id"],
                ranges: { TTL: { min: 0, max: 255 } },
            }"#,
        )
        .unwrap();
        FieldRegion::from_upload(&json(upload), Arc::new(section))
    }

    #[test]
    fn test_field_issues() {
        let issues = field_issues(&region(
            r#"{"type": "TCPv9", "TTL": 300, "enabled": "maybe"}"#,
        ));
        let by_path = |p: &str| {
            issues
                .iter()
                .find(|i| i.path == FieldPath::parse(p))
                .map(|i| i.severity)
        };
        assert_eq!(by_path("type"), Some(Severity::Warning));
        assert_eq!(by_path("TTL"), Some(Severity::Error));
        assert_eq!(by_path("enabled"), Some(Severity::Error));
        assert_eq!(by_path("id"), Some(Severity::Error));
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn test_valid_region_has_no_issues() {
        assert!(field_issues(&region(r#"{"id": "udp", "TTL": "4"}"#)).is_empty());
    }

    #[test]
    fn test_transport_references() {
        let document = json(
            r#"{"profiles": {
                "transport_descriptors": {"transport_descriptor": {"transport_id": "udp"}},
                "participant": [
                    {"@_profile_name": "ok", "rtps": {"userTransports": {"transport_id": "udp"}}},
                    {"@_profile_name": "bad", "rtps": {"userTransports": {"transport_id": ["udp", "tcp"]},
                        "useBuiltinTransports": false}},
                    {"@_profile_name": "lonely", "rtps": {"useBuiltinTransports": false}}
                ]
            }}"#,
        );
        let report = TransportReferenceRule.check(&document).unwrap();
        assert_eq!(
            report.errors,
            vec!["Participant 'bad' references unknown transport 'tcp'".to_string()]
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("lonely"));
    }

    struct Broken;

    impl StructuralRule for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn check(&self, _: &Value) -> Result<ValidationReport, String> {
            Err("boom".into())
        }
    }

    #[test]
    fn test_failing_rule_produces_no_findings() {
        let rules: Vec<Box<dyn StructuralRule>> =
            vec![Box::new(Broken), Box::new(TransportReferenceRule)];
        let report = run_rules(&rules, &json(r#"{"profiles": []}"#));
        assert!(report.is_empty());
    }

    struct Panicking;

    impl StructuralRule for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn check(&self, _: &Value) -> Result<ValidationReport, String> {
            panic!("rule bug")
        }
    }

    #[test]
    fn test_panicking_rule_does_not_stop_other_rules() {
        let rules: Vec<Box<dyn StructuralRule>> =
            vec![Box::new(Panicking), Box::new(TransportReferenceRule)];
        let report = run_rules(
            &rules,
            &json(
                r#"{"profiles": {"participant": {"@_profile_name": "p",
                    "rtps": {"userTransports": {"transport_id": "missing"}}}}}"#,
            ),
        );
        assert_eq!(
            report.errors,
            vec!["Participant 'p' references unknown transport 'missing'".to_string()]
        );
    }
}

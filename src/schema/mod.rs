//! Schema registry: canonical per-vendor default trees.
//!
//! Each vendor schema is a JSON5 data file compiled into the crate. A file
//! holds named [`SchemaSection`]s: CycloneDDS and Zenoh use a single
//! `document` section, Fast DDS has one section per profile kind plus `log`.
//!
//! The registry is read-only after loading; consumers clone what they need.

mod section;

pub use section::{ArraySpec, EmptyArrayPolicy, NumericRange, SchemaSection};

use indexmap::IndexMap;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::base::Vendor;

/// Name of the section holding a whole single-tree document.
pub const DOCUMENT_SECTION: &str = "document";

const CYCLONEDDS_SCHEMA: &str = include_str!("../../schemas/cyclonedds.json5");
const FASTDDS_SCHEMA: &str = include_str!("../../schemas/fastdds.json5");
const ZENOH_SCHEMA: &str = include_str!("../../schemas/zenoh.json5");

/// Errors raised while loading schema data.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema data file is not valid.
    #[error("Invalid {vendor} schema: {message}")]
    Parse { vendor: Vendor, message: String },

    /// A section the vendor needs is missing.
    #[error("{vendor} schema has no '{section}' section")]
    MissingSection { vendor: Vendor, section: String },
}

#[derive(Deserialize)]
struct RawVendorSchema {
    sections: IndexMap<String, SchemaSection>,
}

/// All schema sections of one vendor.
#[derive(Clone, Debug)]
pub struct VendorSchema {
    vendor: Vendor,
    sections: IndexMap<String, Arc<SchemaSection>>,
}

impl VendorSchema {
    /// Parse a JSON5 schema file (`{ sections: { name: {...} } }`).
    pub fn from_json5(vendor: Vendor, text: &str) -> Result<Self, SchemaError> {
        let raw: RawVendorSchema = json5::from_str(text).map_err(|e| SchemaError::Parse {
            vendor,
            message: e.to_string(),
        })?;
        let sections = raw
            .sections
            .into_iter()
            .map(|(name, mut section)| {
                let mut defaults = std::mem::take(&mut section.defaults);
                section.normalize_arity(&mut defaults);
                section.defaults = defaults;
                (name, Arc::new(section))
            })
            .collect();
        Ok(Self { vendor, sections })
    }

    /// Build from already-constructed sections.
    pub fn from_sections(
        vendor: Vendor,
        sections: impl IntoIterator<Item = (String, SchemaSection)>,
    ) -> Self {
        Self {
            vendor,
            sections: sections
                .into_iter()
                .map(|(name, section)| (name, Arc::new(section)))
                .collect(),
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn section(&self, name: &str) -> Option<&Arc<SchemaSection>> {
        self.sections.get(name)
    }

    /// A section that must exist.
    pub fn require(&self, name: &str) -> Result<&Arc<SchemaSection>, SchemaError> {
        self.section(name).ok_or_else(|| SchemaError::MissingSection {
            vendor: self.vendor,
            section: name.to_string(),
        })
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// The canonical schemas of every supported vendor.
#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    cyclonedds: VendorSchema,
    fastdds: VendorSchema,
    zenoh: VendorSchema,
}

impl SchemaRegistry {
    /// Load the built-in schemas.
    pub fn load() -> Result<Self, SchemaError> {
        let cyclonedds = VendorSchema::from_json5(Vendor::CycloneDds, CYCLONEDDS_SCHEMA)?;
        let fastdds = VendorSchema::from_json5(Vendor::FastDds, FASTDDS_SCHEMA)?;
        let zenoh = VendorSchema::from_json5(Vendor::Zenoh, ZENOH_SCHEMA)?;
        cyclonedds.require(DOCUMENT_SECTION)?;
        zenoh.require(DOCUMENT_SECTION)?;
        debug!(
            "Loaded schemas: {} fastdds sections",
            fastdds.sections.len()
        );
        Ok(Self {
            cyclonedds,
            fastdds,
            zenoh,
        })
    }

    /// Replace one vendor's schema.
    pub fn with_schema(mut self, schema: VendorSchema) -> Self {
        match schema.vendor {
            Vendor::CycloneDds => self.cyclonedds = schema,
            Vendor::FastDds => self.fastdds = schema,
            Vendor::Zenoh => self.zenoh = schema,
        }
        self
    }

    pub fn get(&self, vendor: Vendor) -> &VendorSchema {
        match vendor {
            Vendor::CycloneDds => &self.cyclonedds,
            Vendor::FastDds => &self.fastdds,
            Vendor::Zenoh => &self.zenoh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FieldPath;
    use crate::document::Value;

    #[test]
    fn test_builtin_schemas_load() {
        let registry = SchemaRegistry::load().expect("built-in schemas should parse");
        let cyclone = registry.get(Vendor::CycloneDds).require(DOCUMENT_SECTION).unwrap();
        assert_eq!(
            cyclone.defaults.get_path(&FieldPath::parse("Domain/@_Id")),
            Some(&Value::from("any"))
        );
        let fastdds = registry.get(Vendor::FastDds);
        for name in ["participant", "data_writer", "data_reader", "topic", "log"] {
            assert!(fastdds.section(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_declared_arrays_are_sequences_in_defaults() {
        let registry = SchemaRegistry::load().unwrap();
        let zenoh = registry.get(Vendor::Zenoh).require(DOCUMENT_SECTION).unwrap();
        assert_eq!(
            zenoh.defaults.get_path(&FieldPath::parse("connect/endpoints")),
            Some(&Value::Sequence(vec![]))
        );
    }

    #[test]
    fn test_invalid_schema_is_error() {
        let err = VendorSchema::from_json5(Vendor::Zenoh, "{ sections: ").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn test_missing_section() {
        let schema = VendorSchema::from_sections(Vendor::Zenoh, []);
        assert!(matches!(
            schema.require(DOCUMENT_SECTION),
            Err(SchemaError::MissingSection { .. })
        ));
    }
}

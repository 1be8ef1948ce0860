//! The supported configuration targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration target, each with its own document format and schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Eclipse CycloneDDS (XML, `<CycloneDDS>` root).
    CycloneDds,
    /// eProsima Fast DDS (XML, `<dds>` root with profiles).
    FastDds,
    /// Eclipse Zenoh (JSON5).
    Zenoh,
}

impl Vendor {
    pub const ALL: [Vendor; 3] = [Vendor::CycloneDds, Vendor::FastDds, Vendor::Zenoh];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Vendor::CycloneDds => "CycloneDDS",
            Vendor::FastDds => "Fast DDS",
            Vendor::Zenoh => "Zenoh",
        }
    }

    /// Default file name for generated documents.
    pub fn default_filename(self) -> &'static str {
        match self {
            Vendor::CycloneDds => "cyclonedds.xml",
            Vendor::FastDds => "fastdds_profiles.xml",
            Vendor::Zenoh => "zenoh.json5",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

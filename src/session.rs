//! The editor session: one open document at a time.
//!
//! Every operation runs to completion before it returns. A failing
//! operation leaves the session exactly as it was, so a rejected upload
//! keeps the previous document (or no document) open.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::base::{FieldPath, Vendor};
use crate::config::EditorConfig;
use crate::document::{Value, detect_format};
use crate::error::{EditorError, Result};
use crate::field::{Field, FieldRegion, FieldStatus, OutputMode};
use crate::schema::SchemaRegistry;
use crate::validation::{FieldIssue, ValidationReport, field_issues, run_rules};
use crate::vendor::fastdds::{
    FastDdsDocument, ProfileError, ProfileKey, ProfileKind, ProfileSet, TypeLibrary,
};
use crate::vendor::{EditorDocument, VendorAssembler, assembler_for, detect_vendor};

/// Addresses one field tree of the open document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKey {
    /// The whole document (CycloneDDS, Zenoh).
    Document,
    /// One Fast DDS profile.
    Profile(ProfileKey),
    /// The Fast DDS `<log>` block.
    Log,
}

/// A field issue together with the region it was found in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionIssue {
    pub region: RegionKey,
    pub issue: FieldIssue,
}

/// Output of [`EditorSession::generate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub text: String,
    /// Suggested download name: the uploaded name, or the vendor default.
    pub filename: String,
    pub report: ValidationReport,
}

struct OpenDocument {
    vendor: Vendor,
    filename: String,
    assembler: Box<dyn VendorAssembler>,
    document: EditorDocument,
}

pub struct EditorSession {
    registry: Arc<SchemaRegistry>,
    config: EditorConfig,
    open: Option<OpenDocument>,
}

impl EditorSession {
    pub fn new(registry: Arc<SchemaRegistry>, config: EditorConfig) -> Self {
        Self {
            registry,
            config,
            open: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Parse an upload, detect its vendor and replace the open document.
    pub fn load(&mut self, text: &str, filename: &str) -> Result<Vendor> {
        if text.len() > self.config.max_document_bytes {
            return Err(EditorError::TooLarge {
                size: text.len(),
                limit: self.config.max_document_bytes,
            });
        }
        let unknown = || EditorError::UnknownVendor {
            filename: filename.to_string(),
        };
        let format = detect_format(filename, text).ok_or_else(unknown)?;
        let parsed = format.codec(false).parse(text)?;
        let vendor = detect_vendor(format, &parsed).ok_or_else(unknown)?;

        let assembler = assembler_for(vendor);
        let document = assembler.load(&parsed, self.registry.get(vendor))?;
        info!("Loaded {vendor} document '{filename}'");
        self.open = Some(OpenDocument {
            vendor,
            filename: filename.to_string(),
            assembler,
            document,
        });
        Ok(vendor)
    }

    /// Start a new document holding only defaults.
    pub fn create(&mut self, vendor: Vendor) -> Result<()> {
        let assembler = assembler_for(vendor);
        let document = assembler.create(self.registry.get(vendor))?;
        info!("Created {vendor} document");
        self.open = Some(OpenDocument {
            vendor,
            filename: vendor.default_filename().to_string(),
            assembler,
            document,
        });
        Ok(())
    }

    /// Close the open document, discarding its snapshot.
    pub fn reset(&mut self) {
        if let Some(open) = self.open.take() {
            debug!("Closed {} document '{}'", open.vendor, open.filename);
        }
    }

    pub fn vendor(&self) -> Option<Vendor> {
        self.open.as_ref().map(|open| open.vendor)
    }

    pub fn document(&self) -> Option<&EditorDocument> {
        self.open.as_ref().map(|open| &open.document)
    }

    fn open(&self) -> Result<&OpenDocument> {
        self.open.as_ref().ok_or(EditorError::NoDocument)
    }

    fn open_mut(&mut self) -> Result<&mut OpenDocument> {
        self.open.as_mut().ok_or(EditorError::NoDocument)
    }

    // ---- regions -------------------------------------------------------

    pub fn region(&self, key: &RegionKey) -> Result<&FieldRegion> {
        let open = self.open()?;
        match (&open.document, key) {
            (EditorDocument::Tree(region), RegionKey::Document) => Ok(region),
            (EditorDocument::Profiles(document), RegionKey::Log) => Ok(&document.log),
            (EditorDocument::Profiles(document), RegionKey::Profile(profile)) => document
                .profiles
                .get(profile)
                .map(|p| &p.region)
                .ok_or_else(|| ProfileError::NotFound(profile.clone()).into()),
            _ => Err(EditorError::VendorMismatch {
                vendor: open.vendor,
            }),
        }
    }

    fn region_mut(&mut self, key: &RegionKey) -> Result<&mut FieldRegion> {
        let open = self.open_mut()?;
        let vendor = open.vendor;
        match (&mut open.document, key) {
            (EditorDocument::Tree(region), RegionKey::Document) => Ok(region),
            (EditorDocument::Profiles(document), RegionKey::Log) => Ok(&mut document.log),
            (EditorDocument::Profiles(document), RegionKey::Profile(profile)) => document
                .profiles
                .get_mut(profile)
                .map(|p| &mut p.region)
                .ok_or_else(|| ProfileError::NotFound(profile.clone()).into()),
            _ => Err(EditorError::VendorMismatch { vendor }),
        }
    }

    /// Every region of the open document, in output order.
    pub fn regions(&self) -> Vec<(RegionKey, &FieldRegion)> {
        match self.document() {
            None => Vec::new(),
            Some(EditorDocument::Tree(region)) => vec![(RegionKey::Document, region)],
            Some(EditorDocument::Profiles(document)) => document
                .profiles
                .iter()
                .map(|p| (RegionKey::Profile(p.key()), &p.region))
                .chain(std::iter::once((RegionKey::Log, &document.log)))
                .collect(),
        }
    }

    pub fn field(&self, region: &RegionKey, path: &FieldPath) -> Result<Field> {
        self.region(region)?
            .field(path)
            .ok_or_else(|| EditorError::FieldNotFound(path.clone()))
    }

    pub fn set_value(&mut self, region: &RegionKey, path: &FieldPath, value: Value) -> Result<()> {
        Ok(self.region_mut(region)?.set_value(path, value)?)
    }

    pub fn set_force_include(
        &mut self,
        region: &RegionKey,
        path: &FieldPath,
        force: bool,
    ) -> Result<()> {
        Ok(self.region_mut(region)?.set_force_include(path, force)?)
    }

    /// Append an item to an array field; returns the new item's index.
    pub fn add_array_item(&mut self, region: &RegionKey, path: &FieldPath) -> Result<usize> {
        Ok(self.region_mut(region)?.add_array_item(path)?)
    }

    /// Remove the item addressed by `path`, whose last segment is its index.
    pub fn remove_array_item(&mut self, region: &RegionKey, path: &FieldPath) -> Result<()> {
        Ok(self.region_mut(region)?.remove_array_item(path)?)
    }

    pub fn is_modified(&self, region: &RegionKey, path: &FieldPath) -> Result<bool> {
        Ok(self.region(region)?.is_modified(path))
    }

    pub fn field_statuses(&self, region: &RegionKey) -> Result<Vec<FieldStatus>> {
        Ok(self.region(region)?.field_statuses())
    }

    /// Modified leaf paths of every region.
    pub fn modified_paths(&self) -> Vec<(RegionKey, FieldPath)> {
        self.regions()
            .into_iter()
            .flat_map(|(key, region)| {
                region
                    .modified_paths()
                    .into_iter()
                    .map(move |path| (key.clone(), path))
            })
            .collect()
    }

    /// Field-level issues of every region.
    pub fn field_issues(&self) -> Vec<RegionIssue> {
        self.regions()
            .into_iter()
            .flat_map(|(key, region)| {
                field_issues(region).into_iter().map(move |issue| RegionIssue {
                    region: key.clone(),
                    issue,
                })
            })
            .collect()
    }

    // ---- Fast DDS profiles ---------------------------------------------

    fn fastdds(&self) -> Result<&FastDdsDocument> {
        let open = self.open()?;
        match &open.document {
            EditorDocument::Profiles(document) => Ok(document),
            EditorDocument::Tree(_) => Err(EditorError::VendorMismatch {
                vendor: open.vendor,
            }),
        }
    }

    fn fastdds_mut(&mut self) -> Result<&mut FastDdsDocument> {
        let open = self.open_mut()?;
        match &mut open.document {
            EditorDocument::Profiles(document) => Ok(document),
            EditorDocument::Tree(_) => Err(EditorError::VendorMismatch {
                vendor: open.vendor,
            }),
        }
    }

    pub fn profiles(&self) -> Result<&ProfileSet> {
        Ok(&self.fastdds()?.profiles)
    }

    pub fn add_profile(&mut self, kind: ProfileKind, name: &str) -> Result<ProfileKey> {
        self.fastdds_mut()?.add_profile(kind, name)
    }

    pub fn rename_profile(&mut self, key: &ProfileKey, new_name: &str) -> Result<ProfileKey> {
        Ok(self.fastdds_mut()?.profiles.rename(key, new_name)?)
    }

    pub fn duplicate_profile(&mut self, key: &ProfileKey, new_name: &str) -> Result<ProfileKey> {
        Ok(self.fastdds_mut()?.profiles.duplicate(key, new_name)?)
    }

    pub fn delete_profile(&mut self, key: &ProfileKey) -> Result<()> {
        self.fastdds_mut()?.profiles.delete(key)?;
        Ok(())
    }

    pub fn set_default_profile(&mut self, key: &ProfileKey) -> Result<()> {
        Ok(self.fastdds_mut()?.profiles.set_default(key)?)
    }

    pub fn types(&self) -> Result<&TypeLibrary> {
        Ok(&self.fastdds()?.types)
    }

    pub fn types_mut(&mut self) -> Result<&mut TypeLibrary> {
        Ok(&mut self.fastdds_mut()?.types)
    }

    // ---- output --------------------------------------------------------

    /// Render the open document, running structural rules if configured.
    pub fn generate(&self, mode: OutputMode) -> Result<GeneratedDocument> {
        let open = self.open()?;
        let assembled = open.assembler.assemble(&open.document, mode)?;
        let report = if self.config.validate_on_generate {
            let mut report = run_rules(&open.assembler.rules(), &assembled);
            if let EditorDocument::Profiles(document) = &open.document {
                report.merge(document.rename_warnings());
            }
            report
        } else {
            ValidationReport::default()
        };
        let text = open
            .assembler
            .render(&assembled, self.config.xml_declaration)?;
        debug!(
            "Generated {} bytes of {} ({mode:?}), {} errors, {} warnings",
            text.len(),
            open.vendor,
            report.errors.len(),
            report.warnings.len()
        );
        Ok(GeneratedDocument {
            text,
            filename: open.filename.clone(),
            report,
        })
    }

    /// [`generate`](Self::generate) with the configured default mode.
    pub fn generate_default(&self) -> Result<GeneratedDocument> {
        self.generate(self.config.default_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditorSession {
        EditorSession::new(
            Arc::new(SchemaRegistry::load().unwrap()),
            EditorConfig {
                xml_declaration: false,
                ..EditorConfig::default()
            },
        )
    }

    #[test]
    fn test_operations_need_a_document() {
        let mut session = session();
        assert!(matches!(
            session.generate(OutputMode::Minimal),
            Err(EditorError::NoDocument)
        ));
        assert!(matches!(
            session.set_value(&RegionKey::Document, &FieldPath::parse("mode"), Value::from("peer")),
            Err(EditorError::NoDocument)
        ));
        assert!(session.regions().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_previous_document() {
        let mut session = session();
        session.load(r#"{mode: "client"}"#, "zenoh.json5").unwrap();
        assert!(matches!(
            session.load("<CycloneDDS><Domain>", "broken.xml"),
            Err(EditorError::Parse(_))
        ));
        assert!(matches!(
            session.load("<unknown/>", "other.xml"),
            Err(EditorError::UnknownVendor { .. })
        ));
        assert_eq!(session.vendor(), Some(Vendor::Zenoh));
        let generated = session.generate(OutputMode::Minimal).unwrap();
        assert!(generated.text.contains("client"));
        assert_eq!(generated.filename, "zenoh.json5");
    }

    #[test]
    fn test_oversized_upload_is_rejected() {
        let mut session = EditorSession::new(
            Arc::new(SchemaRegistry::load().unwrap()),
            EditorConfig {
                max_document_bytes: 8,
                ..EditorConfig::default()
            },
        );
        assert!(matches!(
            session.load(r#"{mode: "peer"}"#, "z.json5"),
            Err(EditorError::TooLarge { limit: 8, .. })
        ));
        assert_eq!(session.vendor(), None);
    }

    #[test]
    fn test_region_keys_must_match_vendor() {
        let mut session = session();
        session.create(Vendor::CycloneDds).unwrap();
        assert!(matches!(
            session.region(&RegionKey::Log),
            Err(EditorError::VendorMismatch {
                vendor: Vendor::CycloneDds
            })
        ));
        assert!(matches!(
            session.add_profile(ProfileKind::Participant, "p"),
            Err(EditorError::VendorMismatch { .. })
        ));
    }

    #[test]
    fn test_reset_closes_document() {
        let mut session = session();
        session.create(Vendor::Zenoh).unwrap();
        session.reset();
        assert_eq!(session.vendor(), None);
        assert!(session.document().is_none());
    }

    #[test]
    fn test_profile_region_edits() {
        let mut session = session();
        session.create(Vendor::FastDds).unwrap();
        let key = session.add_profile(ProfileKind::Participant, "p").unwrap();
        let region = RegionKey::Profile(key.clone());
        session
            .set_value(&region, &FieldPath::parse("domainId"), Value::from("7"))
            .unwrap();
        assert_eq!(
            session.field(&region, &FieldPath::parse("domainId")).unwrap().value,
            Value::from(7i64)
        );

        let renamed = session.rename_profile(&key, "q").unwrap();
        assert!(matches!(
            session.region(&region),
            Err(EditorError::Profile(ProfileError::NotFound(_)))
        ));
        let text = session.generate(OutputMode::Minimal).unwrap().text;
        assert!(text.contains(r#"<participant profile_name="q">"#));
        assert!(text.contains("<domainId>7</domainId>"));

        session.delete_profile(&renamed).unwrap();
        assert!(session.profiles().unwrap().is_empty());
    }

    #[test]
    fn test_modified_paths_cover_all_regions() {
        let mut session = session();
        session.create(Vendor::FastDds).unwrap();
        let key = session.add_profile(ProfileKind::Topic, "t").unwrap();
        session
            .set_value(
                &RegionKey::Profile(key.clone()),
                &FieldPath::parse("historyQos/kind"),
                Value::from("KEEP_ALL"),
            )
            .unwrap();
        session
            .set_value(&RegionKey::Log, &FieldPath::parse("use_default"), Value::from("FALSE"))
            .unwrap();
        let modified = session.modified_paths();
        assert_eq!(
            modified,
            vec![
                (RegionKey::Profile(key), FieldPath::parse("historyQos/kind")),
                (RegionKey::Log, FieldPath::parse("use_default")),
            ]
        );
    }
}

//! # ddsconf
//!
//! Schema-driven editing core for DDS and Zenoh configuration documents:
//! CycloneDDS XML, Fast DDS XML profiles and Zenoh JSON5.
//!
//! An upload is parsed into a generic [`Value`], merged into the vendor's
//! default tree, and turned into a typed [`Field`] tree. Edits go through
//! the tree; generation serializes it back, either in full or keeping only
//! what differs from the defaults, was present in the upload, or was
//! explicitly included.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! session     → EditorSession: load / edit / generate
//!   ↓
//! vendor      → Vendor detection, per-vendor assemblers, Fast DDS profiles & types
//!   ↓
//! validation  → Field issues, structural rules
//!   ↓
//! field       → Field model, builder, serializer, snapshot, tracker
//!   ↓
//! merge       → Upload-into-defaults merge
//!   ↓
//! schema      → Embedded per-vendor default trees and annotations
//!   ↓
//! document    → Value, XML codec, JSON/JSON5 codec
//!   ↓
//! base        → FieldPath, Vendor, format constants
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use ddsconf::{EditorConfig, EditorSession, OutputMode, SchemaRegistry, Vendor};
//!
//! let registry = Arc::new(SchemaRegistry::load()?);
//! let mut session = EditorSession::new(registry, EditorConfig::default());
//! let vendor = session.load(r#"<CycloneDDS><Domain Id="5"/></CycloneDDS>"#, "cyclonedds.xml")?;
//! assert_eq!(vendor, Vendor::CycloneDds);
//!
//! let generated = session.generate(OutputMode::Minimal)?;
//! assert!(generated.text.contains(r#"<Domain Id="5"/>"#));
//! # Ok::<(), ddsconf::EditorError>(())
//! ```

// ============================================================================
// MODULES (dependency order: base → document → schema → merge → field →
//          validation → vendor → session)
// ============================================================================

/// Foundation types: FieldPath, Vendor, format constants
pub mod base;

/// Document codec: XML and JSON5 text to and from Value
pub mod document;

/// Embedded per-vendor default trees
pub mod schema;

/// Merge of an upload into a default tree
pub mod merge;

/// Field model, builder, serializer and modification tracking
pub mod field;

/// Field-level issues and structural rules
pub mod validation;

/// Vendor detection and output assembly
pub mod vendor;

/// Editor configuration
pub mod config;

mod error;
mod session;

// Re-export foundation types
pub use base::{FieldPath, PathSegment, Vendor};
pub use document::{CodecError, DocumentFormat, FormatKind, Mapping, Value};

// Re-export the editing surface
pub use config::{ConfigError, EditorConfig};
pub use error::{EditorError, Result};
pub use field::{Field, FieldRegion, FieldStatus, FieldType, OutputMode};
pub use schema::{SchemaError, SchemaRegistry};
pub use session::{EditorSession, GeneratedDocument, RegionIssue, RegionKey};
pub use validation::{FieldIssue, Severity, ValidationReport};
pub use vendor::EditorDocument;
pub use vendor::fastdds::{ProfileKey, ProfileKind};

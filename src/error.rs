//! Errors surfaced by editor operations.
//!
//! Every failing operation leaves the session as it was before the call.

use thiserror::Error;

use crate::base::{FieldPath, Vendor};
use crate::config::ConfigError;
use crate::document::CodecError;
use crate::field::FieldError;
use crate::schema::SchemaError;
use crate::vendor::fastdds::{ProfileError, TypeError};

#[derive(Debug, Error)]
pub enum EditorError {
    /// Malformed XML or JSON5.
    #[error("Parse error: {0}")]
    Parse(#[from] CodecError),

    /// The document matches no supported vendor.
    #[error("Unrecognized configuration format in '{filename}'")]
    UnknownVendor { filename: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("No field at '{0}'")]
    FieldNotFound(FieldPath),

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: FieldPath, reason: String },

    /// The operation needs a loaded or created document.
    #[error("No document is open")]
    NoDocument,

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation only applies to another vendor's documents.
    #[error("Operation not supported for {vendor} documents")]
    VendorMismatch { vendor: Vendor },

    #[error("Document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

impl From<FieldError> for EditorError {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::NotFound(path) => EditorError::FieldNotFound(path),
            FieldError::InvalidPath { path, reason } => EditorError::InvalidPath { path, reason },
        }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;

//! Editor configuration.
//!
//! Every field has a default, so an empty file (or none at all) is valid.
//!
//! ```json5
//! {
//!   default_output: "minimal",
//!   xml_declaration: true,
//!   validate_on_generate: true,
//!   max_document_bytes: 4194304,
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::field::OutputMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Mode used by [`EditorSession::generate_default`](crate::EditorSession::generate_default).
    pub default_output: OutputMode,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` before XML documents.
    pub xml_declaration: bool,
    /// Run structural rules on every generation.
    pub validate_on_generate: bool,
    /// Uploads larger than this are rejected before parsing.
    pub max_document_bytes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_output: OutputMode::Minimal,
            xml_declaration: true,
            validate_on_generate: true,
            max_document_bytes: 4 * 1024 * 1024,
        }
    }
}

impl EditorConfig {
    pub fn from_json5_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        json5::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json5_str(&text)
    }
}

//! Error types for document codec operations.

use thiserror::Error;

/// Errors raised while parsing or building a document.
///
/// This is the parse error surfaced to the user as a blocking message: the
/// input is rejected and no partial state is applied.
#[derive(Debug, Error)]
pub enum CodecError {
    /// XML parsing or serialization error.
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON / JSON5 parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// The document is empty or holds no root element.
    #[error("Empty document")]
    Empty,

    /// The value cannot be expressed in the target format.
    #[error("Invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },
}

impl CodecError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json(message.into())
    }

    /// Create an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "value",
            message: message.into(),
        }
    }
}

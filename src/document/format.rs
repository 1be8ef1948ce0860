//! Common trait for document formats.

use super::{CodecError, Value};

/// Root element applied around a payload when building XML.
///
/// The wrapper's attributes are fixed per vendor; namespace attributes found
/// on the payload are dropped in favour of these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootWrapper {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl RootWrapper {
    /// A root element without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Add a fixed attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Trait for document formats.
///
/// Implementations convert between raw text and the generic [`Value`]
/// representation. `build` must be deterministic: the same value always
/// yields byte-identical text.
pub trait DocumentFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format.
    fn extensions(&self) -> &'static [&'static str];

    /// MIME type for this format.
    fn mime_type(&self) -> &'static str;

    /// Parse raw text into a generic value.
    fn parse(&self, text: &str) -> Result<Value, CodecError>;

    /// Build text from a generic value, optionally wrapped in a root element.
    ///
    /// Formats without a root concept ignore `root`.
    fn build(&self, value: &Value, root: Option<&RootWrapper>) -> Result<String, CodecError>;

    /// Cheap check whether `text` looks like this format.
    ///
    /// This does not fully parse the content.
    fn sniff(&self, text: &str) -> bool {
        let _ = text;
        false
    }
}

//! Document codec: raw XML / JSON5 text ⇄ generic [`Value`].
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │  XML text    │     │  JSON5 text  │
//! └──────┬───────┘     └──────┬───────┘
//!        ▼                    ▼
//! ┌──────────────────────────────────────┐
//! │        DocumentFormat trait          │
//! │  - parse(&str) -> Result<Value>      │
//! │  - build(&Value, root) -> String     │
//! └──────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────────────┐
//! │  Value (Null/Bool/Number/String/     │
//! │         Sequence/Mapping)            │
//! └──────────────────────────────────────┘
//! ```

mod error;
mod format;
mod json;
mod value;
mod xml;

pub use error::CodecError;
pub use format::{DocumentFormat, RootWrapper};
pub use json::JsonCodec;
pub use value::{Mapping, Value};
pub use xml::XmlCodec;

/// Which codec a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Xml,
    Json,
}

impl FormatKind {
    /// The codec for this kind.
    pub fn codec(self, xml_declaration: bool) -> Box<dyn DocumentFormat> {
        match self {
            FormatKind::Xml => Box::new(XmlCodec {
                declaration: xml_declaration,
            }),
            FormatKind::Json => Box::new(JsonCodec),
        }
    }
}

/// Supported file extensions.
pub fn supported_extensions() -> &'static [&'static str] {
    &["xml", "json5", "json"]
}

/// Detect the format from the file name, falling back to the content.
pub fn detect_format(filename: &str, text: &str) -> Option<FormatKind> {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("xml") => return Some(FormatKind::Xml),
        Some("json5") | Some("json") => return Some(FormatKind::Json),
        _ => {}
    }
    if XmlCodec::default().sniff(text) {
        Some(FormatKind::Xml)
    } else if JsonCodec.sniff(text) {
        Some(FormatKind::Json)
    } else {
        None
    }
}

//! JSON / JSON5 codec (Zenoh configuration files).
//!
//! Input is read with a strict JSON parser first and, only if that fails,
//! with a permissive JSON5 parser that accepts comments, trailing commas and
//! unquoted keys. Output is always plain pretty-printed JSON, which every
//! JSON5 reader accepts.

use tracing::debug;

use super::{CodecError, DocumentFormat, RootWrapper, Value};

/// JSON / JSON5 format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentFormat for JsonCodec {
    fn name(&self) -> &'static str {
        "JSON5"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json5", "json"]
    }

    fn mime_type(&self) -> &'static str {
        "application/json5"
    }

    fn parse(&self, text: &str) -> Result<Value, CodecError> {
        if text.trim().is_empty() {
            return Err(CodecError::Empty);
        }
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => Ok(Value::from(value)),
            Err(strict) => {
                debug!("Strict JSON parse failed ({strict}), retrying as JSON5");
                json5::from_str::<serde_json::Value>(text)
                    .map(Value::from)
                    .map_err(|relaxed| {
                        CodecError::json(format!("{relaxed} (strict JSON: {strict})"))
                    })
            }
        }
    }

    fn build(&self, value: &Value, _root: Option<&RootWrapper>) -> Result<String, CodecError> {
        let json = serde_json::Value::from(value);
        serde_json::to_string_pretty(&json)
            .map_err(|e| CodecError::json(format!("Serialization error: {e}")))
    }

    fn sniff(&self, text: &str) -> bool {
        let trimmed = text.trim_start();
        trimmed.starts_with('{') || trimmed.starts_with("//") || trimmed.starts_with("/*")
    }
}

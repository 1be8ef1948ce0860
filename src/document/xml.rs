//! XML codec.
//!
//! Maps XML onto [`Value`] with the vendor conventions the editor relies on:
//!
//! ```xml
//! <Domain Id="5">
//!   <Peer address="a"/>
//!   <Peer address="b"/>
//!   <Tag>lab</Tag>
//! </Domain>
//! ```
//!
//! becomes `{"Domain": {"@_Id": 5, "Peer": [{"@_address": "a"}, {"@_address": "b"}], "Tag": "lab"}}`.
//! A tag that occurs once stays a bare value; callers that need an array
//! regardless of count normalize against the schema.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{CodecError, DocumentFormat, Mapping, RootWrapper, Value};
use crate::base::constants::{ATTRIBUTE_PREFIX, TEXT_KEY, is_namespace_key};

/// XML format handler.
#[derive(Debug, Clone, Copy)]
pub struct XmlCodec {
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` before the root.
    pub declaration: bool,
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self { declaration: true }
    }
}

impl DocumentFormat for XmlCodec {
    fn name(&self) -> &'static str {
        "XML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xml"]
    }

    fn mime_type(&self) -> &'static str {
        "application/xml"
    }

    fn parse(&self, text: &str) -> Result<Value, CodecError> {
        XmlReader::new().read(text)
    }

    fn build(&self, value: &Value, root: Option<&RootWrapper>) -> Result<String, CodecError> {
        XmlWriter::new(self.declaration).write(value, root)
    }

    fn sniff(&self, text: &str) -> bool {
        text.trim_start().starts_with('<')
    }
}

// ============================================================================
// READER
// ============================================================================

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    attributes: Mapping,
    children: Mapping,
    text: String,
}

impl OpenElement {
    fn new(name: String, attributes: Mapping) -> Self {
        Self {
            name,
            attributes,
            children: Mapping::new(),
            text: String::new(),
        }
    }

    /// Collapse into a value: text-only elements become typed scalars.
    fn finish(self) -> (String, Value) {
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Value::from_text(&self.text));
        }
        let mut map = self.attributes;
        if !self.text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::from_text(&self.text));
        }
        map.extend(self.children);
        (self.name, Value::Mapping(map))
    }
}

/// Insert a child, turning repeated tags into a sequence.
///
/// Element values are never sequences themselves, so an existing sequence
/// always means the tag was already repeated.
fn insert_child(children: &mut Mapping, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Sequence(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = Value::Sequence(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

struct XmlReader {
    stack: Vec<OpenElement>,
    roots: Mapping,
}

impl XmlReader {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            roots: Mapping::new(),
        }
    }

    fn read(mut self, text: &str) -> Result<Value, CodecError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let element = self.open(e)?;
                    self.stack.push(element);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = self.open(e)?;
                    self.close(element);
                }
                Ok(Event::End(_)) => {
                    let element = self
                        .stack
                        .pop()
                        .ok_or_else(|| CodecError::xml("Unexpected closing tag"))?;
                    self.close(element);
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| CodecError::xml(format!("Invalid text: {e}")))?;
                    self.append_text(&text);
                }
                Ok(Event::CData(e)) => {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| CodecError::xml(format!("Invalid CDATA: {e}")))?;
                    self.append_text(text);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(CodecError::xml(format!(
                        "XML parse error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                // Declarations, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(CodecError::xml(format!("Unclosed element <{}>", open.name)));
        }
        if self.roots.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(Value::Mapping(self.roots))
    }

    fn open(&self, e: &BytesStart<'_>) -> Result<OpenElement, CodecError> {
        let name = std::str::from_utf8(e.name().as_ref())
            .map_err(|e| CodecError::xml(format!("Invalid tag name: {e}")))?
            .to_string();

        let mut attributes = Mapping::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| CodecError::xml(format!("Invalid attribute: {e}")))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| CodecError::xml(format!("Invalid attribute name: {e}")))?;
            let value = attr
                .unescape_value()
                .map_err(|e| CodecError::xml(format!("Invalid attribute value: {e}")))?;
            attributes.insert(format!("{ATTRIBUTE_PREFIX}{key}"), Value::from_text(&value));
        }
        Ok(OpenElement::new(name, attributes))
    }

    fn close(&mut self, element: OpenElement) {
        let (name, value) = element.finish();
        match self.stack.last_mut() {
            Some(parent) => insert_child(&mut parent.children, name, value),
            None => insert_child(&mut self.roots, name, value),
        }
    }

    fn append_text(&mut self, text: &str) {
        // Text outside the root element is ignored.
        if let Some(top) = self.stack.last_mut() {
            top.text.push_str(text);
        }
    }
}

// ============================================================================
// WRITER
// ============================================================================

struct XmlWriter {
    declaration: bool,
}

fn write_error(e: impl std::fmt::Display) -> CodecError {
    CodecError::xml(format!("Write error: {e}"))
}

impl XmlWriter {
    fn new(declaration: bool) -> Self {
        Self { declaration }
    }

    fn write(&self, value: &Value, root: Option<&RootWrapper>) -> Result<String, CodecError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        if self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(write_error)?;
        }

        match root {
            Some(wrapper) => {
                let payload = match value {
                    Value::Null => Mapping::new(),
                    Value::Mapping(map) => map.clone(),
                    other => {
                        return Err(CodecError::invalid_value(format!(
                            "root payload must be a mapping, found {}",
                            other.kind()
                        )));
                    }
                };
                let mut wrapped = Mapping::new();
                for (name, attr_value) in &wrapper.attributes {
                    wrapped.insert(
                        format!("{ATTRIBUTE_PREFIX}{name}"),
                        Value::String(attr_value.clone()),
                    );
                }
                wrapped.extend(payload.into_iter().filter(|(k, _)| !is_namespace_key(k)));
                self.write_element(&mut writer, &wrapper.name, &Value::Mapping(wrapped))?;
            }
            None => {
                let roots = value.as_mapping().ok_or_else(|| {
                    CodecError::invalid_value(format!(
                        "document must be a mapping of root elements, found {}",
                        value.kind()
                    ))
                })?;
                if roots.is_empty() {
                    return Err(CodecError::Empty);
                }
                for (name, child) in roots {
                    self.write_entry(&mut writer, name, child)?;
                }
            }
        }

        let mut output = String::from_utf8(writer.into_inner())
            .map_err(|e| CodecError::xml(format!("Invalid UTF-8 output: {e}")))?;
        output.push('\n');
        Ok(output)
    }

    /// Write a mapping entry; sequences expand into repeated elements.
    fn write_entry(
        &self,
        writer: &mut Writer<Vec<u8>>,
        name: &str,
        value: &Value,
    ) -> Result<(), CodecError> {
        match value {
            Value::Sequence(items) => {
                for item in items {
                    self.write_entry(writer, name, item)?;
                }
                Ok(())
            }
            other => self.write_element(writer, name, other),
        }
    }

    fn write_element(
        &self,
        writer: &mut Writer<Vec<u8>>,
        name: &str,
        value: &Value,
    ) -> Result<(), CodecError> {
        let Value::Mapping(map) = value else {
            // Scalar element.
            let text = value.to_text().unwrap_or_default();
            if text.is_empty() {
                return writer
                    .write_event(Event::Empty(BytesStart::new(name)))
                    .map_err(write_error);
            }
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_error)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(write_error)?;
            return writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error);
        };

        let mut start = BytesStart::new(name);
        let mut text = None;
        let mut children = Vec::new();
        for (key, child) in map {
            if let Some(attr_name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                let attr_text = child.to_text().ok_or_else(|| {
                    CodecError::invalid_value(format!(
                        "attribute '{attr_name}' on <{name}> must be a scalar"
                    ))
                })?;
                start.push_attribute((attr_name, attr_text.as_str()));
            } else if key == TEXT_KEY {
                text = child.to_text().filter(|t| !t.is_empty());
            } else {
                children.push((key, child));
            }
        }

        if text.is_none() && children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(write_error);
        }

        writer
            .write_event(Event::Start(start))
            .map_err(write_error)?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(write_error)?;
        }
        for (key, child) in children {
            self.write_entry(writer, key, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Value {
        XmlCodec::default().parse(text).expect("XML should parse")
    }

    #[test]
    fn test_xml_format_metadata() {
        let xml = XmlCodec::default();
        assert_eq!(xml.name(), "XML");
        assert_eq!(xml.extensions(), &["xml"]);
        assert_eq!(xml.mime_type(), "application/xml");
        assert!(xml.sniff("  <dds/>"));
        assert!(!xml.sniff("{ mode: 'peer' }"));
    }

    #[test]
    fn test_attributes_get_prefix_and_types() {
        let value = parse(r#"<CycloneDDS><Domain Id="5" name="lab"/></CycloneDDS>"#);
        let domain = value.get("CycloneDDS").unwrap().get("Domain").unwrap();
        assert_eq!(domain.get("@_Id"), Some(&Value::from(5i64)));
        assert_eq!(domain.get("@_name"), Some(&Value::from("lab")));
    }

    #[test]
    fn test_single_occurrence_stays_bare() {
        let value = parse("<root><Peer>a</Peer></root>");
        assert_eq!(value.get("root").unwrap().get("Peer"), Some(&Value::from("a")));
    }

    #[test]
    fn test_repeated_tags_become_sequence() {
        let value = parse("<root><Peer>a</Peer><Peer>b</Peer><Peer>c</Peer></root>");
        assert_eq!(
            value.get("root").unwrap().get("Peer"),
            Some(&Value::Sequence(vec![
                Value::from("a"),
                Value::from("b"),
                Value::from("c")
            ]))
        );
    }

    #[test]
    fn test_text_scalars_are_typed() {
        let value = parse(
            "<root><a>true</a><b>42</b><c>30 s</c><d/><e>&lt;x&gt;</e></root>",
        );
        let root = value.get("root").unwrap();
        assert_eq!(root.get("a"), Some(&Value::Bool(true)));
        assert_eq!(root.get("b"), Some(&Value::from(42i64)));
        assert_eq!(root.get("c"), Some(&Value::from("30 s")));
        assert_eq!(root.get("d"), Some(&Value::from("")));
        assert_eq!(root.get("e"), Some(&Value::from("<x>")));
    }

    #[test]
    fn test_mixed_text_goes_to_text_key() {
        let value = parse(r#"<root><a unit="s">30</a></root>"#);
        let a = value.get("root").unwrap().get("a").unwrap();
        assert_eq!(a.get("@_unit"), Some(&Value::from("s")));
        assert_eq!(a.get(TEXT_KEY), Some(&Value::from(30i64)));
    }

    #[test]
    fn test_comments_and_declaration_ignored() {
        let value = parse(
            r#"<?xml version="1.0"?><!-- c --><root><!-- inner --><a>1</a></root>"#,
        );
        assert_eq!(value.get("root").unwrap().get("a"), Some(&Value::from(1i64)));
    }

    #[test]
    fn test_malformed_is_error() {
        let xml = XmlCodec::default();
        assert!(xml.parse("<a><b></a>").is_err());
        assert!(xml.parse("<a>").is_err());
        assert!(matches!(xml.parse("   "), Err(CodecError::Empty)));
    }

    #[test]
    fn test_build_indents_and_expands_sequences() {
        let value = parse(
            r#"<root x="1"><Peer address="a"/><Peer address="b"/><Tag>lab</Tag><Empty/></root>"#,
        );
        let text = XmlCodec { declaration: false }.build(&value, None).unwrap();
        assert_eq!(
            text,
            "<root x=\"1\">\n  <Peer address=\"a\"/>\n  <Peer address=\"b\"/>\n  <Tag>lab</Tag>\n  <Empty/>\n</root>\n"
        );
    }

    #[test]
    fn test_build_with_root_wrapper_replaces_namespaces() {
        let value = parse(
            r#"<CycloneDDS xmlns="evil" xmlns:xsi="evil"><Domain Id="any"/></CycloneDDS>"#,
        );
        let payload = value.get("CycloneDDS").unwrap();
        let wrapper = RootWrapper::new("CycloneDDS").with_attribute("xmlns", "https://cdds.io/config");
        let text = XmlCodec { declaration: false }
            .build(payload, Some(&wrapper))
            .unwrap();
        assert!(text.starts_with("<CycloneDDS xmlns=\"https://cdds.io/config\">"));
        assert!(!text.contains("evil"));
        assert!(!text.contains("@_"));
    }

    #[test]
    fn test_build_escapes_text_and_attributes() {
        let mut inner = Mapping::new();
        inner.insert("@_name".into(), Value::from("a\"b"));
        inner.insert("note".into(), Value::from("x < y & z"));
        let mut root = Mapping::new();
        root.insert("root".into(), Value::Mapping(inner));
        let text = XmlCodec { declaration: false }
            .build(&Value::Mapping(root), None)
            .unwrap();
        assert!(text.contains("name=\"a&quot;b\""));
        assert!(text.contains("<note>x &lt; y &amp; z</note>"));
    }

    #[test]
    fn test_attribute_must_be_scalar() {
        let mut inner = Mapping::new();
        inner.insert("@_bad".into(), Value::Sequence(vec![]));
        let mut root = Mapping::new();
        root.insert("root".into(), Value::Mapping(inner));
        let result = XmlCodec::default().build(&Value::Mapping(root), None);
        assert!(matches!(result, Err(CodecError::Invalid { .. })));
    }

    #[test]
    fn test_roundtrip_is_fixpoint() {
        let source = r#"<?xml version="1.0" encoding="UTF-8"?>
<dds>
  <profiles xmlns="http://www.eprosima.com">
    <participant profile_name="p1" is_default_profile="true">
      <domainId>3</domainId>
      <rtps>
        <userTransports>
          <transport_id>udp</transport_id>
          <transport_id>shm</transport_id>
        </userTransports>
      </rtps>
    </participant>
  </profiles>
</dds>
"#;
        let codec = XmlCodec::default();
        let once = codec.build(&codec.parse(source).unwrap(), None).unwrap();
        let twice = codec.build(&codec.parse(&once).unwrap(), None).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, source);
    }
}

//! Format markers shared by the codec, builder and assemblers.

/// Prefix marking a mapping key as an XML attribute rather than a child element.
pub const ATTRIBUTE_PREFIX: &str = "@_";

/// Key holding the text content of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Separator used when a [`FieldPath`](super::FieldPath) is rendered as a string.
pub const PATH_SEPARATOR: char = '/';

/// Whether `key` names an attribute (`@_name`).
pub fn is_attribute_key(key: &str) -> bool {
    key.starts_with(ATTRIBUTE_PREFIX)
}

/// Whether `key` is a namespace declaration attribute (`@_xmlns`, `@_xmlns:*`, `@_xsi:*`).
///
/// These are owned by the vendor root wrapper and never taken from user data.
pub fn is_namespace_key(key: &str) -> bool {
    match key.strip_prefix(ATTRIBUTE_PREFIX) {
        Some(name) => name == "xmlns" || name.starts_with("xmlns:") || name.starts_with("xsi:"),
        None => false,
    }
}

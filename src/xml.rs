//! Small helpers shared by the quick-xml based report parsers.

use quick_xml::events::BytesStart;

/// Unescaped value of the attribute `name`, if present and well formed.
pub(crate) fn attribute_value(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

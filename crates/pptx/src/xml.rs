//! Small helpers shared by the quick-xml event loops.

use quick_xml::events::BytesStart;
use xtract_core::Error;

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Value of the attribute with exactly this (possibly prefixed) name.
pub(crate) fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| match a.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

/// Value of a namespace-prefixed attribute, matched on its local name only.
///
/// Used for `r:id`, whose prefix is conventional rather than fixed.
pub(crate) fn prefixed_attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Attribute parsed as an integer coordinate.
pub(crate) fn attr_i64(e: &BytesStart, key: &[u8]) -> Option<i64> {
    attr(e, key).and_then(|v| v.trim().parse().ok())
}

/// Wrap a quick-xml error with the part it came from.
pub(crate) fn xml_error(part: &str, e: quick_xml::Error) -> Error {
    Error::invalid(format!("XML parsing error in '{}': {}", part, e))
}

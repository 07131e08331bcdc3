//! HTML text helpers.

use std::borrow::Cow;

use quick_xml::escape::unescape as unescape_entities;

/// Escape HTML special characters for text and attribute positions.
///
/// Borrows when nothing needs escaping.
#[inline]
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Reverse [`escape`]. Text with unknown or broken entities is returned as is.
pub fn unescape(s: &str) -> Cow<'_, str> {
    unescape_entities(s).unwrap_or(Cow::Borrowed(s))
}

//! `<head>` metadata extraction.
//!
//! Only `<meta name=".." content="..">` elements inside `<head>` are
//! collected. Custom elements (names containing `-`) found in the head are
//! handed to a [`HeadExpander`], and any meta tags in their output count as
//! the document's own.

use std::borrow::Cow;
use std::str;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use super::Metadata;
use crate::log;

/// Nesting limit for head components expanding into other head components.
const MAX_EXPANSION_DEPTH: usize = 8;

/// Expands a custom element found in `<head>` into markup.
pub trait HeadExpander {
    /// Returns `None` for unknown elements, which are then skipped.
    fn expand(&self, name: &str, attrs: &[(String, String)]) -> Option<String>;
}

/// Collect meta name/content pairs from the `<head>` of `html`.
///
/// Parsing stops at `</head>` or `<body>`. Malformed markup ends the scan
/// early but keeps whatever was collected before it.
pub fn extract_head_meta(html: &str, expander: Option<&dyn HeadExpander>) -> Metadata {
    let mut metadata = Metadata::new();
    scan(html, expander, &mut metadata, 0, false);
    metadata
}

/// Attributes of an element as owned, unescaped `(name, value)` pairs.
///
/// Valueless attributes (`<x defer>`) map to an empty string. Values with
/// unknown entities are kept verbatim.
pub fn parse_attributes(elem: &BytesStart<'_>) -> Vec<(String, String)> {
    elem.html_attributes()
        .filter_map(Result::ok)
        .filter_map(|attr| {
            let key = str::from_utf8(attr.key.as_ref()).ok()?.to_owned();
            let raw = str::from_utf8(attr.value.as_ref()).ok()?;
            let value = unescape(raw).unwrap_or(Cow::Borrowed(raw)).into_owned();
            Some((key, value))
        })
        .collect()
}

fn create_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    let config = reader.config_mut();
    config.trim_text(false);
    config.enable_all_checks(false);
    reader
}

fn scan(
    html: &str,
    expander: Option<&dyn HeadExpander>,
    metadata: &mut Metadata,
    depth: usize,
    mut in_head: bool,
) {
    let mut reader = create_reader(html);
    loop {
        let elem = match reader.read_event() {
            Ok(Event::Start(elem) | Event::Empty(elem)) => elem,
            Ok(Event::End(elem)) if in_head && elem.name().as_ref() == b"head" => return,
            Ok(Event::Eof) => return,
            Err(e) => {
                log!("warn"; "head metadata cut short at byte {}: {}", reader.error_position(), e);
                return;
            }
            Ok(_) => continue,
        };

        match elem.name().as_ref() {
            b"head" => in_head = true,
            b"body" => return,
            b"meta" if in_head => {
                let attrs = parse_attributes(&elem);
                let find = |key: &str| {
                    attrs
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(key))
                        .map(|(_, value)| value.as_str())
                };
                if let Some(name) = find("name") {
                    metadata.insert(name, find("content").unwrap_or_default());
                }
            }
            name if in_head && name.contains(&b'-') => {
                let Some(expander) = expander else { continue };
                if depth >= MAX_EXPANSION_DEPTH {
                    continue;
                }
                let Ok(name) = str::from_utf8(name) else {
                    continue;
                };
                if let Some(markup) = expander.expand(name, &parse_attributes(&elem)) {
                    scan(&markup, Some(expander), metadata, depth + 1, true);
                }
            }
            _ => {}
        }
    }
}

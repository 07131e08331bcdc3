//! Content documents and their metadata.
//!
//! A [`DocumentRecord`] is one collected page: its raw source, its site path
//! and the metadata harvested from its `<head>`. Records are immutable once
//! collected and shared as `Arc<DocumentRecord>` between every aggregation
//! of one build.
//!
//! ```text
//! pages/blog/post-1.html ──► HtmlScanner ──► extract_head_meta() ──► DocumentRecord
//!                                                                        │
//!                                                                        ▼
//!                                                             PageStore (ContentRepository)
//! ```

mod meta;
mod scan;
mod store;

pub use meta::{HeadExpander, extract_head_meta, parse_attributes};
pub use scan::{ContentScanner, HtmlScanner};
pub use store::{ContentRepository, PageStore};

use crate::utils::path;
use compact_str::CompactString;
use std::borrow::Cow;
use std::sync::Arc;

// ============================================================================
// Paths
// ============================================================================

/// Location of a document within the site.
///
/// All three parts are site paths (see [`crate::utils::path`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    /// Full site path, e.g. `/blog/post-1.html`
    pub pathname: String,
    /// Parent directory, e.g. `/blog`
    pub dirname: String,
    /// Last segment, e.g. `post-1.html`
    pub filename: String,
}

impl DocumentPath {
    pub fn new(pathname: &str) -> Self {
        let pathname = path::join([pathname]);
        let (dirname, filename) = path::split(&pathname);
        Self {
            pathname,
            dirname,
            filename,
        }
    }

    /// Filename without extension.
    pub fn stem(&self) -> &str {
        path::strip_extension(&self.filename)
    }

    /// Whether this is the index file of its directory.
    pub fn is_index(&self) -> bool {
        self.filename == path::INDEX_FILE
    }

    /// Encoded URL of the document.
    pub fn url(&self) -> String {
        path::encode_url(&self.pathname)
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Value of one metadata key. Repeated keys become a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Single(String),
    List(Vec<String>),
}

impl MetaValue {
    /// First (or only) value.
    pub fn first(&self) -> &str {
        match self {
            Self::Single(value) => value,
            Self::List(values) => values.first().map_or("", String::as_str),
        }
    }

    /// All values in document order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        };
        slice.iter().map(String::as_str)
    }

    /// Values joined with `, ` for use as a token.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            Self::Single(value) => Cow::Borrowed(value),
            Self::List(values) => Cow::Owned(values.join(", ")),
        }
    }
}

/// One `{name, content}` pair, as seen by filter predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaEntry<'a> {
    pub name: &'a str,
    pub content: &'a str,
}

/// Ordered metadata mapping, in the order keys first appear in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(CompactString, MetaValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; a second value for the same key turns it into a list.
    pub fn insert(&mut self, name: &str, content: impl Into<String>) {
        let content = content.into();
        let Some((_, value)) = self.entries.iter_mut().find(|(key, _)| key == name) else {
            self.entries
                .push((CompactString::from(name), MetaValue::Single(content)));
            return;
        };
        match value {
            MetaValue::List(values) => values.push(content),
            MetaValue::Single(existing) => {
                let first = std::mem::take(existing);
                *value = MetaValue::List(vec![first, content]);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// First value of a key.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).map(MetaValue::first)
    }

    /// Keys with their values, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Every value as its own entry; list values are visited one by one.
    pub fn entries(&self) -> impl Iterator<Item = MetaEntry<'_>> {
        self.iter().flat_map(|(name, value)| {
            value.values().map(move |content| MetaEntry { name, content })
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A collected content unit.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Raw source, opaque to aggregation
    pub content: Arc<str>,
    pub path: DocumentPath,
    pub metadata: Metadata,
}

impl DocumentRecord {
    pub fn new(path: DocumentPath, content: impl Into<Arc<str>>) -> Self {
        Self {
            content: content.into(),
            path,
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_path_index() {
        let path = DocumentPath::new("/blog/index.html");
        assert_eq!(path.dirname, "/blog");
        assert_eq!(path.filename, "index.html");
        assert_eq!(path.stem(), "index");
        assert!(path.is_index());
    }

    #[test]
    fn test_document_path_normalizes_missing_root() {
        let path = DocumentPath::new("blog.html");
        assert_eq!(path.pathname, "/blog.html");
        assert_eq!(path.dirname, "/");
        assert_eq!(path.stem(), "blog");
        assert!(!path.is_index());
    }

    #[test]
    fn test_metadata_repeated_key_becomes_list() {
        let mut meta = Metadata::new();
        meta.insert("title", "Post 1");
        meta.insert("tag", "rust");
        meta.insert("tag", "web");
        meta.insert("tag", "ssg");

        assert_eq!(meta.len(), 2);
        assert_eq!(meta.first("title"), Some("Post 1"));
        assert_eq!(
            meta.get("tag"),
            Some(&MetaValue::List(vec!["rust".into(), "web".into(), "ssg".into()]))
        );
        assert_eq!(meta.get("tag").unwrap().joined(), "rust, web, ssg");
    }

    #[test]
    fn test_metadata_preserves_insertion_order() {
        let mut meta = Metadata::new();
        meta.insert("zeta", "1");
        meta.insert("alpha", "2");
        let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn test_metadata_entries_flatten_lists() {
        let mut meta = Metadata::new();
        meta.insert("title", "A");
        meta.insert("tag", "x");
        meta.insert("tag", "y");

        let entries: Vec<_> = meta.entries().map(|e| (e.name, e.content)).collect();
        assert_eq!(entries, [("title", "A"), ("tag", "x"), ("tag", "y")]);
    }
}

//! Filtering, sorting and windowing of collected documents.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::content::{DocumentRecord, MetaEntry, Metadata};

/// Predicate deciding which documents are kept.
#[derive(Clone)]
pub enum Filter {
    /// Called per metadata value; the document is kept if any call returns `true`.
    Entry(Arc<dyn Fn(MetaEntry<'_>) -> bool + Send + Sync>),
    /// Called once with the whole metadata map.
    Document(Arc<dyn Fn(&Metadata) -> bool + Send + Sync>),
}

impl Filter {
    pub fn entry(f: impl Fn(MetaEntry<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self::Entry(Arc::new(f))
    }

    pub fn document(f: impl Fn(&Metadata) -> bool + Send + Sync + 'static) -> Self {
        Self::Document(Arc::new(f))
    }

    pub fn keeps(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Entry(f) => metadata.entries().any(|entry| f(entry)),
            Self::Document(f) => f(metadata),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(_) => f.write_str("Filter::Entry(..)"),
            Self::Document(_) => f.write_str("Filter::Document(..)"),
        }
    }
}

/// Comparator over two documents' metadata.
#[derive(Clone)]
pub struct Sort(pub Arc<dyn Fn(&Metadata, &Metadata) -> Ordering + Send + Sync>);

impl Sort {
    pub fn new(f: impl Fn(&Metadata, &Metadata) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sort(..)")
    }
}

/// Sort (stable), then filter. Records themselves are never touched.
pub fn sort_and_filter(
    mut docs: Vec<Arc<DocumentRecord>>,
    sort: Option<&Sort>,
    filter: Option<&Filter>,
) -> Vec<Arc<DocumentRecord>> {
    if let Some(Sort(compare)) = sort {
        docs.sort_by(|a, b| compare(&a.metadata, &b.metadata));
    }
    if let Some(filter) = filter {
        docs.retain(|doc| filter.keeps(&doc.metadata));
    }
    docs
}

/// Drop every document named `filename`.
pub fn exclude_filename(docs: &mut Vec<Arc<DocumentRecord>>, filename: &str) {
    docs.retain(|doc| doc.path.filename != filename);
}

/// Visible index range over `len` items.
///
/// `start` past the end yields an empty range at `len`.
pub fn window(len: usize, start: usize, limit: Option<usize>) -> Range<usize> {
    let start = start.min(len);
    let end = match limit {
        Some(limit) => start.saturating_add(limit).min(len),
        None => len,
    };
    start..end
}

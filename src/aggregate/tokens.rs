//! Token values handed to item templates.

use std::fmt;
use std::sync::Arc;

use crate::content::{DocumentRecord, Metadata};
use crate::render::Values;
use crate::utils::html;

/// Where an extra item token gets its value.
#[derive(Clone)]
pub enum TokenSource {
    /// Copy of another metadata key (or of an already-resolved value).
    Rename(String),
    /// Computed from the item's metadata.
    Compute(Arc<dyn Fn(&Metadata) -> String + Send + Sync>),
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename(source) => f.debug_tuple("Rename").field(source).finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Token name of a metadata key: `og-title` → `meta_og_title`.
pub fn meta_key(name: &str) -> String {
    format!("meta_{}", name.replace('-', "_"))
}

/// Values describing one document: its escaped metadata, `url` and `filename`.
pub fn document_values(doc: &DocumentRecord) -> Values {
    let mut values: Values = doc
        .metadata
        .iter()
        .map(|(name, value)| (meta_key(name), html::escape(&value.joined()).into_owned()))
        .collect();
    values.insert("url".to_owned(), doc.path.url());
    values.insert("filename".to_owned(), doc.path.filename.clone());
    values
}

/// Ancestor values, overlaid with the item's values, then extra tokens.
pub fn merge(ancestors: &Values, doc: &DocumentRecord, tokens: &[(String, TokenSource)]) -> Values {
    let mut values = ancestors.clone();
    values.extend(document_values(doc));

    for (key, source) in tokens {
        let value = match source {
            TokenSource::Rename(source) => doc
                .metadata
                .get(source)
                .map(|v| html::escape(&v.joined()).into_owned())
                .or_else(|| values.get(source).cloned()),
            TokenSource::Compute(f) => Some(html::escape(&f(&doc.metadata)).into_owned()),
        };
        if let Some(value) = value {
            values.insert(key.clone(), value);
        }
    }
    values
}

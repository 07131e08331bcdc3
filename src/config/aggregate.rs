//! `[[aggregate]]` section configuration.
//!
//! Each entry binds a component to an aggregation. When the component is
//! rendered, its `token` receives the aggregated fragments.
//!
//! # Example
//! ```toml
//! [[aggregate]]
//! component = "blog-list"
//! paths = ["blog"]
//! template = "blog-post"             # or { item = "blog-post" }
//! limit = 2
//! filter = { name = "type", content = "post" }
//! sort = { key = "date", order = "desc" }
//! tokens = { heading = "title" }
//! pagination = { segment = "p", max_visible = 3 }
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;
use super::pagination::{PaginationConfig, PaginationOverrides};
use crate::aggregate::{AggregationRequest, Filter, Sort, TemplateRef, TokenSource};
use crate::content::Metadata;
use crate::render::ComponentBinding;

/// Item template, by bare id or as `{ item = "id" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateConfig {
    Named(String),
    Item { item: String },
}

/// Keep documents having a metadata value `name` (equal to `content`, if given).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Order documents by the first value of a metadata key. Documents without
/// the key go last in either order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortConfig {
    pub key: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// One `[[aggregate]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateConfig {
    /// Custom element name, e.g. `blog-list`
    pub component: String,

    /// Token of the component receiving the output
    #[serde(default = "defaults::aggregate::token")]
    pub token: String,

    pub paths: Vec<String>,
    pub template: TemplateConfig,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub offset: usize,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default)]
    pub filter: Option<FilterConfig>,

    #[serde(default)]
    pub sort: Option<SortConfig>,

    /// Extra item tokens: `token = "metadata key"`
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,

    /// Enables pagination; missing fields come from `[pagination]`
    #[serde(default)]
    pub pagination: Option<PaginationOverrides>,
}

impl AggregateConfig {
    /// The aggregation this entry describes.
    pub fn to_request(&self, pagination: &PaginationConfig) -> AggregationRequest {
        let template = match &self.template {
            TemplateConfig::Named(id) => TemplateRef::Named(id.clone()),
            TemplateConfig::Item { item } => TemplateRef::Item(item.clone()),
        };

        let mut request = AggregationRequest::new(self.paths.iter().cloned(), template);
        request.limit = self.limit;
        request.offset = self.offset;
        request.recursive = self.recursive;
        request.pagination = self.pagination.as_ref().map(|p| p.resolve(pagination));
        request.filter = self.filter.as_ref().map(FilterConfig::to_filter);
        request.sort = self.sort.as_ref().map(SortConfig::to_sort);
        request.tokens = self
            .tokens
            .iter()
            .map(|(key, source)| (key.clone(), TokenSource::Rename(source.clone())))
            .collect();
        request
    }

    pub fn to_binding(&self, pagination: &PaginationConfig) -> ComponentBinding {
        ComponentBinding {
            component: self.component.clone(),
            token: self.token.clone(),
            request: self.to_request(pagination),
        }
    }
}

impl FilterConfig {
    pub fn to_filter(&self) -> Filter {
        let name = self.name.clone();
        let content = self.content.clone();
        Filter::entry(move |entry| {
            entry.name == name && content.as_deref().is_none_or(|c| entry.content == c)
        })
    }
}

impl SortConfig {
    pub fn to_sort(&self) -> Sort {
        let key = self.key.clone();
        let order = self.order;
        Sort::new(move |a: &Metadata, b: &Metadata| match (a.first(&key), b.first(&key)) {
            (Some(x), Some(y)) => match order {
                SortOrder::Asc => x.cmp(y),
                SortOrder::Desc => y.cmp(x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    }
}

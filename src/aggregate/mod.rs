//! Collection aggregation with deterministic pagination.
//!
//! One aggregation renders a window of documents through an item template
//! and, when the collection spans several pages, the pagination control
//! for the current page.
//!
//! # Flow
//!
//! ```text
//! aggregate()
//!     │
//!     ├── resolve templates ──► fail fast on unknown ids
//!     ├── Collector::collect() ──► repository hit or directory scan
//!     ├── sort_and_filter() + self-exclusion
//!     ├── Planner::plan() ──► ContextStore (+ RenderQueue on the root page)
//!     ├── window() ──► render each item, in order
//!     └── render pagination control (more than one page only)
//! ```
//!
//! Synthetic pages scheduled on the [`RenderQueue`] go through the whole
//! page pipeline again and re-enter this module with seed values.

mod collect;
mod context;
mod error;
mod paginate;
mod queue;
mod select;
mod tokens;

pub use collect::Collector;
pub use context::{BuildId, ContextId, ContextStore, PaginationState, keys};
pub use error::AggregateError;
pub use paginate::{Geometry, PlanInput, Planner, current_page, root_geometry, synthetic_pathname};
pub use queue::{RenderQueue, SyntheticRenderRequest};
pub use select::{Filter, Sort, exclude_filename, sort_and_filter, window};
pub use tokens::{TokenSource, document_values, merge, meta_key};

use crate::content::{DocumentPath, DocumentRecord};
use crate::render::{Fragment, RenderBridge, RenderRequest, RenderScope, Values, nav};
use crate::utils::html;

// ============================================================================
// Request
// ============================================================================

/// Template used for each aggregated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Named(String),
    Item(String),
}

impl TemplateRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Named(id) | Self::Item(id) => id,
        }
    }
}

/// Pagination settings of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    /// URL segment before the page number
    pub segment: String,
    /// Pagination control template id
    pub template: String,
    pub max_visible: usize,
    pub aria_label: String,
    pub ellipsis: String,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            segment: "page".to_owned(),
            template: nav::BUILTIN_NAV.to_owned(),
            max_visible: 5,
            aria_label: "Pagination".to_owned(),
            ellipsis: "...".to_owned(),
        }
    }
}

/// What to aggregate and how to present it.
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    /// Site directories to collect from
    pub paths: Vec<String>,
    pub template: TemplateRef,
    pub pagination: Option<PaginationOptions>,
    pub filter: Option<Filter>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    pub offset: usize,
    pub recursive: bool,
    /// Extra item tokens, applied in order
    pub tokens: Vec<(String, TokenSource)>,
}

impl AggregationRequest {
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>, template: TemplateRef) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            template,
            pagination: None,
            filter: None,
            sort: None,
            limit: None,
            offset: 0,
            recursive: false,
            tokens: Vec::new(),
        }
    }

    /// Pagination options, when they take effect (a non-zero limit is set).
    fn active_pagination(&self) -> Option<(&PaginationOptions, usize)> {
        let limit = self.limit.filter(|&limit| limit > 0)?;
        Some((self.pagination.as_ref()?, limit))
    }
}

// ============================================================================
// Context
// ============================================================================

/// The render slot an aggregation runs in.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub context_id: ContextId,
    /// Page currently being rendered
    pub document: &'a DocumentRecord,
    /// Values resolved by ancestor renders
    pub values: &'a Values,
    pub scope: &'a RenderScope,
}

impl RenderContext<'_> {
    pub fn build_id(&self) -> Option<BuildId> {
        self.scope.build_id()
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Runs aggregations against one build's state.
pub struct Aggregator<'a> {
    pub collector: Collector<'a>,
    pub store: &'a ContextStore,
    pub queue: &'a RenderQueue,
    pub bridge: &'a dyn RenderBridge,
}

impl Aggregator<'_> {
    /// Rendered fragments for `request` in the slot `context`.
    ///
    /// Items come first, in window order, followed by the pagination
    /// control when the collection spans more than one page.
    pub fn aggregate(
        &self,
        request: &AggregationRequest,
        context: &RenderContext<'_>,
    ) -> Result<Vec<Fragment>, AggregateError> {
        let item_template = self.resolve(request.template.id())?;
        let pagination = request.active_pagination();
        if let Some((options, _)) = pagination {
            self.resolve(&options.template)?;
        }

        let docs = self.collector.collect(&request.paths, request.recursive)?;
        let mut docs = sort_and_filter(docs, request.sort.as_ref(), request.filter.as_ref());
        exclude_filename(&mut docs, &context.document.path.filename);
        if let Some(root) = context.values.get(keys::INDEX_PATHNAME) {
            exclude_filename(&mut docs, &DocumentPath::new(&html::unescape(root)).filename);
        }

        let state = pagination.map(|(options, limit)| {
            let input = PlanInput {
                options,
                limit,
                offset: request.offset,
                count: docs.len(),
            };
            Planner::new(self.store, self.queue).plan(input, context)
        });
        let start = state.as_ref().map_or(request.offset, |s| s.offset);

        let parent = context.context_id.to_string();
        let mut fragments = Vec::new();
        for index in window(docs.len(), start, request.limit) {
            let id = ContextId::new(parent.as_str(), item_template, index);
            let rendered = self
                .bridge
                .render(RenderRequest {
                    template_id: item_template,
                    values: merge(context.values, &docs[index], &request.tokens),
                    document: context.document,
                    context_id: Some(&id),
                    scope: context.scope,
                })
                .map_err(|err| AggregateError::render(item_template, err))?;
            if let Some(rendered) = rendered {
                fragments.extend(rendered.children);
            }
        }

        if let (Some((options, _)), Some(state)) = (pagination, state)
            && state.total_pages > 1
        {
            let mut values = context.values.clone();
            values.extend(state.to_values());
            let id = ContextId::new(parent.as_str(), options.template.as_str(), 0);
            let rendered = self
                .bridge
                .render(RenderRequest {
                    template_id: &options.template,
                    values,
                    document: context.document,
                    context_id: Some(&id),
                    scope: context.scope,
                })
                .map_err(|err| AggregateError::render(&options.template, err))?;
            if let Some(rendered) = rendered {
                fragments.extend(rendered.children);
            }
        }

        Ok(fragments)
    }

    fn resolve<'t>(&self, id: &'t str) -> Result<&'t str, AggregateError> {
        if id.trim().is_empty() {
            return Err(AggregateError::Configuration("template id is empty".into()));
        }
        if !self.bridge.resolves(id) {
            return Err(AggregateError::Configuration(format!("unknown template `{id}`")));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DocumentPath, Metadata, PageStore};
    use crate::render::Rendered;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    /// Renders items as `[title]` and the control as `<current/total>`.
    struct EchoBridge;

    impl RenderBridge for EchoBridge {
        fn resolves(&self, template_id: &str) -> bool {
            matches!(template_id, "item" | "pager")
        }

        fn render(&self, request: RenderRequest<'_>) -> anyhow::Result<Option<Rendered>> {
            let get = |key: &str| request.values.get(key).cloned().unwrap_or_default();
            let html = match request.template_id {
                "item" => format!("[{}]", get("meta_title")),
                _ => format!("<{}/{}>", get(keys::CURRENT), get(keys::TOTAL)),
            };
            Ok(Some(Rendered { children: vec![html] }))
        }
    }

    /// Scanning is never expected in these tests.
    struct NoScan;

    impl crate::content::ContentScanner for NoScan {
        fn scan(&self, dir: &Path, _: bool) -> io::Result<Vec<DocumentRecord>> {
            Err(io::Error::other(format!("unexpected scan of {}", dir.display())))
        }
    }

    struct Site {
        dir: TempDir,
        store: PageStore,
        contexts: ContextStore,
        queue: RenderQueue,
    }

    impl Site {
        /// `count` posts in `/blog`, plus `/blog/index.html`.
        fn new(count: usize) -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::create_dir_all(dir.path().join("blog")).unwrap();
            let store = PageStore::new();
            for i in 1..=count {
                let mut metadata = Metadata::new();
                metadata.insert("title", format!("Post {i}"));
                store.insert(
                    DocumentRecord::new(DocumentPath::new(&format!("/blog/post-{i}.html")), "")
                        .with_metadata(metadata),
                );
            }
            store.insert(DocumentRecord::new(DocumentPath::new("/blog/index.html"), ""));
            Self {
                dir,
                store,
                contexts: ContextStore::new(),
                queue: RenderQueue::new(),
            }
        }

        fn run(
            &self,
            request: &AggregationRequest,
            pathname: &str,
            values: &Values,
            build_id: Option<BuildId>,
        ) -> Result<String, AggregateError> {
            let aggregator = Aggregator {
                collector: Collector {
                    pages_root: self.dir.path(),
                    repository: &self.store,
                    scanner: &NoScan,
                },
                store: &self.contexts,
                queue: &self.queue,
                bridge: &EchoBridge,
            };
            let doc = DocumentRecord::new(DocumentPath::new(pathname), "");
            let scope = RenderScope::new(build_id);
            let context = RenderContext {
                context_id: ContextId::new(pathname, "list", 0),
                document: &doc,
                values,
                scope: &scope,
            };
            aggregator.aggregate(request, &context).map(|f| f.concat())
        }
    }

    fn paged(limit: usize) -> AggregationRequest {
        let mut request = AggregationRequest::new(["/blog"], TemplateRef::Named("item".into()));
        request.limit = Some(limit);
        request.pagination = Some(PaginationOptions {
            template: "pager".into(),
            ..PaginationOptions::default()
        });
        request
    }

    #[test]
    fn test_unknown_template_fails_before_collection() {
        let site = Site::new(1);
        let request = AggregationRequest::new(["/missing"], TemplateRef::Item("nope".into()));
        let err = site.run(&request, "/index.html", &Values::new(), None).unwrap_err();
        assert!(matches!(err, AggregateError::Configuration(_)));

        let request = AggregationRequest::new(["/missing"], TemplateRef::Item(" ".into()));
        let err = site.run(&request, "/index.html", &Values::new(), None).unwrap_err();
        assert!(matches!(err, AggregateError::Configuration(_)));

        let mut request = paged(2);
        request.pagination.as_mut().unwrap().template = "missing-pager".into();
        let err = site.run(&request, "/index.html", &Values::new(), None).unwrap_err();
        assert!(matches!(err, AggregateError::Configuration(_)));
    }

    #[test]
    fn test_plain_window() {
        let site = Site::new(5);
        let mut request = AggregationRequest::new(["/blog"], TemplateRef::Named("item".into()));
        request.offset = 1;
        request.limit = Some(2);
        let html = site.run(&request, "/index.html", &Values::new(), None).unwrap();
        // `/blog/index.html` is excluded by filename
        assert_eq!(html, "[Post 2][Post 3]");
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let site = Site::new(3);
        let mut request = AggregationRequest::new(["/blog"], TemplateRef::Named("item".into()));
        request.offset = 10;
        assert_eq!(site.run(&request, "/x.html", &Values::new(), None).unwrap(), "");
    }

    #[test]
    fn test_self_exclusion_anywhere_in_list() {
        let site = Site::new(5);
        let request = AggregationRequest::new(["/blog"], TemplateRef::Named("item".into()));
        let html = site.run(&request, "/blog/post-3.html", &Values::new(), None).unwrap();
        // `/blog/index.html` has no title and sorts first
        assert_eq!(html, "[][Post 1][Post 2][Post 4][Post 5]");
    }

    #[test]
    fn test_root_page_and_schedule() {
        let site = Site::new(5);
        let build_id = BuildId::next();
        let html = site.run(&paged(2), "/index.html", &Values::new(), Some(build_id)).unwrap();
        assert_eq!(html, "[Post 1][Post 2]<1/3>");

        let queued = site.queue.drain();
        let paths: Vec<_> = queued.iter().map(|r| r.path.pathname.as_str()).collect();
        assert_eq!(paths, ["/page/2.html", "/page/3.html"]);
        assert!(queued.iter().all(|r| r.build_id == build_id));
    }

    #[test]
    fn test_synthetic_pages_window() {
        let site = Site::new(5);
        let mut seeds = Values::new();
        seeds.insert(keys::BASE_URL.into(), "/index.html".into());
        seeds.insert(keys::URL_PREFIX.into(), "/".into());
        seeds.insert(keys::INDEX_PATHNAME.into(), "/index.html".into());
        seeds.insert(keys::ROOT.into(), "false".into());

        let page2 = site.run(&paged(2), "/page/2.html", &seeds, None).unwrap();
        let page3 = site.run(&paged(2), "/page/3.html", &seeds, None).unwrap();
        assert_eq!(page2, "[Post 3][Post 4]<2/3>");
        assert_eq!(page3, "[Post 5]<3/3>");
        assert!(site.queue.is_empty());
    }

    #[test]
    fn test_single_page_omits_control() {
        let site = Site::new(2);
        let html = site
            .run(&paged(2), "/index.html", &Values::new(), Some(BuildId::next()))
            .unwrap();
        assert_eq!(html, "[Post 1][Post 2]");
        assert!(site.queue.is_empty());
    }

    #[test]
    fn test_replanning_is_idempotent() {
        let site = Site::new(5);
        let build_id = Some(BuildId::next());
        let first = site.run(&paged(2), "/index.html", &Values::new(), build_id).unwrap();
        let second = site.run(&paged(2), "/index.html", &Values::new(), build_id).unwrap();
        assert_eq!(first, second);
        assert_eq!(site.queue.len(), 2);

        let id = ContextId::new("/index.html", "list", 0);
        let state = site.contexts.get(&id).unwrap();
        assert!(state.processed);
        assert_eq!((state.current_page, state.total_pages), (1, 3));
    }

    #[test]
    fn test_total_pages_property() {
        for count in 1..=7 {
            for limit in 1..=3 {
                let site = Site::new(count);
                site.run(&paged(limit), "/index.html", &Values::new(), None).unwrap();
                let state = site.contexts.get(&ContextId::new("/index.html", "list", 0)).unwrap();
                assert_eq!(state.total_pages, count.div_ceil(limit));
            }
        }
    }

    #[test]
    fn test_filter_then_paginate() {
        let site = Site::new(5);
        let mut request = paged(2);
        request.filter = Some(Filter::entry(|e| e.name == "title" && e.content != "Post 2"));
        let html = site.run(&request, "/index.html", &Values::new(), None).unwrap();
        assert_eq!(html, "[Post 1][Post 3]<1/2>");
    }

    #[test]
    fn test_sort_descending() {
        let site = Site::new(3);
        let mut request = AggregationRequest::new(["/blog"], TemplateRef::Named("item".into()));
        request.sort = Some(Sort::new(|a, b| b.first("title").cmp(&a.first("title"))));
        let html = site.run(&request, "/index.html", &Values::new(), None).unwrap();
        assert_eq!(html, "[Post 3][Post 2][Post 1]");
    }
}

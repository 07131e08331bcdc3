//! Pagination planning.
//!
//! A paginated aggregation on a page with `N` matching items and a limit of
//! `L` spans `ceil(N / L)` pages. Page 1 is the page that holds the
//! aggregation (the *root*); pages 2..N are synthetic and are scheduled on
//! the render queue by the root's first plan.
//!
//! Output naming depends on the root's shape:
//!
//! | Root                | Page 2              | URL prefix |
//! |---------------------|---------------------|------------|
//! | `/index.html`       | `/page/2.html`      | `/`        |
//! | `/blog.html`        | `/blog/page/2.html` | `/blog/`   |
//! | `/blog/index.html`  | `/blog/page/2.html` | `/blog/`   |
//!
//! Synthetic pages carry the root's URLs in their seed values and never
//! derive naming from their own path.

use regex::Regex;

use super::context::keys;
use super::{
    BuildId, ContextStore, PaginationOptions, PaginationState, RenderContext, RenderQueue,
    SyntheticRenderRequest,
};
use crate::content::{DocumentPath, DocumentRecord};
use crate::log;
use crate::render::Values;
use crate::utils::{html, path};

/// Where a series lives, derived once from its root document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    /// Site directory that holds `<segment>/<n>.html`
    pub target_dir: String,
    pub base_url: String,
    pub url_prefix: String,
}

/// Naming of the series rooted at `root`.
pub fn root_geometry(root: &DocumentPath) -> Geometry {
    let target_dir = if root.is_index() {
        root.dirname.clone()
    } else {
        path::join([root.dirname.as_str(), root.stem()])
    };
    let url_prefix = path::with_trailing_slash(&path::encode_url(&target_dir));
    Geometry {
        target_dir,
        base_url: root.url(),
        url_prefix,
    }
}

/// Pathname of page `page` of a series.
pub fn synthetic_pathname(target_dir: &str, segment: &str, page: usize) -> String {
    path::join([target_dir, segment, &format!("{page}.html")])
}

/// Page number encoded in a trailing `/<segment>/<n>` (optionally `.html`).
pub fn current_page(pathname: &str, segment: &str) -> Option<usize> {
    let pattern = format!("/{}/([0-9]+)(?:\\.html)?$", regex::escape(segment));
    let re = Regex::new(&pattern).ok()?;
    re.captures(pathname)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|&page| page >= 1)
}

/// Inputs of one plan beyond the render context.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub options: &'a PaginationOptions,
    pub limit: usize,
    /// Offset requested by the aggregation, before paging
    pub offset: usize,
    /// Items left after filtering and self-exclusion
    pub count: usize,
}

/// Computes pagination state and schedules synthetic pages.
pub struct Planner<'a> {
    store: &'a ContextStore,
    queue: &'a RenderQueue,
}

impl<'a> Planner<'a> {
    pub fn new(store: &'a ContextStore, queue: &'a RenderQueue) -> Self {
        Self { store, queue }
    }

    /// State of the slot in `context`, computing it on first use.
    ///
    /// Only a root invocation that carries a build id schedules pages, and
    /// only on the call that records the state.
    pub fn plan(&self, input: PlanInput<'_>, context: &RenderContext<'_>) -> PaginationState {
        if let Some(state) = self.store.get(&context.context_id) {
            return state;
        }

        let doc = context.document;
        let seeds = context.values;
        let detected = current_page(&doc.path.pathname, &input.options.segment);
        let seeded_root = seeds.get(keys::ROOT).is_none_or(|flag| flag != "false");
        let is_root = detected.is_none() && seeded_root;

        let geometry = root_geometry(&doc.path);
        let seed = |key: &str| seeds.get(key).map(|value| html::unescape(value).into_owned());
        let base_url = seed(keys::BASE_URL).unwrap_or_else(|| geometry.base_url.clone());
        let url_prefix = seed(keys::URL_PREFIX).unwrap_or_else(|| geometry.url_prefix.clone());

        let limit = input.limit.max(1);
        let current_page = detected.unwrap_or(1);
        let state = PaginationState {
            segment: input.options.segment.clone(),
            max_visible: input.options.max_visible,
            processed: true,
            current_page,
            total_pages: input.count.div_ceil(limit),
            base_url,
            url_prefix,
            offset: input.offset.saturating_add((current_page - 1).saturating_mul(limit)),
            aria_label: input.options.aria_label.clone(),
            ellipsis: input.options.ellipsis.clone(),
        };

        let (state, inserted) = self.store.get_or_insert(context.context_id.clone(), state);
        if inserted
            && is_root
            && state.total_pages > 1
            && let Some(build_id) = context.build_id()
        {
            self.schedule(doc, &geometry, &state, build_id);
        }
        state
    }

    fn schedule(&self, root: &DocumentRecord, geometry: &Geometry, state: &PaginationState, build_id: BuildId) {
        let text = |s: &str| html::escape(s).into_owned();
        let mut seeds = Values::new();
        seeds.insert(keys::BASE_URL.to_owned(), text(&state.base_url));
        seeds.insert(keys::URL_PREFIX.to_owned(), text(&state.url_prefix));
        seeds.insert(keys::INDEX_PATHNAME.to_owned(), text(&root.path.pathname));
        seeds.insert(keys::ROOT.to_owned(), "false".to_owned());

        for page in 2..=state.total_pages {
            let pathname = synthetic_pathname(&geometry.target_dir, &state.segment, page);
            self.queue.enqueue(SyntheticRenderRequest {
                content: root.content.clone(),
                path: DocumentPath::new(&pathname),
                metadata: root.metadata.clone(),
                values: seeds.clone(),
                build_id,
            });
        }
        log!("paginate"; "{} -> {} pages", root.path.pathname, state.total_pages);
    }
}

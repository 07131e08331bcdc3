//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── render_site()
//!     │       │
//!     │       ├── load templates, scan pages ──► PageStore
//!     │       │
//!     │       ├── render every page (rayon, with build id)
//!     │       │       └── root aggregations enqueue synthetic pages
//!     │       │
//!     │       └── drain RenderQueue ──► render synthetic pages (no build id)
//!     │
//!     └── write pages ──► output/<pathname>, minified
//! ```

use crate::{
    aggregate::{BuildId, ContextStore, RenderQueue, SyntheticRenderRequest},
    config::SiteConfig,
    content::{ContentRepository, ContentScanner, DocumentPath, HtmlScanner, PageStore},
    log,
    logger::ProgressBars,
    render::{SiteRenderer, TemplateRegistry, Values},
    utils::{html, minify::minify_page, path},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// State owned by one build pass.
///
/// Dropping the session drops every page, pagination state and pending
/// synthetic request of the build.
#[derive(Debug)]
pub struct BuildSession {
    pub id: BuildId,
    pub pages: PageStore,
    pub contexts: ContextStore,
    pub queue: RenderQueue,
}

impl BuildSession {
    pub fn new() -> Self {
        Self {
            id: BuildId::next(),
            pages: PageStore::new(),
            contexts: ContextStore::new(),
            queue: RenderQueue::new(),
        }
    }

    /// Whether a drained request should be rendered.
    ///
    /// Requests from another build and pathnames already emitted are
    /// dropped; `emitted` records accepted pathnames.
    fn accept(&self, request: &SyntheticRenderRequest, emitted: &mut FxHashSet<String>) -> bool {
        let pathname = &request.path.pathname;
        if request.build_id != self.id {
            log!("warn"; "dropping {} from build {}", pathname, request.build_id);
            return false;
        }
        if !emitted.insert(pathname.clone()) {
            log!("warn"; "{} already rendered, skipping", pathname);
            return false;
        }
        true
    }
}

impl Default for BuildSession {
    fn default() -> Self {
        Self::new()
    }
}

/// One rendered output page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub path: DocumentPath,
    pub html: String,
    pub synthetic: bool,
}

/// Summary of a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Every page written, synthetic ones included
    pub pages: usize,
    pub synthetic: usize,
}

/// Values every page starts from.
fn site_values(config: &SiteConfig) -> Values {
    let mut values = Values::new();
    values.insert("site_title".to_owned(), html::escape(&config.base.title).into_owned());
    if let Some(url) = &config.base.url {
        values.insert("site_url".to_owned(), html::escape(url).into_owned());
    }
    values
}

/// Render every page of the site, synthetic pagination pages included.
pub fn render_site(config: &SiteConfig) -> Result<Vec<RenderedPage>> {
    let pages_root = &config.build.pages;
    let templates = Arc::new(
        TemplateRegistry::load(&config.build.templates).context("Failed to load templates")?,
    );
    let scanner = HtmlScanner::new(pages_root).with_expander(templates.clone());

    let session = BuildSession::new();
    let records = scanner
        .scan(pages_root, true)
        .with_context(|| format!("Failed to scan `{}`", pages_root.display()))?;
    session.pages.extend(records);
    log!("build"; "found {} pages, {} templates", session.pages.len(), templates.len());

    let bindings = config.bindings();
    let renderer = SiteRenderer {
        templates: &templates,
        bindings: &bindings,
        pages_root,
        repository: &session.pages,
        scanner: &scanner,
        contexts: &session.contexts,
        queue: &session.queue,
    };
    let seeds = site_values(config);
    let has_error = AtomicBool::new(false);

    let docs = session.pages.list_all();
    let progress = ProgressBars::new_filtered(&[("pages", docs.len())]);
    let mut rendered = docs
        .par_iter()
        .map(|doc| {
            let html = renderer
                .render_page(doc, &seeds, Some(session.id))
                .with_context(|| format!("Failed to render `{}`", doc.path.pathname));
            if let Some(progress) = &progress {
                progress.inc_by_name("pages");
            }
            report_first_error(&has_error, &html);
            Ok(RenderedPage {
                path: doc.path.clone(),
                html: html?,
                synthetic: false,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    drop(progress);

    let mut emitted: FxHashSet<String> = rendered.iter().map(|p| p.path.pathname.clone()).collect();
    loop {
        let batch: Vec<_> = session
            .queue
            .drain()
            .into_iter()
            .filter(|request| session.accept(request, &mut emitted))
            .collect();
        if batch.is_empty() {
            break;
        }

        let progress = ProgressBars::new_filtered(&[("synthetic", batch.len())]);
        let pages = batch
            .par_iter()
            .map(|request| {
                let doc = request.to_document();
                let mut values = seeds.clone();
                values.extend(request.values.iter().map(|(k, v)| (k.clone(), v.clone())));
                let html = renderer
                    .render_page(&doc, &values, None)
                    .with_context(|| format!("Failed to render `{}`", doc.path.pathname));
                if let Some(progress) = &progress {
                    progress.inc_by_name("synthetic");
                }
                report_first_error(&has_error, &html);
                Ok(RenderedPage {
                    path: doc.path,
                    html: html?,
                    synthetic: true,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rendered.extend(pages);
    }

    Ok(rendered)
}

fn report_first_error<T>(has_error: &AtomicBool, result: &Result<T>) {
    if let Err(e) = result
        && !has_error.swap(true, Ordering::Relaxed)
    {
        log!("error"; "{:#}", e);
    }
}

/// Build the whole site into `[build].output`.
///
/// If `config.build.clean` is true, clears the entire output directory first.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let output = &config.build.output;
    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clean `{}`", output.display()))?;
    }

    log!("build"; "rendering...");
    let pages = render_site(config)?;
    pages
        .par_iter()
        .try_for_each(|page| write_page(output, page, config))?;

    let report = BuildReport {
        pages: pages.len(),
        synthetic: pages.iter().filter(|p| p.synthetic).count(),
    };
    log!("build"; "wrote {} pages ({} paginated) to {}", report.pages, report.synthetic, output.display());
    Ok(report)
}

fn write_page(output: &Path, page: &RenderedPage, config: &SiteConfig) -> Result<()> {
    let target = path::to_fs(output, &page.path.pathname);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create `{}`", parent.display()))?;
    }
    let html = minify_page(page.html.as_bytes(), config);
    fs::write(&target, html).with_context(|| format!("Failed to write `{}`", target.display()))?;
    Ok(())
}

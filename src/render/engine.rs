//! Page renderer.
//!
//! Rendering is a single left-to-right scan over the source. Every match is
//! either a `{{ token }}` placeholder, replaced from the current values, or
//! a custom element whose name is a known component:
//!
//! ```text
//! <blog-list limit="2"></blog-list>
//!     │
//!     ├── attributes ──► values passed down
//!     ├── bound?     ──► aggregate() ──► bound token
//!     └── template body, rendered recursively
//! ```
//!
//! Substituted values are never scanned again.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use quick_xml::events::BytesStart;
use regex::Regex;

use super::nav::{self, BUILTIN_NAV};
use super::template::TOKEN_PATTERN;
use super::{
    RenderBridge, RenderError, RenderRequest, RenderScope, Rendered, TemplateRegistry, Values,
};
use crate::aggregate::{
    AggregationRequest, Aggregator, BuildId, Collector, ContextId, ContextStore, RenderContext,
    RenderQueue, document_values,
};
use crate::content::{ContentRepository, ContentScanner, DocumentRecord, parse_attributes};
use crate::utils::html;

/// Component nesting limit within one page.
pub const MAX_RENDER_DEPTH: usize = 32;

/// Opening tag of a custom element; group 1 is the name, group 2 the attributes.
const ELEMENT_PATTERN: &str =
    r#"<([a-z][a-z0-9]*(?:-[a-z0-9]+)+)((?:[ \t\r\n/](?:"[^"]*"|'[^']*'|[^>"'])*)?)>"#;

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{TOKEN_PATTERN}|{ELEMENT_PATTERN}")).unwrap());

/// A component whose token is filled by an aggregation.
#[derive(Debug, Clone)]
pub struct ComponentBinding {
    pub component: String,
    /// Token receiving the concatenated fragments
    pub token: String,
    pub request: AggregationRequest,
}

/// Renders pages of one build.
pub struct SiteRenderer<'a> {
    pub templates: &'a TemplateRegistry,
    pub bindings: &'a [ComponentBinding],
    pub pages_root: &'a Path,
    pub repository: &'a dyn ContentRepository,
    pub scanner: &'a dyn ContentScanner,
    pub contexts: &'a ContextStore,
    pub queue: &'a RenderQueue,
}

impl SiteRenderer<'_> {
    /// Render a whole page.
    ///
    /// `seeds` override the document's own values. Synthetic pages are
    /// rendered without a build id.
    pub fn render_page(
        &self,
        doc: &DocumentRecord,
        seeds: &Values,
        build_id: Option<BuildId>,
    ) -> Result<String> {
        let scope = RenderScope::new(build_id);
        let mut values = document_values(doc);
        values.extend(seeds.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.expand(&doc.content, &values, doc, &scope, None)
    }

    fn binding(&self, name: &str) -> Option<&ComponentBinding> {
        self.bindings.iter().find(|b| b.component == name)
    }

    fn is_component(&self, name: &str) -> bool {
        self.templates.contains(name) || name == BUILTIN_NAV || self.binding(name).is_some()
    }

    fn aggregator(&self) -> Aggregator<'_> {
        Aggregator {
            collector: Collector {
                pages_root: self.pages_root,
                repository: self.repository,
                scanner: self.scanner,
            },
            store: self.contexts,
            queue: self.queue,
            bridge: self,
        }
    }

    /// Expand `source`; `parent` is the slot it renders under, if any.
    fn expand(
        &self,
        source: &str,
        values: &Values,
        doc: &DocumentRecord,
        scope: &RenderScope,
        parent: Option<&ContextId>,
    ) -> Result<String> {
        let mut out = String::with_capacity(source.len());
        let mut pos = 0;

        while let Some(caps) = MARKUP_RE.captures_at(source, pos) {
            let Some(whole) = caps.get(0) else { break };
            out.push_str(&source[pos..whole.start()]);
            pos = whole.end();

            if let Some(token) = caps.get(1) {
                out.push_str(values.get(token.as_str()).map_or("", String::as_str));
                continue;
            }

            let Some(name) = caps.get(2).map(|m| m.as_str()) else {
                continue;
            };
            if !self.is_component(name) {
                out.push_str(whole.as_str());
                continue;
            }

            let raw_attrs = caps.get(3).map_or("", |m| m.as_str()).trim_end();
            let self_closing = raw_attrs.ends_with('/');
            let attrs = raw_attrs.trim_end_matches('/');

            let mut slot = "";
            if !self_closing {
                let close = format!("</{name}>");
                if let Some(offset) = source[pos..].find(&close) {
                    slot = &source[pos..pos + offset];
                    pos += offset + close.len();
                }
            }

            let mut child = values.clone();
            let elem = BytesStart::from_content(format!("{name}{attrs}"), name.len());
            for (key, value) in parse_attributes(&elem) {
                child.insert(key, html::escape(&value).into_owned());
            }
            if !slot.trim().is_empty() {
                let slot = self.expand(slot, values, doc, scope, parent)?;
                child.insert("slot".to_owned(), slot);
            }

            out.push_str(&self.render_component(name, child, doc, scope, parent)?);
        }

        out.push_str(&source[pos..]);
        Ok(out)
    }

    fn render_component(
        &self,
        name: &str,
        mut values: Values,
        doc: &DocumentRecord,
        scope: &RenderScope,
        parent: Option<&ContextId>,
    ) -> Result<String> {
        if scope.depth() >= MAX_RENDER_DEPTH {
            return Err(RenderError::RecursionLimit {
                component: name.to_owned(),
                limit: MAX_RENDER_DEPTH,
            }
            .into());
        }
        let _level = scope.enter();

        let binding = self.binding(name);
        if let Some(binding) = binding {
            // Slots are counted per owner: the page, or the enclosing item render
            let owner = parent.map_or_else(|| doc.path.pathname.clone(), ToString::to_string);
            let index = scope.next_slot(&format!("{owner}#{name}"));
            let context = RenderContext {
                context_id: ContextId::new(owner, name, index),
                document: doc,
                values: &values,
                scope,
            };
            let fragments = self
                .aggregator()
                .aggregate(&binding.request, &context)
                .with_context(|| format!("aggregation in `<{name}>` failed"))?;
            values.insert(binding.token.clone(), fragments.concat());
        }

        match (self.templates.get(name), binding) {
            (Some(template), _) => self.expand(&template.body, &values, doc, scope, parent),
            (None, _) if name == BUILTIN_NAV => Ok(nav::render(&values)),
            (None, Some(binding)) => Ok(values.remove(&binding.token).unwrap_or_default()),
            (None, None) => Err(RenderError::UnknownTemplate(name.to_owned()).into()),
        }
    }
}

impl RenderBridge for SiteRenderer<'_> {
    fn resolves(&self, template_id: &str) -> bool {
        self.is_component(template_id)
    }

    fn render(&self, request: RenderRequest<'_>) -> Result<Option<Rendered>> {
        let html = self.render_component(
            request.template_id,
            request.values,
            request.document,
            request.scope,
            request.context_id,
        )?;
        Ok(Some(Rendered { children: vec![html] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{PaginationOptions, TemplateRef};
    use crate::content::{DocumentPath, HtmlScanner, PageStore};
    use crate::render::template::substitute;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATES: &str = r#"
<template id="post-item"><li>{{ meta_title }}</li></template>
<template id="post-list"><ul>{{ content }}</ul></template>
<template id="greet-box"><p>Hello {{ name }}{{ slot }}</p></template>
<template id="post-card"><li>{{ meta_title }}<tag-list></tag-list></li></template>
<template id="tag-list"><em>{{ content }}</em></template>
<template id="loop-a"><loop-b></loop-b></template>
<template id="loop-b"><loop-a></loop-a></template>
"#;

    struct Fixture {
        dir: TempDir,
        templates: TemplateRegistry,
        store: PageStore,
        contexts: ContextStore,
        queue: RenderQueue,
        scanner: HtmlScanner,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let blog = dir.path().join("blog");
            fs::create_dir_all(&blog).unwrap();
            for i in 1..=3 {
                fs::write(
                    blog.join(format!("post-{i}.html")),
                    format!(r#"<html><head><meta name="title" content="Post {i}"></head></html>"#),
                )
                .unwrap();
            }
            let mut templates = TemplateRegistry::new();
            templates.parse(TEMPLATES, Path::new("t.html")).unwrap();
            let scanner = HtmlScanner::new(dir.path());
            Self {
                dir,
                templates,
                store: PageStore::new(),
                contexts: ContextStore::new(),
                queue: RenderQueue::new(),
                scanner,
            }
        }

        fn render(
            &self,
            bindings: &[ComponentBinding],
            pathname: &str,
            content: &str,
        ) -> Result<String> {
            let renderer = SiteRenderer {
                templates: &self.templates,
                bindings,
                pages_root: self.dir.path(),
                repository: &self.store,
                scanner: &self.scanner,
                contexts: &self.contexts,
                queue: &self.queue,
            };
            let doc = DocumentRecord::new(DocumentPath::new(pathname), content);
            renderer.render_page(&doc, &Values::new(), Some(BuildId::next()))
        }
    }

    fn list_binding(limit: Option<usize>, pagination: bool) -> ComponentBinding {
        let mut request = AggregationRequest::new(["/blog"], TemplateRef::Named("post-item".into()));
        request.limit = limit;
        request.pagination = pagination.then(PaginationOptions::default);
        ComponentBinding {
            component: "post-list".into(),
            token: "content".into(),
            request,
        }
    }

    #[test]
    fn test_components_and_attributes() {
        let fx = Fixture::new();
        let html = fx
            .render(&[], "/index.html", r#"<main><greet-box name="<Ada>"></greet-box></main>"#)
            .unwrap();
        assert_eq!(html, "<main><p>Hello &lt;Ada&gt;</p></main>");
    }

    #[test]
    fn test_self_closing_and_slot() {
        let fx = Fixture::new();
        let source = r#"<greet-box name="A"/>|<greet-box name="B">, <b>hi</b></greet-box>"#;
        let html = fx.render(&[], "/index.html", source).unwrap();
        assert_eq!(html, "<p>Hello A</p>|<p>Hello B, <b>hi</b></p>");
    }

    #[test]
    fn test_unknown_elements_are_kept() {
        let fx = Fixture::new();
        let source = r#"<my-widget data-x="1"><greet-box name="C"></greet-box></my-widget>"#;
        let html = fx.render(&[], "/index.html", source).unwrap();
        assert_eq!(html, r#"<my-widget data-x="1"><p>Hello C</p></my-widget>"#);
    }

    #[test]
    fn test_page_tokens_from_metadata() {
        let fx = Fixture::new();
        let source = r#"<head><meta name="title" content="Home"></head><h1>{{ meta_title }}</h1>"#;
        let mut metadata = crate::content::Metadata::new();
        metadata.insert("title", "Home");
        let doc = DocumentRecord::new(DocumentPath::new("/index.html"), source).with_metadata(metadata);
        let renderer = SiteRenderer {
            templates: &fx.templates,
            bindings: &[],
            pages_root: fx.dir.path(),
            repository: &fx.store,
            scanner: &fx.scanner,
            contexts: &fx.contexts,
            queue: &fx.queue,
        };
        let html = renderer.render_page(&doc, &Values::new(), None).unwrap();
        assert!(html.ends_with("<h1>Home</h1>"));
    }

    #[test]
    fn test_page_tokens_match_template_tokens() {
        let fx = Fixture::new();
        let source = "{{meta_title}}|{{ \tmeta_title }}|{{ meta title }}|{{ a.b-c$ }}";
        let mut values = Values::new();
        values.insert("meta_title".into(), "T".into());
        values.insert("a.b-c$".into(), "X".into());
        let renderer = SiteRenderer {
            templates: &fx.templates,
            bindings: &[],
            pages_root: fx.dir.path(),
            repository: &fx.store,
            scanner: &fx.scanner,
            contexts: &fx.contexts,
            queue: &fx.queue,
        };
        let doc = DocumentRecord::new(DocumentPath::new("/index.html"), source);
        let html = renderer.render_page(&doc, &values, None).unwrap();
        assert_eq!(html, substitute(source, &values));
        assert_eq!(html, "T|T|{{ meta title }}|X");
    }

    #[test]
    fn test_recursion_is_capped() {
        let fx = Fixture::new();
        let err = fx.render(&[], "/index.html", "<loop-a></loop-a>").unwrap_err();
        assert!(err.chain().any(|e| e.to_string().contains("nested deeper")));
    }

    #[test]
    fn test_bound_component_aggregates() {
        let fx = Fixture::new();
        let html = fx
            .render(&[list_binding(None, false)], "/index.html", "<post-list></post-list>")
            .unwrap();
        assert_eq!(html, "<ul><li>Post 1</li><li>Post 2</li><li>Post 3</li></ul>");
    }

    #[test]
    fn test_bound_component_paginates() {
        let fx = Fixture::new();
        let html = fx
            .render(&[list_binding(Some(2), true)], "/news.html", "<post-list></post-list>")
            .unwrap();
        assert!(html.starts_with("<ul><li>Post 1</li><li>Post 2</li><nav"));
        assert!(html.contains(r#"href="/news/page/2.html""#));

        let queued = fx.queue.drain();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].path.pathname, "/news/page/2.html");
    }

    #[test]
    fn test_each_occurrence_gets_its_own_slot() {
        let fx = Fixture::new();
        fx.render(
            &[list_binding(Some(2), true)],
            "/index.html",
            "<post-list></post-list><post-list></post-list>",
        )
        .unwrap();
        assert_eq!(fx.contexts.len(), 2);
    }

    #[test]
    fn test_nested_aggregation_slots_follow_item() {
        let fx = Fixture::new();
        let mut outer = list_binding(None, false);
        outer.request.template = TemplateRef::Named("post-card".into());
        let mut inner = list_binding(Some(1), true);
        inner.component = "tag-list".into();
        fx.render(&[outer, inner], "/index.html", "<post-list></post-list>").unwrap();

        let list = ContextId::new("/index.html", "post-list", 0);
        assert_eq!(fx.contexts.len(), 3);
        for index in 0..3 {
            let item = ContextId::new(list.to_string(), "post-card", index);
            let nested = ContextId::new(item.to_string(), "tag-list", 0);
            assert_eq!(fx.contexts.get(&nested).map(|s| s.total_pages), Some(3));
        }
        assert!(fx.contexts.get(&ContextId::new("/index.html", "tag-list", 0)).is_none());
    }

    #[test]
    fn test_unknown_item_template_fails() {
        let fx = Fixture::new();
        let mut binding = list_binding(None, false);
        binding.request.template = TemplateRef::Item("nope".into());
        let err = fx.render(&[binding], "/index.html", "<post-list></post-list>").unwrap_err();
        assert!(format!("{err:#}").contains("unknown template `nope`"));
    }
}

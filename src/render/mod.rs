//! Template rendering.
//!
//! Templates are `<template id="..">` blocks loaded from the templates
//! directory. A page is rendered by substituting `{{ token }}` values and
//! expanding every custom element (`<blog-list></blog-list>`) whose name is
//! a known template. Components bound to an aggregation get their bound
//! token filled with the aggregation's output.

mod engine;
mod error;
pub mod nav;
mod template;

pub use engine::{ComponentBinding, MAX_RENDER_DEPTH, SiteRenderer};
pub use error::RenderError;
pub use template::{Template, TemplateRegistry};

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use anyhow::Result;
use rustc_hash::FxHashMap;

use crate::aggregate::{BuildId, ContextId};
use crate::content::DocumentRecord;

/// Token values, by name. Values are HTML-ready (already escaped).
pub type Values = BTreeMap<String, String>;

/// A rendered HTML fragment.
pub type Fragment = String;

/// Output of one template render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub children: Vec<Fragment>,
}

/// One call into the render bridge.
#[derive(Debug)]
pub struct RenderRequest<'a> {
    pub template_id: &'a str,
    pub values: Values,
    /// Page being rendered
    pub document: &'a DocumentRecord,
    /// Slot of this render; aggregations nested in the template key off it
    pub context_id: Option<&'a ContextId>,
    pub scope: &'a RenderScope,
}

/// Renders templates on behalf of aggregation.
///
/// Implementations may call back into aggregation while rendering.
pub trait RenderBridge: Send + Sync {
    /// Whether `template_id` names a renderable template.
    fn resolves(&self, template_id: &str) -> bool;

    /// Render a template; `None` when it produced nothing.
    fn render(&self, request: RenderRequest<'_>) -> Result<Option<Rendered>>;
}

/// State of one page render.
///
/// Counts occurrences of each component (so every aggregation slot gets its
/// own context id) and tracks component nesting depth.
#[derive(Debug, Default)]
pub struct RenderScope {
    build_id: Option<BuildId>,
    slots: RefCell<FxHashMap<String, usize>>,
    depth: Cell<usize>,
}

impl RenderScope {
    pub fn new(build_id: Option<BuildId>) -> Self {
        Self {
            build_id,
            ..Self::default()
        }
    }

    pub fn build_id(&self) -> Option<BuildId> {
        self.build_id
    }

    /// Next occurrence index for `key`, starting at 0.
    pub fn next_slot(&self, key: &str) -> usize {
        let mut slots = self.slots.borrow_mut();
        let slot = slots.entry(key.to_owned()).or_default();
        let index = *slot;
        *slot += 1;
        index
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enter one nesting level; the level is left when the guard drops.
    pub fn enter(&self) -> DepthGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        DepthGuard { scope: self }
    }
}

/// Leaves a nesting level of a [`RenderScope`] on drop.
#[must_use]
pub struct DepthGuard<'a> {
    scope: &'a RenderScope,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.scope.depth.set(self.scope.depth.get().saturating_sub(1));
    }
}

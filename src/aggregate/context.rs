//! Build-scoped pagination state.
//!
//! Every aggregation slot is identified by a [`ContextId`]. The first time a
//! paginated slot is planned its [`PaginationState`] is recorded in the
//! [`ContextStore`]; later lookups for the same id return the recorded state
//! unchanged, so re-entrant renders of one slot always agree.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::render::Values;
use crate::utils::html;

// ============================================================================
// Identifiers
// ============================================================================

/// One render slot: document × template × occurrence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId {
    pub document: String,
    pub template: String,
    pub index: usize,
}

impl ContextId {
    pub fn new(document: impl Into<String>, template: impl Into<String>, index: usize) -> Self {
        Self {
            document: document.into(),
            template: template.into(),
            index,
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}:{}", self.document, self.template, self.index)
    }
}

static BUILD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque token for one full build pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildId(u64);

impl BuildId {
    /// A fresh id, unique within the process.
    pub fn next() -> Self {
        let seq = BUILD_SEQ.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self((nanos << 16) | (seq & 0xFFFF))
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ============================================================================
// Pagination state
// ============================================================================

/// Token names under which pagination facts reach templates.
pub mod keys {
    pub const CURRENT: &str = "pagination_current";
    pub const TOTAL: &str = "pagination_total";
    pub const BASE_URL: &str = "pagination_base_url";
    pub const URL_PREFIX: &str = "pagination_url_prefix";
    pub const SEGMENT: &str = "pagination_segment";
    pub const MAX_VISIBLE: &str = "pagination_max_visible";
    pub const ARIA_LABEL: &str = "pagination_aria_label";
    pub const ELLIPSIS: &str = "pagination_ellipsis";
    pub const OFFSET: &str = "pagination_offset";
    /// Seed only: pathname of the page that started the series
    pub const INDEX_PATHNAME: &str = "pagination_index_pathname";
    /// Seed only: `"false"` on synthetic pages
    pub const ROOT: &str = "pagination_root";
}

/// Facts about one page of a paginated series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub segment: String,
    pub max_visible: usize,
    pub processed: bool,
    /// 1-based
    pub current_page: usize,
    pub total_pages: usize,
    /// URL of page 1
    pub base_url: String,
    /// URL prefix of pages 2..N, with trailing `/`
    pub url_prefix: String,
    /// Index of the first item shown on this page
    pub offset: usize,
    pub aria_label: String,
    pub ellipsis: String,
}

impl PaginationState {
    /// URL of page `page` in this series.
    pub fn page_url(&self, page: usize) -> String {
        if page <= 1 {
            self.base_url.clone()
        } else {
            format!("{}{}/{}.html", self.url_prefix, self.segment, page)
        }
    }

    /// Token values for the pagination control template, escaped like all
    /// other values.
    pub fn to_values(&self) -> Values {
        let text = |s: &str| html::escape(s).into_owned();
        [
            (keys::CURRENT, self.current_page.to_string()),
            (keys::TOTAL, self.total_pages.to_string()),
            (keys::BASE_URL, text(&self.base_url)),
            (keys::URL_PREFIX, text(&self.url_prefix)),
            (keys::SEGMENT, text(&self.segment)),
            (keys::MAX_VISIBLE, self.max_visible.to_string()),
            (keys::ARIA_LABEL, text(&self.aria_label)),
            (keys::ELLIPSIS, text(&self.ellipsis)),
            (keys::OFFSET, self.offset.to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
    }

    /// Rebuild a state from [`to_values`](Self::to_values) output.
    ///
    /// Returns `None` if a numeric fact is missing or malformed.
    pub fn from_values(values: &Values) -> Option<Self> {
        let text = |key: &str| {
            values
                .get(key)
                .map(|value| html::unescape(value).into_owned())
                .unwrap_or_default()
        };
        let number = |key: &str| values.get(key)?.trim().parse::<usize>().ok();
        Some(Self {
            segment: text(keys::SEGMENT),
            max_visible: number(keys::MAX_VISIBLE)?,
            processed: true,
            current_page: number(keys::CURRENT)?,
            total_pages: number(keys::TOTAL)?,
            base_url: text(keys::BASE_URL),
            url_prefix: text(keys::URL_PREFIX),
            offset: number(keys::OFFSET).unwrap_or_default(),
            aria_label: text(keys::ARIA_LABEL),
            ellipsis: text(keys::ELLIPSIS),
        })
    }
}

// ============================================================================
// Store
// ============================================================================

/// Mapping from render slot to its recorded pagination state.
///
/// Owned by one build session and dropped with it.
#[derive(Debug, Default)]
pub struct ContextStore {
    states: RwLock<FxHashMap<ContextId, PaginationState>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ContextId) -> Option<PaginationState> {
        self.states.read().get(id).cloned()
    }

    pub fn set(&self, id: ContextId, state: PaginationState) {
        self.states.write().insert(id, state);
    }

    /// Record `state` unless `id` already has one.
    ///
    /// Returns the state now stored and whether it was inserted by this call.
    pub fn get_or_insert(&self, id: ContextId, state: PaginationState) -> (PaginationState, bool) {
        let mut states = self.states.write();
        match states.get(&id) {
            Some(existing) => (existing.clone(), false),
            None => {
                states.insert(id, state.clone());
                (state, true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    pub fn clear(&self) {
        self.states.write().clear();
    }
}

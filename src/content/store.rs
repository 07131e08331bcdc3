//! In-memory page repository shared by one build.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::DocumentRecord;
use crate::utils::path;

/// Lookup of already-collected documents.
///
/// Aggregation consults the repository first and only falls back to a
/// filesystem scan on a miss. Results are ordered by pathname.
pub trait ContentRepository: Send + Sync {
    /// Documents whose dirname is exactly `dirname`, or `None` when the
    /// directory is unknown.
    fn get_by_directory(&self, dirname: &str) -> Option<Vec<Arc<DocumentRecord>>>;

    fn get_by_pathname(&self, pathname: &str) -> Option<Arc<DocumentRecord>>;

    fn list_all(&self) -> Vec<Arc<DocumentRecord>>;
}

/// Thread-safe page storage, keyed by pathname.
///
/// Filled once before rendering starts, then only read from worker threads.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: RwLock<BTreeMap<String, Arc<DocumentRecord>>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored pages.
    pub fn clear(&self) {
        self.pages.write().clear();
    }

    /// Insert or replace a page.
    pub fn insert(&self, record: DocumentRecord) -> Arc<DocumentRecord> {
        let record = Arc::new(record);
        self.pages
            .write()
            .insert(record.path.pathname.clone(), Arc::clone(&record));
        record
    }

    /// Insert many pages under a single lock.
    pub fn extend(&self, records: impl IntoIterator<Item = DocumentRecord>) {
        let mut pages = self.pages.write();
        for record in records {
            pages.insert(record.path.pathname.clone(), Arc::new(record));
        }
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}

impl ContentRepository for PageStore {
    fn get_by_directory(&self, dirname: &str) -> Option<Vec<Arc<DocumentRecord>>> {
        let dirname = path::join([dirname]);
        let matched: Vec<_> = self
            .pages
            .read()
            .values()
            .filter(|record| record.path.dirname == dirname)
            .cloned()
            .collect();
        (!matched.is_empty()).then_some(matched)
    }

    fn get_by_pathname(&self, pathname: &str) -> Option<Arc<DocumentRecord>> {
        self.pages.read().get(&path::join([pathname])).cloned()
    }

    fn list_all(&self) -> Vec<Arc<DocumentRecord>> {
        self.pages.read().values().cloned().collect()
    }
}

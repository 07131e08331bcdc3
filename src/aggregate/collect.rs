//! Document collection from one or more directories.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::AggregateError;
use crate::content::{ContentRepository, ContentScanner, DocumentRecord};
use crate::log;
use crate::utils::path;

/// Resolves path specifiers into documents.
///
/// The repository is consulted first; a directory it does not know is
/// scanned from disk.
pub struct Collector<'a> {
    pub pages_root: &'a Path,
    pub repository: &'a dyn ContentRepository,
    pub scanner: &'a dyn ContentScanner,
}

impl Collector<'_> {
    /// Documents under `paths`, deduplicated by pathname, in the order given.
    ///
    /// Every target directory must exist before anything is collected, and
    /// the union must not be empty.
    pub fn collect(
        &self,
        paths: &[String],
        recursive: bool,
    ) -> Result<Vec<Arc<DocumentRecord>>, AggregateError> {
        let targets: Vec<String> = paths.iter().map(|p| path::join([p])).collect();

        for target in &targets {
            let dir = path::to_fs(self.pages_root, target);
            if !dir.is_dir() {
                return Err(AggregateError::PathNotFound(dir));
            }
        }

        let mut seen = FxHashSet::default();
        let mut docs = Vec::new();
        for target in &targets {
            for doc in self.collect_one(target, recursive)? {
                if seen.insert(doc.path.pathname.clone()) {
                    docs.push(doc);
                }
            }
        }

        if docs.is_empty() {
            return Err(AggregateError::EmptyResult(targets.join(", ")));
        }
        Ok(docs)
    }

    fn collect_one(
        &self,
        target: &str,
        recursive: bool,
    ) -> Result<Vec<Arc<DocumentRecord>>, AggregateError> {
        let matches = |doc: &DocumentRecord| {
            if recursive {
                path::is_within(target, &doc.path.dirname)
            } else {
                doc.path.dirname == target
            }
        };

        let cached = if recursive {
            let all: Vec<_> = self
                .repository
                .list_all()
                .into_iter()
                .filter(|doc| matches(doc.as_ref()))
                .collect();
            (!all.is_empty()).then_some(all)
        } else {
            self.repository.get_by_directory(target)
        };
        if let Some(docs) = cached {
            return Ok(docs);
        }

        let dir = path::to_fs(self.pages_root, target);
        log!("collect"; "scanning {}", target);
        let scanned = self
            .scanner
            .scan(&dir, recursive)
            .map_err(|err| AggregateError::Scan(dir, err))?;

        Ok(scanned
            .into_iter()
            .filter(|doc| matches(doc))
            .map(Arc::new)
            .collect())
    }
}

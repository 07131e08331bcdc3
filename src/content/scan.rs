//! Filesystem discovery of HTML pages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{DocumentPath, DocumentRecord, HeadExpander, extract_head_meta};
use crate::utils::path;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Reads documents straight from storage.
pub trait ContentScanner: Send + Sync {
    /// Documents found in `dir`, ordered by pathname. Subdirectories are
    /// included only when `recursive` is set.
    fn scan(&self, dir: &Path, recursive: bool) -> io::Result<Vec<DocumentRecord>>;
}

/// Scans `.html` files below a pages root.
#[derive(Clone)]
pub struct HtmlScanner {
    root: PathBuf,
    expander: Option<Arc<dyn HeadExpander + Send + Sync>>,
}

impl HtmlScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            expander: None,
        }
    }

    /// Expand head components while extracting metadata.
    pub fn with_expander(mut self, expander: Arc<dyn HeadExpander + Send + Sync>) -> Self {
        self.expander = Some(expander);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and parse a single page.
    pub fn load(&self, file: &Path) -> io::Result<Option<DocumentRecord>> {
        let Some(pathname) = path::from_fs(&self.root, file) else {
            return Ok(None);
        };
        let content = fs::read_to_string(file)?;
        let expander = self.expander.as_deref().map(|e| e as &dyn HeadExpander);
        let metadata = extract_head_meta(&content, expander);
        let record = DocumentRecord::new(DocumentPath::new(&pathname), content).with_metadata(metadata);
        Ok(Some(record))
    }
}

impl std::fmt::Debug for HtmlScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlScanner")
            .field("root", &self.root)
            .field("expander", &self.expander.is_some())
            .finish()
    }
}

impl ContentScanner for HtmlScanner {
    fn scan(&self, dir: &Path, recursive: bool) -> io::Result<Vec<DocumentRecord>> {
        let mut walker = WalkDir::new(dir).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let files = walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_str().unwrap_or_default();
                !IGNORED_FILES.contains(&name)
            })
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
            .map(walkdir::DirEntry::into_path);

        let mut records = Vec::new();
        for file in files {
            if let Some(record) = self.load(&file)? {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.path.pathname.cmp(&b.path.pathname));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let file = root.join(rel);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, body).unwrap();
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "blog/post-2.html", r#"<head><meta name="title" content="Two"></head>"#);
        write(root, "blog/post-1.html", r#"<head><meta name="title" content="One"></head>"#);
        write(root, "blog/2024/deep.html", "<head></head>");
        write(root, "blog/notes.txt", "skip me");
        dir
    }

    #[test]
    fn test_scan_flat() {
        let dir = site();
        let scanner = HtmlScanner::new(dir.path());
        let records = scanner.scan(&dir.path().join("blog"), false).unwrap();

        let paths: Vec<_> = records.iter().map(|r| r.path.pathname.as_str()).collect();
        assert_eq!(paths, ["/blog/post-1.html", "/blog/post-2.html"]);
        assert_eq!(records[0].metadata.first("title"), Some("One"));
        assert_eq!(records[0].path.dirname, "/blog");
    }

    #[test]
    fn test_scan_recursive() {
        let dir = site();
        let scanner = HtmlScanner::new(dir.path());
        let records = scanner.scan(&dir.path().join("blog"), true).unwrap();

        let paths: Vec<_> = records.iter().map(|r| r.path.pathname.as_str()).collect();
        assert_eq!(
            paths,
            ["/blog/2024/deep.html", "/blog/post-1.html", "/blog/post-2.html"]
        );
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let scanner = HtmlScanner::new(dir.path());
        assert!(scanner.scan(&dir.path().join("nope"), false).unwrap().is_empty());
    }
}

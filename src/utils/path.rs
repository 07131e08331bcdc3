//! Site path helpers.
//!
//! Site paths are `/`-separated and rooted at the pages directory
//! (`/blog/post-1.html`), whatever the host separator is.
//!
//! | Site path           | dirname | filename      | URL prefix |
//! |---------------------|---------|---------------|------------|
//! | `/index.html`       | `/`     | `index.html`  | `/`        |
//! | `/blog.html`        | `/`     | `blog.html`   | `/blog/`   |
//! | `/blog/index.html`  | `/blog` | `index.html`  | `/blog/`   |

use std::path::{Component, Path, PathBuf};

/// File name that stands for its directory.
pub const INDEX_FILE: &str = "index.html";

/// Join site path parts into one normalized, rooted path.
///
/// Empty and `.` segments are dropped, `..` pops the previous segment and
/// never climbs above the root.
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segments: Vec<String> = Vec::new();
    for part in parts {
        for segment in part.as_ref().split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s.to_owned()),
            }
        }
    }
    format!("/{}", segments.join("/"))
}

/// Split a site path into `(dirname, filename)`.
pub fn split(pathname: &str) -> (String, String) {
    let normalized = join([pathname]);
    match normalized.rsplit_once('/') {
        Some(("", filename)) => ("/".to_owned(), filename.to_owned()),
        Some((dirname, filename)) => (dirname.to_owned(), filename.to_owned()),
        None => ("/".to_owned(), normalized),
    }
}

/// File name without its last extension (`blog.html` → `blog`).
pub fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

/// Whether `candidate` is `dir` itself or lies below it.
///
/// Compares whole segments, so `/blog2` is not within `/blog`.
pub fn is_within(dir: &str, candidate: &str) -> bool {
    if dir == "/" || candidate == dir {
        return true;
    }
    candidate
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Convert a file below `root` into its site path.
pub fn from_fs(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_owned()),
            _ => return None,
        }
    }
    Some(join(parts))
}

/// Resolve a site path against a filesystem root.
pub fn to_fs(root: &Path, pathname: &str) -> PathBuf {
    join([pathname])
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Percent-encode a site path for use in `href`, keeping separators.
pub fn encode_url(pathname: &str) -> String {
    let encoded: Vec<_> = pathname
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    encoded.join("/")
}

/// Ensure a URL ends with exactly one `/`.
pub fn with_trailing_slash(url: &str) -> String {
    format!("{}/", url.trim_end_matches('/'))
}

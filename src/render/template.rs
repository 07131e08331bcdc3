//! Template files.
//!
//! Every `*.html` file below the templates directory may define any number
//! of templates:
//!
//! ```html
//! <template id="blog-post">
//!   <article><h2>{{ meta_title }}</h2></article>
//! </template>
//! ```
//!
//! Anything outside `<template>` blocks is ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use walkdir::WalkDir;

use super::{RenderError, Values};
use crate::content::HeadExpander;
use crate::utils::html;

static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<template[ \t\r\n]+id="([^"]+)"[^>]*>(.*?)</template>"#).unwrap()
});

/// `{{ name }}` placeholder; group 1 is the name.
pub(super) const TOKEN_PATTERN: &str = r"\{\{[ \t\r\n]*([A-Za-z0-9_$.-]+)[ \t\r\n]*\}\}";

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(TOKEN_PATTERN).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub body: String,
    /// File the template was read from
    pub source: PathBuf,
}

/// All templates of a site, by id.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: FxHashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every template below `dir`. A missing directory yields an
    /// empty registry.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        let mut registry = Self::new();
        if !dir.is_dir() {
            return Ok(registry);
        }

        let files = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"));

        for entry in files {
            let source = fs::read_to_string(entry.path())
                .map_err(|err| RenderError::Io(entry.path().to_path_buf(), err))?;
            registry.parse(&source, entry.path())?;
        }
        Ok(registry)
    }

    /// Add the templates defined in `source`.
    pub fn parse(&mut self, source: &str, path: &Path) -> Result<(), RenderError> {
        for caps in TEMPLATE_RE.captures_iter(source) {
            self.insert(Template {
                id: caps[1].trim().to_owned(),
                body: caps[2].trim().to_owned(),
                source: path.to_path_buf(),
            })?;
        }
        Ok(())
    }

    pub fn insert(&mut self, template: Template) -> Result<(), RenderError> {
        if self.templates.contains_key(&template.id) {
            return Err(RenderError::DuplicateTemplate(template.id, template.source));
        }
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Replace `{{ name }}` placeholders; unknown names become empty.
pub fn substitute(body: &str, values: &Values) -> String {
    TOKEN_RE
        .replace_all(body, |caps: &Captures<'_>| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

impl HeadExpander for TemplateRegistry {
    fn expand(&self, name: &str, attrs: &[(String, String)]) -> Option<String> {
        let template = self.get(name)?;
        let values: Values = attrs
            .iter()
            .map(|(key, value)| (key.clone(), html::escape(value).into_owned()))
            .collect();
        Some(substitute(&template.body, &values))
    }
}

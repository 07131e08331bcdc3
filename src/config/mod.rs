//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section         | Purpose                                   |
//! |-----------------|-------------------------------------------|
//! | `[base]`        | Site metadata (title, url)                |
//! | `[build]`       | Directories, minification, cleaning       |
//! | `[pagination]`  | Site-wide pagination defaults             |
//! | `[[aggregate]]` | Components filled by aggregations         |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//!
//! [build]
//! pages = "pages"
//! output = "dist"
//!
//! [[aggregate]]
//! component = "blog-list"
//! paths = ["blog"]
//! template = "blog-post"
//! limit = 10
//! pagination = {}
//! ```

mod aggregate;
mod base;
mod build;
pub mod defaults;
mod error;
mod pagination;

pub use aggregate::{AggregateConfig, FilterConfig, SortConfig, SortOrder, TemplateConfig};
pub use base::BaseConfig;
pub use build::BuildConfig;
pub use error::ConfigError;
pub use pagination::{PaginationConfig, PaginationOverrides};

use crate::cli::Cli;
use crate::render::ComponentBinding;
use anyhow::{Result, bail};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Pagination defaults
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Aggregation bindings
    #[serde(default)]
    pub aggregate: Vec<AggregateConfig>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Component bindings of every `[[aggregate]]` entry.
    pub fn bindings(&self) -> Vec<ComponentBinding> {
        self.aggregate
            .iter()
            .map(|entry| entry.to_binding(&self.pagination))
            .collect()
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.pages, cli.pages.as_ref());
        Self::update_option(&mut self.build.templates, cli.templates.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let args = cli.build_args();
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        self.build.clean |= args.clean;

        self.update_path_with_root(&root);
        self.config_path = Self::normalize_path(&self.get_root().join(&cli.config));
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all directories against `root` and normalize to absolute paths
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.build.pages = Self::normalize_path(&root.join(&self.build.pages));
        self.build.templates = Self::normalize_path(&root.join(&self.build.templates));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate directories and aggregation bindings
    pub fn validate(&self) -> Result<()> {
        if !self.build.pages.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.pages] directory `{}` not found",
                self.build.pages.display()
            )));
        }
        if !self.build.templates.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.templates] directory `{}` not found",
                self.build.templates.display()
            )));
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        Self::check_segment("[pagination.segment]", &self.pagination.segment)?;

        let mut components = FxHashSet::default();
        for entry in &self.aggregate {
            let field = format!("[[aggregate]] `{}`", entry.component);
            if !entry.component.contains('-') {
                bail!(ConfigError::Validation(format!(
                    "{field}: component name must contain a `-`"
                )));
            }
            if !components.insert(entry.component.as_str()) {
                bail!(ConfigError::Validation(format!("{field}: bound twice")));
            }
            if entry.paths.is_empty() {
                bail!(ConfigError::Validation(format!(
                    "{field}: `paths` must have at least one element"
                )));
            }
            if let Some(overrides) = &entry.pagination {
                if entry.limit.is_none_or(|limit| limit == 0) {
                    bail!(ConfigError::Validation(format!(
                        "{field}: pagination requires a non-zero `limit`"
                    )));
                }
                if let Some(segment) = &overrides.segment {
                    Self::check_segment(&field, segment)?;
                }
            }
        }

        Ok(())
    }

    fn check_segment(field: &str, segment: &str) -> Result<()> {
        if segment.is_empty() || segment.contains('/') {
            bail!(ConfigError::Validation(format!(
                "{field}: pagination segment must be a single non-empty path segment"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

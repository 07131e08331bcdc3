//! Aggregation error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort one aggregation call.
///
/// None of them is retried; the caller decides whether the page or the
/// whole build fails.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Aggregation configuration error: {0}")]
    Configuration(String),

    #[error("Aggregation path not found: `{0}`")]
    PathNotFound(PathBuf),

    #[error("No documents found in {0}")]
    EmptyResult(String),

    #[error("IO error when scanning `{0}`")]
    Scan(PathBuf, #[source] std::io::Error),

    #[error("Failed to render template `{template}`")]
    Render {
        template: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AggregateError {
    pub(crate) fn render(template: &str, source: anyhow::Error) -> Self {
        Self::Render {
            template: template.to_owned(),
            source: source.into(),
        }
    }
}

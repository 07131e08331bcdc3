//! Render error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unknown template `{0}`")]
    UnknownTemplate(String),

    #[error("Template `{0}` defined twice (again in `{1}`)")]
    DuplicateTemplate(String, PathBuf),

    #[error("Component `{component}` nested deeper than {limit} levels")]
    RecursionLimit { component: String, limit: usize },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

//! Folio - a static site builder with collection aggregation and
//! deterministic pagination.
//!
//! Pages are plain HTML. Components bound in `folio.toml` list documents
//! from other directories through item templates; when a list is limited,
//! the extra pages are rendered as `<segment>/<n>.html` next to the page
//! that started the series.

pub mod aggregate;
pub mod build;
pub mod cli;
pub mod config;
pub mod content;
pub mod logger;
pub mod render;
pub mod utils;

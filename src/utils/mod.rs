//! Shared helpers.

pub mod html;
pub mod minify;
pub mod path;

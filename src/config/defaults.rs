//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }
}

// ============================================================================
// [pagination] Section Defaults
// ============================================================================

pub mod pagination {
    use crate::render::nav::BUILTIN_NAV;

    pub fn segment() -> String {
        "page".into()
    }

    pub fn template() -> String {
        BUILTIN_NAV.into()
    }

    pub fn max_visible() -> usize {
        5
    }

    pub fn aria_label() -> String {
        "Pagination".into()
    }

    pub fn ellipsis() -> String {
        "...".into()
    }
}

// ============================================================================
// [[aggregate]] Section Defaults
// ============================================================================

pub mod aggregate {
    pub fn token() -> String {
        "content".into()
    }
}

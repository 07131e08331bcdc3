//! `[pagination]` section configuration.

use super::defaults;
use crate::aggregate::PaginationOptions;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[pagination]` section in folio.toml - site-wide pagination defaults.
///
/// # Example
/// ```toml
/// [pagination]
/// segment = "page"          # /blog/page/2.html
/// max_visible = 5
/// aria_label = "Pagination"
/// ellipsis = "..."
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// URL segment before the page number.
    #[serde(default = "defaults::pagination::segment")]
    #[educe(Default = defaults::pagination::segment())]
    pub segment: String,

    /// Pagination control template id.
    #[serde(default = "defaults::pagination::template")]
    #[educe(Default = defaults::pagination::template())]
    pub template: String,

    /// Numbered links shown around the current page.
    #[serde(default = "defaults::pagination::max_visible")]
    #[educe(Default = defaults::pagination::max_visible())]
    pub max_visible: usize,

    #[serde(default = "defaults::pagination::aria_label")]
    #[educe(Default = defaults::pagination::aria_label())]
    pub aria_label: String,

    #[serde(default = "defaults::pagination::ellipsis")]
    #[educe(Default = defaults::pagination::ellipsis())]
    pub ellipsis: String,
}

/// Per-aggregation overrides of [`PaginationConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationOverrides {
    pub segment: Option<String>,
    pub template: Option<String>,
    pub max_visible: Option<usize>,
    pub aria_label: Option<String>,
    pub ellipsis: Option<String>,
}

impl PaginationOverrides {
    /// Options with every missing field taken from `defaults`.
    pub fn resolve(&self, defaults: &PaginationConfig) -> PaginationOptions {
        PaginationOptions {
            segment: self.segment.clone().unwrap_or_else(|| defaults.segment.clone()),
            template: self.template.clone().unwrap_or_else(|| defaults.template.clone()),
            max_visible: self.max_visible.unwrap_or(defaults.max_visible),
            aria_label: self.aria_label.clone().unwrap_or_else(|| defaults.aria_label.clone()),
            ellipsis: self.ellipsis.clone().unwrap_or_else(|| defaults.ellipsis.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_options() {
        let config = PaginationConfig::default();
        let options = PaginationOverrides::default().resolve(&config);
        assert_eq!(options, PaginationOptions::default());
    }

    #[test]
    fn test_overrides_win() {
        let config = PaginationConfig {
            segment: "seite".into(),
            ..PaginationConfig::default()
        };
        let overrides = PaginationOverrides {
            max_visible: Some(3),
            ellipsis: Some("---".into()),
            ..PaginationOverrides::default()
        };
        let options = overrides.resolve(&config);
        assert_eq!(options.segment, "seite");
        assert_eq!(options.max_visible, 3);
        assert_eq!(options.ellipsis, "---");
        assert_eq!(options.aria_label, "Pagination");
    }
}

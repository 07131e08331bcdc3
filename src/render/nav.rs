//! Builtin pagination control.
//!
//! Used for the `folio-pagination` template id unless the site defines a
//! template with that id. It reads only the `pagination_*` values.

use std::fmt::Write;
use std::ops::RangeInclusive;

use super::Values;
use crate::aggregate::PaginationState;
use crate::utils::html;

/// Template id of the builtin control.
pub const BUILTIN_NAV: &str = "folio-pagination";

/// Numbered pages shown around `current`, at most `max_visible` of them.
pub fn visible_pages(current: usize, total: usize, max_visible: usize) -> RangeInclusive<usize> {
    let max_visible = max_visible.max(1);
    let total = total.max(1);
    let current = current.clamp(1, total);

    let start = current.saturating_sub(max_visible / 2).max(1);
    let end = (start + max_visible - 1).min(total);
    let start = end.saturating_sub(max_visible - 1).max(1);
    start..=end
}

/// Render the control; empty when the values carry no pagination facts.
pub fn render(values: &Values) -> String {
    let Some(state) = PaginationState::from_values(values) else {
        return String::new();
    };
    let current = state.current_page;
    let total = state.total_pages;
    let pages = visible_pages(current, total, state.max_visible);
    let ellipsis = format!(
        r#"<li class="ellipsis"><span>{}</span></li>"#,
        html::escape(&state.ellipsis)
    );
    let link = |page: usize| {
        let href = html::escape(&state.page_url(page)).into_owned();
        if page == current {
            format!(r#"<li><a href="{href}" aria-current="page">{page}</a></li>"#)
        } else {
            format!(r#"<li><a href="{href}">{page}</a></li>"#)
        }
    };

    let mut out = format!(
        r#"<nav aria-label="{}" class="pagination"><ul>"#,
        html::escape(&state.aria_label)
    );

    if current > 1 {
        let href = html::escape(&state.page_url(current - 1)).into_owned();
        let _ = write!(out, r#"<li><a href="{href}" rel="prev">&laquo;</a></li>"#);
    } else {
        out.push_str(r#"<li aria-disabled="true"><span>&laquo;</span></li>"#);
    }

    if *pages.start() > 1 {
        out.push_str(&link(1));
        if *pages.start() > 2 {
            out.push_str(&ellipsis);
        }
    }
    for page in pages.clone() {
        out.push_str(&link(page));
    }
    if *pages.end() < total {
        if *pages.end() < total - 1 {
            out.push_str(&ellipsis);
        }
        out.push_str(&link(total));
    }

    if current < total {
        let href = html::escape(&state.page_url(current + 1)).into_owned();
        let _ = write!(out, r#"<li><a href="{href}" rel="next">&raquo;</a></li>"#);
    } else {
        out.push_str(r#"<li aria-disabled="true"><span>&raquo;</span></li>"#);
    }

    out.push_str("</ul></nav>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(current: usize, total: usize, max_visible: usize) -> Values {
        PaginationState {
            segment: "p".into(),
            max_visible,
            processed: true,
            current_page: current,
            total_pages: total,
            base_url: "/index.html".into(),
            url_prefix: "/".into(),
            offset: 0,
            aria_label: "Blog Pagination".into(),
            ellipsis: "---".into(),
        }
        .to_values()
    }

    #[test]
    fn test_visible_pages() {
        assert_eq!(visible_pages(1, 10, 3), 1..=3);
        assert_eq!(visible_pages(5, 10, 3), 4..=6);
        assert_eq!(visible_pages(10, 10, 3), 8..=10);
        assert_eq!(visible_pages(2, 2, 5), 1..=2);
        assert_eq!(visible_pages(3, 10, 0), 3..=3);
    }

    #[test]
    fn test_first_page() {
        let html = render(&values(1, 3, 3));
        assert!(html.starts_with(r#"<nav aria-label="Blog Pagination""#));
        assert!(html.contains(r#"<a href="/index.html" aria-current="page">1</a>"#));
        assert!(html.contains(r#"<a href="/p/2.html" rel="next">"#));
        assert!(html.contains(r#"<a href="/p/3.html">3</a>"#));
        assert!(!html.contains("rel=\"prev\""));
        assert!(!html.contains("---"));
    }

    #[test]
    fn test_middle_page_links_both_ways() {
        let html = render(&values(2, 3, 3));
        assert!(html.contains(r#"<a href="/index.html" rel="prev">"#));
        assert!(html.contains(r#"<a href="/p/3.html" rel="next">"#));
        assert!(html.contains(r#"aria-current="page">2</a>"#));
    }

    #[test]
    fn test_ellipsis_around_window() {
        let html = render(&values(5, 10, 3));
        assert!(html.contains(r#"<a href="/index.html">1</a>"#));
        assert!(html.contains(r#"<a href="/p/10.html">10</a>"#));
        assert_eq!(html.matches("<span>---</span>").count(), 2);
        assert!(!html.contains(r#"<a href="/p/3.html">"#));
    }

    #[test]
    fn test_special_chars_escaped_once() {
        let mut state = PaginationState::from_values(&values(1, 2, 3)).unwrap();
        state.aria_label = r#"Say "more""#.into();
        let html = render(&state.to_values());
        assert!(html.starts_with(r#"<nav aria-label="Say &quot;more&quot;""#));
        assert!(!html.contains("&amp;quot;"));
    }

    #[test]
    fn test_no_facts_renders_nothing() {
        assert_eq!(render(&Values::new()), "");
    }
}

//! Document normalizer - permissive parse, noise stripping, page stats.
//!
//! Malformed HTML never fails here: `scraper` (html5ever) produces a
//! best-effort tree for anything it is given.

use scraper::{ElementRef, Html, Node};

/// Tags stripped from the simplified HTML before it is shown to the model.
const NOISE_TAGS: &[&str] = &["script", "style", "svg", "iframe", "noscript", "meta"];

/// Attributes worth keeping in the simplified HTML. Everything else is
/// presentation or tracking noise that wastes prompt space.
const KEPT_ATTRS: &[&str] = &[
    "id", "class", "src", "alt", "href", "title", "itemprop", "itemtype",
];

/// Tags counted as structural for the page-complexity score.
const STRUCTURAL_TAGS: &[&str] = &[
    "div", "section", "article", "main", "aside", "ul", "ol", "table",
];

/// Raw counts describing how heavy a page is.
///
/// Feeds the page-complexity score that gates the LLM fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Total element count
    pub element_count: usize,

    /// Maximum element nesting depth
    pub max_depth: usize,

    /// `<script>` tag count
    pub script_count: usize,

    /// `<style>` tags plus `<link rel="stylesheet">` count
    pub stylesheet_count: usize,

    /// Count of structural container tags (div, section, ...)
    pub structural_count: usize,
}

/// A parsed document plus the derived artifacts the pipeline needs.
pub struct NormalizedDocument {
    /// The immutable parse tree. All detectors read from this.
    pub html: Html,

    /// Noise-stripped HTML capped for prompt use
    pub simplified_html: String,

    /// Raw complexity inputs
    pub stats: PageStats,
}

/// Parse raw HTML and derive the simplified prompt HTML and page stats.
///
/// `max_chars` caps the simplified HTML (15,000 by default upstream).
pub fn normalize(raw_html: &str, max_chars: usize) -> NormalizedDocument {
    let html = Html::parse_document(raw_html);

    let mut stats = PageStats::default();
    collect_stats(html.root_element(), 1, &mut stats);

    let mut simplified = String::new();
    append_simplified(html.root_element(), &mut simplified, max_chars);
    truncate_at_char_boundary(&mut simplified, max_chars);

    NormalizedDocument {
        html,
        simplified_html: simplified,
        stats,
    }
}

fn collect_stats(element: ElementRef, depth: usize, stats: &mut PageStats) {
    stats.element_count += 1;
    stats.max_depth = stats.max_depth.max(depth);

    let tag = element.value().name();
    match tag {
        "script" => stats.script_count += 1,
        "style" => stats.stylesheet_count += 1,
        "link" => {
            if element
                .value()
                .attr("rel")
                .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"))
            {
                stats.stylesheet_count += 1;
            }
        }
        _ if STRUCTURAL_TAGS.contains(&tag) => stats.structural_count += 1,
        _ => {}
    }

    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            collect_stats(child_el, depth + 1, stats);
        }
    }
}

/// Serialize an element subtree, skipping noise tags and comments and
/// keeping only the attributes the extractor cares about. Stops early
/// once the output exceeds the cap.
fn append_simplified(element: ElementRef, out: &mut String, max_chars: usize) {
    if out.len() > max_chars {
        return;
    }

    let tag = element.value().name();
    if NOISE_TAGS.contains(&tag) {
        return;
    }

    out.push('<');
    out.push_str(tag);
    for attr in KEPT_ATTRS {
        if let Some(value) = element.value().attr(attr) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
    }
    out.push('>');

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = collapse_whitespace(text);
                if !collapsed.is_empty() {
                    out.push_str(&collapsed);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    append_simplified(child_el, out, max_chars);
                }
            }
            _ => {}
        }
        if out.len() > max_chars {
            break;
        }
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_at_char_boundary(s: &mut String, max_chars: usize) {
    if s.len() <= max_chars {
        return;
    }
    let mut idx = max_chars;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    s.truncate(idx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_stripped_from_simplified() {
        let doc = normalize(
            r#"<html><head><script>alert(1)</script><style>.x{}</style>
               <meta charset="utf-8"></head>
               <body><svg><circle/></svg><iframe src="x"></iframe>
               <noscript>enable js</noscript>
               <div class="product"><h3>Tea</h3></div></body></html>"#,
            15_000,
        );

        assert!(!doc.simplified_html.contains("script"));
        assert!(!doc.simplified_html.contains("alert"));
        assert!(!doc.simplified_html.contains("svg"));
        assert!(!doc.simplified_html.contains("iframe"));
        assert!(!doc.simplified_html.contains("enable js"));
        assert!(doc.simplified_html.contains("<h3>Tea</h3>"));
        assert!(doc.simplified_html.contains("class=\"product\""));
    }

    #[test]
    fn test_simplified_capped() {
        let big = format!(
            "<html><body>{}</body></html>",
            "<p>some repeated paragraph content</p>".repeat(2000)
        );
        let doc = normalize(&big, 15_000);
        assert!(doc.simplified_html.len() <= 15_000);
    }

    #[test]
    fn test_malformed_html_never_fails() {
        let doc = normalize("<div><p>unclosed <span>everything", 15_000);
        assert!(doc.stats.element_count > 0);
        assert!(doc.simplified_html.contains("unclosed"));
    }

    #[test]
    fn test_stats_counting() {
        let doc = normalize(
            r#"<html><head>
                 <script src="a.js"></script><script src="b.js"></script>
                 <style>.a{}</style>
                 <link rel="stylesheet" href="main.css">
                 <link rel="icon" href="favicon.ico">
               </head>
               <body><div><section><ul><li>x</li></ul></section></div></body></html>"#,
            15_000,
        );

        assert_eq!(doc.stats.script_count, 2);
        assert_eq!(doc.stats.stylesheet_count, 2);
        // div + section + ul
        assert_eq!(doc.stats.structural_count, 3);
        assert!(doc.stats.max_depth >= 5);
    }

    #[test]
    fn test_empty_document() {
        let doc = normalize("<html></html>", 15_000);
        // html + implied head/body
        assert!(doc.stats.element_count >= 1);
        assert_eq!(doc.stats.script_count, 0);
    }
}

//! Price pattern detector.
//!
//! Scans the document for currency-marked amounts and associates them
//! with product candidates by DOM proximity. A price that cannot be
//! unambiguously associated leaves the product's price blank; that is
//! not an error condition.

use ego_tree::{NodeId, NodeRef};
use regex::Regex;
use scraper::{Html, Node};

use crate::detectors::Candidate;

/// Currency marker followed by an amount with optional thousands
/// separators and exactly-two-digit decimals (`.` or `,`). A bare number
/// with no currency marker never matches, and the marker must not be
/// preceded by a letter ("OVER 100" and "DISCOUNTER50" are not prices);
/// group 1 holds the price itself.
pub const PRICE_PATTERN: &str =
    r"(?:^|[^A-Za-z])((?:[$£€]|USD|EUR|GBP|ZAR|R)\s*\d{1,3}(?:[,\s]\d{3})*(?:[.,]\d{2})?)";

/// Compile the price regex. The pattern is a known-good literal.
pub fn price_regex() -> Regex {
    Regex::new(PRICE_PATTERN).unwrap()
}

/// First price match in a text snippet, trimmed.
pub fn find_price(text: &str, re: &Regex) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// A price occurrence and the element whose text contained it.
#[derive(Debug, Clone)]
pub struct PriceMatch {
    /// Matched price text, e.g. "$12.99"
    pub text: String,

    /// Element whose direct text contained the match
    pub node_id: NodeId,
}

/// Scan the whole document for price matches, recording the innermost
/// containing element of each.
pub fn scan_prices(html: &Html, re: &Regex) -> Vec<PriceMatch> {
    let mut matches = Vec::new();

    for node in html.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let Some(price) = find_price(text, re) else {
            continue;
        };
        let Some(parent) = node.parent() else {
            continue;
        };
        matches.push(PriceMatch {
            text: price,
            node_id: parent.id(),
        });
    }

    matches
}

/// Attach document prices to candidates that are still missing one.
///
/// A price is eligible for a candidate only if its element sits inside
/// the candidate's root element; among eligible prices the one closest
/// to the candidate's name element wins. Equidistant conflicting prices
/// count as ambiguous and attach nothing.
pub fn attach_nearest_prices(html: &Html, candidates: &mut [Candidate], matches: &[PriceMatch]) {
    for candidate in candidates.iter_mut() {
        if candidate.product.price.is_some() {
            continue;
        }

        let anchor_id = candidate.name_id.unwrap_or(candidate.root_id);
        let mut best: Option<(usize, &str)> = None;
        let mut ambiguous = false;

        for price in matches {
            let Some(price_node) = html.tree.get(price.node_id) else {
                continue;
            };
            if !is_within(price_node, candidate.root_id) {
                continue;
            }
            let Some(anchor) = html.tree.get(anchor_id) else {
                continue;
            };
            let distance = tree_distance(anchor, price_node);

            match best {
                None => best = Some((distance, &price.text)),
                Some((best_distance, best_text)) => {
                    if distance < best_distance {
                        best = Some((distance, &price.text));
                        ambiguous = false;
                    } else if distance == best_distance && best_text != price.text {
                        ambiguous = true;
                    }
                }
            }
        }

        if let (Some((_, text)), false) = (best, ambiguous) {
            candidate.product.price = Some(text.to_string());
        }
    }
}

/// Whether `node` is `ancestor_id` or one of its descendants.
fn is_within(node: NodeRef<'_, Node>, ancestor_id: NodeId) -> bool {
    if node.id() == ancestor_id {
        return true;
    }
    node.ancestors().any(|a| a.id() == ancestor_id)
}

/// Number of tree edges between two nodes, via their lowest common
/// ancestor.
fn tree_distance(a: NodeRef<'_, Node>, b: NodeRef<'_, Node>) -> usize {
    let path_a = ancestor_chain(a);
    let path_b = ancestor_chain(b);

    for (depth_a, id) in path_a.iter().enumerate() {
        if let Some(depth_b) = path_b.iter().position(|other| other == id) {
            return depth_a + depth_b;
        }
    }

    // Different trees; treat as unreachable
    usize::MAX
}

/// Node id followed by every ancestor id, innermost first.
fn ancestor_chain(node: NodeRef<'_, Node>) -> Vec<NodeId> {
    let mut chain = vec![node.id()];
    chain.extend(node.ancestors().map(|a| a.id()));
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::{DetectedProduct, DetectionMethod};
    use scraper::Selector;

    #[test]
    fn test_matches_common_formats() {
        let re = price_regex();
        for sample in ["$12.99", "R100", "€45,00", "£9.50", "USD 1,299.99", "ZAR 75"] {
            assert!(
                find_price(sample, &re).is_some(),
                "expected a match for {sample}"
            );
        }
    }

    #[test]
    fn test_bare_number_does_not_match() {
        let re = price_regex();
        assert_eq!(find_price("42", &re), None);
        assert_eq!(find_price("item 12345", &re), None);
    }

    #[test]
    fn test_currency_letter_inside_word_does_not_match() {
        let re = price_regex();
        assert_eq!(find_price("OVER 100", &re), None);
        assert_eq!(find_price("DISCOUNTER50", &re), None);
        assert_eq!(find_price("BUSD 5", &re), None);

        // Punctuation or whitespace before the marker is fine
        assert_eq!(find_price("(R100)", &re).as_deref(), Some("R100"));
        assert_eq!(find_price("price: $12.99", &re).as_deref(), Some("$12.99"));
    }

    #[test]
    fn test_match_extracted_from_sentence() {
        let re = price_regex();
        assert_eq!(
            find_price("Buy our Rooibos Tea for $8 today", &re),
            Some("$8".to_string())
        );
    }

    #[test]
    fn test_scan_records_containing_elements() {
        let html = Html::parse_document(
            r#"<html><body>
                 <div class="a"><span>$12.99</span></div>
                 <div class="b"><p>no price here</p></div>
               </body></html>"#,
        );
        let matches = scan_prices(&html, &price_regex());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "$12.99");

        let node = html.tree.get(matches[0].node_id).unwrap();
        let el = scraper::ElementRef::wrap(node).unwrap();
        assert_eq!(el.value().name(), "span");
    }

    #[test]
    fn test_attach_nearest_price_within_root() {
        let html = Html::parse_document(
            r#"<html><body>
                 <div class="card"><h3>Tea</h3><span>$8</span></div>
                 <div class="other"><span>$99.99</span></div>
               </body></html>"#,
        );
        let sel = Selector::parse("div.card").unwrap();
        let card = html.select(&sel).next().unwrap();
        let h3 = card
            .select(&Selector::parse("h3").unwrap())
            .next()
            .unwrap();

        let mut candidates = vec![Candidate {
            product: DetectedProduct::new("Tea", DetectionMethod::RepeatingStructure),
            root_id: card.id(),
            name_id: Some(h3.id()),
        }];

        let matches = scan_prices(&html, &price_regex());
        attach_nearest_prices(&html, &mut candidates, &matches);

        // The $99.99 outside the card must not leak in
        assert_eq!(candidates[0].product.price.as_deref(), Some("$8"));
    }

    #[test]
    fn test_no_association_leaves_price_blank() {
        let html = Html::parse_document(
            r#"<html><body>
                 <div class="card"><h3>Tea</h3></div>
                 <footer><span>$5</span></footer>
               </body></html>"#,
        );
        let sel = Selector::parse("div.card").unwrap();
        let card = html.select(&sel).next().unwrap();

        let mut candidates = vec![Candidate {
            product: DetectedProduct::new("Tea", DetectionMethod::RepeatingStructure),
            root_id: card.id(),
            name_id: None,
        }];

        let matches = scan_prices(&html, &price_regex());
        attach_nearest_prices(&html, &mut candidates, &matches);
        assert_eq!(candidates[0].product.price, None);
    }
}

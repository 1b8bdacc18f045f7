//! Repeating-structure detector.
//!
//! Groups elements by structural signature, finds the container whose
//! children repeat that signature, checks the children actually look
//! like products (images or prices), and extracts one candidate per
//! child of the best container.

use std::collections::HashMap;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::detectors::extract::{element_text, extract_candidate};
use crate::detectors::price::find_price;
use crate::detectors::Candidate;
use crate::dom::signature::{jaccard_similarity, token_set, StructuralSignature};
use crate::types::product::DetectionMethod;

/// Tags never treated as repeating product units.
const SKIPPED_TAGS: &[&str] = &[
    "html", "head", "body", "script", "style", "meta", "link", "noscript", "title", "br", "hr",
];

/// Class fragments that mark a container as e-commerce markup rather
/// than a generic repeating structure.
const ECOMMERCE_CLASS_HINTS: &[&str] = &[
    "product", "item", "card", "listing", "shop", "store", "goods", "catalog",
];

/// Minimum share of children containing an image.
const MIN_IMAGE_SHARE: f64 = 0.5;

/// Minimum share of children containing a price match.
const MIN_PRICE_SHARE: f64 = 0.3;

/// A container accepted as a repeating product pattern.
#[derive(Debug)]
struct RepeatingPattern {
    container_id: NodeId,
    score: f64,
    ecommerce: bool,
}

/// Detect products from repeating sibling structures.
///
/// `min_similarity` is the Jaccard threshold between a container's
/// children and its first child (0.7 by default upstream).
pub fn detect_structural(html: &Html, min_similarity: f64, price_re: &Regex) -> Vec<Candidate> {
    let groups = group_by_signature(html);

    let mut patterns: HashMap<NodeId, RepeatingPattern> = HashMap::new();
    for members in groups.values() {
        if members.len() < 2 {
            continue;
        }
        let Some(container_id) = most_frequent_parent(html, members) else {
            continue;
        };
        let Some(pattern) = evaluate_container(html, container_id, min_similarity, price_re)
        else {
            continue;
        };

        // Several signatures can point at the same container; keep the
        // best score.
        match patterns.entry(container_id) {
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if pattern.score > entry.get().score {
                    entry.insert(pattern);
                }
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(pattern);
            }
        }
    }

    let Some(best) = patterns
        .into_values()
        .max_by(|a, b| a.score.total_cmp(&b.score))
    else {
        return Vec::new();
    };

    let Some(container) = html
        .tree
        .get(best.container_id)
        .and_then(ElementRef::wrap)
    else {
        return Vec::new();
    };

    let method = if best.ecommerce {
        DetectionMethod::EcommercePattern
    } else {
        DetectionMethod::RepeatingStructure
    };

    let candidates: Vec<Candidate> = element_children(container)
        .into_iter()
        .filter_map(|child| extract_candidate(child, method, price_re))
        .collect();

    debug!(
        container = container.value().name(),
        score = best.score,
        method = %method,
        candidates = candidates.len(),
        "Repeating pattern accepted"
    );

    candidates
}

/// Group every element by its structural signature.
fn group_by_signature(html: &Html) -> HashMap<StructuralSignature, Vec<NodeId>> {
    let mut groups: HashMap<StructuralSignature, Vec<NodeId>> = HashMap::new();

    for node in html.tree.root().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if SKIPPED_TAGS.contains(&el.value().name()) {
            continue;
        }
        groups
            .entry(StructuralSignature::of(&el))
            .or_default()
            .push(el.id());
    }

    groups
}

/// The parent shared by the largest number of group members.
fn most_frequent_parent(html: &Html, members: &[NodeId]) -> Option<NodeId> {
    let mut counts: HashMap<NodeId, usize> = HashMap::new();
    for id in members {
        let parent = html.tree.get(*id).and_then(|n| n.parent());
        if let Some(parent) = parent {
            *counts.entry(parent.id()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(id, _)| id)
}

/// Check a candidate container's children for similarity and product
/// evidence; return a ranked pattern when accepted.
fn evaluate_container(
    html: &Html,
    container_id: NodeId,
    min_similarity: f64,
    price_re: &Regex,
) -> Option<RepeatingPattern> {
    let container = html.tree.get(container_id).and_then(ElementRef::wrap)?;
    let children = element_children(container);
    if children.len() < 2 {
        return None;
    }

    let first_tokens = token_set(&children[0]);
    let similarity = children
        .iter()
        .map(|child| jaccard_similarity(&token_set(child), &first_tokens))
        .sum::<f64>()
        / children.len() as f64;

    if similarity < min_similarity {
        return None;
    }

    let img_sel = Selector::parse("img").unwrap();
    let with_image = children
        .iter()
        .filter(|c| c.select(&img_sel).next().is_some())
        .count();
    let with_price = children
        .iter()
        .filter(|c| find_price(&element_text(**c), price_re).is_some())
        .count();

    let image_share = with_image as f64 / children.len() as f64;
    let price_share = with_price as f64 / children.len() as f64;

    if image_share < MIN_IMAGE_SHARE && price_share < MIN_PRICE_SHARE {
        return None;
    }

    Some(RepeatingPattern {
        container_id,
        score: similarity * (1.0 + image_share) * (1.0 + price_share),
        ecommerce: is_ecommerce_markup(container, &children),
    })
}

/// Whether the container or its children carry e-commerce class names.
fn is_ecommerce_markup(container: ElementRef, children: &[ElementRef]) -> bool {
    let mut classes = String::new();
    if let Some(c) = container.value().attr("class") {
        classes.push_str(c);
        classes.push(' ');
    }
    if let Some(first) = children.first() {
        if let Some(c) = first.value().attr("class") {
            classes.push_str(c);
        }
    }
    let classes = classes.to_lowercase();
    ECOMMERCE_CLASS_HINTS.iter().any(|hint| classes.contains(hint))
}

fn element_children(element: ElementRef) -> Vec<ElementRef> {
    element.children().filter_map(ElementRef::wrap).collect()
}

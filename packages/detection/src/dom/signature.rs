//! Structural signatures - tag + class fingerprints for grouping
//! visually similar siblings.

use std::collections::HashSet;

use scraper::ElementRef;

/// A tag + sorted, deduplicated class-token fingerprint.
///
/// Used only as a grouping key during structural detection; never
/// persisted or serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralSignature {
    /// Lowercase tag name
    pub tag: String,

    /// Sorted, deduplicated class tokens
    pub classes: Vec<String>,
}

impl StructuralSignature {
    /// Compute the signature of an element.
    pub fn of(element: &ElementRef) -> Self {
        let mut classes: Vec<String> = element
            .value()
            .classes()
            .map(|c| c.to_lowercase())
            .collect();
        classes.sort();
        classes.dedup();

        Self {
            tag: element.value().name().to_lowercase(),
            classes,
        }
    }
}

/// The tag + class token set of an element, for similarity comparison.
pub fn token_set(element: &ElementRef) -> HashSet<String> {
    let mut tokens: HashSet<String> = element
        .value()
        .classes()
        .map(|c| c.to_lowercase())
        .collect();
    tokens.insert(element.value().name().to_lowercase());
    tokens
}

/// Jaccard similarity of two token sets: |A ∩ B| / |A ∪ B|.
///
/// Two empty sets are identical (1.0).
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

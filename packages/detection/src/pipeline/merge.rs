//! Merging DOM-phase and model-phase results.
//!
//! The two phases see the same page through different lenses, and the
//! DOM detectors themselves can describe one element twice. Merging
//! prefers the stronger set wholesale when one clearly dominates,
//! otherwise unions them, then suppresses name overlaps across the
//! whole final set.

use tracing::debug;

use crate::types::product::{normalize_name, DetectedProduct};

/// Merge DOM and model products into one set.
pub fn merge_results(
    dom: Vec<DetectedProduct>,
    llm: Vec<DetectedProduct>,
) -> Vec<DetectedProduct> {
    if llm.is_empty() {
        return dedup_collisions(dom);
    }
    if dom.is_empty() {
        return dedup_collisions(llm);
    }

    // When the model found strictly more products with strictly higher
    // confidence, the heuristics likely latched onto a fragment of the
    // page; take the model's set wholesale.
    if llm.len() > dom.len() && average(&llm) > average(&dom) {
        debug!(
            dom_count = dom.len(),
            llm_count = llm.len(),
            "Model results replace DOM results"
        );
        return dedup_collisions(llm);
    }

    let mut merged = dom;
    let mut appended = 0usize;
    for candidate in llm {
        let candidate_name = normalize_name(&candidate.name);
        let overlaps = merged.iter().any(|existing| {
            let existing_name = existing.normalized_name();
            existing_name.contains(&candidate_name) || candidate_name.contains(&existing_name)
        });
        if !overlaps {
            merged.push(candidate);
            appended += 1;
        }
    }

    debug!(appended, total = merged.len(), "Merged DOM and model results");
    dedup_collisions(merged)
}

/// Suppress products whose normalized names contain one another
/// (equality included), keeping the higher-confidence entry. Runs over
/// the whole final set: different DOM detectors can emit the same
/// element under the same or a containing name. Order of survivors is
/// preserved.
pub fn dedup_collisions(products: Vec<DetectedProduct>) -> Vec<DetectedProduct> {
    let mut kept: Vec<DetectedProduct> = Vec::with_capacity(products.len());

    for product in products {
        let name = product.normalized_name();
        let existing = kept.iter().position(|p| {
            let kept_name = p.normalized_name();
            kept_name.contains(&name) || name.contains(&kept_name)
        });
        match existing {
            Some(idx) => {
                if product.confidence > kept[idx].confidence {
                    kept[idx] = product;
                }
            }
            None => kept.push(product),
        }
    }

    kept
}

fn average(products: &[DetectedProduct]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(|p| p.confidence).sum::<f64>() / products.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::DetectionMethod;

    fn product(name: &str, method: DetectionMethod, confidence: f64) -> DetectedProduct {
        let mut p = DetectedProduct::new(name, method);
        p.confidence = confidence;
        p
    }

    #[test]
    fn test_empty_dom_adopts_llm() {
        let llm = vec![product("Tea", DetectionMethod::Llm, 0.85)];
        let merged = merge_results(Vec::new(), llm);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].method, DetectionMethod::Llm);
    }

    #[test]
    fn test_llm_replaces_weaker_smaller_dom_set() {
        let dom = vec![product("Tea", DetectionMethod::ImageTextPair, 0.2)];
        let llm = vec![
            product("Rooibos Tea", DetectionMethod::Llm, 0.85),
            product("Green Tea", DetectionMethod::Llm, 0.85),
        ];
        let merged = merge_results(dom, llm);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|p| p.method == DetectionMethod::Llm));
    }

    #[test]
    fn test_substring_overlap_suppresses_append() {
        let dom = vec![product("Organic Rooibos Tea", DetectionMethod::EcommercePattern, 0.6)];
        let llm = vec![
            // Substring of a DOM name in either direction: suppressed
            product("Rooibos Tea", DetectionMethod::Llm, 0.85),
            product("Ceramic Mug", DetectionMethod::Llm, 0.85),
        ];
        let merged = merge_results(dom, llm);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Organic Rooibos Tea");
        assert_eq!(merged[1].name, "Ceramic Mug");
    }

    #[test]
    fn test_collision_keeps_higher_confidence() {
        let mut a = product("Tea", DetectionMethod::RepeatingStructure, 0.4);
        a.images.push("tea.jpg".to_string());
        let mut b = product("TEA", DetectionMethod::Llm, 0.85);
        b.images.push("tea.jpg".to_string());

        let deduped = dedup_collisions(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].confidence, 0.85);
    }

    #[test]
    fn test_same_name_different_images_collapses() {
        // The same card seen by two detectors can surface different
        // image URLs; the name collision still wins.
        let mut a = product("Mug", DetectionMethod::EcommercePattern, 0.6);
        a.images.push("red.jpg".to_string());
        let mut b = product("Mug", DetectionMethod::ImageTextPair, 0.2);
        b.images.push("blue.jpg".to_string());

        let deduped = dedup_collisions(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].method, DetectionMethod::EcommercePattern);
    }

    #[test]
    fn test_containing_names_collapse_across_whole_set() {
        let deduped = dedup_collisions(vec![
            product("Ceramic Mug", DetectionMethod::EcommercePattern, 0.6),
            product("Hand-thrown Ceramic Mug", DetectionMethod::ImageTextPair, 0.8),
            product("Tea Towel", DetectionMethod::EcommercePattern, 0.6),
        ]);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, "Hand-thrown Ceramic Mug");
        assert_eq!(deduped[1].name, "Tea Towel");
    }
}

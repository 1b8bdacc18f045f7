//! Fallback decision: when DOM heuristics are not enough, spend model
//! tokens.

use tracing::debug;

use crate::dom::normalize::PageStats;
use crate::types::config::DetectionConfig;

/// Weighted page-complexity score in `[0.0, 1.0]`.
///
/// Each signal saturates at a reference value typical of a heavy
/// e-commerce page, so no single dimension dominates.
pub fn page_complexity(stats: &PageStats) -> f64 {
    let element = (stats.element_count as f64 / 5_000.0).min(1.0);
    let depth = (stats.max_depth as f64 / 30.0).min(1.0);
    let scripts = (stats.script_count as f64 / 25.0).min(1.0);
    let stylesheets = (stats.stylesheet_count as f64 / 15.0).min(1.0);
    let structural = (stats.structural_count as f64 / 500.0).min(1.0);

    0.25 * element + 0.25 * depth + 0.20 * scripts + 0.15 * stylesheets + 0.15 * structural
}

/// Whether the DOM phase's output justifies the model fallback.
///
/// Fires when the heuristics found nothing, found little on a complex
/// page, or are not confident in what they found.
pub fn should_use_llm(
    product_count: usize,
    avg_confidence: f64,
    complexity: f64,
    config: &DetectionConfig,
) -> bool {
    let decision = product_count == 0
        || avg_confidence < config.min_dom_confidence
        || complexity >= 0.9
        || (complexity >= 0.6 && product_count < 3);

    debug!(
        product_count,
        avg_confidence,
        complexity,
        use_llm = decision,
        "Fallback decision"
    );

    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(elements: usize, depth: usize, scripts: usize, styles: usize, structural: usize) -> PageStats {
        PageStats {
            element_count: elements,
            max_depth: depth,
            script_count: scripts,
            stylesheet_count: styles,
            structural_count: structural,
        }
    }

    #[test]
    fn test_complexity_bounds() {
        assert_eq!(page_complexity(&stats(0, 0, 0, 0, 0)), 0.0);

        let maxed = page_complexity(&stats(10_000, 100, 100, 100, 10_000));
        assert!((maxed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_complexity_simple_page() {
        // 100 elements, depth 8, 1 script, 1 stylesheet, 10 structural
        let c = page_complexity(&stats(100, 8, 1, 1, 10));
        assert!(c < 0.2, "simple page scored {c}");
    }

    #[test]
    fn test_llm_on_empty_results() {
        let config = DetectionConfig::default();
        assert!(should_use_llm(0, 0.0, 0.1, &config));
    }

    #[test]
    fn test_llm_on_low_confidence() {
        let config = DetectionConfig::default();
        assert!(should_use_llm(8, 0.4, 0.2, &config));
        assert!(!should_use_llm(8, 0.7, 0.2, &config));
    }

    #[test]
    fn test_llm_on_complex_page_with_few_products() {
        let config = DetectionConfig::default();
        assert!(should_use_llm(2, 0.8, 0.65, &config));
        assert!(!should_use_llm(5, 0.8, 0.65, &config));
        assert!(should_use_llm(5, 0.8, 0.95, &config));
    }
}

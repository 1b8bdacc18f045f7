//! Confidence calibration for DOM-phase candidates.
//!
//! Each detection method carries a base confidence; calibration scales
//! it by how complete the extracted set looks (field coverage) and how
//! plausible the product count is, then clamps into `[0.0, 0.95]`. DOM
//! heuristics never reach full certainty.

use tracing::debug;

use crate::types::product::DetectedProduct;

/// Ceiling for any calibrated confidence.
const MAX_CONFIDENCE: f64 = 0.95;

/// Field-coverage weights. Name matters most, category least.
const NAME_WEIGHT: f64 = 0.4;
const PRICE_WEIGHT: f64 = 0.3;
const DESCRIPTION_WEIGHT: f64 = 0.2;
const CATEGORY_WEIGHT: f64 = 0.1;

/// Calibrate confidence across a set of DOM-extracted products.
///
/// Quality and count factors are properties of the whole set, so every
/// product in one detection pass shares them; only the method base
/// differs per product.
pub fn calibrate(mut products: Vec<DetectedProduct>) -> Vec<DetectedProduct> {
    if products.is_empty() {
        return products;
    }

    let quality = quality_factor(&products);
    let count = count_factor(products.len());

    for product in &mut products {
        let base = product.method.base_confidence();
        product.confidence = (base * quality * count).clamp(0.0, MAX_CONFIDENCE);
    }

    debug!(
        count = products.len(),
        quality,
        count_factor = count,
        "Calibrated detection confidence"
    );

    products
}

/// Weighted share of products carrying each field.
fn quality_factor(products: &[DetectedProduct]) -> f64 {
    let total = products.len() as f64;

    let rate = |pred: fn(&DetectedProduct) -> bool| {
        products.iter().filter(|p| pred(p)).count() as f64 / total
    };

    NAME_WEIGHT * rate(|p| !p.name.trim().is_empty())
        + PRICE_WEIGHT * rate(|p| p.price.is_some())
        + DESCRIPTION_WEIGHT * rate(|p| p.description.is_some())
        + CATEGORY_WEIGHT * rate(|p| p.category.is_some())
}

/// Plausibility of the product count. Very small sets are suspicious,
/// a typical listing-page range gets a boost, huge sets are likely
/// over-extraction.
fn count_factor(count: usize) -> f64 {
    match count {
        0..=2 => 0.8,
        5..=20 => 1.2,
        c if c > 30 => 0.9,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::DetectionMethod;

    fn product(method: DetectionMethod) -> DetectedProduct {
        DetectedProduct::new("Thing", method)
    }

    #[test]
    fn test_empty_set_stays_empty() {
        assert!(calibrate(Vec::new()).is_empty());
    }

    #[test]
    fn test_typical_grid_confidence() {
        // 5 ecommerce-pattern products with names, prices, and images:
        // quality 0.4 + 0.3 = 0.7, count factor 1.2, base 0.7.
        let products: Vec<_> = (0..5)
            .map(|i| {
                let mut p = product(DetectionMethod::EcommercePattern);
                p.price = Some(format!("${i}9.99"));
                p.images.push(format!("{i}.jpg"));
                p
            })
            .collect();

        let calibrated = calibrate(products);
        for p in &calibrated {
            assert!((p.confidence - 0.588).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_image_text_pair_lands_low() {
        // Base 0.3, quality name+price+desc = 0.9, count factor 0.8.
        let mut p = product(DetectionMethod::ImageTextPair);
        p.price = Some("$8".to_string());
        p.description = Some("Buy our tea".to_string());

        let calibrated = calibrate(vec![p]);
        let conf = calibrated[0].confidence;
        assert!((conf - 0.216).abs() < 1e-9);
        assert!((0.2..=0.6).contains(&conf));
    }

    #[test]
    fn test_confidence_never_exceeds_cap() {
        let products: Vec<_> = (0..10)
            .map(|_| {
                let mut p = product(DetectionMethod::Schema);
                p.price = Some("$1.00".to_string());
                p.description = Some("d".to_string());
                p.category = Some("c".to_string());
                p
            })
            .collect();

        for p in calibrate(products) {
            assert!(p.confidence <= MAX_CONFIDENCE);
        }
    }

    #[test]
    fn test_oversized_set_penalized() {
        let products: Vec<_> = (0..40)
            .map(|_| {
                let mut p = product(DetectionMethod::RepeatingStructure);
                p.price = Some("$5".to_string());
                p
            })
            .collect();

        // base 0.5 * quality 0.7 * count 0.9
        for p in calibrate(products) {
            assert!((p.confidence - 0.315).abs() < 1e-9);
        }
    }
}

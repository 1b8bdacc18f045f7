//! Detection result and metrics types.

use serde::{Deserialize, Serialize};

use crate::types::product::DetectedProduct;

/// Metrics recorded for a single detection pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionMetrics {
    /// Number of products in the final result
    pub product_count: usize,

    /// Estimated LLM tokens used (0 when the fallback did not run)
    pub tokens_used: usize,

    /// Average confidence across final products (0 when empty)
    pub confidence: f64,

    /// Wall-clock duration of the whole pass in milliseconds
    pub total_time_ms: u64,

    /// Set when any stage degraded (LLM failure, empty input, ...).
    /// A populated error never implies the pass itself failed.
    pub error: Option<String>,
}

/// The final output of a detection pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Detected products, deduplicated and scored
    pub products: Vec<DetectedProduct>,

    /// Distinct category strings, in first-seen order
    pub categories: Vec<String>,

    /// Pass metrics
    pub metrics: DetectionMetrics,
}

impl DetectionResult {
    /// Build a result from a final product list, deriving categories and
    /// count/confidence metrics.
    pub fn from_products(products: Vec<DetectedProduct>) -> Self {
        let categories = derive_categories(&products);
        let confidence = average_confidence(&products);

        Self {
            metrics: DetectionMetrics {
                product_count: products.len(),
                confidence,
                ..Default::default()
            },
            products,
            categories,
        }
    }

    /// An empty result carrying an error message, confidence 0.
    pub fn empty_with_error(error: impl Into<String>) -> Self {
        Self {
            products: Vec::new(),
            categories: Vec::new(),
            metrics: DetectionMetrics {
                error: Some(error.into()),
                ..Default::default()
            },
        }
    }

    /// Average confidence of the contained products (0 when empty).
    pub fn average_confidence(&self) -> f64 {
        average_confidence(&self.products)
    }

    /// Whether any product came from the given method.
    pub fn has_method(&self, method: crate::DetectionMethod) -> bool {
        self.products.iter().any(|p| p.method == method)
    }
}

/// Distinct non-empty category strings in first-seen order.
fn derive_categories(products: &[DetectedProduct]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for product in products {
        if let Some(category) = &product.category {
            let category = category.trim();
            if !category.is_empty() && !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
    }
    categories
}

fn average_confidence(products: &[DetectedProduct]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(|p| p.confidence).sum::<f64>() / products.len() as f64
}

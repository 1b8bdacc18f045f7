//! Product types - detected products and the method that produced them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which heuristic or model produced a product candidate.
///
/// A closed variant set: downstream consumers can match exhaustively and
/// the LLM contract cannot smuggle in unknown methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMethod {
    /// Schema.org/JSON-LD markup was present on the page
    Schema,
    /// Repeating structure matched known e-commerce class names
    EcommercePattern,
    /// Generic repeating sibling structure
    RepeatingStructure,
    /// Image paired with nearby text (weakest heuristic)
    ImageTextPair,
    /// Language-model fallback extraction
    Llm,
}

impl DetectionMethod {
    /// Base confidence assigned to candidates from this method,
    /// before quality and count factors are applied.
    pub fn base_confidence(self) -> f64 {
        match self {
            Self::Schema => 0.9,
            Self::EcommercePattern => 0.7,
            Self::RepeatingStructure => 0.5,
            Self::ImageTextPair => 0.3,
            Self::Llm => 0.85,
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Schema => "schema",
            Self::EcommercePattern => "ecommerce-pattern",
            Self::RepeatingStructure => "repeating-structure",
            Self::ImageTextPair => "image-text-pair",
            Self::Llm => "llm",
        };
        f.write_str(name)
    }
}

/// A single product extracted from a page.
///
/// Immutable value object: created once per detection pass and never
/// mutated afterwards. Candidates without a resolvable name are discarded
/// before they reach a [`crate::DetectionResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedProduct {
    /// Product name (always non-empty in final results)
    pub name: String,

    /// Short description if one was found
    pub description: Option<String>,

    /// Raw currency-formatted price, e.g. "$12.99" or "R100"
    pub price: Option<String>,

    /// Image URLs in document order (data URIs excluded)
    #[serde(default)]
    pub images: Vec<String>,

    /// Category if one was found or supplied by the model
    pub category: Option<String>,

    /// Additional key/value attributes (spec tables, dt/dd pairs)
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Calibrated confidence in [0, 1]
    pub confidence: f64,

    /// Which heuristic or model produced this candidate
    pub method: DetectionMethod,
}

impl DetectedProduct {
    /// Create a new product with the given name and method.
    ///
    /// Confidence starts at the method's base confidence and is
    /// recalibrated by the scorer.
    pub fn new(name: impl Into<String>, method: DetectionMethod) -> Self {
        Self {
            name: name.into(),
            description: None,
            price: None,
            images: Vec::new(),
            category: None,
            attributes: IndexMap::new(),
            confidence: method.base_confidence(),
            method,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the raw price string.
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Add an image URL.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add an attribute key/value pair.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Normalized name used for deduplication: lowercased, trimmed,
    /// internal whitespace collapsed.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Normalize a product name for comparison.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

//! Model response parsing.
//!
//! The model is asked for bare JSON but fenced output still shows up;
//! the parser strips fences before deserializing and rejects anything
//! that does not match the response contract.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{DetectError, Result};
use crate::types::product::{DetectedProduct, DetectionMethod};

/// Response contract for the extraction prompt.
#[derive(Debug, Deserialize)]
pub struct LlmProductResponse {
    pub products: Vec<LlmProduct>,

    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProduct {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub price: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

/// Parse raw model output into the response contract.
pub fn parse_response(raw: &str) -> Result<LlmProductResponse> {
    let cleaned = strip_markdown_fences(raw);
    if cleaned.is_empty() {
        return Err(DetectError::Contract {
            reason: "empty model response".to_string(),
        });
    }
    Ok(serde_json::from_str(cleaned)?)
}

/// Convert parsed model products into detected products.
///
/// Products with blank names are dropped; the model occasionally emits
/// placeholder rows and they must never reach a result.
pub fn into_detected(response: LlmProductResponse, confidence: f64) -> Vec<DetectedProduct> {
    response
        .products
        .into_iter()
        .filter(|p| !p.name.trim().is_empty())
        .map(|p| {
            let mut product = DetectedProduct::new(p.name.trim(), DetectionMethod::Llm);
            product.description = p.description.filter(|d| !d.trim().is_empty());
            product.price = p.price.filter(|v| !v.trim().is_empty());
            product.images = p.images;
            product.category = p.category.filter(|c| !c.trim().is_empty());
            product.attributes = p.attributes;
            product.confidence = confidence;
            product
        })
        .collect()
}

fn strip_markdown_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

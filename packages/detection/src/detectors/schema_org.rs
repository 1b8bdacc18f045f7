//! Schema.org JSON-LD detector.
//!
//! Pages that embed `application/ld+json` Product markup hand us
//! structured data directly; when present this short-circuits the
//! structural heuristics entirely and carries the highest base
//! confidence.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::detectors::Candidate;
use crate::types::product::{DetectedProduct, DetectionMethod};

/// Detect products declared via schema.org JSON-LD.
pub fn detect_schema_org(html: &Html) -> Vec<Candidate> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    let mut candidates = Vec::new();

    for script in html.select(&sel) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            // Broken JSON-LD is common in the wild; skip it quietly
            continue;
        };

        let root_id = script.id();
        for product in collect_products(&value) {
            if let Some(detected) = product_from_value(product) {
                candidates.push(Candidate {
                    product: detected,
                    root_id,
                    name_id: None,
                });
            }
        }
    }

    if !candidates.is_empty() {
        debug!(count = candidates.len(), "Schema.org products found");
    }

    candidates
}

/// Walk a JSON-LD document collecting every Product object, including
/// those nested in arrays, `@graph`, and `ItemList` entries.
fn collect_products(value: &Value) -> Vec<&Value> {
    let mut products = Vec::new();
    collect_into(value, &mut products);
    products
}

fn collect_into<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_into(item, out);
            }
        }
        Value::Object(map) => {
            if type_is(value, "Product") {
                out.push(value);
                return;
            }
            if let Some(graph) = map.get("@graph") {
                collect_into(graph, out);
            }
            if type_is(value, "ItemList") {
                if let Some(items) = map.get("itemListElement") {
                    collect_into(items, out);
                }
            }
            // ListItem wrappers hold the product in "item"
            if let Some(item) = map.get("item") {
                collect_into(item, out);
            }
        }
        _ => {}
    }
}

fn type_is(value: &Value, expected: &str) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == expected,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(expected)),
        _ => false,
    }
}

fn product_from_value(value: &Value) -> Option<DetectedProduct> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let mut product = DetectedProduct::new(name, DetectionMethod::Schema);

    if let Some(description) = value.get("description").and_then(Value::as_str) {
        if !description.trim().is_empty() {
            product.description = Some(description.trim().to_string());
        }
    }

    product.price = extract_offer_price(value);
    product.images = extract_images(value);

    if let Some(category) = value.get("category").and_then(Value::as_str) {
        product.category = Some(category.to_string());
    }

    if let Some(brand) = value.get("brand") {
        let brand_name = brand
            .as_str()
            .or_else(|| brand.get("name").and_then(Value::as_str));
        if let Some(brand_name) = brand_name {
            product.attributes.insert("brand".to_string(), brand_name.to_string());
        }
    }

    Some(product)
}

/// Price from `offers`, which may be a single offer or an array. The
/// raw price is kept as-is, prefixed with the currency code when one is
/// declared.
fn extract_offer_price(value: &Value) -> Option<String> {
    let offers = value.get("offers")?;
    let offer = match offers {
        Value::Array(items) => items.first()?,
        other => other,
    };

    let price = match offer.get("price")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    match offer.get("priceCurrency").and_then(Value::as_str) {
        Some(currency) => Some(format!("{currency} {price}")),
        None => Some(price),
    }
}

/// `image` may be a string, an array of strings, or an ImageObject.
fn extract_images(value: &Value) -> Vec<String> {
    let Some(image) = value.get("image") else {
        return Vec::new();
    };

    let mut images = Vec::new();
    match image {
        Value::String(url) => images.push(url.clone()),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(url) => images.push(url.clone()),
                    Value::Object(_) => {
                        if let Some(url) = item.get("url").and_then(Value::as_str) {
                            images.push(url.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Object(_) => {
            if let Some(url) = image.get("url").and_then(Value::as_str) {
                images.push(url.to_string());
            }
        }
        _ => {}
    }

    images.retain(|url| !url.trim_start().starts_with("data:"));
    images
}

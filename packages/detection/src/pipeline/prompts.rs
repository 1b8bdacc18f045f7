//! Prompt templates for model-backed extraction.

use sha2::{Digest, Sha256};

/// System prompt for every extraction call.
pub const SYSTEM_PROMPT: &str = r#"You are a product extraction engine. You read simplified HTML from e-commerce and catalog pages and return structured product data.

Rules:
- Only report products actually present in the HTML. Never invent products, prices, or attributes.
- Return valid JSON only, with no markdown fences and no commentary.
- Keep prices exactly as written in the page, including currency symbols.
- Leave a field out or null when the page does not state it."#;

/// User prompt template. `{html}` receives the simplified page and
/// `{candidates_section}` an optional summary of what the DOM heuristics
/// already found.
pub const EXTRACT_PRODUCTS_PROMPT: &str = r#"Extract every product from this page.
{candidates_section}
HTML:
{html}

Respond with JSON in exactly this shape:
{
  "products": [
    {
      "name": "string (required)",
      "description": "string or null",
      "price": "string as written on the page, or null",
      "images": ["image URLs"],
      "category": "string or null",
      "attributes": {"key": "value"}
    }
  ],
  "categories": ["distinct category names"]
}"#;

/// Render the extraction prompt for a page.
///
/// When the DOM phase produced candidates their names are passed along
/// so the model can correct and complete rather than start cold.
pub fn format_extract_prompt(html: &str, candidate_names: &[String]) -> String {
    let candidates_section = if candidate_names.is_empty() {
        String::new()
    } else {
        format!(
            "\nHeuristics already found these likely products; verify them and add any they missed: {}.\n",
            candidate_names.join(", ")
        )
    };

    EXTRACT_PRODUCTS_PROMPT
        .replace("{candidates_section}", &candidates_section)
        .replace("{html}", html)
}

/// Stable hash of the prompt templates, for logging which prompt
/// revision produced a result.
pub fn extract_prompt_hash() -> String {
    let mut hasher = Sha256::new();
    hasher.update(SYSTEM_PROMPT.as_bytes());
    hasher.update(EXTRACT_PRODUCTS_PROMPT.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 8)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes
        .iter()
        .take(len)
        .map(|b| format!("{b:02x}"))
        .collect()
}

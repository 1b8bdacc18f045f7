//! Image-text pair detector.
//!
//! Fallback heuristic for pages without a usable repeating structure:
//! pair each image with the nearest text and keep pairs that score above
//! a minimum. Weak evidence, so candidates start at a low base
//! confidence.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::detectors::extract::{clean_text, element_text};
use crate::detectors::price::find_price;
use crate::detectors::Candidate;
use crate::types::product::{DetectedProduct, DetectionMethod};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Alt/title values that say nothing about the image's subject.
fn is_generic_label(label: &str) -> bool {
    let re = Regex::new(r"(?i)^(image|photo|picture|img|\d+)$").unwrap();
    re.is_match(label.trim())
}

/// Src fragments that mark decoration rather than product photography.
fn is_decorative_src(src: &str) -> bool {
    let re = Regex::new(r"(?i)icon|logo|banner").unwrap();
    re.is_match(src)
}

fn has_product_ancestor(img: ElementRef) -> bool {
    let re = Regex::new(r"(?i)product|item|thumbnail").unwrap();
    img.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().attr("class").is_some_and(|c| re.is_match(c)))
}

/// Detect products by pairing images with nearby text.
///
/// `min_score` is the acceptance threshold for a pair (3 by default
/// upstream).
pub fn detect_image_text(html: &Html, min_score: u32, price_re: &Regex) -> Vec<Candidate> {
    let img_sel = Selector::parse("img").unwrap();
    let mut candidates = Vec::new();

    for img in html.select(&img_sel) {
        let Some(pair) = pair_image(img, price_re) else {
            continue;
        };

        let score = score_pair(img, &pair);
        if score < min_score {
            continue;
        }

        let root = pair.context.unwrap_or(img);
        let mut product = DetectedProduct::new(pair.name, DetectionMethod::ImageTextPair);
        product.description = pair.description;
        product.price = pair.price;
        if let Some(src) = img.value().attr("src") {
            if !src.trim_start().starts_with("data:") {
                product.images.push(src.to_string());
            }
        }

        debug!(
            name = %product.name,
            score,
            "Image-text pair accepted"
        );

        candidates.push(Candidate {
            product,
            root_id: root.id(),
            name_id: None,
        });
    }

    candidates
}

/// Text found near an image.
struct ImagePair<'a> {
    name: String,
    description: Option<String>,
    price: Option<String>,
    /// The ancestor element that supplied the text, when any did
    context: Option<ElementRef<'a>>,
}

/// Walk outward from the image (parent, then grandparent) looking for
/// the nearest non-empty text, heading, or the image's own alt/title.
fn pair_image<'a>(img: ElementRef<'a>, price_re: &Regex) -> Option<ImagePair<'a>> {
    let alt = img
        .value()
        .attr("alt")
        .map(clean_text)
        .filter(|s| !s.is_empty());
    let title = img
        .value()
        .attr("title")
        .map(clean_text)
        .filter(|s| !s.is_empty());

    let mut heading: Option<String> = None;
    let mut nearby_text: Option<String> = None;
    let mut context: Option<ElementRef<'a>> = None;

    for ancestor in img.ancestors().filter_map(ElementRef::wrap).take(2) {
        if heading.is_none() {
            heading = ancestor
                .descendants()
                .filter_map(ElementRef::wrap)
                .find(|el| HEADING_TAGS.contains(&el.value().name()))
                .map(|el| clean_text(&element_text(el)))
                .filter(|s| !s.is_empty());
        }
        if nearby_text.is_none() {
            let text = clean_text(&element_text(ancestor));
            if !text.is_empty() {
                nearby_text = Some(text);
            }
        }
        if context.is_none() && (heading.is_some() || nearby_text.is_some()) {
            context = Some(ancestor);
        }
        if heading.is_some() && nearby_text.is_some() {
            break;
        }
    }

    let label = alt.clone().or(title);
    let name = heading
        .clone()
        .or_else(|| label.clone().filter(|l| !is_generic_label(l)))
        .or_else(|| nearby_text.clone().map(|t| truncate_words(&t, 8)))?;

    let price = nearby_text.as_deref().and_then(|t| find_price(t, price_re));

    Some(ImagePair {
        name,
        description: nearby_text.filter(|t| Some(t) != heading.as_ref()),
        price,
        context,
    })
}

/// Pair score: +2 non-generic alt/title, +1 non-decorative src,
/// +2 product-ish ancestor class.
fn score_pair(img: ElementRef, _pair: &ImagePair) -> u32 {
    let mut score = 0;

    let label = img.value().attr("alt").or_else(|| img.value().attr("title"));
    if label.is_some_and(|l| !l.trim().is_empty() && !is_generic_label(l)) {
        score += 2;
    }

    if img.value().attr("src").is_some_and(|s| !is_decorative_src(s)) {
        score += 1;
    }

    if has_product_ancestor(img) {
        score += 2;
    }

    score
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::price::price_regex;

    #[test]
    fn test_single_image_with_paragraph() {
        let html = Html::parse_document(
            r#"<html><body><div>
                 <img src="tea.jpg" alt="Rooibos Tea">
                 <p>Buy our Rooibos Tea for $8</p>
               </div></body></html>"#,
        );

        let candidates = detect_image_text(&html, 3, &price_regex());
        assert_eq!(candidates.len(), 1);

        let product = &candidates[0].product;
        assert_eq!(product.name, "Rooibos Tea");
        assert_eq!(product.price.as_deref(), Some("$8"));
        assert_eq!(product.method, DetectionMethod::ImageTextPair);
        assert_eq!(product.images, vec!["tea.jpg"]);
    }

    #[test]
    fn test_generic_alt_icon_rejected() {
        let html = Html::parse_document(
            r#"<html><body>
                 <img src="icon-cart.png" alt="image">
               </body></html>"#,
        );
        // Generic alt (0), decorative src (0), no product ancestor (0)
        assert!(detect_image_text(&html, 3, &price_regex()).is_empty());
    }

    #[test]
    fn test_product_ancestor_class_boosts_score() {
        let html = Html::parse_document(
            r#"<html><body><div class="product-thumbnail">
                 <img src="logo-thing.png" alt="Ceramic Mug">
               </div></body></html>"#,
        );
        // Non-generic alt (+2), decorative src (+0), product ancestor (+2)
        let candidates = detect_image_text(&html, 3, &price_regex());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].product.name, "Ceramic Mug");
    }

    #[test]
    fn test_heading_preferred_over_alt() {
        let html = Html::parse_document(
            r#"<html><body><div class="item">
                 <img src="shot.jpg" alt="DSC-4411">
                 <h2>Hand-thrown Vase</h2>
               </div></body></html>"#,
        );
        let candidates = detect_image_text(&html, 3, &price_regex());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].product.name, "Hand-thrown Vase");
    }

    #[test]
    fn test_generic_label_detection() {
        assert!(is_generic_label("image"));
        assert!(is_generic_label("IMG"));
        assert!(is_generic_label("12345"));
        assert!(!is_generic_label("Rooibos Tea"));
    }
}

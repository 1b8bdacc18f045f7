//! Per-element field extraction shared by the structural and image-text
//! detectors.

use ego_tree::NodeId;
use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::detectors::price::find_price;
use crate::detectors::Candidate;
use crate::types::product::{DetectedProduct, DetectionMethod};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Longest name accepted from the cleaned-text fallback.
const MAX_FALLBACK_NAME_CHARS: usize = 120;

/// Extract a product candidate from one element.
///
/// Returns `None` when no name can be resolved; unnamed candidates never
/// enter a result.
pub fn extract_candidate(
    element: ElementRef,
    method: DetectionMethod,
    price_re: &Regex,
) -> Option<Candidate> {
    let (name, name_id) = extract_name(element)?;

    let mut product = DetectedProduct::new(name, method);
    product.description = extract_description(element);
    product.images = extract_images(element);
    product.category = None;
    product.attributes = extract_attributes(element);
    product.price = extract_price(element, price_re);

    Some(Candidate {
        product,
        root_id: element.id(),
        name_id,
    })
}

/// Name resolution in priority order: heading, title/name class,
/// `itemprop="name"`, cleaned element text, image alt.
pub fn extract_name(element: ElementRef) -> Option<(String, Option<NodeId>)> {
    for descendant in element.descendants() {
        let Some(el) = ElementRef::wrap(descendant) else {
            continue;
        };
        if HEADING_TAGS.contains(&el.value().name()) {
            let text = clean_text(&element_text(el));
            if !text.is_empty() {
                return Some((text, Some(el.id())));
            }
        }
    }

    if let Some(el) = find_by_class(element, &["title", "name"]) {
        let text = clean_text(&element_text(el));
        if !text.is_empty() {
            return Some((text, Some(el.id())));
        }
    }

    let itemprop_sel = Selector::parse(r#"[itemprop="name"]"#).unwrap();
    if let Some(el) = element.select(&itemprop_sel).next() {
        let text = clean_text(&element_text(el));
        if !text.is_empty() {
            return Some((text, Some(el.id())));
        }
    }

    let own_text = clean_text(&element_text(element));
    if !own_text.is_empty() && own_text.chars().count() <= MAX_FALLBACK_NAME_CHARS {
        return Some((own_text, None));
    }

    let img_sel = Selector::parse("img").unwrap();
    for img in element.select(&img_sel) {
        if let Some(alt) = img.value().attr("alt") {
            let alt = clean_text(alt);
            if !alt.is_empty() {
                return Some((alt, Some(img.id())));
            }
        }
    }

    None
}

/// First paragraph or description-class text.
pub fn extract_description(element: ElementRef) -> Option<String> {
    let p_sel = Selector::parse("p").unwrap();
    for p in element.select(&p_sel) {
        let text = clean_text(&element_text(p));
        if !text.is_empty() {
            return Some(text);
        }
    }

    find_by_class(element, &["description", "desc"]).and_then(|el| {
        let text = clean_text(&element_text(el));
        (!text.is_empty()).then_some(text)
    })
}

/// All `img[src]` URLs in document order, excluding data URIs.
pub fn extract_images(element: ElementRef) -> Vec<String> {
    let img_sel = Selector::parse("img[src]").unwrap();
    element
        .select(&img_sel)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.trim_start().starts_with("data:"))
        .map(|src| src.to_string())
        .collect()
}

/// Key/value attributes from `<tr>` rows with two cells and from
/// `<dt>`/`<dd>` pairs.
pub fn extract_attributes(element: ElementRef) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();

    let tr_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td, th").unwrap();
    for row in element.select(&tr_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() == 2 {
            let key = clean_text(&element_text(cells[0]));
            let value = clean_text(&element_text(cells[1]));
            if !key.is_empty() && !value.is_empty() {
                attributes.insert(key, value);
            }
        }
    }

    let dt_sel = Selector::parse("dt").unwrap();
    for dt in element.select(&dt_sel) {
        let key = clean_text(&element_text(dt));
        if key.is_empty() {
            continue;
        }
        // The matching <dd> is the next element sibling
        let dd = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "dd");
        if let Some(dd) = dd {
            let value = clean_text(&element_text(dd));
            if !value.is_empty() {
                attributes.insert(key, value);
            }
        }
    }

    attributes
}

/// Price from a price-class descendant, falling back to a regex pass
/// over the element's text.
pub fn extract_price(element: ElementRef, price_re: &Regex) -> Option<String> {
    if let Some(el) = find_by_class(element, &["price"]) {
        let text = clean_text(&element_text(el));
        if let Some(price) = find_price(&text, price_re) {
            return Some(price);
        }
        if !text.is_empty() {
            return Some(text);
        }
    }

    find_price(&element_text(element), price_re)
}

/// First descendant whose class attribute contains any of the given
/// lowercase tokens.
pub fn find_by_class<'a>(element: ElementRef<'a>, tokens: &[&str]) -> Option<ElementRef<'a>> {
    for descendant in element.descendants() {
        let Some(el) = ElementRef::wrap(descendant) else {
            continue;
        };
        if el.id() == element.id() {
            continue;
        }
        let Some(class) = el.value().attr("class") else {
            continue;
        };
        let class = class.to_lowercase();
        if tokens.iter().any(|t| class.contains(t)) {
            return Some(el);
        }
    }
    None
}

/// Concatenated descendant text of an element.
pub fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Trim and collapse internal whitespace.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

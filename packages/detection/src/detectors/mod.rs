//! DOM-phase detectors.
//!
//! One parametrized module of composable, independently testable
//! functions: schema.org JSON-LD, repeating-structure grouping,
//! image-text pairing, and price scanning. All of them read the
//! normalized tree without mutating it, so the pipeline can run them in
//! any order.

pub mod extract;
pub mod image_text;
pub mod price;
pub mod schema_org;
pub mod structural;

use ego_tree::NodeId;

use crate::types::product::DetectedProduct;

pub use image_text::detect_image_text;
pub use price::{attach_nearest_prices, price_regex, scan_prices, PriceMatch};
pub use schema_org::detect_schema_org;
pub use structural::detect_structural;

/// A product candidate plus the tree positions later passes need.
///
/// `root_id` is the element the candidate was extracted from; `name_id`
/// is the element the name came from, when it was a distinct node. Both
/// are only meaningful against the tree they were extracted from and
/// never leave the DOM phase.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The extracted product (pre-calibration confidence)
    pub product: DetectedProduct,

    /// Element this candidate was extracted from
    pub root_id: NodeId,

    /// Element the name text came from, if distinct
    pub name_id: Option<NodeId>,
}

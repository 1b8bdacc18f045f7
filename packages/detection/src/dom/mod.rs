//! Document normalization and structural fingerprinting.
//!
//! The parsed document is an immutable `scraper::Html` tree (an ego-tree
//! node arena: integer node ids, non-owning parent links). Everything in
//! this module is read-only over that tree.

pub mod normalize;
pub mod signature;

pub use normalize::{normalize, NormalizedDocument, PageStats};
pub use signature::{jaccard_similarity, token_set, StructuralSignature};

//! The detection pipeline: DOM phase, fallback strategy, model
//! extraction, and result merging.

pub mod detect;
pub mod merge;
pub mod prompts;
pub mod response;
pub mod strategy;

pub use detect::Detector;
pub use merge::{dedup_collisions, merge_results};
pub use prompts::{extract_prompt_hash, format_extract_prompt};
pub use strategy::{page_complexity, should_use_llm};

//! Hybrid product detection engine.
//!
//! Turns raw page HTML into structured product data. A fast DOM phase
//! runs first (schema.org JSON-LD, repeating-structure grouping,
//! image-text pairing, price association); when its output is missing or
//! weak a language-model fallback extracts from a simplified copy of the
//! page. Results are merged, deduplicated, confidence-scored, and cached
//! per URL.
//!
//! # Quick start
//!
//! ```no_run
//! use product_detection::{Detector, DetectionConfig, OpenAiModel};
//!
//! # async fn run(html: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let model = OpenAiModel::from_env()?;
//! let detector = Detector::new(model).with_config(DetectionConfig::default());
//!
//! let result = detector.detect("https://shop.example/tea", html).await;
//! for product in &result.products {
//!     println!("{} {:?} ({:.2})", product.name, product.price, product.confidence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Heuristics-only operation (no model, no network) is a config flag:
//! `DetectionConfig::default().without_llm()`.

pub mod ai;
pub mod cache;
pub mod detectors;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod testing;
pub mod traits;
pub mod types;

pub use ai::OpenAiModel;
pub use cache::{CacheStats, Clock, DetectionCache, ManualClock, SystemClock};
pub use error::{DetectError, Result};
pub use pipeline::Detector;
pub use traits::{LanguageModel, ModelMessage, ModelRequest, ModelResponse, Role};
pub use types::{DetectedProduct, DetectionConfig, DetectionMethod, DetectionMetrics, DetectionResult};

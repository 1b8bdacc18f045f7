//! Core data types for the detection engine.

pub mod config;
pub mod product;
pub mod result;

pub use config::DetectionConfig;
pub use product::{DetectedProduct, DetectionMethod};
pub use result::{DetectionMetrics, DetectionResult};

//! Trait seams for pluggable implementations.

pub mod model;

pub use model::{LanguageModel, ModelMessage, ModelRequest, ModelResponse, Role};

//! Configuration for the detection pipeline.

use serde::{Deserialize, Serialize};

/// Tunables for the detection pipeline.
///
/// The defaults reflect the calibrated values the heuristics were tuned
/// with; overriding them shifts the precision/recall and cost tradeoffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum Jaccard similarity between a container's children for a
    /// repeating structure to be accepted. Default: 0.7.
    pub min_structural_similarity: f64,

    /// Minimum image-text pair score for a pair to become a candidate.
    /// Default: 3.
    pub min_pair_score: u32,

    /// Average DOM-phase confidence below which the LLM fallback runs.
    /// Default: 0.6.
    pub min_dom_confidence: f64,

    /// Character cap applied to the simplified HTML sent to the model.
    /// Default: 15,000.
    pub max_html_chars: usize,

    /// Whether the LLM fallback may run at all.
    ///
    /// When false, the pipeline is purely heuristic and never suspends.
    /// Default: true.
    pub llm_enabled: bool,

    /// Model name passed to the provider. Default: "gpt-4o-mini".
    pub llm_model: String,

    /// Sampling temperature for extraction calls (kept low so the model
    /// sticks to the JSON contract). Default: 0.2.
    pub llm_temperature: f32,

    /// Maximum completion tokens requested. Default: 4096.
    pub llm_max_tokens: u32,

    /// Timeout for a single model call, in seconds. Default: 30.
    pub llm_timeout_secs: u64,

    /// Confidence assigned to products returned by the model.
    /// Default: 0.85.
    pub llm_confidence: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_structural_similarity: 0.7,
            min_pair_score: 3,
            min_dom_confidence: 0.6,
            max_html_chars: 15_000,
            llm_enabled: true,
            llm_model: "gpt-4o-mini".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 4096,
            llm_timeout_secs: 30,
            llm_confidence: 0.85,
        }
    }
}

impl DetectionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the LLM fallback (heuristics only).
    pub fn without_llm(mut self) -> Self {
        self.llm_enabled = false;
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = model.into();
        self
    }

    /// Set the minimum DOM confidence that skips the fallback.
    pub fn with_min_dom_confidence(mut self, confidence: f64) -> Self {
        self.min_dom_confidence = confidence;
        self
    }

    /// Set the model call timeout in seconds.
    pub fn with_llm_timeout_secs(mut self, seconds: u64) -> Self {
        self.llm_timeout_secs = seconds;
        self
    }

    /// Set the minimum image-text pair score.
    pub fn with_min_pair_score(mut self, score: u32) -> Self {
        self.min_pair_score = score;
        self
    }

    /// Set the simplified-HTML character cap.
    pub fn with_max_html_chars(mut self, chars: usize) -> Self {
        self.max_html_chars = chars;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibration() {
        let config = DetectionConfig::default();
        assert_eq!(config.min_structural_similarity, 0.7);
        assert_eq!(config.min_dom_confidence, 0.6);
        assert_eq!(config.max_html_chars, 15_000);
        assert!(config.llm_temperature <= 0.3);
        assert!(config.llm_enabled);
    }

    #[test]
    fn test_builders() {
        let config = DetectionConfig::new()
            .without_llm()
            .with_model("gpt-4o")
            .with_min_pair_score(2);

        assert!(!config.llm_enabled);
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.min_pair_score, 2);
    }
}

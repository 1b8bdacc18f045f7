//! The detection pipeline.
//!
//! One pass: cache lookup, DOM heuristics, fallback decision, optional
//! model extraction, merge, cache store. The model phase degrades on
//! failure; only empty input short-circuits the pass.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::DetectionCache;
use crate::detectors::{
    attach_nearest_prices, detect_image_text, detect_schema_org, detect_structural, price_regex,
    scan_prices,
};
use crate::dom::normalize::{normalize, PageStats};
use crate::error::{DetectError, Result};
use crate::pipeline::merge::merge_results;
use crate::pipeline::prompts::{format_extract_prompt, SYSTEM_PROMPT};
use crate::pipeline::response::{into_detected, parse_response};
use crate::pipeline::strategy::{page_complexity, should_use_llm};
use crate::scoring::calibrate;
use crate::traits::model::{LanguageModel, ModelMessage, ModelRequest, ModelResponse};
use crate::types::config::DetectionConfig;
use crate::types::product::DetectedProduct;
use crate::types::result::DetectionResult;

/// DOM-candidate count below which image-text pairing also runs.
const STRUCTURAL_SUFFICIENT: usize = 3;

/// Hybrid product detector.
///
/// Generic over the model so tests script it; production uses
/// [`crate::ai::OpenAiModel`].
pub struct Detector<M: LanguageModel> {
    model: M,
    cache: DetectionCache,
    config: DetectionConfig,
}

/// Owned output of the synchronous DOM phase. The parse tree never
/// crosses an await point.
struct DomPhase {
    products: Vec<DetectedProduct>,
    simplified_html: String,
    stats: PageStats,
}

impl<M: LanguageModel> Detector<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            cache: DetectionCache::new(),
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache(mut self, cache: DetectionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &DetectionCache {
        &self.cache
    }

    /// Detect products in a page.
    ///
    /// Never fails: degraded stages record themselves in
    /// `metrics.error` and the best available result is returned.
    pub async fn detect(&self, url: &str, html: &str) -> DetectionResult {
        self.detect_with_cancellation(url, html, &CancellationToken::new())
            .await
    }

    /// Detect products, abandoning the model phase when `cancel` fires.
    ///
    /// Cancellation degrades to the DOM-only result rather than failing
    /// the pass.
    pub async fn detect_with_cancellation(
        &self,
        url: &str,
        html: &str,
        cancel: &CancellationToken,
    ) -> DetectionResult {
        let started = Instant::now();

        if let Some(cached) = self.cache.get(url) {
            return cached;
        }

        if html.trim().is_empty() {
            warn!(%url, "Empty HTML input");
            let reason = DetectError::Validation {
                reason: "empty HTML input".to_string(),
            };
            let mut result = DetectionResult::empty_with_error(reason.to_string());
            result.metrics.total_time_ms = started.elapsed().as_millis() as u64;
            return result;
        }

        let dom = run_dom_phase(html, &self.config);
        let complexity = page_complexity(&dom.stats);
        let avg_confidence = average(&dom.products);

        debug!(
            %url,
            dom_products = dom.products.len(),
            avg_confidence,
            complexity,
            "DOM phase complete"
        );

        let mut tokens_used = 0usize;
        let mut error: Option<String> = None;
        let mut llm_products: Vec<DetectedProduct> = Vec::new();
        let mut llm_categories: Vec<String> = Vec::new();

        let fallback = self.config.llm_enabled
            && should_use_llm(dom.products.len(), avg_confidence, complexity, &self.config);

        if fallback {
            match self.run_llm_phase(&dom, cancel).await {
                Ok((response, prompt_chars)) => {
                    tokens_used = estimate_tokens(prompt_chars, response.content.len());
                    match parse_response(&response.content) {
                        Ok(parsed) => {
                            llm_categories = parsed.categories.clone();
                            llm_products = into_detected(parsed, self.config.llm_confidence);
                        }
                        Err(e) => {
                            warn!(%url, error = %e, "Model response rejected");
                            error = Some(e.to_string());
                        }
                    }
                }
                Err(e) => {
                    warn!(%url, error = %e, "Model phase degraded");
                    error = Some(e.to_string());
                }
            }
        }

        let merged = merge_results(dom.products, llm_products);
        let mut result = DetectionResult::from_products(merged);
        for category in llm_categories {
            let category = category.trim().to_string();
            if !category.is_empty() && !result.categories.contains(&category) {
                result.categories.push(category);
            }
        }
        result.metrics.tokens_used = tokens_used;
        result.metrics.total_time_ms = started.elapsed().as_millis() as u64;
        result.metrics.error = error;

        info!(
            %url,
            products = result.metrics.product_count,
            confidence = result.metrics.confidence,
            tokens = result.metrics.tokens_used,
            used_llm = fallback,
            "Detection pass complete"
        );

        self.cache.set(url, result.clone());
        result
    }

    /// Run the model call with cancellation and timeout, returning the
    /// response plus the prompt size for token accounting.
    async fn run_llm_phase(
        &self,
        dom: &DomPhase,
        cancel: &CancellationToken,
    ) -> Result<(ModelResponse, usize)> {
        let names: Vec<String> = dom.products.iter().map(|p| p.name.clone()).collect();
        let prompt = format_extract_prompt(&dom.simplified_html, &names);
        let prompt_chars = SYSTEM_PROMPT.len() + prompt.len();

        let request = ModelRequest {
            model: self.config.llm_model.clone(),
            messages: vec![
                ModelMessage::system(SYSTEM_PROMPT),
                ModelMessage::user(prompt),
            ],
            temperature: self.config.llm_temperature,
            max_tokens: self.config.llm_max_tokens,
        };

        let timeout = Duration::from_secs(self.config.llm_timeout_secs);
        let response = tokio::select! {
            _ = cancel.cancelled() => Err(DetectError::Cancelled),
            completed = tokio::time::timeout(timeout, self.model.complete(&request)) => {
                match completed {
                    Ok(inner) => inner,
                    Err(_) => Err(DetectError::Timeout {
                        seconds: self.config.llm_timeout_secs,
                    }),
                }
            }
        }?;

        Ok((response, prompt_chars))
    }
}

/// Parse, detect, and calibrate. Synchronous on purpose: the parse tree
/// is not `Sync` and must be dropped before the pipeline suspends.
fn run_dom_phase(html: &str, config: &DetectionConfig) -> DomPhase {
    let doc = normalize(html, config.max_html_chars);
    let price_re = price_regex();

    // Structured markup wins outright when present
    let mut candidates = detect_schema_org(&doc.html);
    if candidates.is_empty() {
        candidates = detect_structural(&doc.html, config.min_structural_similarity, &price_re);
        if candidates.len() < STRUCTURAL_SUFFICIENT {
            candidates.extend(detect_image_text(&doc.html, config.min_pair_score, &price_re));
        }
    }

    let prices = scan_prices(&doc.html, &price_re);
    attach_nearest_prices(&doc.html, &mut candidates, &prices);

    let products = calibrate(candidates.into_iter().map(|c| c.product).collect());

    DomPhase {
        products,
        simplified_html: doc.simplified_html,
        stats: doc.stats,
    }
}

/// Rough token estimate at four characters per token, prompt and
/// response sides counted separately.
fn estimate_tokens(prompt_chars: usize, response_chars: usize) -> usize {
    prompt_chars.div_ceil(4) + response_chars.div_ceil(4)
}

fn average(products: &[DetectedProduct]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    products.iter().map(|p| p.confidence).sum::<f64>() / products.len() as f64
}

//! Scripted mock model for tests.
//!
//! Outcomes are consumed in order; when the script runs out the mock
//! returns an empty-products response. Every request is recorded for
//! assertion.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DetectError, Result};
use crate::traits::model::{LanguageModel, ModelRequest, ModelResponse};

const EMPTY_RESPONSE: &str = r#"{"products": [], "categories": []}"#;

enum Outcome {
    Response(String),
    Failure(String),
}

/// A [`LanguageModel`] with scripted responses.
#[derive(Clone, Default)]
pub struct MockModel {
    outcomes: Arc<RwLock<VecDeque<Outcome>>>,
    calls: Arc<RwLock<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response body.
    pub fn with_response(self, body: impl Into<String>) -> Self {
        self.outcomes
            .write()
            .unwrap()
            .push_back(Outcome::Response(body.into()));
        self
    }

    /// Queue a provider failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.outcomes
            .write()
            .unwrap()
            .push_back(Outcome::Failure(message.into()));
        self
    }

    /// Delay every call, for exercising timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<ModelRequest> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.calls.write().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcomes.write().unwrap().pop_front();
        match outcome {
            Some(Outcome::Response(body)) => Ok(ModelResponse { content: body }),
            Some(Outcome::Failure(message)) => Err(DetectError::Provider(message.into())),
            None => Ok(ModelResponse {
                content: EMPTY_RESPONSE.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::model::ModelMessage;

    fn request() -> ModelRequest {
        ModelRequest {
            model: "test-model".to_string(),
            messages: vec![ModelMessage::user("hi")],
            temperature: 0.2,
            max_tokens: 16,
        }
    }

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let mock = MockModel::new()
            .with_response(r#"{"products": [{"name": "Tea"}]}"#)
            .with_failure("boom");

        let first = mock.complete(&request()).await.unwrap();
        assert!(first.content.contains("Tea"));

        assert!(mock.complete(&request()).await.is_err());

        // Script exhausted: empty response
        let third = mock.complete(&request()).await.unwrap();
        assert!(third.content.contains("\"products\": []"));
    }

    #[tokio::test]
    async fn test_calls_recorded() {
        let mock = MockModel::new();
        mock.complete(&request()).await.unwrap();
        mock.complete(&request()).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, "test-model");
    }
}

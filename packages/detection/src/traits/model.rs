//! Language-model provider abstraction.
//!
//! The pipeline only needs chat-style completion; the trait keeps it
//! swappable between the real provider client and the scripted mock used
//! in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: Role,
    pub content: String,
}

impl ModelMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A completion request.
///
/// `Clone` so mocks can record the requests they receive.
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest {
    /// Provider model name
    pub model: String,

    /// Ordered chat messages
    pub messages: Vec<ModelMessage>,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token cap
    pub max_tokens: u32,
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Raw text content of the first choice
    pub content: String,
}

/// A chat-completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one completion call.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

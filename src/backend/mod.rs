//! Model backends: the seam between the dispatcher and a hosted model.
//!
//! A [`ModelBackend`] receives one [`ModelRequest`] (an ordered list of text
//! and image parts) and returns the generated text. Backends are constructed
//! explicitly and passed to [`crate::Analyzer`], so tests can substitute a
//! recording stub for the network.
//!
//! | Backend | Transport |
//! |---------|-----------|
//! | [`gemini::GeminiBackend`] | Generative Language REST API via reqwest (default) |
//! | [`provider::ProviderBackend`] | any `edgequake_llm::LLMProvider` (OpenAI, Anthropic, Ollama, …) |

pub mod gemini;
pub mod provider;

use crate::document::ImagePayload;
use crate::error::DispatchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One element of a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text(String),
    Image(ImagePayload),
}

impl Part {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(t),
            Part::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImagePayload> {
        match self {
            Part::Image(img) => Some(img),
            Part::Text(_) => None,
        }
    }
}

/// A single multimodal generation request. Part order is significant and
/// must reach the provider unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub parts: Vec<Part>,
}

/// Text produced by the model, with token usage when the provider reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReply {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A hosted multimodal model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short provider name for logs and error messages.
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send one request and wait for the generated text.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, DispatchError>;
}

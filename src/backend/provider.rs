//! Adapter from [`ModelBackend`] to an `edgequake_llm::LLMProvider`.
//!
//! Chat APIs have no notion of interleaved parts inside one turn, so each
//! part becomes its own user message, in request order: a text part is a
//! plain user message, an image part is a user message with one image
//! attachment and empty text.

use super::{ModelBackend, ModelReply, ModelRequest, Part};
use crate::config::AnalyzerConfig;
use crate::error::{ConfigError, DispatchError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Model used when a provider is named without a model.
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-mini";

/// A [`ModelBackend`] backed by any edgequake-llm provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    name: String,
    model: String,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl ProviderBackend {
    /// Wrap an already-constructed provider.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            name: name.into(),
            model: model.into(),
            options: CompletionOptions::default(),
            timeout_secs: AnalyzerConfig::default().api_timeout_secs,
        }
    }

    /// Instantiate the named provider through [`ProviderFactory`], which reads
    /// the provider's own API key variable (`OPENAI_API_KEY`, …).
    pub fn from_config(provider_name: &str, config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_PROVIDER_MODEL.to_string());

        let provider = ProviderFactory::create_llm_provider(provider_name, &model).map_err(|e| {
            ConfigError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;

        let mut backend = Self::new(provider, provider_name, model);
        backend.options = build_options(config);
        backend.timeout_secs = config.api_timeout_secs;
        Ok(backend)
    }
}

#[async_trait]
impl ModelBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, DispatchError> {
        let messages = to_messages(request);

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| classify_error(&self.name, format!("{e}"), self.timeout_secs))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.name, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(DispatchError::EmptyResponse);
        }

        Ok(ModelReply {
            text: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// One user message per part, order preserved.
fn to_messages(request: &ModelRequest) -> Vec<ChatMessage> {
    request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => ChatMessage::user_with_images(text.as_str(), Vec::new()),
            Part::Image(img) => ChatMessage::user_with_images(
                "",
                vec![ImageData::new(img.data.clone(), img.mime_type.as_str())],
            ),
        })
        .collect()
}

/// Build `CompletionOptions` from the analyzer config.
fn build_options(config: &AnalyzerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_output_tokens,
        ..Default::default()
    }
}

/// Sort a provider error message into a [`DispatchError`] variant.
///
/// edgequake-llm flattens HTTP failures into strings, so the status is
/// recovered from the message text. `timeout_secs` is the limit reported
/// when the provider's own client gave up waiting.
fn classify_error(provider: &str, message: String, timeout_secs: u64) -> DispatchError {
    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        DispatchError::Timeout { secs: timeout_secs }
    } else if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("api key")
    {
        DispatchError::Auth {
            provider: provider.to_string(),
            detail: message,
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        DispatchError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs: None,
        }
    } else {
        DispatchError::Api {
            status: 0,
            message,
        }
    }
}

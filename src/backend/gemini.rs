//! Gemini backend: `models/{model}:generateContent` over HTTPS.
//!
//! The request carries a single user turn whose parts mirror
//! [`ModelRequest::parts`] one-to-one and in order: text parts become
//! `{"text": …}`, images become `{"inlineData": {"mimeType", "data"}}`.
//! The reply text is the concatenation of the first candidate's text parts.

use super::{ModelBackend, ModelReply, ModelRequest, Part};
use crate::config::AnalyzerConfig;
use crate::error::{ConfigError, DispatchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "gemini";

/// Finish reasons that mean the model withheld its answer.
const BLOCKING_FINISH_REASONS: [&str; 5] =
    ["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Client handle for the Generative Language API.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout_secs: u64,
    generation: GenerationConfig,
}

impl GeminiBackend {
    /// Build a backend from the analyzer configuration.
    ///
    /// Fails with [`ConfigError::MissingApiKey`] when no key was configured.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                var: crate::config::API_KEY_VARS[0].to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config
                .gemini_model()
                .trim_start_matches("models/")
                .to_string(),
            endpoint: config.gemini_endpoint.trim_end_matches('/').to_string(),
            timeout_secs: config.api_timeout_secs,
            generation: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    /// Full URL of the `generateContent` method for this model.
    pub fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, DispatchError> {
        let body = request_body(request, &self.generation);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    DispatchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!("Gemini returned HTTP {}", status.as_u16());
            return Err(DispatchError::from_status(
                PROVIDER,
                status.as_u16(),
                error_message(&text),
                retry_after_secs,
            ));
        }

        let reply = parse_reply(&text)?;
        debug!(
            "Gemini: {} prompt tokens, {} completion tokens",
            reply.prompt_tokens, reply.completion_tokens
        );
        Ok(reply)
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_output_tokens.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

fn request_body<'a>(
    request: &'a ModelRequest,
    generation: &'a GenerationConfig,
) -> GenerateContentRequest<'a> {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart::Text { text },
            Part::Image(img) => WirePart::InlineData {
                inline_data: InlineData {
                    mime_type: &img.mime_type,
                    data: &img.data,
                },
            },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: (!generation.is_empty()).then_some(generation),
    }
}

/// Extract the generated text from a successful response body.
fn parse_reply(body: &str) -> Result<ModelReply, DispatchError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| DispatchError::Transport(format!("invalid response body: {e}")))?;

    let usage = parsed.usage_metadata.unwrap_or_default();

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(match parsed.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => DispatchError::Blocked { reason },
            None => DispatchError::EmptyResponse,
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                DispatchError::Blocked { reason }
            }
            _ => DispatchError::EmptyResponse,
        });
    }

    Ok(ModelReply {
        text,
        prompt_tokens: usage.prompt_token_count,
        completion_tokens: usage.candidates_token_count,
    })
}

/// Best-effort human-readable message from an error response body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => match env.error.status {
            Some(status) if !env.error.message.is_empty() => {
                format!("{}: {}", status, env.error.message)
            }
            Some(status) => status,
            None => env.error.message,
        },
        Err(_) => body.trim().chars().take(300).collect(),
    }
}

//! Result types returned by a successful analysis.

use crate::prompts::Action;
use serde::{Deserialize, Serialize};

/// The model's answer to one action, plus bookkeeping.
///
/// `text` is exactly what the model returned; callers render it as Markdown
/// without parsing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub action: Action,
    pub text: String,
    /// Backend name, e.g. `gemini`.
    pub provider: String,
    /// Model identifier the request was sent to.
    pub model: String,
    pub stats: AnalysisStats,
}

/// Timing and usage figures for one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Pages in the uploaded PDF (only the first was sent).
    pub page_count: usize,
    /// Rendered page size in pixels.
    pub image_width: u32,
    pub image_height: u32,
    /// Size of the JPEG sent to the model.
    pub image_bytes: usize,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub render_duration_ms: u64,
    pub dispatch_duration_ms: u64,
    pub total_duration_ms: u64,
}

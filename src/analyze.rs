//! Analysis entry points: one pipeline, parameterised over [`Action`].
//!
//! [`Analyzer`] is the session-independent handle a shell holds on to. It is
//! built once at start-up (resolving the model backend and its credential)
//! and then serves any number of requests; it holds no per-request state, so
//! an `Arc<Analyzer>` can be shared by concurrent sessions.

use crate::backend::gemini::GeminiBackend;
use crate::backend::provider::ProviderBackend;
use crate::backend::ModelBackend;
use crate::config::AnalyzerConfig;
use crate::document::{ImagePayload, ResumeDocument};
use crate::error::{AtsError, ConfigError};
use crate::output::{Analysis, AnalysisStats};
use crate::pipeline::{encode, input, llm, render};
use crate::prompts::{instruction_for, Action};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// First page of a resume, encoded, with the figures reported in stats.
struct ConvertedPage {
    payload: ImagePayload,
    width: u32,
    height: u32,
    page_count: usize,
    jpeg_len: usize,
}

/// Convert the first page of a PDF into an [`ImagePayload`].
///
/// Later pages are ignored. Fails with [`AtsError::Conversion`] for empty,
/// non-PDF, encrypted or unparseable input.
///
/// # Example
/// ```rust,no_run
/// use ats_checker::{convert_first_page, AnalyzerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("resume.pdf")?;
/// let payload = convert_first_page(&bytes, &AnalyzerConfig::default()).await?;
/// assert_eq!(payload.mime_type, "image/jpeg");
/// # Ok(())
/// # }
/// ```
pub async fn convert_first_page(
    resume_bytes: &[u8],
    config: &AnalyzerConfig,
) -> Result<ImagePayload, AtsError> {
    Ok(convert_page(resume_bytes, config).await?.payload)
}

async fn convert_page(resume_bytes: &[u8], config: &AnalyzerConfig) -> Result<ConvertedPage, AtsError> {
    input::validate_pdf_bytes(resume_bytes)?;

    let rendered = render::render_first_page(resume_bytes, config).await?;
    let payload = encode::encode_page(&rendered.image, config.jpeg_quality).map_err(|e| {
        crate::error::ConversionError::EncodingFailed {
            detail: e.to_string(),
        }
    })?;

    // base64 length → raw length: 4 chars per 3 bytes, minus padding.
    let padding = payload.data.bytes().rev().take_while(|b| *b == b'=').count();
    let jpeg_len = payload.data.len() / 4 * 3 - padding;

    Ok(ConvertedPage {
        width: rendered.image.width(),
        height: rendered.image.height(),
        page_count: rendered.page_count,
        jpeg_len,
        payload,
    })
}

/// Explicitly constructed analysis handle.
pub struct Analyzer {
    backend: Arc<dyn ModelBackend>,
    config: AnalyzerConfig,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("backend", &self.backend.name())
            .field("model", &self.backend.model())
            .field("config", &self.config)
            .finish()
    }
}

impl Analyzer {
    /// Resolve the backend described by `config`.
    ///
    /// Fails fast with [`AtsError::Config`] when the credential is missing.
    pub fn new(config: AnalyzerConfig) -> Result<Self, AtsError> {
        let backend = resolve_backend(&config)?;
        info!("Model backend: {} ({})", backend.name(), backend.model());
        Ok(Self { backend, config })
    }

    /// [`AnalyzerConfig::from_env`] followed by [`Analyzer::new`].
    pub fn from_env() -> Result<Self, AtsError> {
        Self::new(AnalyzerConfig::from_env()?)
    }

    /// Use `backend` regardless of what `config` names.
    pub fn with_backend(backend: Arc<dyn ModelBackend>, config: AnalyzerConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run one action against the current job description and resume.
    ///
    /// The resume is re-rendered on every call. `None` means nothing was
    /// uploaded: the result is [`AtsError::MissingInput`] and the backend is
    /// not contacted. On success the model's text is returned verbatim; on
    /// failure no text is returned at all.
    pub async fn analyze(
        &self,
        job_description: &str,
        resume: Option<&ResumeDocument>,
        action: Action,
    ) -> Result<Analysis, AtsError> {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_analysis_start(action);
        }

        let result = self.run(job_description, resume, action).await;

        match &result {
            Ok(analysis) => {
                info!(
                    "{}: {} chars in {}ms",
                    action,
                    analysis.text.len(),
                    analysis.stats.total_duration_ms
                );
                if let Some(cb) = cb {
                    cb.on_analysis_complete(action, analysis.text.len());
                }
            }
            Err(e) => {
                warn!("{}: {}", action, e);
                if let Some(cb) = cb {
                    cb.on_analysis_error(action, &e.to_string());
                }
            }
        }

        result
    }

    /// Synchronous wrapper around [`Analyzer::analyze`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn analyze_sync(
        &self,
        job_description: &str,
        resume: Option<&ResumeDocument>,
        action: Action,
    ) -> Result<Analysis, AtsError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| AtsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.analyze(job_description, resume, action))
    }

    async fn run(
        &self,
        job_description: &str,
        resume: Option<&ResumeDocument>,
        action: Action,
    ) -> Result<Analysis, AtsError> {
        let total_start = Instant::now();
        let resume = resume.ok_or(AtsError::MissingInput)?;
        info!(
            "{}: analysing {} ({} bytes)",
            action,
            resume.name().unwrap_or("resume"),
            resume.len()
        );

        // ── Step 1: First page → JPEG payload ────────────────────────────────
        let render_start = Instant::now();
        let page = convert_page(resume.bytes(), &self.config).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        debug!(
            "Page 1 of {}: {}x{} px, {} bytes JPEG in {}ms",
            page.page_count, page.width, page.height, page.jpeg_len, render_duration_ms
        );
        if let Some(cb) = &self.config.progress_callback {
            cb.on_page_rendered(page.width, page.height, page.jpeg_len);
        }

        // ── Step 2: Instruction lookup ───────────────────────────────────────
        let instruction = instruction_for(action);

        // ── Step 3: Single remote call ───────────────────────────────────────
        if let Some(cb) = &self.config.progress_callback {
            cb.on_dispatch_start(action, self.backend.model());
        }
        let dispatch_start = Instant::now();
        let reply = llm::dispatch(
            self.backend.as_ref(),
            job_description,
            page.payload,
            instruction,
            self.config.api_timeout_secs,
        )
        .await?;
        let dispatch_duration_ms = dispatch_start.elapsed().as_millis() as u64;

        Ok(Analysis {
            action,
            text: reply.text,
            provider: self.backend.name().to_string(),
            model: self.backend.model().to_string(),
            stats: AnalysisStats {
                page_count: page.page_count,
                image_width: page.width,
                image_height: page.height,
                image_bytes: page.jpeg_len,
                prompt_tokens: reply.prompt_tokens,
                completion_tokens: reply.completion_tokens,
                render_duration_ms,
                dispatch_duration_ms,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
            },
        })
    }
}

/// Resolve the model backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`): used as-is; this is how tests
///    and embedding applications inject their own client.
/// 2. **Named non-Gemini provider** (`config.provider_name`): built through
///    edgequake-llm's `ProviderFactory`, which reads that provider's key.
/// 3. **Gemini** (default): requires `config.api_key`.
fn resolve_backend(config: &AnalyzerConfig) -> Result<Arc<dyn ModelBackend>, ConfigError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if !config.uses_gemini() {
        if let Some(ref name) = config.provider_name {
            return Ok(Arc::new(ProviderBackend::from_config(name, config)?));
        }
    }

    Ok(Arc::new(GeminiBackend::from_config(config)?))
}

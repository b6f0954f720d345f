//! # ats-checker
//!
//! Check a PDF resume against a job description with a multimodal LLM.
//!
//! The resume's first page is rasterised and sent as an image together with
//! the job description and one of four instruction templates; the model's
//! answer comes back as free-form Markdown.
//!
//! ## Pipeline Overview
//!
//! ```text
//! resume.pdf (bytes)
//!  │
//!  ├─ 1. Input    reject empty / non-PDF uploads
//!  ├─ 2. Render   rasterise page 1 via pdfium (spawn_blocking)
//!  ├─ 3. Encode   RGB → JPEG → base64 ImagePayload
//!  ├─ 4. Prompt   pick the instruction template for the Action
//!  └─ 5. Model    one request: [job description, image, instruction]
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ats_checker::{Action, Analyzer, ResumeDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Gemini key from GOOGLE_API_KEY; fails here, not on first use, if unset.
//!     let analyzer = Analyzer::from_env()?;
//!     let resume = ResumeDocument::from_path("resume.pdf").await?;
//!     let analysis = analyzer
//!         .analyze("Senior Data Analyst, SQL, Python required", Some(&resume), Action::PercentageMatch)
//!         .await?;
//!     println!("{}", analysis.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Actions
//!
//! | Action | Output |
//! |--------|--------|
//! | [`Action::AboutResume`] | Strengths and weaknesses against the role |
//! | [`Action::PercentageMatch`] | Percentage, missing keywords, final thoughts |
//! | [`Action::ImproveSkills`] | Skill gaps and what to learn |
//! | [`Action::MissingKeywords`] | Missing keywords and why they matter |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ats-check` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{convert_first_page, Analyzer};
pub use backend::{ModelBackend, ModelReply, ModelRequest, Part};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use document::{ImagePayload, ResumeDocument, JPEG_MIME};
pub use error::{AtsError, ConfigError, ConversionError, DispatchError};
pub use output::{Analysis, AnalysisStats};
pub use pipeline::llm::dispatch;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{instruction_for, Action};

//! Configuration for resume analysis.
//!
//! Every knob lives in [`AnalyzerConfig`], built through
//! [`AnalyzerConfigBuilder`] or read from the process environment with
//! [`AnalyzerConfig::from_env`]. The credential is resolved here, once, so a
//! missing key fails at start-up instead of on the first button press.

use crate::backend::ModelBackend;
use crate::error::ConfigError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the caller nor `ATS_MODEL` names one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Base URL of the Generative Language API.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the Gemini credential, in order.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Configuration for an [`crate::Analyzer`].
///
/// # Example
/// ```rust
/// use ats_checker::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("test-key")
///     .dpi(150)
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Rendering DPI for the first page. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Cap on the longest edge of the rendered page, in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// JPEG quality (1–100). Default: 75.
    pub jpeg_quality: u8,

    /// User password for encrypted resumes.
    pub password: Option<String>,

    /// Directory holding the pdfium shared library. If None, the system
    /// library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Model identifier. If None, [`DEFAULT_GEMINI_MODEL`] for Gemini or the
    /// provider's own default.
    pub model: Option<String>,

    /// Backend name: `gemini` (default) or any edgequake-llm provider name
    /// (`openai`, `anthropic`, `ollama`, …).
    pub provider_name: Option<String>,

    /// Pre-constructed backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn ModelBackend>>,

    /// Gemini API key.
    pub api_key: Option<String>,

    /// Gemini base URL. Default: [`DEFAULT_GEMINI_ENDPOINT`].
    pub gemini_endpoint: String,

    /// Sampling temperature. If None, the provider default.
    pub temperature: Option<f32>,

    /// Output token cap. If None, the provider default.
    pub max_output_tokens: Option<usize>,

    /// Per-dispatch timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional stage-progress listener.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2000,
            jpeg_quality: 75,
            password: None,
            pdfium_lib_path: None,
            model: None,
            provider_name: None,
            backend: None,
            api_key: None,
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            temperature: None,
            max_output_tokens: None,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_endpoint", &self.gemini_endpoint)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GOOGLE_API_KEY`, then `GEMINI_API_KEY` | `api_key` |
    /// | `ATS_MODEL` | `model` |
    /// | `ATS_PROVIDER` | `provider_name` |
    /// | `ATS_GEMINI_ENDPOINT` | `gemini_endpoint` |
    /// | `ATS_API_TIMEOUT` | `api_timeout_secs` |
    /// | `PDFIUM_LIB_PATH` | `pdfium_lib_path` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::env_builder()?.build()
    }

    /// Like [`AnalyzerConfig::from_env`] but reading from any lookup function.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        AnalyzerConfigBuilder::from_vars(lookup)?.build()
    }

    /// A builder seeded from the process environment, for callers that layer
    /// their own overrides (command-line flags) on top before validating.
    pub fn env_builder() -> Result<AnalyzerConfigBuilder, ConfigError> {
        AnalyzerConfigBuilder::from_vars(|key| std::env::var(key).ok())
    }

    /// True when the Gemini REST backend is selected.
    pub fn uses_gemini(&self) -> bool {
        self.provider_name
            .as_deref()
            .map_or(true, |p| p.eq_ignore_ascii_case("gemini") || p.eq_ignore_ascii_case("google"))
    }

    /// Model identifier actually sent to Gemini.
    pub fn gemini_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }
}

/// Builder for [`AnalyzerConfig`].
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl fmt::Debug for AnalyzerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalyzerConfigBuilder {
    /// Seed a builder from environment-style lookups. Blank values are
    /// treated as unset; range checks happen in [`AnalyzerConfigBuilder::build`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = AnalyzerConfig::builder();

        if let Some(key) = API_KEY_VARS.iter().find_map(|var| get(*var)) {
            builder = builder.api_key(key);
        }
        if let Some(model) = get("ATS_MODEL") {
            builder = builder.model(model);
        }
        if let Some(provider) = get("ATS_PROVIDER") {
            builder = builder.provider_name(provider);
        }
        if let Some(endpoint) = get("ATS_GEMINI_ENDPOINT") {
            builder = builder.gemini_endpoint(endpoint);
        }
        if let Some(secs) = get("ATS_API_TIMEOUT") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                ConfigError::Invalid(format!("ATS_API_TIMEOUT must be whole seconds, got '{secs}': {e}"))
            })?;
            builder = builder.api_timeout_secs(secs);
        }
        if let Some(dir) = get("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_lib_path(dir);
        }

        Ok(builder)
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn gemini_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_endpoint = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, ConfigError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(ConfigError::Invalid(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.max_rendered_pixels < 100 {
            return Err(ConfigError::Invalid(format!(
                "Maximum rendered size must be at least 100 px, got {}",
                c.max_rendered_pixels
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ConfigError::Invalid(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if let Some(t) = c.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "Temperature must be 0.0–2.0, got {t}"
                )));
            }
        }
        if c.api_timeout_secs == 0 {
            return Err(ConfigError::Invalid("API timeout must be ≥ 1 second".into()));
        }
        if c.gemini_endpoint.is_empty() {
            return Err(ConfigError::Invalid("Gemini endpoint must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.jpeg_quality, 75);
        assert_eq!(c.api_timeout_secs, 60);
        assert!(c.uses_gemini());
        assert_eq!(c.gemini_model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn out_of_range_values_rejected() {
        let err = AnalyzerConfig::builder().dpi(10).build().unwrap_err();
        assert!(err.to_string().contains("DPI"), "{err}");

        let err = AnalyzerConfig::builder().dpi(401).build().unwrap_err();
        assert!(err.to_string().contains("DPI"), "{err}");

        let err = AnalyzerConfig::builder().jpeg_quality(0).build().unwrap_err();
        assert!(err.to_string().contains("JPEG quality"), "{err}");

        let err = AnalyzerConfig::builder().jpeg_quality(101).build().unwrap_err();
        assert!(err.to_string().contains("JPEG quality"), "{err}");

        let err = AnalyzerConfig::builder().temperature(9.0).build().unwrap_err();
        assert!(err.to_string().contains("Temperature"), "{err}");

        let err = AnalyzerConfig::builder().max_rendered_pixels(10).build().unwrap_err();
        assert!(err.to_string().contains("100 px"), "{err}");
    }

    #[test]
    fn boundary_values_accepted() {
        let c = AnalyzerConfig::builder()
            .dpi(72)
            .jpeg_quality(100)
            .temperature(0.0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 72);
        assert_eq!(c.jpeg_quality, 100);
        assert_eq!(c.temperature, Some(0.0));
    }

    #[test]
    fn env_builder_takes_overrides_before_validation() {
        let c = AnalyzerConfigBuilder::from_vars(vars(&[("ATS_MODEL", "from-env")]))
            .unwrap()
            .model("from-flag")
            .dpi(150)
            .build()
            .unwrap();
        assert_eq!(c.model.as_deref(), Some("from-flag"));
        assert_eq!(c.dpi, 150);

        let err = AnalyzerConfigBuilder::from_vars(vars(&[]))
            .unwrap()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = AnalyzerConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn env_prefers_google_key() {
        let c = AnalyzerConfig::from_vars(vars(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("GEMINI_API_KEY", "other"),
        ]))
        .unwrap();
        assert_eq!(c.api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn env_falls_back_to_gemini_key() {
        let c = AnalyzerConfig::from_vars(vars(&[
            ("GOOGLE_API_KEY", "  "),
            ("GEMINI_API_KEY", "gm-key"),
        ]))
        .unwrap();
        assert_eq!(c.api_key.as_deref(), Some("gm-key"));
    }

    #[test]
    fn env_overrides() {
        let c = AnalyzerConfig::from_vars(vars(&[
            ("ATS_MODEL", "gemini-2.0-flash"),
            ("ATS_PROVIDER", "openai"),
            ("ATS_GEMINI_ENDPOINT", "http://localhost:8080/"),
            ("ATS_API_TIMEOUT", "15"),
            ("PDFIUM_LIB_PATH", "/opt/pdfium/lib"),
        ]))
        .unwrap();
        assert_eq!(c.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(!c.uses_gemini());
        assert_eq!(c.gemini_endpoint, "http://localhost:8080");
        assert_eq!(c.api_timeout_secs, 15);
        assert_eq!(c.pdfium_lib_path, Some(PathBuf::from("/opt/pdfium/lib")));
        assert!(c.api_key.is_none());
    }

    #[test]
    fn env_bad_timeout() {
        let err = AnalyzerConfig::from_vars(vars(&[("ATS_API_TIMEOUT", "soon")])).unwrap_err();
        assert!(err.to_string().contains("ATS_API_TIMEOUT"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = AnalyzerConfig::builder()
            .api_key("super-secret")
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(!dbg.contains("hunter2"));
    }
}

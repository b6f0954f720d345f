//! Error types for the ats-checker library.
//!
//! One enum per pipeline stage, wrapped by a single top-level type:
//!
//! * [`ConversionError`]: the uploaded bytes could not be turned into an
//!   [`crate::document::ImagePayload`] (not a PDF, corrupt, no pages, …).
//! * [`DispatchError`]: the remote model call failed (network, auth, rate
//!   limit, timeout, empty output).
//! * [`ConfigError`]: the analyzer could not be constructed (missing API
//!   key, out-of-range setting). Raised at start-up, never mid-request.
//! * [`AtsError`]: what [`crate::Analyzer::analyze`] returns; adds
//!   [`AtsError::MissingInput`] for an action triggered with no resume.
//!
//! Every variant carries a message fit to show the user as-is. None of them
//! is fatal to the session: the shell prints it and waits for the next action.

use thiserror::Error;

/// Top-level error returned by one analysis request.
#[derive(Debug, Error)]
pub enum AtsError {
    /// An action was triggered before a resume was uploaded.
    #[error("No resume uploaded. Please upload a PDF.")]
    MissingInput,

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unexpected internal error (task join failure etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The resume could not be rasterised into an image payload.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Zero-length upload.
    #[error("The uploaded file is empty.")]
    EmptyInput,

    /// The bytes do not start with the `%PDF` signature.
    #[error("The uploaded file is not a valid PDF (first bytes: {magic:?}).")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium could not parse the document.
    #[error("The PDF could not be read: {detail}")]
    CorruptPdf { detail: String },

    /// Encrypted document and no password configured.
    #[error("The PDF is encrypted and requires a password.")]
    PasswordRequired,

    /// Encrypted document and the configured password is wrong.
    #[error("Wrong password for the encrypted PDF.")]
    WrongPassword,

    /// The document parsed but contains no pages.
    #[error("The PDF has no pages.")]
    EmptyDocument,

    /// pdfium failed to render the first page.
    #[error("Rendering the first page failed: {detail}")]
    RasterisationFailed { detail: String },

    /// The rendered page could not be encoded as JPEG.
    #[error("Encoding the first page as JPEG failed: {detail}")]
    EncodingFailed { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or set PDFIUM_LIB_PATH to the directory\n\
containing it (libpdfium.so / libpdfium.dylib / pdfium.dll).\n\
Prebuilt binaries: https://github.com/bblanchon/pdfium-binaries"
    )]
    PdfiumBindingFailed(String),
}

/// The remote model call failed.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Connection refused, DNS failure, TLS error, malformed response body.
    #[error("Could not reach the model endpoint: {0}")]
    Transport(String),

    /// The provider rejected the credential (HTTP 401/403).
    #[error("Authentication error from provider '{provider}': {detail}")]
    Auth { provider: String, detail: String },

    /// HTTP 429.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success response.
    #[error("Model API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The call did not finish within the configured timeout.
    #[error("Model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider refused to answer (safety filters).
    #[error("The model declined to answer: {reason}")]
    Blocked { reason: String },

    /// The call succeeded but produced no text.
    #[error("The model returned an empty response")]
    EmptyResponse,
}

/// The analyzer configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No credential for the selected backend.
    #[error("Missing API key: set {var} (or put it in a .env file).")]
    MissingApiKey { var: String },

    /// A provider name could not be turned into a backend.
    #[error("Model provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl DispatchError {
    /// Map an HTTP status code and body message to a dispatch error.
    pub fn from_status(
        provider: &str,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    ) -> Self {
        match status {
            401 | 403 => DispatchError::Auth {
                provider: provider.to_string(),
                detail: message,
            },
            429 => DispatchError::RateLimited {
                provider: provider.to_string(),
                retry_after_secs,
            },
            _ => DispatchError::Api { status, message },
        }
    }
}

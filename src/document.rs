//! In-memory inputs and payloads of one analysis request.

use crate::error::ConversionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mime type of every [`ImagePayload`].
pub const JPEG_MIME: &str = "image/jpeg";

/// Raw bytes of an uploaded resume PDF.
///
/// Held in memory only; the pipeline reads it through a byte slice and
/// never writes it to disk.
#[derive(Clone)]
pub struct ResumeDocument {
    bytes: Vec<u8>,
    name: Option<String>,
}

impl ResumeDocument {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            name: None,
        }
    }

    /// Attach a display name (usually the uploaded file name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a resume from a local file.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let doc = Self::from_bytes(bytes);
        Ok(match path.file_name() {
            Some(name) => doc.with_name(name.to_string_lossy()),
            None => doc,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ResumeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// First page of a resume as a base64 JPEG, ready for a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Always [`JPEG_MIME`].
    pub mime_type: String,
    /// Standard-alphabet, padded base64 of the JPEG bytes.
    pub data: String,
}

impl ImagePayload {
    /// Wrap raw JPEG bytes.
    pub fn from_jpeg(jpeg: &[u8]) -> Self {
        Self {
            mime_type: JPEG_MIME.to_string(),
            data: STANDARD.encode(jpeg),
        }
    }

    /// Decode back to the JPEG bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ConversionError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| ConversionError::EncodingFailed {
                detail: e.to_string(),
            })
    }
}

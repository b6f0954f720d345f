//! Upload validation.
//!
//! pdfium reports garbage input with an opaque error code. Checking the
//! `%PDF` signature first gives the user a clear message and keeps obviously
//! wrong uploads (a .docx renamed to .pdf, an empty file) away from the
//! native library entirely.

use crate::error::ConversionError;
use tracing::debug;

/// The four bytes every PDF starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Validate that `bytes` look like a PDF document.
pub fn validate_pdf_bytes(bytes: &[u8]) -> Result<(), ConversionError> {
    if bytes.is_empty() {
        return Err(ConversionError::EmptyInput);
    }

    // Tolerate leading whitespace or a UTF-8 BOM some exporters emit.
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace() && *b != 0xEF && *b != 0xBB && *b != 0xBF)
        .unwrap_or(bytes.len());
    let head = &bytes[start..];

    if !head.starts_with(PDF_MAGIC) {
        let magic = bytes.iter().take(4).copied().collect();
        return Err(ConversionError::NotAPdf { magic });
    }

    debug!("Resume upload: {} bytes, PDF signature ok", bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_upload() {
        assert!(matches!(validate_pdf_bytes(&[]), Err(ConversionError::EmptyInput)));
    }

    #[test]
    fn accepts_pdf_header() {
        assert!(validate_pdf_bytes(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n").is_ok());
        assert!(validate_pdf_bytes(b"\r\n%PDF-1.4").is_ok());
    }

    #[test]
    fn rejects_other_formats() {
        match validate_pdf_bytes(b"PK\x03\x04word/document.xml") {
            Err(ConversionError::NotAPdf { magic }) => assert_eq!(magic, b"PK\x03\x04".to_vec()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn short_garbage() {
        assert!(matches!(
            validate_pdf_bytes(b"%P"),
            Err(ConversionError::NotAPdf { .. })
        ));
        assert!(matches!(
            validate_pdf_bytes(b"   "),
            Err(ConversionError::NotAPdf { .. })
        ));
    }
}

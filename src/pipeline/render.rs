//! PDF rasterisation: render page 0 of an in-memory PDF via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is CPU-bound. Rendering runs on Tokio's blocking pool so one
//! session rasterising a resume never stalls another session's request.
//!
//! Only the first page is ever rendered. Later pages are neither rasterised
//! nor inspected, so they cannot influence the payload.
//!
//! ## One binding per process
//!
//! `Pdfium::new` initialises the library's process-wide state and dropping a
//! `Pdfium` destroys it, even while another instance is mid-render. The
//! binding is therefore created once, on first use, and never dropped.

use crate::config::AnalyzerConfig;
use crate::error::{AtsError, ConversionError};
use image::DynamicImage;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// The rasterised first page plus the document's page count.
#[derive(Debug)]
pub struct RenderedPage {
    pub image: DynamicImage,
    pub page_count: usize,
}

/// Rasterise the first page of `pdf_bytes`.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_first_page(
    pdf_bytes: &[u8],
    config: &AnalyzerConfig,
) -> Result<RenderedPage, AtsError> {
    let bytes = pdf_bytes.to_vec();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let lib_dir = config.pdfium_lib_path.clone();

    let result = tokio::task::spawn_blocking(move || {
        render_first_page_blocking(&bytes, dpi, max_pixels, password.as_deref(), lib_dir.as_deref())
    })
    .await
    .map_err(|e| AtsError::Internal(format!("Render task panicked: {}", e)))?;

    Ok(result?)
}

static PDFIUM: OnceCell<Pdfium> = OnceCell::new();

/// The process-wide pdfium binding, created on first call.
///
/// The first successful call decides which library is loaded: `lib_dir` when
/// given, else the working directory, else the system library search path.
/// A failed bind is not cached, so a later call may still succeed.
pub fn shared_pdfium(lib_dir: Option<&Path>) -> Result<&'static Pdfium, ConversionError> {
    PDFIUM.get_or_try_init(|| {
        let pdfium = bind_pdfium(lib_dir)?;
        info!("pdfium bound");
        Ok(pdfium)
    })
}

fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, ConversionError> {
    let bindings = match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ConversionError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of first-page rendering.
fn render_first_page_blocking(
    pdf_bytes: &[u8],
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    lib_dir: Option<&Path>,
) -> Result<RenderedPage, ConversionError> {
    let pdfium = shared_pdfium(lib_dir)?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ConversionError::WrongPassword
                } else {
                    ConversionError::PasswordRequired
                }
            } else {
                ConversionError::CorruptPdf { detail: err_str }
            }
        })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages, rendering page 1", page_count);

    if page_count == 0 {
        return Err(ConversionError::EmptyDocument);
    }

    let page = pages
        .get(0)
        .map_err(|e| ConversionError::RasterisationFailed {
            detail: format!("{:?}", e),
        })?;

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ConversionError::RasterisationFailed {
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

    Ok(RenderedPage { image, page_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_is_shared() {
        let Ok(first) = shared_pdfium(None) else {
            println!("SKIP: pdfium library not found");
            return;
        };
        let second = shared_pdfium(None).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn concurrent_first_use_binds_once() {
        if shared_pdfium(None).is_err() {
            println!("SKIP: pdfium library not found");
            return;
        }
        let addrs: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| shared_pdfium(None).map(|p| p as *const Pdfium as usize)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}

//! Image encoding: `DynamicImage` → base64 JPEG wrapped in [`ImagePayload`].
//!
//! JPEG has no alpha channel, and pdfium bitmaps come back as RGBA, so the
//! page is flattened to RGB before encoding. A rendered resume page is mostly
//! white space and text; at the default quality (75) the JPEG stays in the
//! low hundreds of kilobytes while remaining legible to a vision model.

use crate::document::ImagePayload;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode a rasterised page as a base64 JPEG ready for the model request.
pub fn encode_page(img: &DynamicImage, quality: u8) -> Result<ImagePayload, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;

    let payload = ImagePayload::from_jpeg(&buf);
    debug!(
        "Encoded page → {} bytes JPEG, {} bytes base64",
        buf.len(),
        payload.data.len()
    );

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let data = encode_page(&img, 75).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = data.decode().expect("valid base64");
        // JPEG SOI marker
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 48, |x, y| {
            Rgba([(x * 8) as u8, (y * 5) as u8, 128, 255])
        }));
        assert_eq!(encode_page(&img, 80).unwrap(), encode_page(&img, 80).unwrap());
    }

    #[test]
    fn lower_quality_is_smaller() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([((x ^ y) * 4) as u8, (x * 4) as u8, (y * 4) as u8, 255])
        }));
        let hi = encode_page(&img, 95).unwrap().decode().unwrap();
        let lo = encode_page(&img, 10).unwrap().decode().unwrap();
        assert!(lo.len() < hi.len(), "lo={} hi={}", lo.len(), hi.len());
    }

    #[test]
    fn decodes_back_to_same_dimensions() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(17, 23, Rgba([0, 0, 0, 255])));
        let jpeg = encode_page(&img, 75).unwrap().decode().unwrap();
        let round = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).unwrap();
        assert_eq!((round.width(), round.height()), (17, 23));
    }
}

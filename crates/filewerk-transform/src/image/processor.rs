// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, resize, and encode in-memory images using the
// `image` crate (JPEG, PNG) and `webp` (lossy WebP).

use filewerk_core::error::{FilewerkError, Result};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use tracing::{debug, instrument};

/// A single decoded image.
///
/// ```ignore
/// let png = ImageProcessor::from_bytes(&bytes)?
///     .resized(800, 600)
///     .to_png_bytes()?;
/// ```
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// The decoded pixel surface.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, WebP, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| FilewerkError::Decode {
            file: "<memory>".into(),
            detail: err.to_string(),
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Transformations ------------------------------------------------------

    /// A copy resized to exactly `width` x `height` (Lanczos3).
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let resized = self
            .image
            .resize_exact(width.max(1), height.max(1), FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as PNG with the strongest compression.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
        self.image.write_with_encoder(encoder).map_err(|err| FilewerkError::Encode {
            format: "PNG",
            detail: err.to_string(),
        })?;
        Ok(buffer)
    }

    /// Encode as JPEG with the given quality (1-100). Alpha is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| FilewerkError::Encode {
            format: "JPEG",
            detail: err.to_string(),
        })?;
        Ok(buffer)
    }

    /// Encode as lossy WebP with the given quality (0-100).
    pub fn to_webp_bytes(&self, quality: f32) -> Result<Vec<u8>> {
        let rgba = self.image.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
        let memory = encoder
            .encode_simple(false, quality.clamp(0.0, 100.0))
            .map_err(|err| FilewerkError::Encode {
                format: "WebP",
                detail: format!("{:?}", err),
            })?;
        Ok(memory.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> ImageProcessor {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        });
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let png = gradient(40, 30).to_png_bytes().unwrap();
        let decoded = ImageProcessor::from_bytes(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let processor = gradient(128, 128);
        let high = processor.to_jpeg_bytes(95).unwrap();
        let low = processor.to_jpeg_bytes(10).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn jpeg_accepts_alpha_input() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 128]));
        let processor = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(img));
        assert!(!processor.to_jpeg_bytes(80).unwrap().is_empty());
    }

    #[test]
    fn webp_output_decodes() {
        let webp = gradient(64, 48).to_webp_bytes(80.0).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        let decoded = ImageProcessor::from_bytes(&webp).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn resized_never_collapses_to_zero() {
        let small = gradient(10, 10).resized(0, 3);
        assert_eq!((small.width(), small.height()), (1, 3));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"definitely not an image"),
            Err(FilewerkError::Decode { .. })
        ));
    }
}

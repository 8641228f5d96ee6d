// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Size-targeted recompression — decodes an image, converts it to the target
// codec, and runs the byte-budget search over real encoders.

use filewerk_core::TransformConfig;
use filewerk_core::error::{FilewerkError, Result};
use filewerk_core::types::{ImageTarget, InputFile, OutputFile};
use tracing::{info, instrument};

use super::processor::ImageProcessor;
use super::search::{Encode, SearchOutcome, SizeSearch};

/// [`Encode`] backend over a decoded image.
///
/// Rescales always start from the native image, never from an earlier
/// downscaled surface.
pub struct CodecSurface {
    native: ImageProcessor,
    current: Option<ImageProcessor>,
    target: ImageTarget,
}

impl CodecSurface {
    pub fn new(native: ImageProcessor, target: ImageTarget) -> Self {
        Self {
            native,
            current: None,
            target,
        }
    }

    /// Dimensions of the surface the next encode will use.
    pub fn dimensions(&self) -> (u32, u32) {
        let surface = self.surface();
        (surface.width(), surface.height())
    }

    fn surface(&self) -> &ImageProcessor {
        self.current.as_ref().unwrap_or(&self.native)
    }
}

impl Encode for CodecSurface {
    fn encode(&mut self, quality: f32) -> Result<Vec<u8>> {
        let surface = self.surface();
        match self.target {
            ImageTarget::Png => surface.to_png_bytes(),
            ImageTarget::Jpeg => {
                let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
                surface.to_jpeg_bytes(q)
            }
            ImageTarget::WebP => surface.to_webp_bytes(quality * 100.0),
        }
    }

    fn rescale(&mut self, scale: f64) -> Result<()> {
        let width = (self.native.width() as f64 * scale).round() as u32;
        let height = (self.native.height() as f64 * scale).round() as u32;
        self.current = Some(self.native.resized(width, height));
        Ok(())
    }
}

/// Recompress one image under `config.byte_budget`.
///
/// The output keeps the source's base name with the target's extension.
/// The budget is a target: a pathological image may still exceed it after
/// the downscale fallback.
#[instrument(skip_all, fields(file = %file.name, bytes = file.size(), target = target.name()))]
pub fn recompress(file: &InputFile, target: ImageTarget, config: &TransformConfig) -> Result<OutputFile> {
    let native = ImageProcessor::from_bytes(&file.bytes).map_err(|err| match err {
        FilewerkError::Decode { detail, .. } => FilewerkError::Decode {
            file: file.name.clone(),
            detail,
        },
        other => other,
    })?;
    let (width, height) = (native.width(), native.height());

    let mut surface = CodecSurface::new(native, target);
    let SearchOutcome {
        bytes,
        quality,
        scale,
        encodes,
    } = SizeSearch::new(config).run(&mut surface, target)?;
    let (out_width, out_height) = surface.dimensions();

    info!(
        from = %format!("{width}x{height}"),
        to = %format!("{out_width}x{out_height}"),
        quality,
        scale,
        encodes,
        output_bytes = bytes.len(),
        "Image recompressed"
    );

    let name = format!("{}.{}", file.base_name(), target.extension());
    Ok(OutputFile::new(name, bytes))
}

/// Recompress `files` one after another.
///
/// Each output is handed to `on_output` before the next file starts. The
/// first failure stops the batch; outputs already delivered stay delivered.
pub async fn recompress_batch<F>(
    files: Vec<InputFile>,
    target: ImageTarget,
    config: &TransformConfig,
    mut on_output: F,
) -> Result<usize>
where
    F: FnMut(OutputFile) -> Result<()>,
{
    let mut delivered = 0;
    for file in files {
        let config = config.clone();
        let output = tokio::task::spawn_blocking(move || recompress(&file, target, &config))
            .await
            .map_err(|err| FilewerkError::Task(format!("image worker: {err}")))??;
        on_output(output)?;
        delivered += 1;
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    /// Deterministic high-entropy RGB noise (xorshift), which compresses badly.
    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let img = RgbImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xFF) as u8
            };
            Rgb([next(), next(), next()])
        });
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img))
            .to_png_bytes()
            .unwrap()
    }

    fn decoded_dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = ImageProcessor::from_bytes(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn png_under_budget_keeps_dimensions() {
        let file = InputFile::new("tiny.jpeg", noise_png(32, 24));
        let output = recompress(&file, ImageTarget::Png, &TransformConfig::default()).unwrap();

        assert_eq!(output.name, "tiny.png");
        assert_eq!(decoded_dimensions(&output.bytes), (32, 24));
    }

    #[test]
    fn png_over_budget_is_downscaled_once() {
        let source = noise_png(256, 256);
        let budget = (source.len() / 4) as u64;
        let config = TransformConfig::default().with_byte_budget(budget);

        let file = InputFile::new("noise.png", source);
        let output = recompress(&file, ImageTarget::Png, &config).unwrap();

        let (w, h) = decoded_dimensions(&output.bytes);
        assert!(w < 256 && h < 256);
        assert!(output.bytes.len() < file.bytes.len());
    }

    #[test]
    fn jpeg_search_shrinks_noise_below_baseline() {
        let file = InputFile::new("noise.bmp.png", noise_png(256, 256));
        let baseline = ImageProcessor::from_bytes(&file.bytes)
            .unwrap()
            .to_jpeg_bytes(95)
            .unwrap()
            .len() as u64;
        let config = TransformConfig::default().with_byte_budget(baseline / 3);

        let output = recompress(&file, ImageTarget::Jpeg, &config).unwrap();

        assert_eq!(output.name, "noise.bmp.jpg");
        assert!((output.bytes.len() as u64) < baseline);
        assert_eq!(&output.bytes[0..2], &[0xFFu8, 0xD8]);
    }

    #[test]
    fn webp_target_produces_webp() {
        let file = InputFile::new("photo.png", noise_png(64, 64));
        let output = recompress(&file, ImageTarget::WebP, &TransformConfig::default()).unwrap();
        assert_eq!(output.name, "photo.webp");
        assert_eq!(&output.bytes[8..12], b"WEBP");
    }

    #[test]
    fn rescale_starts_from_native_surface() {
        let native = ImageProcessor::from_bytes(&noise_png(100, 50)).unwrap();
        let mut surface = CodecSurface::new(native, ImageTarget::Png);
        surface.rescale(0.5).unwrap();
        surface.rescale(0.8).unwrap();
        assert_eq!(surface.dimensions(), (80, 40));
    }

    #[test]
    fn undecodable_input_names_the_file() {
        let file = InputFile::new("broken.jpg", b"nope".to_vec());
        match recompress(&file, ImageTarget::Jpeg, &TransformConfig::default()) {
            Err(FilewerkError::Decode { file, .. }) => assert_eq!(file, "broken.jpg"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_delivers_outputs_before_failing() {
        let files = vec![
            InputFile::new("one.png", noise_png(16, 16)),
            InputFile::new("two.png", b"garbage".to_vec()),
            InputFile::new("three.png", noise_png(16, 16)),
        ];
        let mut delivered = Vec::new();
        let result = recompress_batch(
            files,
            ImageTarget::Jpeg,
            &TransformConfig::default(),
            |output| {
                delivered.push(output.name);
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(FilewerkError::Decode { .. })));
        assert_eq!(delivered, vec!["one.jpg"]);
    }

    #[tokio::test]
    async fn batch_processes_in_order() {
        let files = vec![
            InputFile::new("a.png", noise_png(8, 8)),
            InputFile::new("b.png", noise_png(8, 8)),
        ];
        let mut names = Vec::new();
        let count = recompress_batch(files, ImageTarget::Png, &TransformConfig::default(), |o| {
            names.push(o.name);
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(names, vec!["a.png", "b.png"]);
    }
}

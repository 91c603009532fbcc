//! Default optimizer built on the `image` crate.
//!
//! Accepts JPEG and PNG and writes the same format back. Re-encoding always
//! drops metadata. Encoder switches the `image` encoders do not expose
//! (trellis quantization, quantization tables, scan optimization, interlacing)
//! are accepted and ignored.

use std::borrow::Cow;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use super::{ImageHandle, OptimizationOptions, OptimizeError, Optimizer};

/// `image`-crate optimizer for JPEG and PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageEngine;

impl Optimizer for ImageEngine {
    fn open(&self, data: Bytes) -> Result<Box<dyn ImageHandle>, OptimizeError> {
        let format = image::guess_format(&data).map_err(|_| OptimizeError::UnsupportedFormat)?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(OptimizeError::UnsupportedFormat);
        }

        let image = image::load_from_memory_with_format(&data, format)
            .map_err(|e| OptimizeError::Decode(e.to_string()))?;

        tracing::debug!(
            format = ?format,
            width = image.width(),
            height = image.height(),
            "Image opened"
        );

        Ok(Box::new(EngineImage { image, format }))
    }
}

struct EngineImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl ImageHandle for EngineImage {
    fn optimize(&mut self, options: &OptimizationOptions) -> Result<Vec<u8>, OptimizeError> {
        encode(&self.image, self.format, options)
    }

    fn resize(
        &mut self,
        width: u32,
        height: u32,
        options: &OptimizationOptions,
    ) -> Result<Vec<u8>, OptimizeError> {
        let (w, h) = target_dimensions(self.image.width(), self.image.height(), width, height);
        if w == 0 || h == 0 {
            return Err(OptimizeError::Resize(format!("invalid target size {w}x{h}")));
        }

        let resized = self.image.resize_exact(w, h, FilterType::Lanczos3);
        encode(&resized, self.format, options)
    }
}

/// Output size for a resize request.
///
/// Both axes set: fit inside the box keeping the aspect ratio. One axis set:
/// scale the other to match. Neither set: unchanged.
pub fn target_dimensions(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (width, height);
    }

    let scale = |len: u32, ratio: f64| ((f64::from(len) * ratio).round() as u32).max(1);

    match (width, height) {
        (0, 0) => (src_w, src_h),
        (w, 0) => (w, scale(src_h, f64::from(w) / f64::from(src_w))),
        (0, h) => (scale(src_w, f64::from(h) / f64::from(src_h)), h),
        (w, h) => {
            let ratio = (f64::from(w) / f64::from(src_w)).min(f64::from(h) / f64::from(src_h));
            (scale(src_w, ratio).min(w), scale(src_h, ratio).min(h))
        }
    }
}

fn png_compression(level: u32) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    options: &OptimizationOptions,
) -> Result<Vec<u8>, OptimizeError> {
    let mut out = Vec::new();

    let result = match format {
        ImageFormat::Jpeg => {
            // The JPEG encoder takes 8-bit gray or RGB only.
            let image = match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
                other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
            };
            let quality = options.quality.clamp(1, 100) as u8;
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut out,
                png_compression(options.compression),
                PngFilter::Adaptive,
            );
            image.write_with_encoder(encoder)
        }
        _ => return Err(OptimizeError::UnsupportedFormat),
    };

    result.map_err(|e| OptimizeError::Encode(e.to_string()))?;
    Ok(out)
}

//! Image optimizer interface.
//!
//! The gateway does not re-encode images itself; it drives an [`Optimizer`].
//! Opening yields an [`ImageHandle`] that is released when dropped, so every
//! exit path of a request gives the decoded image back. [`ImageEngine`] is the
//! default implementation.
//!
//! All calls are blocking and CPU bound. Callers on the async runtime run them
//! through `spawn_blocking`.

pub mod engine;

use bytes::Bytes;
use thiserror::Error;

pub use engine::ImageEngine;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u32 = 60;
/// Default PNG compression level.
pub const DEFAULT_COMPRESSION: u32 = 9;
/// Default JPEG quantization table.
pub const DEFAULT_QUANT_TABLE: u32 = 3;

/// Encoder settings for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationOptions {
    /// JPEG quality, 1–100.
    pub quality: u32,
    /// PNG compression level, 0–9.
    pub compression: u32,
    /// JPEG quantization table, 0–8.
    pub quant_table: u32,
    pub optimize_coding: bool,
    pub interlace: bool,
    pub strip_metadata: bool,
    pub optimize_icc_profile: bool,
    pub trellis_quant: bool,
    pub overshoot_deringing: bool,
    pub optimize_scans: bool,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            compression: DEFAULT_COMPRESSION,
            quant_table: DEFAULT_QUANT_TABLE,
            optimize_coding: true,
            interlace: false,
            strip_metadata: true,
            optimize_icc_profile: true,
            trellis_quant: true,
            overshoot_deringing: true,
            optimize_scans: true,
        }
    }
}

/// Optimizer failures.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to resize image: {0}")]
    Resize(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Opens encoded images.
pub trait Optimizer: Send + Sync {
    fn open(&self, data: Bytes) -> Result<Box<dyn ImageHandle>, OptimizeError>;
}

/// A decoded image. Dropping the handle releases it.
pub trait ImageHandle: Send {
    /// Re-encode at the original size.
    fn optimize(&mut self, options: &OptimizationOptions) -> Result<Vec<u8>, OptimizeError>;

    /// Re-encode at a new size. A zero axis follows the other one.
    fn resize(
        &mut self,
        width: u32,
        height: u32,
        options: &OptimizationOptions,
    ) -> Result<Vec<u8>, OptimizeError>;
}

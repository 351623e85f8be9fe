//! Image codec capability
//!
//! One operation per stage kind, each taking raw encoded bytes plus stage
//! parameters and returning freshly encoded bytes. Implementations never
//! mutate their input. Operations are synchronous CPU work; callers decide
//! where they run.

use bytes::Bytes;
use thiserror::Error;

/// Codec operation errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("unsupported target format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for codec operations
pub type CodecResult = Result<Bytes, CodecError>;

/// The six primitive image operations the pipeline dispatches to.
///
/// Each call is a pure function of its input bytes and parameters: same
/// input, same output. Output stays in the source encoding except for
/// `convert`, which re-encodes to the requested target.
pub trait ImageCodec: Send + Sync {
    /// Scale to exactly `width` x `height`.
    fn resize(&self, data: &[u8], width: u32, height: u32) -> CodecResult;

    /// Rotate clockwise by `angle` degrees. Angle 0 (after normalization
    /// modulo 360) is a valid explicit no-op.
    fn rotate(&self, data: &[u8], angle: i32) -> CodecResult;

    /// Center-gravity crop to `width` x `height`. Requesting a crop larger
    /// than the image is an `InvalidGeometry` error.
    fn crop(&self, data: &[u8], width: u32, height: u32) -> CodecResult;

    /// Horizontal mirror.
    fn flip(&self, data: &[u8]) -> CodecResult;

    /// Re-encode to the named target format (png, jpeg, webp).
    fn convert(&self, data: &[u8], image_type: &str) -> CodecResult;

    /// Integer upscale: multiply both dimensions by `factor`.
    fn zoom(&self, data: &[u8], factor: u32) -> CodecResult;
}

//! Imago Processing Library
//!
//! The Image Codec Capability (`ImageCodec` trait plus the `RasterCodec`
//! production implementation) and the transformation pipeline that resolves a
//! sparse `TransformRequest` into the canonical stage order and executes it
//! against a materialized source image.

pub mod codec;
pub mod pipeline;
pub mod raster;
pub mod upload;

// Re-export commonly used types
pub use codec::{CodecError, ImageCodec};
pub use pipeline::{resolve_stages, PipelineError, Stage, StageKind, TransformPipeline, STAGE_ORDER};
pub use raster::RasterCodec;
pub use upload::{sniff_content_type, UploadError, UploadPolicy};

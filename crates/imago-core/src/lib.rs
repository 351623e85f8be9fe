//! Imago Core Library
//!
//! This crate provides the domain types shared across all Imago components:
//! configuration, the application error taxonomy, and the transformation
//! request model with its boundary validation.

pub mod config;
pub mod error;
pub mod storage_types;
pub mod transform;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use transform::{
    ConvertSpec, CropSpec, FieldViolation, ResizeSpec, RotateSpec, TransformRequest,
    ValidationError, ZoomSpec,
};

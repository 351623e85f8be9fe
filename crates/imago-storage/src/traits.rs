//! Storage abstraction trait
//!
//! This module defines the `Storage` trait that all storage backends must
//! implement. The transformation pipeline consumes only `materialize`; the
//! remaining operations serve the image-management flows (upload, fetch,
//! delete).

use crate::scratch::ScratchFile;
use async_trait::async_trait;
use imago_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Unique name the object was stored under; callers use it to address
    /// the object in every later call.
    pub object_name: String,
    /// Publicly reachable URL for the object
    pub url: String,
    /// Stored size in bytes
    pub size: u64,
}

/// Storage abstraction trait
///
/// All backends (S3-compatible, local filesystem) implement this trait so the
/// handlers and the pipeline never couple to a concrete provider.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under a unique object name derived from `filename`.
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject>;

    /// Download the full content of an object.
    async fn download(&self, object_name: &str) -> StorageResult<Vec<u8>>;

    /// Materialize an object into a local scratch file.
    ///
    /// The returned [`ScratchFile`] owns the local copy and deletes it when
    /// dropped. The stored object itself is never touched.
    async fn materialize(&self, object_name: &str) -> StorageResult<ScratchFile>;

    /// Delete an object. Deleting an object that does not exist is not an
    /// error.
    async fn delete(&self, object_name: &str) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, object_name: &str) -> StorageResult<bool>;

    /// Size in bytes of an object, if it exists.
    async fn content_length(&self, object_name: &str) -> StorageResult<u64>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

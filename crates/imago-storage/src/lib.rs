//! Imago Storage Library
//!
//! Object Storage Capability for Imago: the `Storage` trait plus a local
//! filesystem backend and an S3-compatible backend.
//!
//! # Object names
//!
//! Upload derives a unique object name from the client filename
//! (`{stem}_{nanos}.{ext}`, see the `keys` module) and every backend stores
//! under `media/{object_name}`. Object names must not contain `..`, path
//! separators, or a leading `/`.
//!
//! # Scratch files
//!
//! `materialize` bridges remote objects to local-file-oriented processing: it
//! downloads an object into a [`ScratchFile`], a guard whose `Drop` removes
//! the file on every exit path, including panics.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod scratch;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use imago_core::StorageBackend;
pub use scratch::ScratchFile;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};

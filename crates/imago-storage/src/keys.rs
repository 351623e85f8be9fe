//! Shared object naming for storage backends.
//!
//! Uploads get a unique object name `{stem}_{nanos}.{ext}` so repeated
//! uploads of the same client filename never collide. All backends store
//! objects under `media/{object_name}`.

use crate::traits::{StorageError, StorageResult};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Derive a unique object name from a client-supplied filename.
///
/// Any path components in the filename are discarded; the current wall-clock
/// nanosecond timestamp is appended before the extension.
pub fn unique_object_name(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}_{}.{}", stem, nanos, ext)
        }
        _ => format!("{}_{}", base, nanos),
    }
}

/// Storage key for an object name.
pub fn object_key(object_name: &str) -> StorageResult<String> {
    validate_object_name(object_name)?;
    Ok(format!("media/{}", object_name))
}

/// Reject object names that could escape the storage prefix.
pub fn validate_object_name(object_name: &str) -> StorageResult<()> {
    if object_name.is_empty()
        || object_name.contains("..")
        || object_name.contains('/')
        || object_name.contains('\\')
    {
        return Err(StorageError::InvalidKey(object_name.to_string()));
    }
    Ok(())
}

//! Scratch file guard for local materialization of remote objects.

use crate::traits::StorageResult;
use std::path::Path;
use tempfile::TempPath;

/// A local temporary materialization of a remotely stored object, owned for
/// one pipeline invocation.
///
/// The underlying file is removed when the guard is dropped, on every exit
/// path: normal completion, early-return errors, and unwinding panics. Never
/// delete the file manually.
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    /// Allocate an empty scratch file in the system temp directory.
    pub fn allocate() -> StorageResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("imago-scratch-")
            .tempfile()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Path of the scratch file, valid until the guard is dropped.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for ScratchFile {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

use crate::keys;
use crate::scratch::ScratchFile;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use async_trait::async_trait;
use imago_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/imago/media")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:8080/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert an object name to a filesystem path. Object names are
    /// validated by the keys module, so the result cannot escape `base_path`.
    fn object_path(&self, object_name: &str) -> StorageResult<PathBuf> {
        let key = keys::object_key(object_name)?;
        Ok(self.base_path.join(key))
    }

    /// Generate public URL for an object
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject> {
        let object_name = keys::unique_object_name(filename);
        let key = keys::object_key(&object_name)?;
        let path = self.base_path.join(&key);
        let size = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            object_name = %object_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredObject {
            url: self.generate_url(&key),
            object_name,
            size,
        })
    }

    async fn download(&self, object_name: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(object_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(object_name.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            object_name = %object_name,
            size_bytes = data.len(),
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn materialize(&self, object_name: &str) -> StorageResult<ScratchFile> {
        let path = self.object_path(object_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(object_name.to_string()));
        }

        let scratch = ScratchFile::allocate()?;

        fs::copy(&path, scratch.path()).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to copy {} to scratch: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            object_name = %object_name,
            scratch = %scratch.path().display(),
            "Materialized object to scratch file"
        );

        Ok(scratch)
    }

    async fn delete(&self, object_name: &str) -> StorageResult<()> {
        let path = self.object_path(object_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(object_name = %object_name, "Local storage delete successful");

        Ok(())
    }

    async fn exists(&self, object_name: &str) -> StorageResult<bool> {
        let path = self.object_path(object_name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, object_name: &str) -> StorageResult<u64> {
        let path = self.object_path(object_name)?;
        let meta = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(object_name.to_string())
            } else {
                StorageError::BackendError(e.to_string())
            }
        })?;
        Ok(meta.len())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

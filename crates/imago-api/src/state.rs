//! Application state shared across handlers.

use imago_core::Config;
use imago_processing::{RasterCodec, TransformPipeline, UploadPolicy};
use imago_storage::{create_storage, Storage, StorageError};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub upload_policy: UploadPolicy,
    pub pipeline: TransformPipeline,
}

impl AppState {
    /// Build state with the storage backend selected by configuration.
    pub async fn initialize(config: Config) -> Result<Self, StorageError> {
        let storage = create_storage(&config).await?;
        Ok(Self::with_storage(config, storage))
    }

    /// Build state around an explicit storage backend. Used by tests to wire
    /// in local storage under a temp directory.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        let codec = Arc::new(RasterCodec::new(config.jpeg_quality));
        let pipeline = TransformPipeline::new(storage.clone(), codec);
        let upload_policy = UploadPolicy::from_config(&config);

        Self {
            config,
            storage,
            upload_policy,
            pipeline,
        }
    }
}

//! Transformation pipeline
//!
//! Resolves a sparse `TransformRequest` into an ordered execution plan and
//! runs it against a locally materialized copy of the source object.
//!
//! The stage order is a hardcoded total order, independent of how the request
//! fields were encoded: geometric operations run before format conversion so
//! pixel work happens on the richest representation, and zoom is a final
//! scale adjustment. Callers may depend on this order.
//!
//! Failure semantics are all-or-nothing: the first failing stage aborts the
//! invocation, later stages never run, and partial output is never returned.
//! The scratch copy of the source is released on every exit path by its
//! `ScratchFile` guard; the stored object itself is never touched.

use crate::codec::{CodecError, ImageCodec};
use bytes::Bytes;
use imago_core::error::AppError;
use imago_core::transform::{TransformRequest, ValidationError};
use imago_storage::{Storage, StorageError};
use std::fmt;
use std::sync::Arc;

/// The canonical stage execution order. A contract, not an implementation
/// detail: requesting both resize and crop always resizes first.
pub const STAGE_ORDER: [StageKind; 6] = [
    StageKind::Resize,
    StageKind::Rotate,
    StageKind::Crop,
    StageKind::Flip,
    StageKind::Convert,
    StageKind::Zoom,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Resize,
    Rotate,
    Crop,
    Flip,
    Convert,
    Zoom,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Resize => "resize",
            StageKind::Rotate => "rotate",
            StageKind::Crop => "crop",
            StageKind::Flip => "flip",
            StageKind::Convert => "convert",
            StageKind::Zoom => "zoom",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage descriptor: one requested operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Resize { width: u32, height: u32 },
    Rotate { angle: i32 },
    Crop { width: u32, height: u32 },
    Flip,
    Convert { image_type: String },
    Zoom { factor: u32 },
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Resize { .. } => StageKind::Resize,
            Stage::Rotate { .. } => StageKind::Rotate,
            Stage::Crop { .. } => StageKind::Crop,
            Stage::Flip => StageKind::Flip,
            Stage::Convert { .. } => StageKind::Convert,
            Stage::Zoom { .. } => StageKind::Zoom,
        }
    }
}

/// Resolve a request into the ordered list of stage descriptors to run.
///
/// Iterates [`STAGE_ORDER`] once, keeping only the stages present in the
/// request. An empty request resolves to an empty plan (the identity
/// pipeline).
pub fn resolve_stages(request: &TransformRequest) -> Vec<Stage> {
    let mut stages = Vec::with_capacity(STAGE_ORDER.len());

    for kind in STAGE_ORDER {
        match kind {
            StageKind::Resize => {
                if let Some(resize) = &request.resize {
                    stages.push(Stage::Resize {
                        width: resize.width,
                        height: resize.height,
                    });
                }
            }
            StageKind::Rotate => {
                if let Some(rotate) = &request.rotate {
                    stages.push(Stage::Rotate {
                        angle: rotate.angle,
                    });
                }
            }
            StageKind::Crop => {
                if let Some(crop) = &request.crop {
                    stages.push(Stage::Crop {
                        width: crop.width,
                        height: crop.height,
                    });
                }
            }
            StageKind::Flip => {
                if request.flip {
                    stages.push(Stage::Flip);
                }
            }
            StageKind::Convert => {
                if let Some(convert) = &request.convert {
                    stages.push(Stage::Convert {
                        image_type: convert.image_type.clone(),
                    });
                }
            }
            StageKind::Zoom => {
                if let Some(zoom) = &request.zoom {
                    stages.push(Stage::Zoom {
                        factor: zoom.factor,
                    });
                }
            }
        }
    }

    stages
}

/// Pipeline errors. All are terminal for the invocation; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),

    #[error("source unavailable: {0}")]
    SourceUnavailable(#[source] StorageError),

    #[error("source read failed: {0}")]
    SourceRead(#[source] std::io::Error),

    #[error("transformation failed at stage {kind}: {source}")]
    Stage {
        kind: StageKind,
        #[source]
        source: CodecError,
    },
}

impl PipelineError {
    /// The stage the invocation failed at, if it got that far.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            PipelineError::Stage { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidRequest(validation) => AppError::Validation(validation),
            PipelineError::SourceUnavailable(StorageError::NotFound(name)) => {
                AppError::NotFound(format!("image not found: {}", name))
            }
            PipelineError::SourceUnavailable(storage) => AppError::Storage(storage.to_string()),
            PipelineError::SourceRead(io) => AppError::Internal(io.to_string()),
            stage @ PipelineError::Stage { .. } => AppError::ImageProcessing(stage.to_string()),
        }
    }
}

/// The pipeline orchestrator.
///
/// One instance is shared across invocations; it holds no per-invocation
/// state. Each `execute` call owns its own scratch file and byte buffer, so
/// concurrent invocations need no locking.
#[derive(Clone)]
pub struct TransformPipeline {
    storage: Arc<dyn Storage>,
    codec: Arc<dyn ImageCodec>,
}

impl TransformPipeline {
    pub fn new(storage: Arc<dyn Storage>, codec: Arc<dyn ImageCodec>) -> Self {
        Self { storage, codec }
    }

    /// Execute a transformation request against one stored image and return
    /// the final encoded bytes.
    ///
    /// Validation runs before any I/O. An empty request returns the source
    /// bytes unchanged.
    pub async fn execute(
        &self,
        object_name: &str,
        request: &TransformRequest,
    ) -> Result<Bytes, PipelineError> {
        request.validate()?;
        let stages = resolve_stages(request);

        let scratch = self
            .storage
            .materialize(object_name)
            .await
            .map_err(PipelineError::SourceUnavailable)?;

        // From here on the scratch guard releases the local copy on every
        // exit path, including panics inside a codec call.
        let source = tokio::fs::read(scratch.path())
            .await
            .map_err(PipelineError::SourceRead)?;

        let mut outcome = Bytes::from(source);
        for stage in &stages {
            let kind = stage.kind();
            tracing::debug!(object_name = %object_name, stage = %kind, "applying stage");
            outcome = self
                .apply(stage, &outcome)
                .map_err(|source| PipelineError::Stage { kind, source })?;
        }

        tracing::debug!(
            object_name = %object_name,
            stages = stages.len(),
            output_bytes = outcome.len(),
            "pipeline complete"
        );

        Ok(outcome)
    }

    fn apply(&self, stage: &Stage, data: &[u8]) -> Result<Bytes, CodecError> {
        match stage {
            Stage::Resize { width, height } => self.codec.resize(data, *width, *height),
            Stage::Rotate { angle } => self.codec.rotate(data, *angle),
            Stage::Crop { width, height } => self.codec.crop(data, *width, *height),
            Stage::Flip => self.codec.flip(data),
            Stage::Convert { image_type } => self.codec.convert(data, image_type),
            Stage::Zoom { factor } => self.codec.zoom(data, *factor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecResult;
    use async_trait::async_trait;
    use imago_core::transform::{ConvertSpec, CropSpec, ResizeSpec, RotateSpec, ZoomSpec};
    use imago_core::StorageBackend;
    use imago_storage::{ScratchFile, StorageResult, StoredObject};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Codec double that records which operations ran, in order, and can be
    /// told to fail at one stage kind.
    #[derive(Default)]
    struct RecordingCodec {
        calls: Mutex<Vec<StageKind>>,
        fail_at: Option<StageKind>,
    }

    impl RecordingCodec {
        fn failing_at(kind: StageKind) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at: Some(kind),
            }
        }

        fn record(&self, kind: StageKind, data: &[u8]) -> CodecResult {
            self.calls.lock().unwrap().push(kind);
            if self.fail_at == Some(kind) {
                return Err(CodecError::Decode(format!("forced failure at {kind}")));
            }
            // Tag the buffer so stage application order is observable.
            let mut out = data.to_vec();
            out.extend_from_slice(kind.as_str().as_bytes());
            out.push(b'|');
            Ok(Bytes::from(out))
        }

        fn calls(&self) -> Vec<StageKind> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageCodec for RecordingCodec {
        fn resize(&self, data: &[u8], _width: u32, _height: u32) -> CodecResult {
            self.record(StageKind::Resize, data)
        }
        fn rotate(&self, data: &[u8], _angle: i32) -> CodecResult {
            self.record(StageKind::Rotate, data)
        }
        fn crop(&self, data: &[u8], _width: u32, _height: u32) -> CodecResult {
            self.record(StageKind::Crop, data)
        }
        fn flip(&self, data: &[u8]) -> CodecResult {
            self.record(StageKind::Flip, data)
        }
        fn convert(&self, data: &[u8], _image_type: &str) -> CodecResult {
            self.record(StageKind::Convert, data)
        }
        fn zoom(&self, data: &[u8], _factor: u32) -> CodecResult {
            self.record(StageKind::Zoom, data)
        }
    }

    /// In-memory storage double that tracks materializations and the scratch
    /// path it last handed out.
    struct FakeStorage {
        object: Option<(String, Vec<u8>)>,
        materialize_count: Mutex<usize>,
        last_scratch: Mutex<Option<PathBuf>>,
    }

    impl FakeStorage {
        fn with_object(name: &str, data: &[u8]) -> Self {
            Self {
                object: Some((name.to_string(), data.to_vec())),
                materialize_count: Mutex::new(0),
                last_scratch: Mutex::new(None),
            }
        }

        fn empty() -> Self {
            Self {
                object: None,
                materialize_count: Mutex::new(0),
                last_scratch: Mutex::new(None),
            }
        }

        fn materializations(&self) -> usize {
            *self.materialize_count.lock().unwrap()
        }

        fn last_scratch_path(&self) -> Option<PathBuf> {
            self.last_scratch.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Storage for FakeStorage {
        async fn upload(
            &self,
            _filename: &str,
            _content_type: &str,
            _data: Vec<u8>,
        ) -> StorageResult<StoredObject> {
            unimplemented!("not used by the pipeline")
        }

        async fn download(&self, _object_name: &str) -> StorageResult<Vec<u8>> {
            unimplemented!("not used by the pipeline")
        }

        async fn materialize(&self, object_name: &str) -> StorageResult<ScratchFile> {
            *self.materialize_count.lock().unwrap() += 1;
            match &self.object {
                Some((name, data)) if name == object_name => {
                    let scratch = ScratchFile::allocate()?;
                    std::fs::write(scratch.path(), data)?;
                    *self.last_scratch.lock().unwrap() = Some(scratch.path().to_path_buf());
                    Ok(scratch)
                }
                _ => Err(StorageError::NotFound(object_name.to_string())),
            }
        }

        async fn delete(&self, _object_name: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn exists(&self, object_name: &str) -> StorageResult<bool> {
            Ok(self
                .object
                .as_ref()
                .is_some_and(|(name, _)| name == object_name))
        }

        async fn content_length(&self, _object_name: &str) -> StorageResult<u64> {
            Ok(0)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    fn full_request() -> TransformRequest {
        TransformRequest {
            resize: Some(ResizeSpec {
                width: 50,
                height: 50,
            }),
            rotate: Some(RotateSpec { angle: 90 }),
            crop: Some(CropSpec {
                width: 10,
                height: 10,
            }),
            flip: true,
            convert: Some(ConvertSpec {
                image_type: "webp".to_string(),
            }),
            zoom: Some(ZoomSpec { factor: 2 }),
        }
    }

    #[test]
    fn empty_request_resolves_to_empty_plan() {
        assert!(resolve_stages(&TransformRequest::default()).is_empty());
    }

    #[test]
    fn plan_follows_canonical_order_not_field_order() {
        let stages = resolve_stages(&full_request());
        let kinds: Vec<StageKind> = stages.iter().map(Stage::kind).collect();
        assert_eq!(kinds, STAGE_ORDER);
    }

    #[test]
    fn plan_keeps_only_present_stages() {
        let request = TransformRequest {
            crop: Some(CropSpec {
                width: 10,
                height: 10,
            }),
            resize: Some(ResizeSpec {
                width: 50,
                height: 50,
            }),
            ..Default::default()
        };
        let kinds: Vec<StageKind> = resolve_stages(&request).iter().map(Stage::kind).collect();
        assert_eq!(kinds, vec![StageKind::Resize, StageKind::Crop]);
    }

    #[tokio::test]
    async fn identity_pipeline_returns_source_bytes_untouched() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"source bytes"));
        let codec = Arc::new(RecordingCodec::default());
        let pipeline = TransformPipeline::new(storage.clone(), codec.clone());

        let out = pipeline
            .execute("cat.png", &TransformRequest::default())
            .await
            .unwrap();

        assert_eq!(out, b"source bytes".as_slice());
        assert!(codec.calls().is_empty());
        assert_eq!(storage.materializations(), 1);
    }

    #[tokio::test]
    async fn stages_run_in_canonical_order() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"src|"));
        let codec = Arc::new(RecordingCodec::default());
        let pipeline = TransformPipeline::new(storage, codec.clone());

        let out = pipeline.execute("cat.png", &full_request()).await.unwrap();

        assert_eq!(codec.calls(), STAGE_ORDER.to_vec());
        // Each stage consumed the previous stage's output.
        assert_eq!(out, b"src|resize|rotate|crop|flip|convert|zoom|".as_slice());
    }

    #[tokio::test]
    async fn resize_always_runs_before_crop() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"src|"));
        let codec = Arc::new(RecordingCodec::default());
        let pipeline = TransformPipeline::new(storage, codec.clone());

        // Crop listed first in the request; the plan still resizes first.
        let request = TransformRequest {
            crop: Some(CropSpec {
                width: 10,
                height: 10,
            }),
            resize: Some(ResizeSpec {
                width: 50,
                height: 50,
            }),
            ..Default::default()
        };

        let out = pipeline.execute("cat.png", &request).await.unwrap();
        assert_eq!(codec.calls(), vec![StageKind::Resize, StageKind::Crop]);
        assert_eq!(out, b"src|resize|crop|".as_slice());
    }

    #[tokio::test]
    async fn first_failing_stage_aborts_without_running_later_stages() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"src|"));
        let codec = Arc::new(RecordingCodec::failing_at(StageKind::Crop));
        let pipeline = TransformPipeline::new(storage.clone(), codec.clone());

        let err = pipeline
            .execute("cat.png", &full_request())
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some(StageKind::Crop));
        assert_eq!(
            codec.calls(),
            vec![StageKind::Resize, StageKind::Rotate, StageKind::Crop]
        );

        // Scratch released exactly once despite the failure.
        let scratch = storage.last_scratch_path().unwrap();
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn scratch_is_released_after_success() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"src|"));
        let pipeline =
            TransformPipeline::new(storage.clone(), Arc::new(RecordingCodec::default()));

        pipeline.execute("cat.png", &full_request()).await.unwrap();

        let scratch = storage.last_scratch_path().unwrap();
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn invalid_request_fails_before_any_storage_access() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"src|"));
        let codec = Arc::new(RecordingCodec::default());
        let pipeline = TransformPipeline::new(storage.clone(), codec.clone());

        let request = TransformRequest {
            resize: Some(ResizeSpec {
                width: 0,
                height: 50,
            }),
            ..Default::default()
        };

        let err = pipeline.execute("cat.png", &request).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
        assert_eq!(storage.materializations(), 0);
        assert!(codec.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_source_is_source_unavailable_and_runs_no_stages() {
        let storage = Arc::new(FakeStorage::empty());
        let codec = Arc::new(RecordingCodec::default());
        let pipeline = TransformPipeline::new(storage, codec.clone());

        let err = pipeline
            .execute("ghost.png", &full_request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::SourceUnavailable(StorageError::NotFound(_))
        ));
        assert!(codec.calls().is_empty());
    }

    #[tokio::test]
    async fn repeated_invocations_are_deterministic() {
        let storage = Arc::new(FakeStorage::with_object("cat.png", b"src|"));
        let pipeline =
            TransformPipeline::new(storage.clone(), Arc::new(RecordingCodec::default()));

        let first = pipeline.execute("cat.png", &full_request()).await.unwrap();
        let second = pipeline.execute("cat.png", &full_request()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(storage.materializations(), 2);
    }

    #[test]
    fn stage_errors_name_the_failing_stage() {
        let err = PipelineError::Stage {
            kind: StageKind::Convert,
            source: CodecError::UnsupportedFormat("bogus".to_string()),
        };
        assert!(err.to_string().contains("convert"));
        assert!(err.to_string().contains("bogus"));
    }
}

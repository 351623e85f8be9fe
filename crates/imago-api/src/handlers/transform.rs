use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use imago_core::transform::TransformRequest;
use imago_core::AppError;
use imago_processing::sniff_content_type;
use std::sync::Arc;

/// Apply a transformation request to a stored image and return the final
/// encoded bytes.
///
/// The request body is the sparse JSON stage selection; the pipeline
/// validates it, resolves the canonical stage order and executes against a
/// scratch copy of the stored object. Failures render as the structured
/// error body with the failing stage named.
#[tracing::instrument(skip(state, request), fields(object_name = %name, operation = "transform_image"))]
pub async fn transform_image(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<TransformRequest>,
) -> Result<Response, HttpAppError> {
    let output = state.pipeline.execute(&name, &request).await?;

    // The convert stage may have changed the encoding; sniff the result.
    let content_type = sniff_content_type(&output).unwrap_or("application/octet-stream");

    tracing::debug!(
        object_name = %name,
        output_bytes = output.len(),
        content_type = content_type,
        "transformation complete"
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(output))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

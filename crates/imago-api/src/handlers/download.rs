use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use imago_core::AppError;
use imago_processing::sniff_content_type;
use std::sync::Arc;

/// Stream the stored bytes of an image back to the caller.
pub async fn download_image(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let data = state.storage.download(&name).await?;

    let content_type = sniff_content_type(&data).unwrap_or("application/octet-stream");

    tracing::debug!(object_name = %name, size_bytes = data.len(), "serving image download");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}

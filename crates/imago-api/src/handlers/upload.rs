use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use imago_core::AppError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub object_name: String,
    pub url: String,
    pub size: u64,
}

/// Upload image handler
///
/// Accepts a multipart form with an `image` field, validates it against the
/// upload policy (size cap, sniffed content type) and stores it under a
/// unique object name that later calls use to address the image.
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let mut part: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let claimed = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("unable to read upload: {}", e)))?;
            part = Some((filename, claimed, data.to_vec()));
            break;
        }
    }

    let (filename, claimed, data) =
        part.ok_or_else(|| AppError::BadRequest("missing \"image\" form field".to_string()))?;

    let content_type = state.upload_policy.check(&data, claimed.as_deref())?;

    let stored = state.storage.upload(&filename, content_type, data).await?;

    tracing::info!(
        object_name = %stored.object_name,
        size_bytes = stored.size,
        content_type = content_type,
        "image uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            object_name: stored.object_name,
            url: stored.url,
            size: stored.size,
        }),
    ))
}

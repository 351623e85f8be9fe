use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub object_name: String,
    pub size: u64,
}

/// Return metadata for a stored image.
pub async fn get_image(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ImageInfo>, HttpAppError> {
    let size = state.storage.content_length(&name).await?;

    Ok(Json(ImageInfo {
        object_name: name,
        size,
    }))
}

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use imago_core::AppError;
use std::sync::Arc;

/// Delete a stored image.
pub async fn delete_image(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HttpAppError> {
    if !state.storage.exists(&name).await? {
        return Err(AppError::NotFound(format!("image not found: {}", name)).into());
    }

    state.storage.delete(&name).await?;

    tracing::info!(object_name = %name, "image deleted");

    Ok(StatusCode::NO_CONTENT)
}

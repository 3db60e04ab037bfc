//! HTTP handlers for data file uploads

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::uploads::{UploadKind, UploadReceipt, UploadedFile};
use crate::AppState;

#[derive(Serialize)]
pub struct UploadsResponse {
    pub uploads: Vec<UploadedFile>,
}

/// Read the `file` field of a multipart form
async fn read_file_field(mut multipart: Multipart) -> AppResult<(Option<String>, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Could not read upload: {}", e)))?;
        return Ok((filename, bytes.to_vec()));
    }

    Err(AppError::Validation {
        field: "file".to_string(),
        message: "Missing file field".to_string(),
    })
}

async fn store(state: AppState, kind: UploadKind, multipart: Multipart) -> AppResult<Json<UploadReceipt>> {
    let (filename, contents) = read_file_field(multipart).await?;
    let uploads = state.uploads.clone();
    let receipt = tokio::task::spawn_blocking(move || uploads.store_csv(kind, filename, &contents))
        .await
        .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))??;
    Ok(Json(receipt))
}

/// Upload a climate CSV (`date,rainfall,temperature,humidity`)
pub async fn upload_climate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadReceipt>> {
    store(state, UploadKind::Climate, multipart).await
}

/// Upload a dengue case CSV (`date,barangay,cases`)
pub async fn upload_dengue(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadReceipt>> {
    store(state, UploadKind::Dengue, multipart).await
}

/// List stored data files
pub async fn list_uploads(State(state): State<AppState>) -> AppResult<Json<UploadsResponse>> {
    let uploads = state.uploads.clone();
    let uploads = tokio::task::spawn_blocking(move || uploads.list_uploads())
        .await
        .map_err(|e| AppError::Internal(format!("Listing task failed: {}", e)))??;
    Ok(Json(UploadsResponse { uploads }))
}

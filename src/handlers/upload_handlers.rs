//! `POST /upload-multiple`: multipart batch upload.
//!
//! Every file part must sit under the `files` field and end in `.txt.gz`.
//! Parts are streamed to disk one after another; the first rejected part
//! fails the whole batch and removes what this request already wrote. Disk
//! failures and interrupted streams fail the request but keep those files.

use crate::{
    errors::AppError,
    models::uploaded_file::{UploadManifestEntry, UploadResponse, UploadedFile},
    services::{
        naming,
        storage_service::{StorageService, UploadError},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use tracing::{error, info};

/// Multipart field that carries the files.
pub const UPLOAD_FIELD: &str = "files";

pub async fn upload_multiple(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // A body that is not multipart at all simply carries no files.
    let Ok(mut multipart) = multipart else {
        return Err(AppError::bad_request("No files"));
    };
    let max_files = state.config.max_files;
    let max_file_size = state.config.max_file_size;
    let mut saved: Vec<UploadedFile> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(reject(&state.storage, &saved, err.into()).await),
        };

        // Plain form values ride along in the same body; only file parts count.
        let Some(original_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        if field.name() != Some(UPLOAD_FIELD) {
            let name = field.name().unwrap_or_default().to_string();
            return Err(reject(&state.storage, &saved, UploadError::UnexpectedField(name)).await);
        }
        if saved.len() >= max_files {
            return Err(reject(&state.storage, &saved, UploadError::TooManyFiles(max_files)).await);
        }
        if !naming::has_allowed_extension(&original_name) {
            return Err(reject(
                &state.storage,
                &saved,
                UploadError::InvalidExtension(original_name),
            )
            .await);
        }

        let content_type = field.content_type().map(str::to_owned);
        match state
            .storage
            .store_stream(&original_name, content_type, field, max_file_size)
            .await
        {
            Ok(file) => saved.push(file),
            Err(err) => return Err(reject(&state.storage, &saved, err).await),
        }
    }

    if saved.is_empty() {
        return Err(AppError::bad_request("No files"));
    }

    info!("stored {} uploaded file(s)", saved.len());

    Ok(Json(UploadResponse {
        ok: true,
        files: saved.iter().map(UploadManifestEntry::from).collect(),
    }))
}

/// Validation failures undo the batch; disk and stream failures leave
/// siblings in place.
async fn reject(storage: &StorageService, saved: &[UploadedFile], err: UploadError) -> AppError {
    if err.is_validation() {
        storage.discard(saved).await;
    } else {
        error!("upload failed after {} file(s): {}", saved.len(), err);
    }
    err.into()
}

//! Handlers for the `/workflows` resource.

use std::path::PathBuf;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use wizflow_core::service;
use wizflow_core::types::DbId;
use wizflow_core::upload::{extension_of, mime_for_filename};
use wizflow_core::workflow::{FileDescriptor, Workflow};

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// MIME type recorded when neither the part nor the file name says otherwise.
const FALLBACK_MIME: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/workflows
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Workflow>>)> {
    let Json(body) = payload?;
    let workflow = service::create_workflow(state.store.as_ref(), body).await?;

    tracing::info!(
        workflow_id = workflow.id,
        source_type = workflow.source.source_type.as_str(),
        "Workflow created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse::ok(workflow))))
}

/// GET /api/workflows
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Workflow>>>> {
    let workflows = service::list_workflows(state.store.as_ref()).await?;
    Ok(Json(DataResponse::ok(workflows)))
}

/// GET /api/workflows/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    path: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<DataResponse<Workflow>>> {
    let Path(id) = path?;
    let workflow = service::get_workflow(state.store.as_ref(), id).await?;
    Ok(Json(DataResponse::ok(workflow)))
}

/// PUT /api/workflows/{id}
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<DbId>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<Workflow>>> {
    let Path(id) = path?;
    let Json(body) = payload?;
    let workflow = service::update_workflow(state.store.as_ref(), id, body).await?;

    tracing::info!(workflow_id = id, "Workflow updated");

    Ok(Json(DataResponse::ok(workflow)))
}

/// DELETE /api/workflows/{id}
///
/// Stored file bytes are left on disk; only the record is removed.
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let Path(id) = path?;
    service::delete_workflow(state.store.as_ref(), id).await?;

    tracing::info!(workflow_id = id, "Workflow deleted");

    Ok(Json(DataResponse::ok(MessageResponse {
        message: "Workflow deleted successfully".to_string(),
    })))
}

// ---------------------------------------------------------------------------
// File upload
// ---------------------------------------------------------------------------

/// POST /api/workflows/{id}/files
///
/// Accept a multipart upload, write each file part under `UPLOAD_DIR` with
/// a generated name, and append the descriptors to the workflow. The
/// workflow is looked up first so an unknown id never leaves files on
/// disk; files written before a later failure are removed again.
pub async fn upload_files(
    State(state): State<AppState>,
    path: Result<Path<DbId>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DataResponse<Workflow>>> {
    let Path(id) = path?;
    let mut multipart = multipart?;
    service::get_workflow(state.store.as_ref(), id).await?;

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;

    let mut written: Vec<PathBuf> = Vec::new();
    let result = async {
        let descriptors = store_parts(&state, &mut multipart, &mut written).await?;
        if descriptors.is_empty() {
            return Err(AppError::BadRequest(
                "No files received in multipart upload".to_string(),
            ));
        }
        Ok(service::attach_files(state.store.as_ref(), id, &descriptors).await?)
    }
    .await;

    match result {
        Ok(workflow) => {
            tracing::info!(
                workflow_id = id,
                files_received = written.len(),
                total_files = workflow.files.len(),
                "Files attached to workflow"
            );
            Ok(Json(DataResponse::ok(workflow)))
        }
        Err(err) => {
            remove_files(&written).await;
            Err(err)
        }
    }
}

/// Drain the multipart stream, writing each file part to disk. Parts
/// without a file name (plain form fields) are ignored.
async fn store_parts(
    state: &AppState,
    multipart: &mut Multipart,
    written: &mut Vec<PathBuf>,
) -> AppResult<Vec<FileDescriptor>> {
    let limits = &state.config.upload;
    let mut descriptors = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_for_filename(&original_name).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        if descriptors.len() >= limits.max_files {
            return Err(AppError::Upload(format!(
                "Maximum {} files allowed",
                limits.max_files
            )));
        }

        let data = field.bytes().await?;
        if data.len() as u64 > limits.max_size_bytes {
            return Err(AppError::Upload(format!(
                "{original_name} exceeds maximum file size of {}MB",
                limits.max_size_mb()
            )));
        }

        let stored_filename = format!("{}{}", uuid::Uuid::new_v4(), extension_of(&original_name));
        let dest = state.config.upload_dir.join(&stored_filename);
        tokio::fs::write(&dest, &data)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;
        written.push(dest);

        descriptors.push(FileDescriptor {
            original_name,
            storage_path: format!("{}/{}", state.config.uploads_url_prefix, stored_filename),
            stored_filename,
            mime_type,
            size_bytes: data.len() as i64,
        });
    }

    Ok(descriptors)
}

/// Best-effort cleanup of files written by a failed upload.
async fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove orphaned upload");
        }
    }
}

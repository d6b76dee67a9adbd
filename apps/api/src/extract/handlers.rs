use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CvRecord, Document, DocumentKind, SourceInfo};
use crate::pipeline::{DocumentReport, DocumentStatus};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct BatchRequest {
    pub file_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub ok: usize,
    pub failed: usize,
    pub documents: Vec<DocumentReport>,
}

/// POST /api/v1/extract
/// Runs the pipeline on one uploaded document (multipart field `file`).
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CvRecord>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let kind = DocumentKind::detect(&file_name, field.content_type())
            .ok_or_else(|| AppError::UnsupportedMedia(file_name.clone()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }

        let source = SourceInfo {
            file_id: Uuid::new_v4().to_string(),
            file_name,
        };
        info!(file_id = %source.file_id, file_name = %source.file_name, ?kind, "Upload received");
        let record = state
            .pipeline
            .process(Document::new(bytes.to_vec(), kind), &source, Utc::now().date_naive())
            .await;
        return Ok(Json(record));
    }
    Err(AppError::Validation(format!("missing multipart field '{FILE_FIELD}'")))
}

/// POST /api/v1/extract/batch
/// Fetches, processes and persists each file id on the worker pool.
pub async fn handle_extract_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let file_ids: Vec<String> = req
        .file_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if file_ids.is_empty() {
        return Err(AppError::Validation("file_ids must not be empty".to_string()));
    }

    let documents = state.batch.run(file_ids, Utc::now().date_naive()).await;
    let ok = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Ok)
        .count();
    Ok(Json(BatchResponse {
        ok,
        failed: documents.len() - ok,
        documents,
    }))
}

//! Axum route handlers for the Ranking API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::documents::extract_upload;
use crate::errors::AppError;
use crate::ranking::criteria::{extract_criteria, parse_criteria_field};
use crate::ranking::export::{write_scores_csv, CSV_FILENAME};
use crate::ranking::pipeline::{score_batch, ResumeOutcome, UploadedFile};
use crate::ranking::scoring::ScoreRecord;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CriteriaResponse {
    pub criteria: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /extract-criteria
///
/// Multipart upload of a job description (PDF, DOC/DOCX or text). The file is read
/// from the `file` field, or from the first field carrying a filename.
pub async fn handle_extract_criteria(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CriteriaResponse>, AppError> {
    let mut upload: Option<UploadedFile> = None;
    while let Some(field) = multipart.next_field().await? {
        let is_file_field = field.name() == Some("file");
        let filename = field.file_name().map(str::to_string);
        let content = field.bytes().await?;
        if upload.is_none() || is_file_field {
            if let Some(filename) = filename {
                upload = Some(UploadedFile { filename, content });
            }
        }
    }

    let upload = upload
        .ok_or_else(|| AppError::Validation("No job description file provided".to_string()))?;
    let jd_text = extract_upload(&upload.filename, upload.content).await?;
    if jd_text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "Empty job description text extracted".to_string(),
        ));
    }

    let criteria = extract_criteria(&jd_text, state.llm.as_ref()).await?;
    Ok(Json(CriteriaResponse { criteria }))
}

/// POST /score-resumes
///
/// Multipart form with a `criteria` field (JSON array or comma-separated) and one
/// or more `files`. Responds with a CSV attachment, one row per file in upload order.
pub async fn handle_score_resumes(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut criteria_raw = String::new();
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("criteria") => criteria_raw = field.text().await?,
            Some("files") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if filename.is_empty() && content.is_empty() {
                    continue;
                }
                uploads.push(UploadedFile { filename, content });
            }
            _ => {
                let _ = field.bytes().await?;
            }
        }
    }

    let criteria = parse_criteria_field(&criteria_raw);
    if uploads.is_empty() {
        return Err(AppError::Validation("No files provided".to_string()));
    }
    if criteria.is_empty() {
        return Err(AppError::Validation("No criteria provided".to_string()));
    }

    let criteria = Arc::new(criteria);
    let outcomes = score_batch(
        uploads,
        Arc::clone(&criteria),
        Arc::clone(&state.llm),
        state.scoring_concurrency,
        state.all_zero_policy,
    )
    .await;
    info!("Scored {} resumes", outcomes.len());

    let records: Vec<ScoreRecord> = outcomes
        .into_iter()
        .map(|ResumeOutcome { filename, status, record }| {
            info!("{filename}: {} [{status}]", record.candidate_name);
            record
        })
        .collect();
    let csv = write_scores_csv(&criteria, &records)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        csv,
    )
        .into_response())
}

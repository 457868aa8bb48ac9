//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::extractor::extract_text_off_runtime;
use crate::models::resume::{ResumeSummary, StoredResume};
use crate::state::AppState;

/// Name of the multipart field carrying the resume file.
const RESUME_FIELD: &str = "resume";

struct ResumeUpload {
    file_name: String,
    data: Bytes,
}

/// POST /api/resumes/upload
///
/// Extracts text from the uploaded PDF, analyzes it and stores the result.
/// Analysis problems never fail the request: a fallback record is stored instead.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StoredResume>, AppError> {
    let upload = read_resume_field(multipart).await?;

    let file_name = sanitize_filename(&upload.file_name);
    if file_name.is_empty() {
        return Err(AppError::Validation("Invalid file name".to_string()));
    }
    info!(
        "Received resume '{}' ({} bytes)",
        file_name,
        upload.data.len()
    );

    let resume_text = extract_text_off_runtime(upload.data).await;
    let outcome = state.analyzer.analyze(&resume_text).await;
    if let Some(reason) = outcome.degrade_reason() {
        info!("Storing fallback analysis for '{file_name}': {reason}");
    }
    let analysis = outcome.into_analysis();
    let stored = state.store.insert(&file_name, &analysis).await?;

    Ok(Json(stored))
}

/// GET /api/resumes/
///
/// Summary of every stored resume, newest upload first.
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    Ok(Json(state.store.list_summary().await?))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StoredResume>, AppError> {
    let resume = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(resume))
}

async fn read_resume_field(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.trim().is_empty() {
            return Err(AppError::Validation("No selected file".to_string()));
        }

        let data = field.bytes().await?;
        return Ok(ResumeUpload { file_name, data });
    }

    Err(AppError::Validation("No file part".to_string()))
}

/// Reduces a client-supplied file name to a safe, flat ASCII name.
///
/// Path separators become word breaks, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are trimmed.
/// May return an empty string.
pub fn sanitize_filename(raw: &str) -> String {
    let flattened: String = raw
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::analysis::analyzer::{analyze_cv, AnalyzeParams, JobContext};
use crate::analysis::recommend::{recommend_jobs, JobRecommendation};
use crate::errors::AppError;
use crate::extraction::{self, ExtractError, SUPPORTED_EXTENSIONS};
use crate::history;
use crate::models::analysis::{AnalysisRunRow, AnalysisStats};
use crate::models::job::JobRow;
use crate::state::AppState;
use crate::storage::{self, StoredFile};

/// Upload limit for CV documents.
pub const MAX_CV_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub user_id: Uuid,
    pub cv_text: String,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<JobRecommendation>,
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub user_id: Uuid,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis/upload
///
/// Multipart CV upload (pdf/docx/txt, ≤ 10 MB) through the full pipeline:
/// extract → (optional OCR) → prompt → score → persist. The stored-file
/// upload is best-effort — analysis proceeds even when storage fails.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisRunRow>, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut job_id: Option<Uuid> = None;
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<bytes::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "user_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {e}")))?;
                user_id = Some(
                    Uuid::parse_str(text.trim())
                        .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?,
                );
            }
            "job_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job_id field: {e}")))?;
                job_id = Uuid::parse_str(text.trim()).ok();
            }
            "file" => {
                file_name = field.file_name().map(|n| n.to_string());
                file_bytes = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Could not read uploaded file: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| AppError::Validation("user_id field is required".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;
    let file_bytes =
        file_bytes.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;

    if file_bytes.len() > MAX_CV_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "CV file exceeds the {} MB limit",
            MAX_CV_BYTES / (1024 * 1024)
        )));
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Unsupported file type '{extension}'. Accepted: pdf, docx, txt"
        )));
    }

    // Extraction works from disk; OCR rasterization needs a real path anyway.
    let workdir = tempfile::tempdir()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("scratch dir failed: {e}")))?;
    let cv_path = workdir
        .path()
        .join(sanitize_filename::sanitize(&file_name));
    tokio::fs::write(&cv_path, &file_bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("scratch write failed: {e}")))?;

    let cv_text = extraction::extract_text(&cv_path, state.ocr.as_ref())
        .await
        .map_err(extract_error_to_app)?;

    if cv_text.trim().is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the uploaded document".to_string(),
        ));
    }

    // Best-effort storage: a failed upload must not abort the analysis.
    let stored_file: Option<StoredFile> = match storage::upload_cv(
        &state.s3,
        &state.config.s3_bucket,
        &state.config.s3_endpoint,
        user_id,
        &file_name,
        file_bytes,
    )
    .await
    {
        Ok(stored) => Some(stored),
        Err(e) => {
            warn!("CV storage upload failed for user {user_id}: {e:#}");
            None
        }
    };

    let job = load_job_context(&state, job_id).await?;
    let row = analyze_cv(
        &state.db,
        &state.llm,
        AnalyzeParams {
            user_id,
            cv_text,
            stored_file,
            job,
        },
    )
    .await?;

    Ok(Json(row))
}

/// POST /api/v1/analysis/text
///
/// Raw-text submission through the same pipeline, minus file handling.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisRunRow>, AppError> {
    if request.cv_text.trim().is_empty() {
        return Err(AppError::Validation("cv_text cannot be empty".to_string()));
    }

    let cv_text = extraction::normalize_text(&request.cv_text);
    let job = load_job_context(&state, request.job_id).await?;

    let row = analyze_cv(
        &state.db,
        &state.llm,
        AnalyzeParams {
            user_id: request.user_id,
            cv_text,
            stored_file: None,
            job,
        },
    )
    .await?;

    Ok(Json(row))
}

/// GET /api/v1/analysis/history
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<AnalysisRunRow>>, AppError> {
    let rows = history::get_history(
        &state.db,
        params.user_id,
        params.page.unwrap_or(1),
        params.page_size.unwrap_or_else(history::default_page_size),
    )
    .await
    .map_err(AppError::Internal)?;
    Ok(Json(rows))
}

/// GET /api/v1/analysis/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AnalysisStats>, AppError> {
    let stats = history::get_stats(&state.db, params.user_id)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(stats))
}

/// GET /api/v1/analysis/export
///
/// Streams the user's history as an XLSX attachment.
pub async fn handle_export(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = history::get_recent_for_export(&state.db, params.user_id)
        .await
        .map_err(AppError::Internal)?;
    let bytes = history::export::build_history_workbook(&rows).map_err(AppError::Internal)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"analysis_history.xlsx\"",
            ),
        ],
        bytes,
    ))
}

/// GET /api/v1/analysis/:id
///
/// Requires BOTH the analysis id and the owning user id — an id that
/// exists under another user is indistinguishable from a missing one.
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<AnalysisRunRow>, AppError> {
    let row = history::get_by_id(&state.db, params.user_id, analysis_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;
    Ok(Json(row))
}

/// POST /api/v1/recommendations
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let recommendations =
        recommend_jobs(&state.db, &state.llm, &state.skills, request.user_id).await?;
    Ok(Json(RecommendResponse { recommendations }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn load_job_context(
    state: &AppState,
    job_id: Option<Uuid>,
) -> Result<JobContext, AppError> {
    match job_id {
        Some(id) => {
            let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
            Ok(JobContext::from_job(&job))
        }
        None => Ok(JobContext::general_review()),
    }
}

fn extract_error_to_app(e: ExtractError) -> AppError {
    match e {
        ExtractError::UnsupportedFormat(ext) => AppError::Validation(format!(
            "Unsupported file type '{ext}'. Accepted: pdf, docx, txt"
        )),
        ExtractError::CorruptOrProtected(msg) => {
            AppError::Validation(format!("Could not read document: {msg}"))
        }
    }
}

//! Analysis persistence & history.
//!
//! Runs are immutable once saved: a re-analysis inserts a new row and the
//! old one is simply superseded by recency. Retrieval by id authorizes on
//! BOTH `user_id` and `analysis_id` — an analysis id alone never fetches
//! another user's record.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::scoring::CvAnalysisResult;
use crate::models::analysis::{AnalysisRunRow, AnalysisStats};
use crate::storage::StoredFile;

pub mod export;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const EXPORT_LIMIT: i64 = 1000;

/// Parameters for persisting one analysis run.
pub struct SaveRunParams<'a> {
    pub user_id: Uuid,
    pub cv_text: &'a str,
    pub stored_file: Option<&'a StoredFile>,
    pub result: &'a CvAnalysisResult,
}

/// Persists an analysis run and returns the stored row.
/// Storage errors are surfaced — a run is never silently dropped.
pub async fn save_run(pool: &PgPool, params: SaveRunParams<'_>) -> Result<AnalysisRunRow> {
    let analysis_id = Uuid::new_v4();
    let result = params.result;
    let profile = serde_json::to_value(&result.profile)?;

    let row = sqlx::query_as::<_, AnalysisRunRow>(
        r#"
        INSERT INTO analysis_runs
            (id, user_id, cv_text, file_url, file_name, file_size,
             match_score, strengths, weaknesses, suggestions,
             detailed_rationale, recommendation, candidate_profile)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(analysis_id)
    .bind(params.user_id)
    .bind(params.cv_text)
    .bind(params.stored_file.map(|f| f.url.as_str()))
    .bind(params.stored_file.map(|f| f.file_name.as_str()))
    .bind(params.stored_file.map(|f| f.size))
    .bind(result.match_score as i32)
    .bind(&result.strengths)
    .bind(&result.weaknesses)
    .bind(&result.suggestions)
    .bind(&result.detailed_rationale)
    .bind(result.recommendation.label())
    .bind(&profile)
    .fetch_one(pool)
    .await?;

    info!(
        "Saved analysis run {analysis_id} for user {} (score {})",
        params.user_id, result.match_score
    );
    Ok(row)
}

/// Returns one page of the user's runs, most recent first.
pub async fn get_history(
    pool: &PgPool,
    user_id: Uuid,
    page: i64,
    page_size: i64,
) -> Result<Vec<AnalysisRunRow>> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * page_size;

    Ok(sqlx::query_as::<_, AnalysisRunRow>(
        r#"
        SELECT * FROM analysis_runs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool)
    .await?)
}

/// Fetches one run, requiring both keys to match.
pub async fn get_by_id(
    pool: &PgPool,
    user_id: Uuid,
    analysis_id: Uuid,
) -> Result<Option<AnalysisRunRow>> {
    Ok(sqlx::query_as::<_, AnalysisRunRow>(
        "SELECT * FROM analysis_runs WHERE id = $1 AND user_id = $2",
    )
    .bind(analysis_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?)
}

/// Aggregate statistics, recomputed on demand — no caching layer,
/// "as of last read" is the only staleness guarantee.
pub async fn get_stats(pool: &PgPool, user_id: Uuid) -> Result<AnalysisStats> {
    Ok(sqlx::query_as::<_, AnalysisStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM analysis_runs WHERE user_id = $1)       AS total_analyses,
            (SELECT AVG(match_score)::float8 FROM analysis_runs WHERE user_id = $1) AS avg_score,
            (SELECT MIN(match_score) FROM analysis_runs WHERE user_id = $1) AS min_score,
            (SELECT MAX(match_score) FROM analysis_runs WHERE user_id = $1) AS max_score,
            (SELECT COUNT(*) FROM match_analytics WHERE user_id = $1)     AS total_recommendations,
            (SELECT MIN(created_at) FROM analysis_runs WHERE user_id = $1) AS first_analysis_at,
            (SELECT MAX(created_at) FROM analysis_runs WHERE user_id = $1) AS last_analysis_at
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?)
}

/// Recent runs for Excel export, newest first.
pub async fn get_recent_for_export(pool: &PgPool, user_id: Uuid) -> Result<Vec<AnalysisRunRow>> {
    Ok(sqlx::query_as::<_, AnalysisRunRow>(
        "SELECT * FROM analysis_runs WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(EXPORT_LIMIT)
    .fetch_all(pool)
    .await?)
}

pub fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

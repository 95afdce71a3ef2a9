//! CV Analysis — orchestrates the full analysis pipeline.
//!
//! Flow: (extracted) CV text → prompt build → single LLM call →
//!       JSON carve-out → scoring → persist to history → return row.
//!
//! Every external failure on this path degrades to a conservative default
//! result rather than an error: a judgment that cannot be obtained or
//! parsed becomes the fixed manual-review result, and an empty CV is
//! scored deterministically without any external call.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::judgment::RawJudgment;
use crate::analysis::prompts::CV_ANALYSIS_PROMPT_TEMPLATE;
use crate::analysis::scoring::{empty_cv_result, manual_review_result, score_judgment};
use crate::errors::AppError;
use crate::history::{self, SaveRunParams};
use crate::llm_client::carve::carve_and_parse;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::GeminiClient;
use crate::models::analysis::AnalysisRunRow;
use crate::models::job::JobRow;
use crate::notify;
use crate::storage::StoredFile;

const ANALYSIS_TEMPERATURE: f32 = 0.2;
const ANALYSIS_MAX_TOKENS: u32 = 2048;

/// Job payload embedded in the analysis prompt. An explicit record type,
/// so prompt building gets compile-time field checks.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub job_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub experience_required: Option<String>,
}

impl JobContext {
    pub fn from_job(job: &JobRow) -> Self {
        Self {
            job_id: Some(job.id),
            title: job.title.clone(),
            description: job.description.clone(),
            required_skills: job.required_skills.clone(),
            experience_required: None,
        }
    }

    /// Context for a CV review with no target job selected.
    pub fn general_review() -> Self {
        Self {
            job_id: None,
            title: "General candidate review".to_string(),
            description: "Assess overall employability and profile quality.".to_string(),
            required_skills: Vec::new(),
            experience_required: None,
        }
    }
}

/// Inputs for one analysis run.
pub struct AnalyzeParams {
    pub user_id: Uuid,
    pub cv_text: String,
    pub stored_file: Option<StoredFile>,
    pub job: JobContext,
}

/// Runs the analysis pipeline and persists the result.
pub async fn analyze_cv(
    pool: &PgPool,
    llm: &GeminiClient,
    params: AnalyzeParams,
) -> Result<AnalysisRunRow, AppError> {
    let result = if params.cv_text.trim().is_empty() {
        info!(
            "Empty CV text for user {} — scoring deterministically, no model call",
            params.user_id
        );
        empty_cv_result(&params.job.required_skills)
    } else {
        let prompt = build_analysis_prompt(&params.job, &params.cv_text)?;
        match llm
            .generate(&prompt, ANALYSIS_TEMPERATURE, ANALYSIS_MAX_TOKENS)
            .await
        {
            Ok(text) => match carve_and_parse::<RawJudgment>(&text) {
                Ok(judgment) => score_judgment(&judgment),
                Err(e) => {
                    warn!(
                        "Unparseable judgment for user {} (cv {} chars, response {} chars): {e}",
                        params.user_id,
                        params.cv_text.len(),
                        text.len()
                    );
                    manual_review_result()
                }
            },
            Err(e) => {
                warn!(
                    "Analysis call failed for user {} (cv {} chars): {e}",
                    params.user_id,
                    params.cv_text.len()
                );
                manual_review_result()
            }
        }
    };

    let row = history::save_run(
        pool,
        SaveRunParams {
            user_id: params.user_id,
            cv_text: &params.cv_text,
            stored_file: params.stored_file.as_ref(),
            result: &result,
        },
    )
    .await
    .map_err(AppError::Internal)?;

    // In-app notification is best-effort, like the other analytics writes.
    let body = format!(
        "Your CV scored {}/100 ({}).",
        result.match_score,
        result.recommendation.label()
    );
    if let Err(e) =
        notify::insert_notification(pool, params.user_id, "CV analysis complete", &body).await
    {
        warn!(
            "failed to record analysis notification for user {}: {e}",
            params.user_id
        );
    }

    Ok(row)
}

/// Fills the analysis template with the serialized job payload and CV text.
fn build_analysis_prompt(job: &JobContext, cv_text: &str) -> Result<String, AppError> {
    let job_json = serde_json::to_string_pretty(job)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize job context: {e}")))?;

    Ok(CV_ANALYSIS_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{job_json}", &job_json)
        .replace("{cv_text}", cv_text))
}

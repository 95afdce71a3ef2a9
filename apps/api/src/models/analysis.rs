use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted analysis run. Immutable once created — a re-analysis
/// produces a new row with a fresh id, never an update in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRunRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cv_text: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    /// Always within [0, 100] — clamped before insert.
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub detailed_rationale: String,
    pub recommendation: String,
    pub candidate_profile: Value,
    pub created_at: DateTime<Utc>,
}

/// Per-user/per-job match analytics, upserted on each recommendation pass.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchAnalyticsRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub match_score: i32,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate statistics over a user's analysis history,
/// recomputed on demand from the backing rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisStats {
    pub total_analyses: i64,
    pub avg_score: Option<f64>,
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
    pub total_recommendations: i64,
    pub first_analysis_at: Option<DateTime<Utc>>,
    pub last_analysis_at: Option<DateTime<Utc>>,
}

//! Job recommendations — ranks the corpus for a candidate and persists
//! per-user/per-job match analytics.
//!
//! The model supplies the ranking when it can; when the call or the parse
//! fails, a deterministic heuristic over skills/location/salary produces a
//! degraded-but-complete ranking instead. Jobs the model mentions that are
//! not in the corpus are dropped, never kept as dangling references.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::judgment::CandidateProfile;
use crate::analysis::prompts::RECOMMEND_PROMPT_TEMPLATE;
use crate::analysis::scoring::{clamp_score, RecommendationTier};
use crate::config::SkillDomainMap;
use crate::errors::AppError;
use crate::llm_client::carve::carve_and_parse;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::GeminiClient;
use crate::models::analysis::AnalysisRunRow;
use crate::models::job::JobRow;
use crate::signals::{self, PreferenceSummary};

const RECOMMEND_TEMPERATURE: f32 = 0.3;
const RECOMMEND_MAX_TOKENS: u32 = 4096;
const CORPUS_LIMIT: i64 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Candidate payload embedded in the recommendation prompt.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateContext {
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub education: String,
    pub positions: Vec<String>,
}

impl CandidateContext {
    pub fn from_profile(profile: &CandidateProfile) -> Self {
        Self {
            skills: profile.skills.clone(),
            experience_years: profile.experience_years_rounded(),
            education: profile.education.clone(),
            positions: profile.positions.clone(),
        }
    }
}

/// One entry of the model's raw ranking. `job_id` is untrusted text.
#[derive(Debug, Clone, Deserialize)]
struct RawRecommendation {
    job_id: String,
    #[serde(default)]
    match_score: f64,
    #[serde(default)]
    reason: String,
}

/// Computed fit dimensions, reported for transparency alongside the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitScores {
    pub skills_fit: f64,
    pub location_fit: f64,
    pub salary_fit: f64,
}

/// A fully resolved recommendation for one corpus job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecommendation {
    pub job_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub required_skills: Vec<String>,
    pub match_score: u8,
    pub reason: String,
    pub recommendation_level: String,
    pub fit: FitScores,
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Produces a ranked recommendation list for the user's latest analyzed
/// profile and upserts match analytics for every recommended job.
pub async fn recommend_jobs(
    pool: &PgPool,
    llm: &GeminiClient,
    skills_map: &SkillDomainMap,
    user_id: Uuid,
) -> Result<Vec<JobRecommendation>, AppError> {
    let latest: Option<AnalysisRunRow> = sqlx::query_as(
        "SELECT * FROM analysis_runs WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let latest = latest.ok_or_else(|| {
        AppError::Validation(
            "No analyzed profile found. Run a CV analysis before requesting recommendations."
                .to_string(),
        )
    })?;

    let profile: CandidateProfile = serde_json::from_value(latest.candidate_profile.clone())
        .unwrap_or_default();
    let candidate = CandidateContext::from_profile(&profile);

    let corpus: Vec<JobRow> =
        sqlx::query_as("SELECT * FROM jobs ORDER BY created_at DESC LIMIT $1")
            .bind(CORPUS_LIMIT)
            .fetch_all(pool)
            .await?;

    if corpus.is_empty() {
        return Ok(Vec::new());
    }

    let preferences = signals::summarize(pool, user_id)
        .await
        .map_err(AppError::Internal)?;

    let ranked = match rank_with_model(llm, &candidate, &preferences, &corpus).await {
        Ok(raw) => resolve_recommendations(raw, &candidate, &preferences, &corpus, skills_map),
        Err(e) => {
            warn!("Model ranking unavailable for user {user_id}: {e}; using heuristic ranking");
            heuristic_recommendations(&candidate, &preferences, &corpus, skills_map)
        }
    };

    for rec in &ranked {
        upsert_match_analytics(pool, user_id, rec).await?;
    }

    info!(
        "Produced {} recommendations for user {user_id} over {} corpus jobs",
        ranked.len(),
        corpus.len()
    );
    Ok(ranked)
}

async fn rank_with_model(
    llm: &GeminiClient,
    candidate: &CandidateContext,
    preferences: &PreferenceSummary,
    corpus: &[JobRow],
) -> anyhow::Result<Vec<RawRecommendation>> {
    let jobs_json = serde_json::to_string_pretty(
        &corpus
            .iter()
            .map(|j| {
                serde_json::json!({
                    "id": j.id,
                    "title": j.title,
                    "company": j.company,
                    "location": j.location,
                    "job_type": j.job_type,
                    "salary": j.salary_display(),
                    "required_skills": j.required_skills,
                })
            })
            .collect::<Vec<_>>(),
    )?;

    let preferences_json = if preferences.is_empty() {
        "{}".to_string()
    } else {
        serde_json::to_string_pretty(preferences)?
    };

    let prompt = RECOMMEND_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{candidate_json}", &serde_json::to_string_pretty(candidate)?)
        .replace("{preferences_json}", &preferences_json)
        .replace("{jobs_json}", &jobs_json);

    let text = llm
        .generate(&prompt, RECOMMEND_TEMPERATURE, RECOMMEND_MAX_TOKENS)
        .await?;
    Ok(carve_and_parse::<Vec<RawRecommendation>>(&text)?)
}

/// Resolves raw model output against the corpus: parses ids, drops unknown
/// jobs, clamps scores, attaches computed fit dimensions and tier labels.
fn resolve_recommendations(
    raw: Vec<RawRecommendation>,
    candidate: &CandidateContext,
    preferences: &PreferenceSummary,
    corpus: &[JobRow],
    skills_map: &SkillDomainMap,
) -> Vec<JobRecommendation> {
    let by_id: HashMap<Uuid, &JobRow> = corpus.iter().map(|j| (j.id, j)).collect();

    let mut recommendations: Vec<JobRecommendation> = raw
        .into_iter()
        .filter_map(|r| {
            let job_id = Uuid::parse_str(r.job_id.trim()).ok()?;
            let job = by_id.get(&job_id)?;
            Some(build_recommendation(
                job,
                clamp_score(r.match_score),
                r.reason,
                candidate,
                preferences,
                skills_map,
            ))
        })
        .collect();

    recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    recommendations
}

/// Deterministic fallback ranking when no model judgment is available.
fn heuristic_recommendations(
    candidate: &CandidateContext,
    preferences: &PreferenceSummary,
    corpus: &[JobRow],
    skills_map: &SkillDomainMap,
) -> Vec<JobRecommendation> {
    let mut recommendations: Vec<JobRecommendation> = corpus
        .iter()
        .map(|job| {
            let fit = compute_fit(job, candidate, preferences, skills_map);
            let score =
                clamp_score((fit.skills_fit * 0.6 + fit.location_fit * 0.25 + fit.salary_fit * 0.15) * 100.0);
            let matched = matched_skill_count(&candidate.skills, &job.required_skills);
            let reason = format!(
                "Matched {matched} of {} required skills",
                job.required_skills.len()
            );
            build_recommendation(job, score, reason, candidate, preferences, skills_map)
        })
        .collect();

    recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    recommendations
}

fn build_recommendation(
    job: &JobRow,
    match_score: u8,
    reason: String,
    candidate: &CandidateContext,
    preferences: &PreferenceSummary,
    skills_map: &SkillDomainMap,
) -> JobRecommendation {
    JobRecommendation {
        job_id: job.id,
        title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        salary: job.salary_display(),
        required_skills: job.required_skills.clone(),
        match_score,
        reason,
        recommendation_level: RecommendationTier::from_score(match_score)
            .label()
            .to_string(),
        fit: compute_fit(job, candidate, preferences, skills_map),
    }
}

/// Refreshes the advisory match-analytics row for `(user, job)`.
/// Single-statement upsert: concurrent refreshes are last-writer-wins and
/// can never create a duplicate row.
async fn upsert_match_analytics(
    pool: &PgPool,
    user_id: Uuid,
    rec: &JobRecommendation,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO match_analytics (id, user_id, job_id, match_score, recommendation)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, job_id) DO UPDATE
        SET match_score = EXCLUDED.match_score,
            recommendation = EXCLUDED.recommendation,
            updated_at = NOW()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(rec.job_id)
    .bind(rec.match_score as i32)
    .bind(&rec.recommendation_level)
    .execute(pool)
    .await?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Fit dimensions
// ────────────────────────────────────────────────────────────────────────────

fn compute_fit(
    job: &JobRow,
    candidate: &CandidateContext,
    preferences: &PreferenceSummary,
    skills_map: &SkillDomainMap,
) -> FitScores {
    FitScores {
        skills_fit: skills_fit(&candidate.skills, &job.required_skills, skills_map),
        location_fit: location_fit(&job.location, &preferences.top_locations),
        salary_fit: salary_fit(job, preferences),
    }
}

/// Ratio of required skills the candidate covers. When nothing overlaps
/// directly but both skill sets fall in the same domain of the injected
/// map, partial adjacent-field credit applies.
fn skills_fit(candidate_skills: &[String], required: &[String], map: &SkillDomainMap) -> f64 {
    if required.is_empty() {
        return 0.5;
    }

    let matched = matched_skill_count(candidate_skills, required);
    if matched > 0 {
        return matched as f64 / required.len() as f64;
    }

    match (map.domain_of(candidate_skills), map.domain_of(required)) {
        (Some(a), Some(b)) if a == b => 0.25,
        _ => 0.0,
    }
}

fn matched_skill_count(candidate_skills: &[String], required: &[String]) -> usize {
    required
        .iter()
        .filter(|r| {
            let r = r.to_lowercase();
            candidate_skills.iter().any(|c| {
                let c = c.to_lowercase();
                c.contains(&r) || r.contains(&c)
            })
        })
        .count()
}

fn location_fit(job_location: &str, top_locations: &[String]) -> f64 {
    if top_locations.is_empty() {
        return 0.5; // no observed preference yet
    }
    let job_location = job_location.to_lowercase();
    let preferred = top_locations.iter().any(|l| {
        let l = l.to_lowercase();
        job_location.contains(&l) || l.contains(&job_location)
    });
    if preferred {
        1.0
    } else {
        0.25
    }
}

fn salary_fit(job: &JobRow, preferences: &PreferenceSummary) -> f64 {
    let band = match &preferences.salary_band {
        Some(b) => b,
        None => return 0.5,
    };
    match (job.salary_min, job.salary_max) {
        (Some(min), Some(max)) => {
            if min <= band.max && max >= band.min {
                1.0
            } else {
                0.25
            }
        }
        _ => 0.5,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SalaryBand;
    use chrono::Utc;

    fn job(id: Uuid, required: &[&str]) -> JobRow {
        JobRow {
            id,
            title: "Growth Marketer".to_string(),
            company: "Acme".to_string(),
            location: "Hanoi".to_string(),
            job_type: "full_time".to_string(),
            salary_min: Some(1000),
            salary_max: Some(2000),
            required_skills: required.iter().map(|s| s.to_string()).collect(),
            description: "desc".to_string(),
            created_at: Utc::now(),
        }
    }

    fn candidate(skills: &[&str]) -> CandidateContext {
        CandidateContext {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: 3,
            education: "BA".to_string(),
            positions: vec![],
        }
    }

    fn no_preferences() -> PreferenceSummary {
        PreferenceSummary {
            top_keywords: vec![],
            top_locations: vec![],
            top_job_types: vec![],
            salary_band: None,
        }
    }

    #[test]
    fn test_unknown_job_ids_are_dropped() {
        let known = Uuid::new_v4();
        let corpus = vec![job(known, &["seo"])];
        let raw = vec![
            RawRecommendation {
                job_id: known.to_string(),
                match_score: 70.0,
                reason: "fits".to_string(),
            },
            RawRecommendation {
                job_id: Uuid::new_v4().to_string(),
                match_score: 90.0,
                reason: "hallucinated".to_string(),
            },
            RawRecommendation {
                job_id: "not-a-uuid".to_string(),
                match_score: 80.0,
                reason: "garbage".to_string(),
            },
        ];

        let resolved = resolve_recommendations(
            raw,
            &candidate(&["seo"]),
            &no_preferences(),
            &corpus,
            &SkillDomainMap::builtin(),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].job_id, known);
    }

    #[test]
    fn test_model_scores_are_clamped_and_labeled() {
        let id = Uuid::new_v4();
        let corpus = vec![job(id, &["seo"])];
        let raw = vec![RawRecommendation {
            job_id: id.to_string(),
            match_score: 240.0,
            reason: "overenthusiastic".to_string(),
        }];

        let resolved = resolve_recommendations(
            raw,
            &candidate(&["seo"]),
            &no_preferences(),
            &corpus,
            &SkillDomainMap::builtin(),
        );
        assert_eq!(resolved[0].match_score, 100);
        assert_eq!(resolved[0].recommendation_level, "Highly Recommended");
    }

    #[test]
    fn test_heuristic_ranking_orders_by_overlap() {
        let strong = Uuid::new_v4();
        let weak = Uuid::new_v4();
        let corpus = vec![job(weak, &["figma", "branding"]), job(strong, &["seo", "sql"])];

        let ranked = heuristic_recommendations(
            &candidate(&["seo", "sql"]),
            &no_preferences(),
            &corpus,
            &SkillDomainMap::builtin(),
        );
        assert_eq!(ranked[0].job_id, strong);
        assert!(ranked[0].match_score > ranked[1].match_score);
    }

    #[test]
    fn test_skills_fit_full_overlap_is_one() {
        let fit = skills_fit(
            &["SEO".to_string(), "SQL".to_string()],
            &["seo".to_string(), "sql".to_string()],
            &SkillDomainMap::builtin(),
        );
        assert!((fit - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skills_fit_same_domain_gets_partial_credit() {
        let fit = skills_fit(
            &["copywriting".to_string()],
            &["social media".to_string()],
            &SkillDomainMap::builtin(),
        );
        assert!((fit - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skills_fit_disjoint_domains_is_zero() {
        let fit = skills_fit(
            &["accounting".to_string()],
            &["figma".to_string()],
            &SkillDomainMap::builtin(),
        );
        assert_eq!(fit, 0.0);
    }

    #[test]
    fn test_location_fit_prefers_observed_locations() {
        let prefs = vec!["hanoi".to_string()];
        assert_eq!(location_fit("Hanoi, Vietnam", &prefs), 1.0);
        assert_eq!(location_fit("Da Nang", &prefs), 0.25);
        assert_eq!(location_fit("Anywhere", &[]), 0.5);
    }

    #[test]
    fn test_salary_fit_overlapping_band() {
        let mut prefs = no_preferences();
        prefs.salary_band = Some(SalaryBand {
            min: 1500,
            avg: 1800,
            max: 2500,
        });
        let j = job(Uuid::new_v4(), &["seo"]);
        assert_eq!(salary_fit(&j, &prefs), 1.0);
    }

    #[test]
    fn test_salary_fit_disjoint_band() {
        let mut prefs = no_preferences();
        prefs.salary_band = Some(SalaryBand {
            min: 5000,
            avg: 6000,
            max: 7000,
        });
        let j = job(Uuid::new_v4(), &["seo"]);
        assert_eq!(salary_fit(&j, &prefs), 0.25);
    }
}

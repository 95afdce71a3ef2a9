//! Behavioral signal store — search / view / application events.
//!
//! Recording is fire-and-forget: failures are logged and swallowed so
//! analytics never block or fail the primary user action. Events are
//! append-only and consumed strictly in aggregate.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

pub mod handlers;

const TOP_KEYWORDS: usize = 10;
const TOP_LOCATIONS: usize = 5;
const TOP_JOB_TYPES: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Event payloads
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEvent {
    pub user_id: Uuid,
    pub keyword: String,
    pub location: Option<String>,
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobEvent {
    pub user_id: Uuid,
    pub job_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Recording (append-only, never surfaced)
// ────────────────────────────────────────────────────────────────────────────

pub async fn record_search(pool: &PgPool, event: &SearchEvent) {
    let result = sqlx::query(
        "INSERT INTO search_events (id, user_id, keyword, location, job_type)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(event.user_id)
    .bind(event.keyword.trim().to_lowercase())
    .bind(event.location.as_deref().map(str::trim))
    .bind(event.job_type.as_deref().map(str::trim))
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!("failed to record search event for user {}: {e}", event.user_id);
    }
}

pub async fn record_view(pool: &PgPool, event: &JobEvent) {
    let result =
        sqlx::query("INSERT INTO view_events (id, user_id, job_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(event.user_id)
            .bind(event.job_id)
            .execute(pool)
            .await;

    if let Err(e) = result {
        warn!("failed to record view event for user {}: {e}", event.user_id);
    }
}

pub async fn record_application(pool: &PgPool, event: &JobEvent) {
    let result =
        sqlx::query("INSERT INTO application_events (id, user_id, job_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(event.user_id)
            .bind(event.job_id)
            .execute(pool)
            .await;

    if let Err(e) = result {
        warn!(
            "failed to record application event for user {}: {e}",
            event.user_id
        );
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Preference summary
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryBand {
    pub min: i64,
    pub avg: i64,
    pub max: i64,
}

/// Lightweight preference summary derived from grouped event counts,
/// computed fresh on every call. Feeds personalization context into
/// recommendation prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceSummary {
    pub top_keywords: Vec<String>,
    pub top_locations: Vec<String>,
    pub top_job_types: Vec<String>,
    pub salary_band: Option<SalaryBand>,
}

impl PreferenceSummary {
    pub fn is_empty(&self) -> bool {
        self.top_keywords.is_empty()
            && self.top_locations.is_empty()
            && self.top_job_types.is_empty()
            && self.salary_band.is_none()
    }
}

pub async fn summarize(pool: &PgPool, user_id: Uuid) -> Result<PreferenceSummary> {
    let keyword_counts: Vec<(String, i64)> = sqlx::query_as(
        "SELECT keyword, COUNT(*) FROM search_events
         WHERE user_id = $1 GROUP BY keyword",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    // Locations come from both explicit search filters and viewed jobs.
    let location_counts: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT location, SUM(n)::bigint FROM (
            SELECT location, COUNT(*) AS n FROM search_events
            WHERE user_id = $1 AND location IS NOT NULL GROUP BY location
            UNION ALL
            SELECT j.location, COUNT(*) AS n FROM view_events v
            JOIN jobs j ON j.id = v.job_id
            WHERE v.user_id = $1 GROUP BY j.location
        ) AS merged GROUP BY location
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let job_type_counts: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT job_type, SUM(n)::bigint FROM (
            SELECT job_type, COUNT(*) AS n FROM search_events
            WHERE user_id = $1 AND job_type IS NOT NULL GROUP BY job_type
            UNION ALL
            SELECT j.job_type, COUNT(*) AS n FROM application_events a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.user_id = $1 GROUP BY j.job_type
        ) AS merged GROUP BY job_type
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let salary_band: Option<(Option<i64>, Option<f64>, Option<i64>)> = sqlx::query_as(
        r#"
        SELECT MIN(j.salary_min), AVG((j.salary_min + j.salary_max) / 2.0)::float8, MAX(j.salary_max)
        FROM jobs j
        WHERE j.salary_min IS NOT NULL AND j.salary_max IS NOT NULL AND j.id IN (
            SELECT job_id FROM view_events WHERE user_id = $1
            UNION
            SELECT job_id FROM application_events WHERE user_id = $1
        )
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(PreferenceSummary {
        top_keywords: rank_descending(keyword_counts, TOP_KEYWORDS),
        top_locations: rank_descending(location_counts, TOP_LOCATIONS),
        top_job_types: rank_descending(job_type_counts, TOP_JOB_TYPES),
        salary_band: salary_band.and_then(|(min, avg, max)| {
            Some(SalaryBand {
                min: min?,
                avg: avg?.round() as i64,
                max: max?,
            })
        }),
    })
}

/// Ranks grouped counts descending with a lexical tie-break, so repeated
/// calls over the same events always produce identical output.
fn rank_descending(counts: Vec<(String, i64)>, limit: usize) -> Vec<String> {
    let mut merged: HashMap<String, i64> = HashMap::new();
    for (key, count) in counts {
        *merged.entry(key).or_default() += count;
    }

    let mut ranked: Vec<(String, i64)> = merged.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(k, _)| k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(items: &[(&str, i64)]) -> Vec<(String, i64)> {
        items.iter().map(|(k, n)| (k.to_string(), *n)).collect()
    }

    #[test]
    fn test_rank_descending_orders_by_count() {
        let ranked = rank_descending(counts(&[("rust", 2), ("sql", 5), ("go", 1)]), 10);
        assert_eq!(ranked, vec!["sql", "rust", "go"]);
    }

    #[test]
    fn test_rank_descending_ties_break_lexically() {
        let ranked = rank_descending(counts(&[("zig", 3), ("ada", 3)]), 10);
        assert_eq!(ranked, vec!["ada", "zig"]);
    }

    #[test]
    fn test_rank_descending_applies_limit() {
        let ranked = rank_descending(counts(&[("a", 9), ("b", 8), ("c", 7)]), 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_rank_descending_merges_duplicate_keys() {
        let ranked = rank_descending(counts(&[("hanoi", 1), ("hanoi", 3), ("hue", 2)]), 10);
        assert_eq!(ranked, vec!["hanoi", "hue"]);
    }

    #[test]
    fn test_rank_descending_is_idempotent() {
        let input = counts(&[("a", 2), ("b", 2), ("c", 1)]);
        assert_eq!(
            rank_descending(input.clone(), 10),
            rank_descending(input, 10)
        );
    }

    #[test]
    fn test_empty_summary_detection() {
        let summary = PreferenceSummary {
            top_keywords: vec![],
            top_locations: vec![],
            top_job_types: vec![],
            salary_band: None,
        };
        assert!(summary.is_empty());
    }
}

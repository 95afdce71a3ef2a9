//! Scoring engine — converts the model's free-form judgment into a bounded,
//! auditable analysis result.
//!
//! Pure functions over the parsed judgment structure. No I/O, no clock, no
//! state: every call is fully determined by its explicit inputs.

use serde::{Deserialize, Serialize};

use crate::analysis::judgment::{CandidateProfile, RawJudgment};

/// Score reported when the response contained no recoverable JSON.
/// Deliberately distinct from 0: it means "manual review required",
/// not "candidate scored zero on merit".
pub const MANUAL_REVIEW_SCORE: u8 = 25;

/// Score for a CV with no extractable text against a concrete job.
pub const EMPTY_CV_SCORE: u8 = 15;

const MIN_SUGGESTIONS: usize = 3;

const RED_FLAG_MARKER: &str = "⚠ ";
const CONCERN_MARKER: &str = "• ";

pub const MANUAL_REVIEW_MESSAGE: &str =
    "This CV could not be analyzed automatically. Manual review required.";

// ────────────────────────────────────────────────────────────────────────────
// Recommendation tiers
// ────────────────────────────────────────────────────────────────────────────

/// Ordinal label derived from a numeric match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    HighlyRecommended,
    GoodMatch,
    PotentialMatch,
    LowMatch,
}

impl RecommendationTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::HighlyRecommended,
            60..=79 => Self::GoodMatch,
            40..=59 => Self::PotentialMatch,
            _ => Self::LowMatch,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HighlyRecommended => "Highly Recommended",
            Self::GoodMatch => "Good Match",
            Self::PotentialMatch => "Potential Match",
            Self::LowMatch => "Low Match",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis result
// ────────────────────────────────────────────────────────────────────────────

/// Fully validated analysis of one CV: the shape persisted to history and
/// returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvAnalysisResult {
    pub match_score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub detailed_rationale: String,
    pub recommendation: RecommendationTier,
    pub profile: CandidateProfile,
}

/// Scores a parsed judgment.
pub fn score_judgment(raw: &RawJudgment) -> CvAnalysisResult {
    let match_score = clamp_score(raw.final_score);

    CvAnalysisResult {
        match_score,
        strengths: build_strengths(&raw.positive_points),
        weaknesses: build_weaknesses(&raw.major_red_flags, &raw.minor_concerns),
        suggestions: build_suggestions(&raw.critical_missing_skills),
        detailed_rationale: build_rationale(raw),
        recommendation: RecommendationTier::from_score(match_score),
        profile: raw.candidate_profile.clone(),
    }
}

/// Fixed low-confidence result when no JSON could be located at all.
pub fn manual_review_result() -> CvAnalysisResult {
    CvAnalysisResult {
        match_score: MANUAL_REVIEW_SCORE,
        strengths: vec!["Not determined — see rationale".to_string()],
        weaknesses: vec![format!("{RED_FLAG_MARKER}Automatic analysis failed")],
        suggestions: generic_suggestions(),
        detailed_rationale: MANUAL_REVIEW_MESSAGE.to_string(),
        recommendation: RecommendationTier::from_score(MANUAL_REVIEW_SCORE),
        profile: CandidateProfile::default(),
    }
}

/// Deterministic result for an empty CV against a job: no external call is
/// made, every required skill is reported as missing.
pub fn empty_cv_result(required_skills: &[String]) -> CvAnalysisResult {
    let mut weaknesses = vec![format!("{RED_FLAG_MARKER}No CV content could be read")];
    weaknesses.extend(
        required_skills
            .iter()
            .map(|s| format!("{RED_FLAG_MARKER}Missing required skill: {s}")),
    );

    CvAnalysisResult {
        match_score: EMPTY_CV_SCORE,
        strengths: vec!["None identified".to_string()],
        weaknesses,
        suggestions: build_suggestions(required_skills),
        detailed_rationale:
            "The submitted CV contained no readable text, so no evidence of the required skills \
             could be found. Resubmit a text-based document or fill in the profile manually."
                .to_string(),
        recommendation: RecommendationTier::from_score(EMPTY_CV_SCORE),
        profile: CandidateProfile::default(),
    }
}

/// Clamps an upstream score (possibly negative or > 100) into [0, 100].
pub fn clamp_score(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0).round() as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Result composition
// ────────────────────────────────────────────────────────────────────────────

fn build_strengths(positive_points: &[String]) -> Vec<String> {
    if positive_points.is_empty() {
        vec!["None identified".to_string()]
    } else {
        positive_points.to_vec()
    }
}

fn build_weaknesses(major_red_flags: &[String], minor_concerns: &[String]) -> Vec<String> {
    let mut weaknesses: Vec<String> = major_red_flags
        .iter()
        .map(|f| format!("{RED_FLAG_MARKER}{f}"))
        .chain(minor_concerns.iter().map(|c| format!("{CONCERN_MARKER}{c}")))
        .collect();

    if weaknesses.is_empty() {
        weaknesses.push("None identified".to_string());
    }
    weaknesses
}

/// One acquisition directive per critical missing skill, padded with
/// generic advice up to the minimum count.
fn build_suggestions(critical_missing_skills: &[String]) -> Vec<String> {
    let mut suggestions: Vec<String> = critical_missing_skills
        .iter()
        .map(|skill| format!("Develop demonstrable proficiency in {skill}"))
        .collect();

    for generic in generic_suggestions() {
        if suggestions.len() >= MIN_SUGGESTIONS {
            break;
        }
        suggestions.push(generic);
    }
    suggestions
}

fn generic_suggestions() -> Vec<String> {
    vec![
        "Quantify achievements with concrete numbers and outcomes".to_string(),
        "Tailor the CV summary to the specific role being applied for".to_string(),
        "List recent projects with the technologies and your role in each".to_string(),
    ]
}

/// Model reasoning followed by an itemized breakdown of the penalties that
/// were actually applied (present and positive).
fn build_rationale(raw: &RawJudgment) -> String {
    let mut rationale = raw.reasoning.trim().to_string();
    if rationale.is_empty() {
        rationale = "No reasoning provided by the analysis model.".to_string();
    }

    let penalties = [
        ("Field mismatch", raw.penalties.field_mismatch),
        ("Experience gap", raw.penalties.experience_gap),
        ("Skills gap", raw.penalties.skills_gap),
    ];

    let applied: Vec<String> = penalties
        .iter()
        .filter(|(_, points)| *points > 0.0)
        .map(|(name, points)| format!("- {name}: -{points:.0} points"))
        .collect();

    if !applied.is_empty() {
        rationale.push_str("\n\nScore penalties applied:\n");
        rationale.push_str(&applied.join("\n"));
    }
    rationale
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::judgment::PenaltyBreakdown;

    fn judgment(score: f64) -> RawJudgment {
        RawJudgment {
            final_score: score,
            reasoning: "Solid backend profile.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_clamp_negative_score_to_zero() {
        assert_eq!(clamp_score(-40.0), 0);
    }

    #[test]
    fn test_clamp_overflow_score_to_hundred() {
        assert_eq!(clamp_score(240.0), 100);
    }

    #[test]
    fn test_clamp_in_range_score_rounds() {
        assert_eq!(clamp_score(71.6), 72);
    }

    #[test]
    fn test_score_judgment_clamps_out_of_range_inputs() {
        assert_eq!(score_judgment(&judgment(-5.0)).match_score, 0);
        assert_eq!(score_judgment(&judgment(150.0)).match_score, 100);
        assert_eq!(score_judgment(&judgment(64.0)).match_score, 64);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(
            RecommendationTier::from_score(80),
            RecommendationTier::HighlyRecommended
        );
        assert_eq!(
            RecommendationTier::from_score(79),
            RecommendationTier::GoodMatch
        );
        assert_eq!(
            RecommendationTier::from_score(60),
            RecommendationTier::GoodMatch
        );
        assert_eq!(
            RecommendationTier::from_score(59),
            RecommendationTier::PotentialMatch
        );
        assert_eq!(
            RecommendationTier::from_score(40),
            RecommendationTier::PotentialMatch
        );
        assert_eq!(
            RecommendationTier::from_score(39),
            RecommendationTier::LowMatch
        );
        assert_eq!(
            RecommendationTier::from_score(0),
            RecommendationTier::LowMatch
        );
    }

    #[test]
    fn test_empty_positive_points_get_placeholder() {
        let result = score_judgment(&judgment(50.0));
        assert_eq!(result.strengths, vec!["None identified".to_string()]);
    }

    #[test]
    fn test_weaknesses_combine_flags_and_concerns_with_markers() {
        let raw = RawJudgment {
            final_score: 45.0,
            major_red_flags: vec!["No production experience".to_string()],
            minor_concerns: vec!["Short tenures".to_string()],
            ..Default::default()
        };
        let result = score_judgment(&raw);
        assert_eq!(result.weaknesses.len(), 2);
        assert!(result.weaknesses[0].starts_with("⚠ "));
        assert!(result.weaknesses[1].starts_with("• "));
    }

    #[test]
    fn test_suggestions_padded_to_minimum_of_three() {
        let raw = RawJudgment {
            critical_missing_skills: vec!["Kubernetes".to_string()],
            ..Default::default()
        };
        let result = score_judgment(&raw);
        assert!(result.suggestions.len() >= 3);
        assert!(result.suggestions[0].contains("Kubernetes"));
    }

    #[test]
    fn test_suggestions_not_padded_when_enough_missing_skills() {
        let raw = RawJudgment {
            critical_missing_skills: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(score_judgment(&raw).suggestions.len(), 4);
    }

    #[test]
    fn test_rationale_itemizes_positive_penalties_only() {
        let raw = RawJudgment {
            final_score: 40.0,
            reasoning: "Adjacent field.".to_string(),
            penalties: PenaltyBreakdown {
                field_mismatch: 20.0,
                experience_gap: 0.0,
                skills_gap: 15.0,
            },
            ..Default::default()
        };
        let rationale = score_judgment(&raw).detailed_rationale;
        assert!(rationale.contains("Field mismatch: -20"));
        assert!(rationale.contains("Skills gap: -15"));
        assert!(!rationale.contains("Experience gap"));
    }

    #[test]
    fn test_manual_review_result_is_twenty_five_not_zero() {
        let result = manual_review_result();
        assert_eq!(result.match_score, 25);
        assert!(result.detailed_rationale.contains("Manual review"));
        assert_eq!(result.recommendation, RecommendationTier::LowMatch);
    }

    #[test]
    fn test_empty_cv_scores_at_most_twenty() {
        let required = vec!["Social Media".to_string(), "Content Creation".to_string()];
        let result = empty_cv_result(&required);
        assert!(result.match_score <= 20);
        assert_eq!(result.recommendation, RecommendationTier::LowMatch);
        assert!(!result.weaknesses.is_empty());
        assert!(result
            .weaknesses
            .iter()
            .any(|w| w.contains("Social Media")));
    }
}

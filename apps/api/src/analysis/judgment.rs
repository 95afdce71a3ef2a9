//! Typed shape of the external model's judgment, before local validation.
//!
//! Everything in here is UNTRUSTED: scores may be out of range, lists may
//! be empty, numbers may arrive as integers or fractions. The scoring
//! engine is responsible for clamping and defaulting — deserialization is
//! deliberately lenient (`#[serde(default)]` throughout) so a partially
//! conforming response still yields a usable judgment.

use serde::{Deserialize, Serialize};

/// Raw judgment for a single CV against a job context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJudgment {
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub penalties: PenaltyBreakdown,
    #[serde(default)]
    pub positive_points: Vec<String>,
    #[serde(default)]
    pub major_red_flags: Vec<String>,
    #[serde(default)]
    pub minor_concerns: Vec<String>,
    #[serde(default)]
    pub critical_missing_skills: Vec<String>,
    #[serde(default)]
    pub candidate_profile: CandidateProfile,
}

/// Itemized deductions the model was instructed to report alongside its
/// score, so the rubric stays auditable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    #[serde(default)]
    pub field_mismatch: f64,
    #[serde(default)]
    pub experience_gap: f64,
    #[serde(default)]
    pub skills_gap: f64,
}

/// Candidate facts the model extracted from the CV. Recomputed per
/// analysis call — this is derived data, not an entity of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    /// Raw value as reported — may be fractional ("2.6 years").
    #[serde(default)]
    pub experience_years: f64,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
}

impl CandidateProfile {
    /// Experience as a non-negative whole number of years, rounded half-up.
    pub fn experience_years_rounded(&self) -> u32 {
        self.experience_years.max(0.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_years_fractional_rounds_half_up() {
        let profile = CandidateProfile {
            experience_years: 2.6,
            ..Default::default()
        };
        assert_eq!(profile.experience_years_rounded(), 3);
    }

    #[test]
    fn test_experience_years_half_rounds_up() {
        let profile = CandidateProfile {
            experience_years: 2.5,
            ..Default::default()
        };
        assert_eq!(profile.experience_years_rounded(), 3);
    }

    #[test]
    fn test_experience_years_integer_passes_through() {
        let profile = CandidateProfile {
            experience_years: 4.0,
            ..Default::default()
        };
        assert_eq!(profile.experience_years_rounded(), 4);
    }

    #[test]
    fn test_experience_years_negative_clamps_to_zero() {
        let profile = CandidateProfile {
            experience_years: -1.0,
            ..Default::default()
        };
        assert_eq!(profile.experience_years_rounded(), 0);
    }

    #[test]
    fn test_judgment_tolerates_integer_and_fractional_numbers() {
        let raw = r#"{
            "final_score": 73,
            "candidate_profile": {"skills": ["sql"], "experience_years": 2.6}
        }"#;
        let judgment: RawJudgment = serde_json::from_str(raw).unwrap();
        assert_eq!(judgment.final_score, 73.0);
        assert_eq!(judgment.candidate_profile.experience_years_rounded(), 3);
    }

    #[test]
    fn test_judgment_tolerates_missing_fields() {
        let judgment: RawJudgment = serde_json::from_str(r#"{"final_score": -12}"#).unwrap();
        assert_eq!(judgment.final_score, -12.0);
        assert!(judgment.positive_points.is_empty());
        assert!(judgment.candidate_profile.skills.is_empty());
    }
}

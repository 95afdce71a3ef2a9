// All LLM prompt constants for the Analysis module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// CV analysis prompt template.
/// Replace: {json_only}, {job_json}, {cv_text}
///
/// The scoring rubric is embedded as prose so the model's reported score
/// and its penalty breakdown stay self-consistent.
pub const CV_ANALYSIS_PROMPT_TEMPLATE: &str = r#"{json_only}

You are an experienced technical recruiter evaluating one candidate CV
against one job posting.

Return a JSON object with this EXACT schema (no extra fields):
{
  "final_score": 72,
  "reasoning": "Two short paragraphs explaining the score",
  "penalties": {
    "field_mismatch": 0,
    "experience_gap": 10,
    "skills_gap": 8
  },
  "positive_points": ["Concrete strength backed by CV evidence"],
  "major_red_flags": ["Disqualifying or near-disqualifying issue"],
  "minor_concerns": ["Smaller issue worth flagging"],
  "critical_missing_skills": ["Required skill absent from the CV"],
  "candidate_profile": {
    "skills": ["skill extracted from the CV"],
    "experience_years": 2.5,
    "education": "Highest relevant education",
    "positions": ["Prior position titles"],
    "projects": ["Notable projects"]
  }
}

SCORING RUBRIC — start from 100 and subtract. Report every deduction in
"penalties" and make final_score consistent with them:

FIELD MISMATCH:
- Completely different professional field: subtract 30 to 50
- Adjacent field with transferable skills: subtract 10 to 25
- Same field: subtract 0

EXPERIENCE GAP versus the posting's stated requirement:
- Missing more than 3 years: subtract 20 to 30
- Missing 1 to 3 years: subtract 10 to 15
- Meets or exceeds: subtract 0

SKILLS GAP versus the posting's required skills:
- Most critical skills absent: subtract 25 to 40
- Some critical skills absent: subtract 10 to 20
- All present: subtract 0

"experience_years" is the candidate's total relevant experience; use a
fractional number when the CV implies one.

JOB POSTING:
{job_json}

CANDIDATE CV TEXT:
{cv_text}"#;

/// Job recommendation prompt template.
/// Replace: {json_only}, {candidate_json}, {preferences_json}, {jobs_json}
pub const RECOMMEND_PROMPT_TEMPLATE: &str = r#"{json_only}

You are a job-matching assistant. Rank the open jobs below for this
candidate and score each one.

Return a JSON ARRAY with this EXACT schema:
[
  {
    "job_id": "the exact id copied from the job list",
    "match_score": 84,
    "reason": "One or two sentences on why this job fits (or does not)"
  }
]

RULES:
1. "job_id" MUST be copied verbatim from the job list — never invent ids.
2. "match_score" is 0-100: weigh skills overlap most, then experience
   level, then the candidate's observed preferences (locations, job
   types, salary band).
3. Include every job from the list exactly once.
4. Keep reasons concrete: name the overlapping or missing skills.

CANDIDATE:
{candidate_json}

OBSERVED PREFERENCES (from the candidate's activity, may be empty):
{preferences_json}

OPEN JOBS:
{jobs_json}"#;

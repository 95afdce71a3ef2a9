//! Excel export of a user's analysis history.

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

use crate::models::analysis::AnalysisRunRow;

const HEADERS: &[&str] = &[
    "Analysis ID",
    "Date",
    "Score",
    "Recommendation",
    "File",
    "Strengths",
    "Weaknesses",
    "Suggestions",
];

/// Renders history rows into an XLSX workbook, one run per row.
pub fn build_history_workbook(rows: &[AnalysisRunRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write(0, col as u16, *header)
            .context("failed to write export header")?;
    }

    for (i, run) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet
            .write(row, 0, run.id.to_string())
            .and_then(|ws| ws.write(row, 1, run.created_at.format("%Y-%m-%d %H:%M").to_string()))
            .and_then(|ws| ws.write(row, 2, run.match_score))
            .and_then(|ws| ws.write(row, 3, run.recommendation.as_str()))
            .and_then(|ws| ws.write(row, 4, run.file_name.as_deref().unwrap_or("-")))
            .and_then(|ws| ws.write(row, 5, run.strengths.join("; ")))
            .and_then(|ws| ws.write(row, 6, run.weaknesses.join("; ")))
            .and_then(|ws| ws.write(row, 7, run.suggestions.join("; ")))
            .context("failed to write export row")?;
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize workbook")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn run() -> AnalysisRunRow {
        AnalysisRunRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            cv_text: "text".to_string(),
            file_url: None,
            file_name: Some("cv.pdf".to_string()),
            file_size: Some(1024),
            match_score: 64,
            strengths: vec!["SQL".to_string()],
            weaknesses: vec!["No cloud experience".to_string()],
            suggestions: vec!["Learn AWS".to_string()],
            detailed_rationale: "ok".to_string(),
            recommendation: "Good Match".to_string(),
            candidate_profile: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_workbook_builds_for_empty_history() {
        let bytes = build_history_workbook(&[]).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_workbook_builds_with_rows() {
        let bytes = build_history_workbook(&[run(), run()]).unwrap();
        // XLSX containers are ZIP files
        assert_eq!(&bytes[..2], b"PK");
    }
}

//! Text extraction from uploaded CV documents (PDF / DOCX / TXT).
//!
//! Policy: direct extraction first; when a PDF yields fewer than
//! `MIN_DIRECT_TEXT_CHARS` characters (a scanned/image-based document),
//! re-run through the OCR engine and keep whichever text is strictly longer.
//! OCR failure degrades to an empty string — empty CV text is handled
//! explicitly downstream, so this never fails the caller.

use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::{events::Event, Reader as XmlReader};
use thiserror::Error;
use tracing::warn;
use zip::ZipArchive;

use crate::extraction::ocr::OcrEngine;

pub mod ocr;

/// Direct extraction shorter than this triggers the OCR fallback.
pub const MIN_DIRECT_TEXT_CHARS: usize = 50;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read document: {0}")]
    CorruptOrProtected(String),
}

/// Extracts normalized plain text from a CV document on disk.
pub async fn extract_text(path: &Path, ocr: &dyn OcrEngine) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let raw = match extension.as_str() {
        "pdf" => {
            let direct = extract_pdf_text(path.to_path_buf()).await?;
            if needs_ocr(&direct) {
                let recognized = match ocr.recognize_pdf(path).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("OCR fallback failed for {}: {e:#}", path.display());
                        String::new()
                    }
                };
                prefer_longer(direct, recognized)
            } else {
                direct
            }
        }
        "docx" => extract_docx_text(path.to_path_buf()).await?,
        "txt" => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractError::CorruptOrProtected(e.to_string()))?,
        other => return Err(ExtractError::UnsupportedFormat(other.to_string())),
    };

    Ok(normalize_text(&raw))
}

/// True when direct extraction looks like a scanned document.
pub fn needs_ocr(direct_text: &str) -> bool {
    direct_text.trim().chars().count() < MIN_DIRECT_TEXT_CHARS
}

/// OCR output replaces direct extraction only when strictly longer.
pub fn prefer_longer(direct: String, recognized: String) -> String {
    if recognized.trim().chars().count() > direct.trim().chars().count() {
        recognized
    } else {
        direct
    }
}

/// Collapses whitespace runs and strips characters outside the allow-list
/// (word characters plus basic punctuation). This is the text sent onward.
pub fn normalize_text(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || is_allowed_punctuation(c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_allowed_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '-' | '_' | '\'' | '"' | '(' | ')' | '/' | '+' | '@'
            | '&' | '%' | '#'
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Format-specific extraction (CPU-bound work runs on the blocking pool)
// ────────────────────────────────────────────────────────────────────────────

async fn extract_pdf_text(path: PathBuf) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text(&path)
            .map_err(|e| ExtractError::CorruptOrProtected(format!("PDF parse failed: {e}")))
    })
    .await
    .map_err(|e| ExtractError::CorruptOrProtected(format!("extraction task failed: {e}")))?
}

async fn extract_docx_text(path: PathBuf) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || read_docx_document(&path))
        .await
        .map_err(|e| ExtractError::CorruptOrProtected(format!("extraction task failed: {e}")))?
}

/// Walks `word/document.xml` inside the DOCX container, collecting text
/// nodes and mapping tabs/breaks to whitespace.
fn read_docx_document(path: &Path) -> Result<String, ExtractError> {
    let corrupt = |msg: String| ExtractError::CorruptOrProtected(msg);

    let file = std::fs::File::open(path).map_err(|e| corrupt(format!("open failed: {e}")))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| corrupt(format!("not a DOCX archive: {e}")))?;

    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| corrupt(format!("missing word/document.xml: {e}")))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(format!("unreadable document XML: {e}")))?;

    let mut reader = XmlReader::from_str(&xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_node = true,
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_node {
                    let value = e
                        .unescape()
                        .map_err(|err| corrupt(format!("bad XML text node: {err}")))?;
                    output.push_str(&value);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text_node = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(corrupt(format!("DOCX XML parse failed: {err}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct StubOcr(&'static str);

    #[async_trait]
    impl OcrEngine for StubOcr {
        async fn recognize_pdf(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_needs_ocr_below_threshold() {
        assert!(needs_ocr("short"));
        assert!(needs_ocr("   \n  "));
    }

    #[test]
    fn test_needs_ocr_not_triggered_at_threshold() {
        let text = "x".repeat(MIN_DIRECT_TEXT_CHARS);
        assert!(!needs_ocr(&text));
    }

    #[test]
    fn test_prefer_longer_keeps_direct_on_tie() {
        let direct = "same length!".to_string();
        let recognized = "same length!".to_string();
        assert_eq!(prefer_longer(direct.clone(), recognized), direct);
    }

    #[test]
    fn test_prefer_longer_takes_strictly_longer_ocr() {
        let direct = "tiny".to_string();
        let recognized = "a noticeably longer recognized text".to_string();
        assert_eq!(prefer_longer(direct, recognized.clone()), recognized);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a\n\n b\t\tc"), "a b c");
    }

    #[test]
    fn test_normalize_strips_disallowed_characters() {
        assert_eq!(normalize_text("hello <world> ™"), "hello world");
    }

    #[test]
    fn test_normalize_keeps_basic_punctuation() {
        assert_eq!(
            normalize_text("Skills: Rust, SQL (5+ years)."),
            "Skills: Rust, SQL (5+ years)."
        );
    }

    #[tokio::test]
    async fn test_extract_txt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.txt");
        std::fs::write(&path, "Experienced   backend\nengineer").unwrap();

        let text = extract_text(&path, &StubOcr("")).await.unwrap();
        assert_eq!(text, "Experienced backend engineer");
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.exe");
        std::fs::write(&path, b"MZ").unwrap();

        let result = extract_text(&path, &StubOcr("")).await;
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(ext)) if ext == "exe"));
    }

    #[tokio::test]
    async fn test_corrupt_docx_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let result = extract_text(&path, &StubOcr("")).await;
        assert!(matches!(result, Err(ExtractError::CorruptOrProtected(_))));
    }
}

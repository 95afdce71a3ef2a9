//! OCR fallback for scanned PDFs, behind a trait seam.
//!
//! Carried in `AppState` as `Arc<dyn OcrEngine>` so tests can stub it and
//! deployments can swap the backend without touching the extraction policy.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Rasterization density for page images. Scanned CVs at lower densities
/// produce unusable recognition output.
const RASTER_DPI: u32 = 300;

/// Contrast boost applied to each page image before recognition.
const CONTRAST_BOOST: f32 = 30.0;

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognizes text across all pages of a PDF. An error here is treated
    /// by callers as "no OCR text", never as a pipeline failure.
    async fn recognize_pdf(&self, path: &Path) -> Result<String>;
}

/// Tesseract-backed engine: `pdftoppm` rasterizes pages to grayscale PNGs,
/// the `image` crate boosts contrast, `tesseract` recognizes each page.
pub struct TesseractOcr {
    pub language: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize_pdf(&self, path: &Path) -> Result<String> {
        let workdir = tempfile::tempdir().context("failed to create OCR scratch directory")?;
        let prefix = workdir.path().join("page");

        rasterize_pages(path, &prefix).await?;

        let mut pages = collect_page_images(workdir.path())?;
        if pages.is_empty() {
            return Err(anyhow!("rasterization produced no page images"));
        }
        pages.sort();

        let mut recognized = String::new();
        for page in pages {
            preprocess_page(page.clone()).await?;
            match recognize_page(&page, &self.language).await {
                Ok(text) => {
                    recognized.push_str(&text);
                    recognized.push('\n');
                }
                Err(e) => warn!("OCR failed on {}: {e:#}", page.display()),
            }
        }

        debug!("OCR recognized {} chars", recognized.len());
        Ok(recognized)
    }
}

async fn rasterize_pages(pdf: &Path, prefix: &Path) -> Result<()> {
    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-gray")
        .arg("-r")
        .arg(RASTER_DPI.to_string())
        .arg(pdf)
        .arg(prefix)
        .output()
        .await
        .context("failed to execute pdftoppm")?;

    if !output.status.success() {
        return Err(anyhow!(
            "pdftoppm exited with status {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).context("failed to list rasterized pages")?;
    Ok(entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect())
}

/// Grayscale + contrast preprocessing. The page is already grayscale from
/// rasterization; the contrast boost is what lifts faint scans.
async fn preprocess_page(page: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let img = image::open(&page)
            .with_context(|| format!("failed to open page image {}", page.display()))?;
        img.grayscale()
            .adjust_contrast(CONTRAST_BOOST)
            .save(&page)
            .with_context(|| format!("failed to save preprocessed page {}", page.display()))
    })
    .await
    .context("preprocess task failed")?
}

async fn recognize_page(page: &Path, language: &str) -> Result<String> {
    let output = Command::new("tesseract")
        .arg(page)
        .arg("stdout")
        .arg("-l")
        .arg(language)
        .arg("--dpi")
        .arg(RASTER_DPI.to_string())
        .output()
        .await
        .context("failed to execute tesseract")?;

    if !output.status.success() {
        return Err(anyhow!(
            "tesseract exited with status {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_page_images_filters_non_png() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-1.png"), b"").unwrap();
        std::fs::write(dir.path().join("page-2.png"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let pages = collect_page_images(dir.path()).unwrap();
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn test_default_language_is_english() {
        assert_eq!(TesseractOcr::default().language, "eng");
    }
}

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::{Config, SkillDomainMap};
use crate::extraction::ocr::OcrEngine;
use crate::llm_client::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: GeminiClient,
    pub config: Config,
    /// Read-only domain → skills map for lightweight keyword matching.
    /// Loaded once at startup; config data, not logic.
    pub skills: Arc<SkillDomainMap>,
    /// Pluggable OCR backend for scanned-PDF fallback extraction.
    pub ocr: Arc<dyn OcrEngine>,
}

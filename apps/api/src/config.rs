use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub skill_domains_path: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
            skill_domains_path: std::env::var("SKILL_DOMAINS_PATH").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

// ────────────────────────────────────────────────────────────────────────────
// Skill domain map
// ────────────────────────────────────────────────────────────────────────────

/// Read-only mapping of professional domains to their representative skills,
/// used for lightweight keyword matching in recommendation scoring.
///
/// Loaded once at startup from `SKILL_DOMAINS_PATH` (a JSON object of
/// domain → skill list) and injected through `AppState`. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDomainMap {
    pub domains: HashMap<String, Vec<String>>,
}

impl SkillDomainMap {
    /// Loads the map from a JSON file, or returns the built-in default
    /// when no path is configured.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(Path::new(p))
                    .with_context(|| format!("failed to read skill domain map at {p}"))?;
                let domains: HashMap<String, Vec<String>> = serde_json::from_str(&raw)
                    .with_context(|| format!("invalid skill domain map JSON at {p}"))?;
                Ok(Self { domains })
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Built-in fallback covering the job board's common verticals.
    pub fn builtin() -> Self {
        let mut domains = HashMap::new();
        for (domain, skills) in [
            (
                "software",
                vec!["programming", "git", "sql", "testing", "api design"],
            ),
            (
                "marketing",
                vec![
                    "social media",
                    "content creation",
                    "seo",
                    "copywriting",
                    "analytics",
                ],
            ),
            (
                "design",
                vec!["figma", "typography", "branding", "ui design", "ux research"],
            ),
            (
                "sales",
                vec!["negotiation", "crm", "lead generation", "account management"],
            ),
            (
                "finance",
                vec!["accounting", "excel", "financial modeling", "auditing"],
            ),
        ] {
            domains.insert(
                domain.to_string(),
                skills.into_iter().map(String::from).collect(),
            );
        }
        Self { domains }
    }

    /// Returns the domain whose skill list best overlaps the given skills,
    /// or `None` when nothing matches. Ties resolve to the lexically first
    /// domain so results are stable across calls.
    pub fn domain_of(&self, skills: &[String]) -> Option<&str> {
        let lowered: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();
        self.domains
            .iter()
            .map(|(domain, domain_skills)| {
                let hits = domain_skills
                    .iter()
                    .filter(|ds| {
                        let ds = ds.to_lowercase();
                        lowered
                            .iter()
                            .any(|s| s.contains(&ds) || ds.contains(s.as_str()))
                    })
                    .count();
                (domain.as_str(), hits)
            })
            .filter(|(_, hits)| *hits > 0)
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(domain, _)| domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_map_covers_marketing() {
        let map = SkillDomainMap::builtin();
        assert!(map.domains.contains_key("marketing"));
    }

    #[test]
    fn test_domain_of_matches_marketing_skills() {
        let map = SkillDomainMap::builtin();
        let skills = vec!["Social Media".to_string(), "Content Creation".to_string()];
        assert_eq!(map.domain_of(&skills), Some("marketing"));
    }

    #[test]
    fn test_domain_of_no_overlap_is_none() {
        let map = SkillDomainMap::builtin();
        let skills = vec!["welding".to_string()];
        assert_eq!(map.domain_of(&skills), None);
    }

    #[test]
    fn test_domain_of_is_deterministic() {
        let map = SkillDomainMap::builtin();
        let skills = vec!["excel".to_string()];
        let first = map.domain_of(&skills);
        assert_eq!(first, map.domain_of(&skills));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, r#"{"ops": ["kubernetes", "terraform"]}"#).unwrap();
        let map = SkillDomainMap::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(map.domains["ops"].len(), 2);
    }

    #[test]
    fn test_load_without_path_falls_back_to_builtin() {
        let map = SkillDomainMap::load(None).unwrap();
        assert!(!map.domains.is_empty());
    }
}

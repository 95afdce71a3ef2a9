//! Object storage for uploaded CV documents.
//!
//! Upload is best-effort for the analysis pipeline: a storage failure is
//! logged and the analysis continues without a stored-file reference.

use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use uuid::Uuid;

/// Reference to a stored CV document, recorded on the analysis run.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub url: String,
    pub key: String,
    pub file_name: String,
    pub size: i64,
}

/// Uploads a CV document and returns its public reference.
pub async fn upload_cv(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    endpoint: &str,
    user_id: Uuid,
    file_name: &str,
    bytes: bytes::Bytes,
) -> Result<StoredFile> {
    let safe_name = sanitize_filename::sanitize(file_name);
    let key = format!("upload/cvs/{}/{}_{}", user_id, Uuid::new_v4(), safe_name);
    let size = bytes.len() as i64;

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(bytes.to_vec()))
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("CV upload failed: {e}"))?;

    let url = format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key);
    tracing::debug!(
        "stored CV object {key} (public id {:?})",
        public_id_from_url(&url)
    );

    Ok(StoredFile {
        url,
        key,
        file_name: safe_name,
        size,
    })
}

/// Derives the public identifier from a stored-file URL: the path segments
/// following `/upload/`, with the file extension stripped.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, tail) = url.split_once("/upload/")?;
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);
    if tail.is_empty() {
        return None;
    }
    let without_ext = match tail.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => tail,
    };
    Some(without_ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_strips_prefix_and_extension() {
        let url = "https://cdn.example.com/bucket/upload/cvs/u1/abc_resume.pdf";
        assert_eq!(public_id_from_url(url).as_deref(), Some("cvs/u1/abc_resume"));
    }

    #[test]
    fn test_public_id_keeps_nested_segments() {
        let url = "https://host/b/upload/a/b/c.docx";
        assert_eq!(public_id_from_url(url).as_deref(), Some("a/b/c"));
    }

    #[test]
    fn test_public_id_without_upload_segment_is_none() {
        assert_eq!(public_id_from_url("https://host/b/files/x.pdf"), None);
    }

    #[test]
    fn test_public_id_ignores_query_string() {
        let url = "https://host/b/upload/x.pdf?sig=123";
        assert_eq!(public_id_from_url(url).as_deref(), Some("x"));
    }
}

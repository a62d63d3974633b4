use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{FlowError, TransportError};
use crate::transport::ApiClient;

pub const DOWNLOAD_FAILED_MESSAGE: &str = "Failed to download template";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    pub file: &'static str,
    pub preview: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        id: 1,
        name: "Modern Professional",
        description: "Clean and modern design with professional layout",
        tags: &["professional", "modern", "clean"],
        file: "modern-professional.docx",
        preview: "modern-professional-preview.png",
    },
    Template {
        id: 2,
        name: "Technical Engineering",
        description: "Technical resume template with emphasis on projects and skills",
        tags: &["technical", "engineering", "projects"],
        file: "technical-engineering.docx",
        preview: "technical-engineering-preview.png",
    },
    Template {
        id: 3,
        name: "Creative Design",
        description: "Visually appealing template for creative professionals",
        tags: &["creative", "design", "portfolio"],
        file: "creative-design.docx",
        preview: "creative-design-preview.png",
    },
];

pub fn find_template(id: u32) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Fetches `template` through `client` (pointed at the template base address)
/// and writes it into `dir` under its own file name. Any answer other than a
/// 2xx reads as a failed download; only a missing response keeps its cause.
pub async fn download_template(
    client: &ApiClient,
    template: &Template,
    dir: &Path,
) -> Result<PathBuf, FlowError> {
    let bytes = client.get_bytes(template.file).await.map_err(|e| {
        warn!("Download error for {}: {e}", template.file);
        match e {
            TransportError::EndpointNotFound
            | TransportError::ServerError { .. }
            | TransportError::Unclassified { .. }
            | TransportError::Decode(_) => {
                FlowError::Application(DOWNLOAD_FAILED_MESSAGE.to_string())
            }
            other => FlowError::Transport(other),
        }
    })?;

    let target = dir.join(template.file);
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|e| FlowError::Application(format!("{DOWNLOAD_FAILED_MESSAGE}: {e}")))?;

    info!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode as AxumStatus;
    use axum::{routing::get, Router};

    use super::*;
    use crate::testing::{client_for, spawn_backend};

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(TEMPLATES.len(), 3);
        assert_eq!(find_template(2).unwrap().name, "Technical Engineering");
        assert!(find_template(9).is_none());
        assert!(TEMPLATES.iter().all(|t| t.file.ends_with(".docx")));
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let app = Router::new().route(
            "/templates/creative-design.docx",
            get(|| async { b"PK\x03\x04docx".to_vec() }),
        );
        let base = spawn_backend(app).await;
        let client = client_for(&format!("{base}templates/"), Duration::from_secs(2));
        let dir = tempfile::tempdir().unwrap();

        let template = find_template(3).unwrap();
        let path = download_template(&client, template, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("creative-design.docx"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"PK\x03\x04docx");
    }

    #[tokio::test]
    async fn test_download_failure_message() {
        let app = Router::new().route(
            "/templates/modern-professional.docx",
            get(|| async { AxumStatus::FORBIDDEN }),
        );
        let base = spawn_backend(app).await;
        let client = client_for(&format!("{base}templates/"), Duration::from_secs(2));
        let dir = tempfile::tempdir().unwrap();

        let err = download_template(&client, &TEMPLATES[0], dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), DOWNLOAD_FAILED_MESSAGE);
        assert!(!dir.path().join("modern-professional.docx").exists());
    }

    #[tokio::test]
    async fn test_missing_or_broken_template_reads_as_failed_download() {
        let app = Router::new().route(
            "/templates/technical-engineering.docx",
            get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_backend(app).await;
        let client = client_for(&format!("{base}templates/"), Duration::from_secs(2));
        let dir = tempfile::tempdir().unwrap();

        for template in [&TEMPLATES[0], &TEMPLATES[1]] {
            let err = download_template(&client, template, dir.path())
                .await
                .unwrap_err();
            assert!(matches!(err, FlowError::Application(_)));
            assert_eq!(err.user_message(), DOWNLOAD_FAILED_MESSAGE);
        }
    }
}

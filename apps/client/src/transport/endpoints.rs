use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;

use super::ApiClient;
use crate::errors::TransportError;
use crate::models::resume::{
    AnalysisId, BatchAnalysis, BatchUploadRequest, ResumeFile, UploadReceipt, UploadRequest,
};
use crate::monitor::HealthProbe;

pub const HEALTH_PATH: &str = "health/";
pub const UPLOAD_PATH: &str = "resumes/upload/";
pub const BATCH_ANALYZE_PATH: &str = "hr/analyze/";

/// `resumes/{id}/analysis/`, with the id kept to a single segment.
pub fn analysis_url(client: &ApiClient, id: &AnalysisId) -> Result<Url, TransportError> {
    client.endpoint_segments(&["resumes", &id.to_string(), "analysis"])
}

impl ApiClient {
    /// GET health/. Only a 200 counts as healthy; the body is ignored.
    pub async fn check_health(&self) -> Result<(), TransportError> {
        let response = self.request(Method::GET, HEALTH_PATH, None, None).await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Unclassified {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn upload_resume(&self, req: &UploadRequest) -> Result<UploadReceipt, TransportError> {
        let form = Form::new()
            .part("file", file_part(&req.file)?)
            .text("job_description", req.job_description.clone());
        self.post_multipart(UPLOAD_PATH, form).await
    }

    /// The analysis payload is returned untouched.
    pub async fn fetch_analysis(&self, id: &AnalysisId) -> Result<Value, TransportError> {
        self.get_json_url(analysis_url(self, id)?).await
    }

    pub async fn analyze_batch(
        &self,
        req: &BatchUploadRequest,
    ) -> Result<BatchAnalysis, TransportError> {
        let mut form = Form::new();
        for file in &req.files {
            form = form.part("resumes", file_part(file)?);
        }
        let form = form.text("job_description", req.job_description.clone());
        self.post_multipart(BATCH_ANALYZE_PATH, form).await
    }
}

fn file_part(file: &ResumeFile) -> Result<Part, TransportError> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| TransportError::InvalidRequest(format!("file '{}': {e}", file.name)))
}

#[async_trait]
impl HealthProbe for ApiClient {
    async fn probe(&self) -> Result<(), TransportError> {
        self.check_health().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Multipart, Path, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::models::resume::{MIME_DOCX, MIME_PDF};
    use crate::testing::{client_for, file, pdf, spawn_backend};

    /// (field name, file name, content type, body) for every multipart field received.
    type Fields = Arc<Mutex<Vec<(String, Option<String>, Option<String>, Vec<u8>)>>>;

    async fn record(State(fields): State<Fields>, mut multipart: Multipart) {
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.unwrap().to_vec();
            fields.lock().unwrap().push((name, file_name, content_type, data));
        }
    }

    #[tokio::test]
    async fn test_health_requires_200() {
        let app = Router::new()
            .route("/health/", get(|| async { Json(json!({"status": "healthy"})) }));
        let base = spawn_backend(app).await;
        assert!(client_for(&base, Duration::from_secs(2)).check_health().await.is_ok());

        let app = Router::new().route("/health/", get(|| async { AxumStatus::NO_CONTENT }));
        let base = spawn_backend(app).await;
        let err = client_for(&base, Duration::from_secs(2))
            .check_health()
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unclassified { status: 204, .. }));
    }

    #[tokio::test]
    async fn test_upload_sends_file_and_job_description() {
        let fields: Fields = Arc::default();
        let app = Router::new()
            .route(
                "/resumes/upload/",
                post(|state: State<Fields>, multipart: Multipart| async move {
                    record(state, multipart).await;
                    (AxumStatus::CREATED, Json(json!({"id": 12, "analysis_id": 3})))
                }),
            )
            .with_state(fields.clone());
        let base = spawn_backend(app).await;
        let client = client_for(&base, Duration::from_secs(2));

        let req = UploadRequest::new(Some(pdf("cv.pdf", 16)), "Backend engineer").unwrap();
        let receipt = client.upload_resume(&req).await.unwrap();
        assert_eq!(receipt.id, AnalysisId::Number(12));
        assert_eq!(receipt.analysis_id, Some(AnalysisId::Number(3)));

        let fields = fields.lock().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "file");
        assert_eq!(fields[0].1.as_deref(), Some("cv.pdf"));
        assert_eq!(fields[0].2.as_deref(), Some(MIME_PDF));
        assert_eq!(fields[0].3.len(), 16);
        assert_eq!(fields[1].0, "job_description");
        assert_eq!(fields[1].3, b"Backend engineer");
    }

    #[tokio::test]
    async fn test_batch_sends_every_file_under_resumes() {
        let fields: Fields = Arc::default();
        let app = Router::new()
            .route(
                "/hr/analyze/",
                post(|state: State<Fields>, multipart: Multipart| async move {
                    record(state, multipart).await;
                    Json(json!({"results": [{"ats_score": 70}, {"ats_score": 60}], "total_count": 2}))
                }),
            )
            .with_state(fields.clone());
        let base = spawn_backend(app).await;
        let client = client_for(&base, Duration::from_secs(2));

        let req = BatchUploadRequest::new(
            vec![file("a.pdf", MIME_PDF), file("b.docx", MIME_DOCX)],
            "Data analyst",
        )
        .unwrap();
        let batch = client.analyze_batch(&req).await.unwrap();
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.total_count, Some(2));

        let fields = fields.lock().unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.0.as_str()).collect();
        assert_eq!(names, ["resumes", "resumes", "job_description"]);
        assert_eq!(fields[0].1.as_deref(), Some("a.pdf"));
        assert_eq!(fields[1].1.as_deref(), Some("b.docx"));
    }

    #[tokio::test]
    async fn test_fetch_analysis_hits_id_path() {
        let app = Router::new().route(
            "/resumes/:id/analysis/",
            get(|Path(id): Path<String>| async move {
                Json(json!({"id": id, "analysis": {"ats_score": {"score": 81, "rating": "Good"}}}))
            }),
        );
        let base = spawn_backend(app).await;
        let client = client_for(&base, Duration::from_secs(2));

        let value = client.fetch_analysis(&AnalysisId::Number(5)).await.unwrap();
        assert_eq!(value["id"], "5");
        assert_eq!(value["analysis"]["ats_score"]["score"], 81);
    }

    #[tokio::test]
    async fn test_fetch_analysis_escapes_text_ids() {
        let app = Router::new()
            .route(
                "/resumes/:id/analysis/",
                get(|Path(id): Path<String>| async move { Json(json!({"id": id})) }),
            )
            .route("/health/", get(|| async { Json(json!({"status": "healthy"})) }));
        let base = spawn_backend(app).await;
        let client = client_for(&base, Duration::from_secs(2));

        for id in ["5?x", "../../health", "a#b"] {
            let value = client.fetch_analysis(&AnalysisId::from(id)).await.unwrap();
            assert_eq!(value["id"], id);
        }
        let err = client
            .fetch_analysis(&AnalysisId::from(".."))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn test_bad_mime_is_invalid_request() {
        let err = file_part(&file("x.pdf", "not a mime")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}

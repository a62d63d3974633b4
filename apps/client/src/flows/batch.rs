use tracing::{debug, info, warn};

use crate::errors::{FlowError, TransportError, ValidationError};
use crate::models::resume::{BatchAnalysis, BatchUploadRequest, CandidateResult, ResumeFile};
use crate::models::status::AvailabilityGate;
use crate::transport::ApiClient;

pub const BATCH_FAILED_MESSAGE: &str = "Failed to analyze resumes";
/// How many candidates the dashboard shows.
pub const TOP_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    AtsScore,
    SkillMatch,
}

/// HR dashboard: accumulate resumes, analyze them against one job description.
pub struct HrDashboard {
    client: ApiClient,
    files: Vec<ResumeFile>,
    job_description: String,
    results: Vec<CandidateResult>,
    show_results: bool,
    loading: bool,
    error: Option<String>,
}

pub struct PendingBatch {
    client: ApiClient,
    request: BatchUploadRequest,
}

impl PendingBatch {
    pub fn request(&self) -> &BatchUploadRequest {
        &self.request
    }

    pub async fn send(self) -> Result<BatchAnalysis, TransportError> {
        self.client.analyze_batch(&self.request).await
    }
}

impl HrDashboard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            files: Vec::new(),
            job_description: String::new(),
            results: Vec::new(),
            show_results: false,
            loading: false,
            error: None,
        }
    }

    /// Drop-zone add: files with an unsupported declared type are skipped
    /// without an error. Returns how many were accepted.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = ResumeFile>) -> usize {
        let before = self.files.len();
        for file in files {
            if file.is_batch_type() {
                self.files.push(file);
            } else {
                debug!("Skipping {} ({})", file.name, file.mime_type);
            }
        }
        self.files.len() - before
    }

    /// Single-file picker add: an unsupported type is reported.
    pub fn add_file(&mut self, file: ResumeFile) -> Result<(), ValidationError> {
        if !file.is_batch_type() {
            let err = ValidationError::InvalidBatchFormat { name: file.name };
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.files.push(file);
        Ok(())
    }

    /// Removes the file at `index`; later files shift down by one.
    pub fn remove_file(&mut self, index: usize) -> Option<ResumeFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn files(&self) -> &[ResumeFile] {
        &self.files
    }

    pub fn set_job_description(&mut self, text: impl Into<String>) {
        self.job_description = text.into();
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn results(&self) -> &[CandidateResult] {
        &self.results
    }

    /// The first [`TOP_CANDIDATES`] results in their current order.
    pub fn top_candidates(&self) -> &[CandidateResult] {
        &self.results[..self.results.len().min(TOP_CANDIDATES)]
    }

    pub fn show_results(&self) -> bool {
        self.show_results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn can_submit(&self, gate: &impl AvailabilityGate) -> bool {
        !self.loading && self.validate(gate).is_ok()
    }

    /// At least one file, a job description, then backend availability.
    pub fn validate(
        &self,
        gate: &impl AvailabilityGate,
    ) -> Result<BatchUploadRequest, ValidationError> {
        let request = BatchUploadRequest::new(self.files.clone(), &self.job_description)?;
        if !gate.is_available() {
            return Err(ValidationError::BackendUnavailable);
        }
        Ok(request)
    }

    pub fn begin_submit(
        &mut self,
        gate: &impl AvailabilityGate,
    ) -> Result<PendingBatch, ValidationError> {
        if self.loading {
            return Err(ValidationError::SubmissionInProgress);
        }
        let request = match self.validate(gate) {
            Ok(r) => r,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.loading = true;
        self.error = None;
        Ok(PendingBatch {
            client: self.client.clone(),
            request,
        })
    }

    /// Stores results in response order on success. On failure the backend's
    /// own error message is preferred over the generic one.
    pub fn complete(
        &mut self,
        outcome: Result<BatchAnalysis, TransportError>,
    ) -> Result<&[CandidateResult], FlowError> {
        self.loading = false;
        match outcome {
            Ok(batch) => {
                info!("Batch analysis returned {} results", batch.results.len());
                self.results = batch.results;
                self.show_results = true;
                Ok(self.results.as_slice())
            }
            Err(e) => {
                warn!("Batch analysis failed: {e}");
                match e.application_message() {
                    Some(message) => {
                        self.error = Some(message.clone());
                        Err(FlowError::Application(message))
                    }
                    None => {
                        self.error = Some(BATCH_FAILED_MESSAGE.to_string());
                        Err(FlowError::Transport(e))
                    }
                }
            }
        }
    }

    pub fn abandon(&mut self) {
        self.loading = false;
    }

    pub async fn submit(
        &mut self,
        gate: &impl AvailabilityGate,
    ) -> Result<&[CandidateResult], FlowError> {
        let pending = self.begin_submit(gate)?;
        let outcome = pending.send().await;
        self.complete(outcome)
    }

    /// Resets files, job description, results and result visibility together.
    pub fn clear(&mut self) {
        self.files.clear();
        self.job_description.clear();
        self.results.clear();
        self.show_results = false;
        self.error = None;
    }

    /// Highest first; ties keep their response order.
    pub fn sort_results(&mut self, key: SortKey) {
        match key {
            SortKey::AtsScore => self
                .results
                .sort_by(|a, b| b.ats_score.total_cmp(&a.ats_score)),
            SortKey::SkillMatch => self
                .results
                .sort_by(|a, b| b.skill_match.total_cmp(&a.skill_match)),
        }
    }
}

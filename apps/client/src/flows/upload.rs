use tracing::{info, warn};

use crate::errors::{FlowError, TransportError, ValidationError};
use crate::models::resume::{AnalysisId, ResumeFile, UploadReceipt, UploadRequest};
use crate::models::status::{AvailabilityGate, BackendStatus, StatusSnapshot};
use crate::transport::ApiClient;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Resume uploaded successfully!";
pub const UPLOAD_FAILED_MESSAGE: &str = "An error occurred while uploading the resume";

/// Single-resume analysis: one PDF plus a job description.
pub struct ResumeUpload {
    client: ApiClient,
    job_description: String,
    selected_file: Option<ResumeFile>,
    uploading: bool,
    error: Option<String>,
    success: Option<String>,
    analysis_id: Option<AnalysisId>,
}

/// An upload that passed validation and is waiting to be sent.
pub struct PendingUpload {
    client: ApiClient,
    request: UploadRequest,
}

impl PendingUpload {
    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    pub async fn send(self) -> Result<UploadReceipt, TransportError> {
        self.client.upload_resume(&self.request).await
    }
}

impl ResumeUpload {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            job_description: String::new(),
            selected_file: None,
            uploading: false,
            error: None,
            success: None,
            analysis_id: None,
        }
    }

    /// Picks a file. Oversized and non-PDF files are refused with a visible
    /// error and leave the previous selection in place.
    pub fn select_file(&mut self, file: ResumeFile) -> Result<(), ValidationError> {
        if let Err(e) = file.check_single_upload() {
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.selected_file = Some(file);
        self.error = None;
        self.success = None;
        Ok(())
    }

    pub fn set_job_description(&mut self, text: impl Into<String>) {
        self.job_description = text.into();
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn selected_file(&self) -> Option<&ResumeFile> {
        self.selected_file.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn analysis_id(&self) -> Option<&AnalysisId> {
        self.analysis_id.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Feeds a monitor reading into the form. An unavailable backend shows
    /// its status message as the inline error; other readings leave it alone.
    pub fn apply_status(&mut self, snapshot: &StatusSnapshot) {
        if snapshot.status == BackendStatus::Unavailable {
            self.error = Some(snapshot.message.clone());
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self, gate: &impl AvailabilityGate) -> bool {
        !self.uploading && self.validate(gate).is_ok()
    }

    /// Size, format, required inputs, then backend availability.
    pub fn validate(&self, gate: &impl AvailabilityGate) -> Result<UploadRequest, ValidationError> {
        let request = UploadRequest::new(self.selected_file.clone(), &self.job_description)?;
        if !gate.is_available() {
            return Err(ValidationError::BackendUnavailable);
        }
        Ok(request)
    }

    pub fn begin_submit(
        &mut self,
        gate: &impl AvailabilityGate,
    ) -> Result<PendingUpload, ValidationError> {
        if self.uploading {
            return Err(ValidationError::SubmissionInProgress);
        }
        let request = match self.validate(gate) {
            Ok(r) => r,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.uploading = true;
        self.error = None;
        self.success = None;
        Ok(PendingUpload {
            client: self.client.clone(),
            request,
        })
    }

    /// Applies the upload outcome. Inputs are cleared only on success.
    pub fn complete(
        &mut self,
        outcome: Result<UploadReceipt, TransportError>,
    ) -> Result<AnalysisId, FlowError> {
        self.uploading = false;
        match outcome {
            Ok(receipt) => {
                info!("Resume uploaded, analysis id {}", receipt.id);
                self.analysis_id = Some(receipt.id.clone());
                self.selected_file = None;
                self.job_description.clear();
                self.success = Some(UPLOAD_SUCCESS_MESSAGE.to_string());
                Ok(receipt.id)
            }
            Err(e) => {
                warn!("Upload error: {e}");
                let message = e.to_string();
                self.error = Some(if message.trim().is_empty() {
                    UPLOAD_FAILED_MESSAGE.to_string()
                } else {
                    message
                });
                Err(FlowError::Transport(e))
            }
        }
    }

    /// Releases the busy flag when a pending upload is dropped unsent.
    pub fn abandon(&mut self) {
        self.uploading = false;
    }

    pub async fn submit(&mut self, gate: &impl AvailabilityGate) -> Result<AnalysisId, FlowError> {
        let pending = self.begin_submit(gate)?;
        let outcome = pending.send().await;
        self.complete(outcome)
    }
}

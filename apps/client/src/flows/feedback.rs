use serde_json::Value;
use tracing::warn;

use crate::errors::FlowError;
use crate::models::resume::AnalysisId;
use crate::transport::ApiClient;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch analysis results";

/// Loads the analysis for an uploaded resume. The payload is kept opaque.
pub struct AnalysisFeedback {
    client: ApiClient,
    analysis: Option<Value>,
    loading: bool,
    error: Option<String>,
}

impl AnalysisFeedback {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            analysis: None,
            loading: false,
            error: None,
        }
    }

    pub fn analysis(&self) -> Option<&Value> {
        self.analysis.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self, id: &AnalysisId) -> Result<&Value, FlowError> {
        self.loading = true;
        self.error = None;
        let outcome = self.client.fetch_analysis(id).await;
        self.loading = false;

        match outcome {
            Ok(value) => Ok(&*self.analysis.insert(value)),
            Err(e) => {
                warn!("Error fetching analysis {id}: {e}");
                let message = e.to_string();
                self.error = Some(if message.trim().is_empty() {
                    FETCH_FAILED_MESSAGE.to_string()
                } else {
                    message
                });
                Err(FlowError::Transport(e))
            }
        }
    }
}

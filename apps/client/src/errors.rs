use serde::Deserialize;
use thiserror::Error;

pub const BACKEND_UNREACHABLE_MESSAGE: &str =
    "Backend server is not running. Please start the backend development server.";
pub const ENDPOINT_NOT_FOUND_MESSAGE: &str =
    "API endpoint not found. Please check the backend configuration.";
pub const SERVER_ERROR_MESSAGE: &str = "Backend server error. Please check the server logs.";

/// Transport-level failure, classified once at the HTTP boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received: connection refused, DNS failure or timeout.
    #[error("{}", BACKEND_UNREACHABLE_MESSAGE)]
    BackendUnreachable,

    #[error("{}", ENDPOINT_NOT_FOUND_MESSAGE)]
    EndpointNotFound,

    #[error("{}", SERVER_ERROR_MESSAGE)]
    ServerError { status: u16 },

    /// A non-2xx status that is neither 404 nor 5xx. The body is kept as-is.
    #[error("Request failed with status code {status}")]
    Unclassified { status: u16, body: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Could not read the backend response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

impl TransportError {
    /// The backend's own `{"error": "..."}` message, when the response carried one.
    pub fn application_message(&self) -> Option<String> {
        match self {
            TransportError::Unclassified { body, .. } => serde_json::from_str::<ApiErrorBody>(body)
                .ok()
                .map(|b| b.error)
                .filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }
}

/// Local, pre-network rejection of a user action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("File size should be less than 5MB")]
    FileTooLarge { size: usize },

    #[error("Please upload a PDF file")]
    UnsupportedFormat { name: String },

    #[error("Please select a resume file and enter a job description")]
    MissingInput,

    #[error("Backend server is not running. Please start the backend server and try again.")]
    BackendUnavailable,

    #[error("Please upload at least one resume")]
    NoFiles,

    #[error("Please provide a job description")]
    MissingJobDescription,

    #[error("Invalid file format. Please upload PDF or DOCX files only.")]
    InvalidBatchFormat { name: String },

    #[error("A submission is already in progress")]
    SubmissionInProgress,
}

/// Everything a request flow can fail with.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Structured error body returned by the backend.
    #[error("{0}")]
    Application(String),
}

impl FlowError {
    /// Text shown next to the control that triggered the action.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "An unexpected error occurred".to_string()
        } else {
            message
        }
    }
}

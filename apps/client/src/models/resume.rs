use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;

/// Upper bound for a single-upload resume, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5_000_000;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_UNKNOWN: &str = "application/octet-stream";

/// Declared types the HR dashboard accepts.
pub const BATCH_MIME_TYPES: &[&str] = &[MIME_PDF, MIME_DOC, MIME_DOCX];

/// A resume picked by the user: name, declared type and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, declaring its type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_for_name(&name);
        Ok(Self::new(name, mime_type, Bytes::from(bytes)))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn has_pdf_extension(&self) -> bool {
        self.name.to_lowercase().ends_with(".pdf")
    }

    pub fn is_batch_type(&self) -> bool {
        BATCH_MIME_TYPES.contains(&self.mime_type.as_str())
    }

    /// Size and format rules of the single-resume flow.
    pub fn check_single_upload(&self) -> Result<(), ValidationError> {
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::FileTooLarge { size: self.size() });
        }
        if !self.has_pdf_extension() {
            return Err(ValidationError::UnsupportedFormat {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

fn mime_for_name(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("pdf") => MIME_PDF,
        Some("doc") => MIME_DOC,
        Some("docx") => MIME_DOCX,
        _ => MIME_UNKNOWN,
    }
}

/// A validated single-resume submission.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: ResumeFile,
    pub job_description: String,
}

impl UploadRequest {
    /// Checks size, then format, then presence of both inputs.
    pub fn new(file: Option<ResumeFile>, job_description: &str) -> Result<Self, ValidationError> {
        if let Some(file) = &file {
            file.check_single_upload()?;
        }
        match file {
            Some(file) if !job_description.trim().is_empty() => Ok(Self {
                file,
                job_description: job_description.to_string(),
            }),
            _ => Err(ValidationError::MissingInput),
        }
    }
}

/// A validated batch submission.
#[derive(Debug, Clone)]
pub struct BatchUploadRequest {
    pub files: Vec<ResumeFile>,
    pub job_description: String,
}

impl BatchUploadRequest {
    pub fn new(files: Vec<ResumeFile>, job_description: &str) -> Result<Self, ValidationError> {
        if files.is_empty() {
            return Err(ValidationError::NoFiles);
        }
        if job_description.trim().is_empty() {
            return Err(ValidationError::MissingJobDescription);
        }
        Ok(Self {
            files,
            job_description: job_description.to_string(),
        })
    }
}

/// Identifier the backend hands back for an uploaded resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisId {
    Number(i64),
    Text(String),
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisId::Number(n) => write!(f, "{n}"),
            AnalysisId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AnalysisId {
    fn from(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(AnalysisId::Number)
            .unwrap_or_else(|_| AnalysisId::Text(raw.to_string()))
    }
}

/// Body of a successful upload. Only `id` is relied on.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub id: AnalysisId,
    #[serde(default)]
    pub analysis_id: Option<AnalysisId>,
    #[serde(default)]
    pub analysis: Option<Value>,
}

/// One candidate in a batch response. Missing fields default to zero / empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateResult {
    pub ats_score: f64,
    pub keyword_match: f64,
    pub skill_match: f64,
    pub suggestions: Vec<String>,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchAnalysis {
    #[serde(default)]
    pub results: Vec<CandidateResult>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

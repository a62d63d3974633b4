use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{TransportError, BACKEND_UNREACHABLE_MESSAGE};

pub const BACKEND_RUNNING_MESSAGE: &str =
    "Backend server is running and ready to accept requests.";
pub const CHECKING_MESSAGE: &str = "Checking backend status...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    Unknown,
    Available,
    Unavailable,
}

impl BackendStatus {
    pub fn is_available(self) -> bool {
        self == BackendStatus::Available
    }
}

/// Latest availability reading with its user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub status: BackendStatus,
    pub message: String,
    pub checked_at: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    pub fn unknown() -> Self {
        Self {
            status: BackendStatus::Unknown,
            message: CHECKING_MESSAGE.to_string(),
            checked_at: None,
        }
    }

    /// Snapshot for one probe outcome. Depends only on the outcome, never on
    /// the previous snapshot.
    pub fn from_probe(outcome: &Result<(), TransportError>, checked_at: DateTime<Utc>) -> Self {
        let (status, message) = match outcome {
            Ok(()) => (BackendStatus::Available, BACKEND_RUNNING_MESSAGE.to_string()),
            Err(e) => {
                let text = e.to_string();
                let message = if text.trim().is_empty() {
                    BACKEND_UNREACHABLE_MESSAGE.to_string()
                } else {
                    text
                };
                (BackendStatus::Unavailable, message)
            }
        };
        Self {
            status,
            message,
            checked_at: Some(checked_at),
        }
    }
}

/// Anything that can answer "may a backend action start right now?".
pub trait AvailabilityGate {
    fn backend_status(&self) -> BackendStatus;

    fn is_available(&self) -> bool {
        self.backend_status().is_available()
    }
}

impl AvailabilityGate for BackendStatus {
    fn backend_status(&self) -> BackendStatus {
        *self
    }
}

impl AvailabilityGate for StatusSnapshot {
    fn backend_status(&self) -> BackendStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ENDPOINT_NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE};

    #[test]
    fn test_success_probe_is_available() {
        let snap = StatusSnapshot::from_probe(&Ok(()), Utc::now());
        assert_eq!(snap.status, BackendStatus::Available);
        assert_eq!(snap.message, BACKEND_RUNNING_MESSAGE);
        assert!(snap.checked_at.is_some());
    }

    #[test]
    fn test_failed_probe_uses_remediation_text() {
        let cases = [
            (TransportError::BackendUnreachable, BACKEND_UNREACHABLE_MESSAGE),
            (TransportError::EndpointNotFound, ENDPOINT_NOT_FOUND_MESSAGE),
            (TransportError::ServerError { status: 500 }, SERVER_ERROR_MESSAGE),
        ];
        for (err, expected) in cases {
            let snap = StatusSnapshot::from_probe(&Err(err), Utc::now());
            assert_eq!(snap.status, BackendStatus::Unavailable);
            assert_eq!(snap.message, expected);
        }
    }

    #[test]
    fn test_gate_only_opens_when_available() {
        assert!(BackendStatus::Available.is_available());
        assert!(!BackendStatus::Unknown.is_available());
        assert!(!BackendStatus::Unavailable.is_available());
        assert!(!StatusSnapshot::unknown().is_available());
    }
}

//! Client for the ATS resume analysis backend.
//!
//! The backend does all parsing and scoring. This crate knows whether the
//! backend is reachable, gates uploads on that, classifies transport failures
//! into user-facing messages and formats what comes back.

pub mod config;
pub mod errors;
pub mod flows;
pub mod models;
pub mod monitor;
pub mod presentation;
pub mod templates;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use errors::{FlowError, TransportError, ValidationError};
pub use models::status::{AvailabilityGate, BackendStatus, StatusSnapshot};
pub use monitor::{AvailabilityMonitor, HealthProbe, MonitorHandle};
pub use transport::ApiClient;

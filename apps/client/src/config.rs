use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/";
pub const DEFAULT_TEMPLATES_URL: &str = "http://localhost:3012/templates/";
/// Every call to the backend is bounded by this timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Client configuration loaded once at startup from environment variables.
/// The backend base address lives here and nowhere else.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub templates_url: Url,
    pub request_timeout: Duration,
    pub health_interval: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_url: base_url(&env_or("ATS_API_URL", DEFAULT_API_URL))
                .context("ATS_API_URL must be an absolute http(s) URL")?,
            templates_url: base_url(&env_or("ATS_TEMPLATES_URL", DEFAULT_TEMPLATES_URL))
                .context("ATS_TEMPLATES_URL must be an absolute http(s) URL")?,
            request_timeout: millis_env("ATS_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT)?,
            health_interval: millis_env("ATS_HEALTH_INTERVAL_MS", DEFAULT_HEALTH_INTERVAL)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Configuration with default timings pointed at the given backend.
    pub fn with_api_url(api_url: &str) -> Result<Self> {
        Ok(Config {
            api_url: base_url(api_url)?,
            templates_url: base_url(DEFAULT_TEMPLATES_URL)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            rust_log: "info".to_string(),
        })
    }
}

/// Parses a base address and forces a trailing slash so relative endpoint
/// paths join under it instead of replacing its last segment.
pub fn base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).with_context(|| format!("Invalid base URL '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Unsupported URL scheme '{}'", url.scheme());
    }
    Ok(url)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn millis_env(key: &str, default: Duration) -> Result<Duration> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .with_context(|| format!("{key} must be a whole number of milliseconds")),
        Err(_) => Ok(default),
    }
}

use std::time::Duration;

use thiserror::Error;

/// Failure to make the engine binary present and executable on disk.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("engine download failed with status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("engine provisioning failed: {0}")]
    EngineInit(#[from] ProvisionError),
    #[error("unsupported source")]
    UnsupportedSource,
    #[error("source is private or unavailable")]
    RestrictedSource,
    #[error("extraction exceeded its {}s budget", .0.as_secs())]
    Timeout(Duration),
    #[error("engine output was not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),
    #[error("failed to start engine process: {0}")]
    SpawnFailed(std::io::Error),
    #[error("extraction failed: {0}")]
    Other(String),
}

//! Errors raised while talking to the review provider.
//!
//! These never reach the dashboard: the source adapter absorbs them and
//! substitutes the fallback data set. They are still typed so callers that
//! care (see `FetchOutcome`) can tell a live feed from a degraded one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no API key configured for the review provider")]
    NotConfigured,

    #[error("live fetching is disabled (offline mode)")]
    Disabled,

    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("failed to reach review provider at {url}: {message}")]
    Transport { url: String, message: String },

    #[error("review provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode review provider response: {0}")]
    Decode(String),

    #[error("review provider reported status '{0}'")]
    ProviderStatus(String),

    #[error("review provider returned no reviews")]
    EmptyResult,
}

impl SourceError {
    /// Short machine-friendly tag, used in logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::NotConfigured => "not_configured",
            SourceError::Disabled => "disabled",
            SourceError::Timeout { .. } => "timeout",
            SourceError::Transport { .. } => "transport",
            SourceError::HttpStatus { .. } => "http_status",
            SourceError::Decode(_) => "decode",
            SourceError::ProviderStatus(_) => "provider_status",
            SourceError::EmptyResult => "empty_result",
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            SourceError::Timeout {
                url: url.to_string(),
                seconds: timeout_seconds,
            }
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else if err.is_connect() {
            SourceError::Transport {
                url: url.to_string(),
                message: "connection refused or host unreachable".to_string(),
            }
        } else {
            SourceError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

//! HTTP client for the review provider.
//!
//! Fetch failures are never surfaced to callers of [`HostawayClient::fetch_reviews`]:
//! the injected fallback set is returned instead and the cause is logged.

use crate::error::SourceError;
use crate::models::RawReviewRecord;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for [`HostawayClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub account_id: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    /// Never contact the provider.
    pub offline: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hostaway.com/v1".to_string(),
            account_id: None,
            api_key: None,
            timeout_seconds: 15,
            offline: false,
        }
    }
}

impl From<&crate::config::ProviderConfig> for ClientConfig {
    fn from(config: &crate::config::ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            account_id: config.account_id.clone(),
            api_key: config.api_key.clone(),
            timeout_seconds: config.timeout_seconds,
            offline: config.offline,
        }
    }
}

impl ClientConfig {
    pub fn reviews_url(&self) -> String {
        format!("{}/reviews", self.base_url.trim_end_matches('/'))
    }
}

/// Provider list response.
#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
}

/// Decode each record on its own so one unreadable entry does not cost the batch.
///
/// Missing or null fields are defaulted by the record type itself; only
/// records that still cannot be read (no numeric id, not an object) are
/// dropped.
fn decode_records(values: Vec<serde_json::Value>) -> Vec<RawReviewRecord> {
    let total = values.len();
    let records: Vec<RawReviewRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable review record #{}: {}", index, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(
            "Kept {} of {} review records from provider",
            records.len(),
            total
        );
    }
    records
}

/// Where a batch of reviews came from.
#[derive(Debug)]
pub enum ReviewOrigin {
    Live,
    /// The fallback set, with the reason the live feed was not used.
    Fallback(SourceError),
}

impl ReviewOrigin {
    pub fn is_live(&self) -> bool {
        matches!(self, ReviewOrigin::Live)
    }

    pub fn describe(&self) -> String {
        match self {
            ReviewOrigin::Live => "live provider feed".to_string(),
            ReviewOrigin::Fallback(err) => format!("built-in sample data ({})", err),
        }
    }
}

/// Reviews plus their origin.
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<RawReviewRecord>,
    pub origin: ReviewOrigin,
}

/// Client for the provider's `/reviews` endpoint.
pub struct HostawayClient {
    config: ClientConfig,
    http_client: reqwest::Client,
    fallback: Vec<RawReviewRecord>,
}

impl HostawayClient {
    /// Create a client that serves `fallback` whenever the provider fails.
    pub fn new(config: ClientConfig, fallback: Vec<RawReviewRecord>) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SourceError::Transport {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        debug!(
            "Review client for {} (account {})",
            config.base_url,
            config.account_id.as_deref().unwrap_or("unset")
        );

        Ok(Self {
            config,
            http_client,
            fallback,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn fallback(&self) -> &[RawReviewRecord] {
        &self.fallback
    }

    /// Fetch reviews, substituting the fallback set on any failure.
    pub async fn fetch_reviews(&self) -> Vec<RawReviewRecord> {
        self.fetch_with_origin().await.records
    }

    /// Like [`fetch_reviews`](Self::fetch_reviews), but also says where the data came from.
    pub async fn fetch_with_origin(&self) -> FetchOutcome {
        match self.try_fetch().await {
            Ok(records) => {
                info!("Fetched {} reviews from provider", records.len());
                FetchOutcome {
                    records,
                    origin: ReviewOrigin::Live,
                }
            }
            Err(err) => {
                match err {
                    SourceError::Disabled | SourceError::NotConfigured => info!(
                        "Using {} sample reviews: {}",
                        self.fallback.len(),
                        err
                    ),
                    _ => warn!(
                        code = err.code(),
                        "Review provider unavailable, using {} sample reviews: {}",
                        self.fallback.len(),
                        err
                    ),
                }
                FetchOutcome {
                    records: self.fallback.clone(),
                    origin: ReviewOrigin::Fallback(err),
                }
            }
        }
    }

    /// One attempt against the provider, with no fallback.
    pub async fn try_fetch(&self) -> Result<Vec<RawReviewRecord>, SourceError> {
        if self.config.offline {
            return Err(SourceError::Disabled);
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SourceError::NotConfigured)?;

        let url = self.config.reviews_url();
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(e, &url, self.config.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: ReviewsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        if let Some(status) = body.status {
            if !status.eq_ignore_ascii_case("success") {
                return Err(SourceError::ProviderStatus(status));
            }
        }

        let values = body.result.unwrap_or_default();
        if values.is_empty() {
            return Err(SourceError::EmptyResult);
        }

        let received = values.len();
        let records = decode_records(values);
        if records.is_empty() {
            return Err(SourceError::Decode(format!(
                "none of the {} review records could be read",
                received
            )));
        }

        Ok(records)
    }
}

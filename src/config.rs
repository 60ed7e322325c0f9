//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.reviewpulse.toml` files.

use crate::analysis::TrendFill;
use crate::models::TimeRange;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".reviewpulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Review provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Dashboard computation settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Review provider (Hostaway) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL; `/reviews` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Provider account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// API key sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Skip the provider and serve the built-in sample reviews.
    #[serde(default)]
    pub offline: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            account_id: None,
            api_key: None,
            timeout_seconds: default_timeout(),
            offline: false,
        }
    }
}

fn default_base_url() -> String {
    "https://api.hostaway.com/v1".to_string()
}

fn default_timeout() -> u64 {
    15
}

/// Dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Default time range.
    #[serde(default)]
    pub range: TimeRange,

    /// How empty trend buckets are filled.
    #[serde(default)]
    pub trend_fill: TrendFill,

    /// Alert when more than this many reviews are below 3.5.
    #[serde(default = "default_low_rating_alert_count")]
    pub low_rating_alert_count: usize,

    /// Alert when more than this many reviews are pending.
    #[serde(default = "default_pending_alert_count")]
    pub pending_alert_count: usize,

    /// Approval percentage under which an info alert is raised.
    #[serde(default = "default_min_approval_rate")]
    pub min_approval_rate: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            range: TimeRange::default(),
            trend_fill: TrendFill::default(),
            low_rating_alert_count: default_low_rating_alert_count(),
            pending_alert_count: default_pending_alert_count(),
            min_approval_rate: default_min_approval_rate(),
        }
    }
}

fn default_low_rating_alert_count() -> usize {
    2
}

fn default_pending_alert_count() -> usize {
    10
}

fn default_min_approval_rate() -> f64 {
    50.0
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Include the filtered review list in the report.
    #[serde(default = "default_true")]
    pub include_reviews: bool,

    /// Maximum reviews listed in the report.
    #[serde(default = "default_max_reviews")]
    pub max_reviews: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            include_reviews: true,
            max_reviews: default_max_reviews(),
        }
    }
}

fn default_output() -> String {
    "review_dashboard.md".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_reviews() -> usize {
    25
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.reviewpulse.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.provider.base_url = base_url.clone();
        }
        if let Some(ref account_id) = args.account_id {
            self.provider.account_id = Some(account_id.clone());
        }
        if let Some(ref api_key) = args.api_key {
            self.provider.api_key = Some(api_key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.provider.timeout_seconds = timeout;
        }
        if args.offline {
            self.provider.offline = true;
        }

        if let Some(range) = args.range {
            self.dashboard.range = range;
        }
        if let Some(fill) = args.trend_fill {
            self.dashboard.trend_fill = fill;
        }

        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(max_reviews) = args.max_reviews {
            self.report.max_reviews = max_reviews;
        }
        if args.no_reviews {
            self.report.include_reviews = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.base_url, "https://api.hostaway.com/v1");
        assert_eq!(config.dashboard.range, TimeRange::Last30Days);
        assert_eq!(config.dashboard.trend_fill, TrendFill::Sentinel);
        assert_eq!(config.dashboard.pending_alert_count, 10);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[provider]
account_id = "61148"
api_key = "secret"
timeout_seconds = 5

[dashboard]
range = "90d"
trend_fill = "synthetic"
pending_alert_count = 3

[report]
max_reviews = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.provider.account_id.as_deref(), Some("61148"));
        assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
        assert_eq!(config.provider.timeout_seconds, 5);
        assert_eq!(config.dashboard.range, TimeRange::Last90Days);
        assert_eq!(config.dashboard.trend_fill, TrendFill::Synthetic);
        assert_eq!(config.dashboard.pending_alert_count, 3);
        assert_eq!(config.dashboard.low_rating_alert_count, 2);
        assert_eq!(config.report.max_reviews, 5);
        assert!(config.report.include_reviews);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[provider]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(toml_str.contains("[report]"));
        assert!(!toml_str.contains("api_key"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.dashboard.range, TimeRange::Last30Days);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        writeln!(file, "[dashboard]\nrange = \"7d\"").unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.dashboard.range, TimeRange::Last7Days);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[dashboard]\nrange = \"fortnight\"").unwrap();
        assert!(Config::load(&path).is_err());
    }
}

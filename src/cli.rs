//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::{SortOrder, TrendFill, VisibilityFilter};
use crate::models::{AlertSeverity, TimeRange};
use crate::source::parse_timestamp;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;

/// ReviewPulse - guest review dashboard for rental properties
///
/// Fetches guest reviews from Hostaway (or built-in sample data), filters
/// them and writes a dashboard report with trends, per-property rollups
/// and alerts.
///
/// Examples:
///   reviewpulse --offline --range 90d
///   reviewpulse --api-key $KEY --min-rating 4 --status displayed
///   reviewpulse --property "2B Shoreditch Heights" --format json -o dash.json
///   reviewpulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .reviewpulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Provider API base URL
    #[arg(long, value_name = "URL", env = "REVIEWPULSE_BASE_URL")]
    pub base_url: Option<String>,

    /// Provider account identifier
    #[arg(long, value_name = "ID", env = "REVIEWPULSE_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Provider API key
    #[arg(long, value_name = "KEY", env = "REVIEWPULSE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the provider and use the built-in sample reviews
    #[arg(long)]
    pub offline: bool,

    /// Exit with an error instead of reporting on sample data
    #[arg(long, conflicts_with = "offline")]
    pub require_live: bool,

    /// Time range: 7d, 30d, 90d, 1y, all
    #[arg(short, long, value_name = "RANGE")]
    pub range: Option<TimeRange>,

    /// Reference date for the time range (defaults to now)
    ///
    /// Accepts YYYY-MM-DD, "YYYY-MM-DD HH:MM:SS" or RFC 3339.
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub as_of: Option<DateTime<Utc>>,

    /// How to fill trend periods without reviews: sentinel, synthetic
    #[arg(long, value_name = "MODE")]
    pub trend_fill: Option<TrendFill>,

    /// Case-insensitive text search over review text, guest and listing
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Minimum overall rating (inclusive)
    #[arg(long, value_name = "RATING")]
    pub min_rating: Option<f64>,

    /// Only reviews from this channel ("all" for every channel)
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<String>,

    /// Only reviews for this listing ("all" for every listing)
    #[arg(short, long, value_name = "NAME")]
    pub property: Option<String>,

    /// Visibility filter: displayed, hidden, all
    #[arg(long, default_value = "all", value_name = "STATUS")]
    pub status: VisibilityFilter,

    /// Only reviews submitted on or after this date
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub from: Option<DateTime<Utc>>,

    /// Only reviews submitted on or before this date
    ///
    /// A bare date (YYYY-MM-DD) includes that whole day.
    #[arg(long, value_name = "DATE", value_parser = parse_date_bound)]
    pub to: Option<DateBound>,

    /// Review order: rating, rating-asc, newest, oldest
    #[arg(long, default_value = "rating", value_name = "ORDER")]
    pub sort: SortOrder,

    /// Review ids to show on the website before reporting (comma-separated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub show: Vec<u64>,

    /// Review ids to hide from the website before reporting (comma-separated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub hide: Vec<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Maximum number of reviews listed in the report
    #[arg(long, value_name = "COUNT")]
    pub max_reviews: Option<usize>,

    /// Leave the review list out of the report
    #[arg(long)]
    pub no_reviews: bool,

    /// Fail if an alert at or above this severity is raised
    ///
    /// Exit code 2 when the threshold is reached. Values: critical, warning, info
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .reviewpulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Alert severity for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Info,
    Warning,
    Critical,
}

impl From<FailOnLevel> for AlertSeverity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Info => AlertSeverity::Info,
            FailOnLevel::Warning => AlertSeverity::Warning,
            FailOnLevel::Critical => AlertSeverity::Critical,
        }
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).ok_or_else(|| format!("invalid date '{}'", value))
}

/// A date argument that remembers whether a time of day was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBound {
    pub at: DateTime<Utc>,
    /// Given as `YYYY-MM-DD` with no time part.
    pub date_only: bool,
}

fn parse_date_bound(value: &str) -> Result<DateBound, String> {
    let at = parse_date(value)?;
    let date_only = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok();
    Ok(DateBound { at, date_only })
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(min) = self.min_rating {
            if !(0.0..=10.0).contains(&min) {
                return Err("Minimum rating must be between 0 and 10".to_string());
            }
        }

        if let (Some(from), Some(to)) = (self.from, self.date_to()) {
            if from > to {
                return Err("--from must not be after --to".to_string());
            }
        }

        if let Some(id) = self.show.iter().find(|id| self.hide.contains(id)) {
            return Err(format!("Review {} cannot be both shown and hidden", id));
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.max_reviews == Some(0) && !self.no_reviews {
            return Err("Max reviews must be at least 1 (use --no-reviews to omit them)".to_string());
        }

        Ok(())
    }

    /// Inclusive upper date bound.
    ///
    /// A bare date resolves to the last representable instant before the
    /// next midnight, so sub-second timestamps late in the day still match.
    pub fn date_to(&self) -> Option<DateTime<Utc>> {
        self.to.map(|to| {
            if to.date_only {
                to.at + Duration::days(1) - Duration::nanoseconds(1)
            } else {
                to.at
            }
        })
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args::parse_from(["reviewpulse"])
    }

    #[test]
    fn test_defaults() {
        let args = make_args();
        assert_eq!(args.status, VisibilityFilter::All);
        assert_eq!(args.sort, SortOrder::RatingDesc);
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(args.range.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_filters() {
        let args = Args::parse_from([
            "reviewpulse",
            "--range",
            "90d",
            "--min-rating",
            "4",
            "--status",
            "displayed",
            "--from",
            "2025-09-01",
            "--hide",
            "7453,7454",
            "--fail-on",
            "warning",
        ]);
        assert_eq!(args.range, Some(TimeRange::Last90Days));
        assert_eq!(args.min_rating, Some(4.0));
        assert_eq!(args.status, VisibilityFilter::Displayed);
        assert!(args.from.is_some());
        assert_eq!(args.hide, vec![7453, 7454]);
        assert_eq!(args.fail_on, Some(FailOnLevel::Warning));
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(Args::try_parse_from(["reviewpulse", "--range", "2w"]).is_err());
        assert!(Args::try_parse_from(["reviewpulse", "--as-of", "soon"]).is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.show = vec![1];
        args.hide = vec![1];
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_values() {
        let mut args = make_args();
        args.base_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.min_rating = Some(11.0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.from = parse_timestamp("2025-10-01");
        args.to = parse_date_bound("2025-09-01").ok();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_date_to_covers_whole_day() {
        let args = Args::parse_from(["reviewpulse", "--to", "2025-09-01"]);
        let to = args.date_to().unwrap();
        let late = parse_timestamp("2025-09-01T23:59:59.750Z").unwrap();
        let next_day = parse_timestamp("2025-09-02").unwrap();
        assert!(late <= to);
        assert!(to < next_day);

        let args = Args::parse_from(["reviewpulse", "--to", "2025-09-01 10:30:00"]);
        assert_eq!(args.date_to(), parse_timestamp("2025-09-01 10:30:00"));
    }

    #[test]
    fn test_explicit_midnight_is_not_widened() {
        for value in ["2025-09-01 00:00:00", "2025-09-01T00:00:00Z"] {
            let args = Args::parse_from(["reviewpulse", "--to", value]);
            assert_eq!(args.date_to(), parse_timestamp("2025-09-01"), "{}", value);
        }

        let args = Args::parse_from([
            "reviewpulse",
            "--from",
            "2025-09-01",
            "--to",
            "2025-09-01",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_fail_on_maps_to_severity() {
        assert_eq!(AlertSeverity::from(FailOnLevel::Critical), AlertSeverity::Critical);
        assert!(FailOnLevel::Info < FailOnLevel::Critical);
    }
}

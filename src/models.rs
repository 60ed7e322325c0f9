//! Data models for guest reviews and dashboard output.
//!
//! Raw records mirror the review provider's JSON shape. Canonical records
//! are what the rest of the crate reads. The dashboard types at the bottom
//! are derived projections and are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Overall rating used when a review carries no category ratings.
pub const NEUTRAL_RATING: f64 = 5.0;

/// Channel assigned to records that do not name one.
pub const DEFAULT_CHANNEL: &str = "hostaway";

/// Reviews strictly below this overall rating count as low-rated.
pub const LOW_RATING_THRESHOLD: f64 = 3.5;

/// Averages at or above this classify a property as trending up.
pub const HIGH_RATING_THRESHOLD: f64 = 4.5;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numbers and numeric strings become `Some`; anything else is `None`.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rating {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Rating>::deserialize(deserializer)? {
        Some(Rating::Number(value)) => Some(value),
        Some(Rating::Text(text)) => text.trim().parse().ok(),
        Some(Rating::Other(_)) | None => None,
    })
}

/// A single category score as sent by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCategoryRating {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<f64>,
}

/// A review exactly as received from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReviewRecord {
    pub id: u64,
    /// `host-to-guest` or `guest-to-host`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub review_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Provider's own overall score. Informational only; the canonical
    /// rating is always derived from the categories.
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_review: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_category: Vec<RawCategoryRating>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submitted_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub guest_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub listing_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Lifecycle status of a review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ReviewStatus {
    Published,
    Pending,
    Rejected,
    /// Any status string the provider sends that we do not model.
    Other(String),
}

impl ReviewStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReviewStatus::Published => "published",
            ReviewStatus::Pending => "pending",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Other(s) => s,
        }
    }
}

impl From<&str> for ReviewStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "published" => ReviewStatus::Published,
            "pending" | "awaiting" => ReviewStatus::Pending,
            "rejected" => ReviewStatus::Rejected,
            _ => ReviewStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for ReviewStatus {
    fn from(s: String) -> Self {
        ReviewStatus::from(s.as_str())
    }
}

impl From<ReviewStatus> for String {
    fn from(status: ReviewStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of rating categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCategory {
    Cleanliness,
    Communication,
    RespectHouseRules,
    Location,
    Checkin,
    Accuracy,
    Value,
}

impl ReviewCategory {
    pub const ALL: [ReviewCategory; 7] = [
        ReviewCategory::Cleanliness,
        ReviewCategory::Communication,
        ReviewCategory::RespectHouseRules,
        ReviewCategory::Location,
        ReviewCategory::Checkin,
        ReviewCategory::Accuracy,
        ReviewCategory::Value,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewCategory::Cleanliness => "cleanliness",
            ReviewCategory::Communication => "communication",
            ReviewCategory::RespectHouseRules => "respect_house_rules",
            ReviewCategory::Location => "location",
            ReviewCategory::Checkin => "checkin",
            ReviewCategory::Accuracy => "accuracy",
            ReviewCategory::Value => "value",
        }
    }

    /// Human readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewCategory::Cleanliness => "Cleanliness",
            ReviewCategory::Communication => "Communication",
            ReviewCategory::RespectHouseRules => "House Rules",
            ReviewCategory::Location => "Location",
            ReviewCategory::Checkin => "Check-in",
            ReviewCategory::Accuracy => "Accuracy",
            ReviewCategory::Value => "Value",
        }
    }
}

impl FromStr for ReviewCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "cleanliness" => Ok(ReviewCategory::Cleanliness),
            "communication" => Ok(ReviewCategory::Communication),
            "respect_house_rules" | "house_rules" => Ok(ReviewCategory::RespectHouseRules),
            "location" => Ok(ReviewCategory::Location),
            "checkin" | "check_in" => Ok(ReviewCategory::Checkin),
            "accuracy" => Ok(ReviewCategory::Accuracy),
            "value" => Ok(ReviewCategory::Value),
            _ => Err(format!("unknown review category: {}", s)),
        }
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category scores of one review. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryRatings(BTreeMap<ReviewCategory, f64>);

impl CategoryRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: ReviewCategory) -> Option<f64> {
        self.0.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReviewCategory, f64)> + '_ {
        self.0.iter().map(|(c, r)| (*c, *r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Arithmetic mean of the present scores.
    pub fn mean(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.values().sum::<f64>() / self.0.len() as f64)
    }
}

impl FromIterator<(ReviewCategory, f64)> for CategoryRatings {
    fn from_iter<I: IntoIterator<Item = (ReviewCategory, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Rounded mean of the category scores, or [`NEUTRAL_RATING`] if none.
pub fn overall_rating_for(categories: &CategoryRatings) -> f64 {
    categories
        .mean()
        .map(|mean| mean.round())
        .unwrap_or(NEUTRAL_RATING)
}

/// A normalized, provider-agnostic review.
///
/// `categories`, `overall_rating` and `is_approved` are private so the
/// overall rating can only change together with the categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalReview {
    pub id: u64,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_type: Option<String>,
    pub text: String,
    overall_rating: f64,
    categories: CategoryRatings,
    pub submitted_at: Option<DateTime<Utc>>,
    pub guest_name: String,
    pub listing_name: String,
    pub channel: String,
    is_approved: bool,
}

impl CanonicalReview {
    /// Create a published review with the given scores.
    pub fn new(id: u64, listing_name: impl Into<String>, categories: CategoryRatings) -> Self {
        Self {
            id,
            status: ReviewStatus::Published,
            review_type: None,
            text: String::new(),
            overall_rating: overall_rating_for(&categories),
            categories,
            submitted_at: None,
            guest_name: String::new(),
            listing_name: listing_name.into(),
            channel: DEFAULT_CHANNEL.to_string(),
            is_approved: true,
        }
    }

    /// Set the status; the displayed flag follows it.
    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.is_approved = status == ReviewStatus::Published;
        self.status = status;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_guest(mut self, guest_name: impl Into<String>) -> Self {
        self.guest_name = guest_name.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_review_type(mut self, review_type: Option<String>) -> Self {
        self.review_type = review_type;
        self
    }

    pub fn submitted(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Copy of this review with the publicly displayed flag overridden.
    pub fn with_visibility(&self, displayed: bool) -> Self {
        Self {
            is_approved: displayed,
            ..self.clone()
        }
    }

    /// Copy of this review with one category score added or replaced.
    pub fn set_category(&self, category: ReviewCategory, rating: f64) -> Self {
        let categories: CategoryRatings = self
            .categories
            .iter()
            .filter(|(c, _)| *c != category)
            .chain(std::iter::once((category, rating)))
            .collect();
        self.with_categories(categories)
    }

    /// Copy of this review without the given category.
    pub fn remove_category(&self, category: ReviewCategory) -> Self {
        let categories: CategoryRatings = self
            .categories
            .iter()
            .filter(|(c, _)| *c != category)
            .collect();
        self.with_categories(categories)
    }

    fn with_categories(&self, categories: CategoryRatings) -> Self {
        Self {
            overall_rating: overall_rating_for(&categories),
            categories,
            ..self.clone()
        }
    }

    pub fn overall_rating(&self) -> f64 {
        self.overall_rating
    }

    pub fn categories(&self) -> &CategoryRatings {
        &self.categories
    }

    /// Whether the review is shown on the public site.
    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending
    }
}

/// Selectable dashboard time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "1y")]
    LastYear,
    #[serde(rename = "all")]
    AllTime,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
            TimeRange::LastYear => "1y",
            TimeRange::AllTime => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "Last 7 days",
            TimeRange::Last30Days => "Last 30 days",
            TimeRange::Last90Days => "Last 90 days",
            TimeRange::LastYear => "Last year",
            TimeRange::AllTime => "All time",
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" | "week" => Ok(TimeRange::Last7Days),
            "30d" | "month" => Ok(TimeRange::Last30Days),
            "90d" | "quarter" => Ok(TimeRange::Last90Days),
            "1y" | "365d" | "year" => Ok(TimeRange::LastYear),
            "all" | "all-time" => Ok(TimeRange::AllTime),
            other => Err(format!(
                "invalid time range '{}', expected one of 7d, 30d, 90d, 1y, all",
                other
            )),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headline numbers for the selected window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
    pub average_rating: Option<f64>,
    /// Percentage of reviews that are publicly displayed.
    pub approval_rate: Option<f64>,
    /// Change in review count against the previous window, in percent.
    pub review_count_change_pct: Option<f64>,
    pub rating_change: Option<f64>,
    pub approval_rate_change: Option<f64>,
}

/// Where a trend point's values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointSource {
    Observed,
    Synthetic,
    NoData,
}

/// Aggregates for one sub-period of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub review_count: usize,
    pub average_rating: Option<f64>,
    pub approval_rate: Option<f64>,
    pub source: PointSource,
}

/// Mean score of one category across a set of reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: ReviewCategory,
    pub average: Option<f64>,
    pub count: usize,
}

/// Direction classification for a property's rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Stable,
    Down,
}

impl TrendDirection {
    /// `Up` at 4.5 and above, `Down` below 3.5, otherwise `Stable`.
    pub fn classify(average_rating: f64) -> Self {
        if average_rating >= HIGH_RATING_THRESHOLD {
            TrendDirection::Up
        } else if average_rating < LOW_RATING_THRESHOLD {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            TrendDirection::Up => "↑",
            TrendDirection::Stable => "→",
            TrendDirection::Down => "↓",
        }
    }
}

/// Rollup of all reviews for one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyPerformance {
    pub listing_name: String,
    pub review_count: usize,
    pub approved_count: usize,
    pub pending_count: usize,
    pub average_rating: f64,
    pub category_averages: Vec<CategoryAverage>,
    pub trend: TrendDirection,
    pub latest_review: Option<DateTime<Utc>>,
}

/// Severity of a dashboard alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "🔵",
            AlertSeverity::Warning => "🟠",
            AlertSeverity::Critical => "🔴",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "Info"),
            AlertSeverity::Warning => write!(f, "Warning"),
            AlertSeverity::Critical => write!(f, "Critical"),
        }
    }
}

/// A heuristic warning shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastConfidence {
    Low,
    Medium,
    High,
}

/// Projected average rating for the next sub-period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingForecast {
    pub projected_rating: f64,
    /// Rating change per sub-period.
    pub slope: f64,
    pub direction: TrendDirection,
    pub confidence: ForecastConfidence,
    pub based_on_points: usize,
}

/// Everything the dashboard shows for one window.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub range: TimeRange,
    pub generated_at: DateTime<Utc>,
    pub stats: DashboardStats,
    pub trend: Vec<TrendPoint>,
    pub category_averages: Vec<CategoryAverage>,
    pub properties: Vec<PropertyPerformance>,
    pub alerts: Vec<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<RatingForecast>,
}

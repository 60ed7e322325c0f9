//! Markdown and JSON dashboard reports.

use crate::analysis::FilterCriteria;
use crate::models::{
    Alert, AlertSeverity, CanonicalReview, CategoryAverage, Dashboard, DashboardStats,
    PointSource, PropertyPerformance, RatingForecast, TimeRange, TrendPoint,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about one report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// Reference time the ranges were computed against.
    pub as_of: DateTime<Utc>,
    pub data_source: String,
    pub live: bool,
    pub range: TimeRange,
    pub total_reviews: usize,
    pub filtered_reviews: usize,
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub criteria: FilterCriteria,
    pub dashboard: Dashboard,
    /// Filtered reviews in display order, possibly truncated.
    pub reviews: Vec<CanonicalReview>,
}

fn fmt_value(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|v| format!("{:.1}{}", v, suffix))
        .unwrap_or_else(|| "n/a".to_string())
}

fn fmt_delta(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|v| format!("{:+.1}{}", v, suffix))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# Review Dashboard\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.dashboard.stats));
    output.push_str(&generate_alerts_section(&report.dashboard.alerts));
    output.push_str(&generate_trend_section(
        &report.dashboard.trend,
        report.dashboard.forecast.as_ref(),
    ));
    output.push_str(&generate_category_section(&report.dashboard.category_averages));
    output.push_str(&generate_properties_section(&report.dashboard.properties));
    output.push_str(&generate_reviews_section(
        &report.reviews,
        report.metadata.filtered_reviews,
    ));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Period:** {} (as of {})\n",
        metadata.range.label(),
        metadata.as_of.format("%Y-%m-%d")
    ));
    section.push_str(&format!("- **Data Source:** {}\n", metadata.data_source));
    if !metadata.live {
        section.push_str("- ⚠️ **Figures are based on sample data, not the live feed.**\n");
    }
    section.push_str(&format!(
        "- **Reviews:** {} loaded, {} after filters\n",
        metadata.total_reviews, metadata.filtered_reviews
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_summary_section(stats: &DashboardStats) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Reviews | Displayed | Pending | Rejected | Avg Rating | Approval |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | {} | {} | {} | {} | {} |\n\n",
        stats.total,
        stats.approved,
        stats.pending,
        stats.rejected,
        fmt_value(stats.average_rating, ""),
        fmt_value(stats.approval_rate, "%"),
    ));

    section.push_str("**Change vs previous period:** ");
    section.push_str(&format!(
        "reviews {}, rating {}, approval {}\n\n",
        fmt_delta(stats.review_count_change_pct, "%"),
        fmt_delta(stats.rating_change, ""),
        fmt_delta(stats.approval_rate_change, " pts"),
    ));

    section
}

fn generate_alerts_section(alerts: &[Alert]) -> String {
    let mut section = String::new();

    section.push_str("## Alerts\n\n");

    if alerts.is_empty() {
        section.push_str("No alerts for this period. 🎉\n\n");
        return section;
    }

    for alert in alerts {
        section.push_str(&generate_alert_block(alert));
    }

    section
}

fn generate_alert_block(alert: &Alert) -> String {
    let mut block = String::new();

    let badge = match alert.severity {
        AlertSeverity::Critical => "**CRITICAL**",
        AlertSeverity::Warning => "**WARNING**",
        AlertSeverity::Info => "**INFO**",
    };

    block.push_str(&format!(
        "- {} {} {}: {}\n",
        alert.severity.emoji(),
        badge,
        alert.title,
        alert.message
    ));

    if let Some(ref recommendation) = alert.recommendation {
        block.push_str(&format!("  > 💡 {}\n", recommendation));
    }

    block
}

fn generate_trend_section(trend: &[TrendPoint], forecast: Option<&RatingForecast>) -> String {
    let mut section = String::new();

    section.push_str("## Rating Trend\n\n");
    section.push_str("| Period | Reviews | Avg Rating | Approval |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for point in trend {
        let marker = match point.source {
            PointSource::Observed => "",
            PointSource::Synthetic => " *",
            PointSource::NoData => "",
        };
        section.push_str(&format!(
            "| {} | {} | {}{} | {}{} |\n",
            point.label,
            point.review_count,
            fmt_value(point.average_rating, ""),
            marker,
            fmt_value(point.approval_rate, "%"),
            marker,
        ));
    }
    section.push('\n');

    if trend.iter().any(|p| p.source == PointSource::Synthetic) {
        section.push_str("\\* placeholder value, no reviews in this period\n\n");
    }

    if let Some(forecast) = forecast {
        section.push_str(&format!(
            "**Forecast:** next period around {:.2} {} ({:?} confidence, {} data points)\n\n",
            forecast.projected_rating,
            forecast.direction.arrow(),
            forecast.confidence,
            forecast.based_on_points
        ));
    }

    section
}

fn generate_category_section(averages: &[CategoryAverage]) -> String {
    let mut section = String::new();

    section.push_str("## Category Averages\n\n");
    section.push_str("| Category | Average | Ratings |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for average in averages {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            average.category,
            fmt_value(average.average, ""),
            average.count
        ));
    }
    section.push('\n');

    section
}

fn generate_properties_section(properties: &[PropertyPerformance]) -> String {
    let mut section = String::new();

    section.push_str("## Properties\n\n");

    if properties.is_empty() {
        section.push_str("No property has reviews in this period.\n\n");
        return section;
    }

    section.push_str("| Property | Reviews | Displayed | Pending | Avg Rating | Trend | Latest |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---|\n");

    for property in properties {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {:.2} | {} | {} |\n",
            property.listing_name,
            property.review_count,
            property.approved_count,
            property.pending_count,
            property.average_rating,
            property.trend.arrow(),
            property
                .latest_review
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "n/a".to_string()),
        ));
    }
    section.push('\n');

    section
}

fn generate_reviews_section(reviews: &[CanonicalReview], filtered_total: usize) -> String {
    if reviews.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Reviews\n\n");
    if filtered_total > reviews.len() {
        section.push_str(&format!(
            "*Showing {} of {} matching reviews.*\n\n",
            reviews.len(),
            filtered_total
        ));
    }

    for review in reviews {
        let shown = if review.is_approved() { "shown" } else { "hidden" };
        section.push_str(&format!(
            "### #{} {} ({:.0}★, {}, {})\n\n",
            review.id,
            review.listing_name,
            review.overall_rating(),
            review.status,
            shown
        ));

        let date = review
            .submitted_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "undated".to_string());
        section.push_str(&format!(
            "*{} via {} on {}*\n\n",
            if review.guest_name.is_empty() {
                "Anonymous guest"
            } else {
                review.guest_name.as_str()
            },
            review.channel,
            date
        ));

        if !review.text.is_empty() {
            section.push_str(&format!("> {}\n\n", review.text));
        }
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by ReviewPulse*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_dashboard, DashboardOptions, TrendFill};
    use crate::source::{fallback_reviews, normalize_all};
    use chrono::TimeZone;

    fn create_test_report(fill: TrendFill) -> DashboardReport {
        let as_of = Utc.with_ymd_and_hms(2025, 10, 6, 12, 0, 0).unwrap();
        let reviews = normalize_all(&fallback_reviews());
        let options = DashboardOptions {
            trend_fill: fill,
            ..Default::default()
        };
        let dashboard = build_dashboard(&reviews, TimeRange::Last30Days, as_of, &options);

        DashboardReport {
            metadata: ReportMetadata {
                generated_at: as_of,
                as_of,
                data_source: "built-in sample data".to_string(),
                live: false,
                range: TimeRange::Last30Days,
                total_reviews: reviews.len(),
                filtered_reviews: reviews.len(),
                duration_seconds: 0.1,
            },
            criteria: FilterCriteria::default(),
            dashboard,
            reviews: reviews.into_iter().take(3).collect(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(TrendFill::Sentinel);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Review Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("sample data, not the live feed"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Alerts"));
        assert!(markdown.contains("## Rating Trend"));
        assert!(markdown.contains("## Category Averages"));
        assert!(markdown.contains("Sample - Studio Camden Lock"));
        assert!(markdown.contains("Showing 3 of 12"));
        assert!(!markdown.contains("placeholder value"));
    }

    #[test]
    fn test_synthetic_points_are_marked() {
        let report = create_test_report(TrendFill::Synthetic);
        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("placeholder value"));
    }

    #[test]
    fn test_generate_alert_block() {
        let alert = Alert {
            severity: AlertSeverity::Critical,
            title: "Low-rated reviews".to_string(),
            message: "4 reviews are below 3.5 stars.".to_string(),
            recommendation: Some("Call the guests".to_string()),
            listing_name: None,
        };

        let block = generate_alert_block(&alert);
        assert!(block.contains("CRITICAL"));
        assert!(block.contains("4 reviews"));
        assert!(block.contains("Call the guests"));
    }

    #[test]
    fn test_summary_formats_missing_values() {
        let section = generate_summary_section(&DashboardStats::default());
        assert!(section.contains("| **0** |"));
        assert!(section.contains("n/a"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(TrendFill::Sentinel);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"overallRating\""));
        assert!(json.contains("\"category_averages\""));
        assert!(json.contains("\"range\": \"30d\""));
    }
}

//! Review aggregation and dashboard statistics.
//!
//! Everything here is a pure function of the review slice, the selected
//! range and the caller's notion of "now". Nothing is cached.

use crate::analysis::alerts::{forecast_rating, generate_alerts, AlertThresholds};
use crate::analysis::range::{buckets, window, Window};
use crate::models::{
    CanonicalReview, CategoryAverage, Dashboard, DashboardStats, PointSource,
    PropertyPerformance, ReviewCategory, ReviewStatus, TimeRange, TrendDirection, TrendPoint,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// What to put in trend buckets that have no reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendFill {
    /// Leave the values empty and mark the point as having no data.
    #[default]
    Sentinel,
    /// Fill with a bounded placeholder derived from the bucket start.
    Synthetic,
}

impl FromStr for TrendFill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentinel" | "none" | "empty" => Ok(TrendFill::Sentinel),
            "synthetic" | "demo" => Ok(TrendFill::Synthetic),
            other => Err(format!(
                "invalid trend fill '{}', expected 'sentinel' or 'synthetic'",
                other
            )),
        }
    }
}

impl fmt::Display for TrendFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendFill::Sentinel => write!(f, "sentinel"),
            TrendFill::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Knobs for [`build_dashboard`].
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub trend_fill: TrendFill,
    pub thresholds: AlertThresholds,
}

/// Mean overall rating of a set of reviews.
pub fn average_rating<'a, I>(reviews: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a CanonicalReview>,
{
    let (sum, count) = reviews
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.overall_rating(), count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Percentage of reviews that are publicly displayed.
pub fn approval_rate<'a, I>(reviews: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a CanonicalReview>,
{
    let (approved, count) = reviews.into_iter().fold((0usize, 0usize), |(a, c), r| {
        (a + usize::from(r.is_approved()), c + 1)
    });
    (count > 0).then(|| approved as f64 / count as f64 * 100.0)
}

/// Reviews whose submission time falls in `window`.
pub fn in_window(reviews: &[CanonicalReview], window: &Window) -> Vec<CanonicalReview> {
    reviews
        .iter()
        .filter(|r| window.contains(r.submitted_at))
        .cloned()
        .collect()
}

/// Headline counts for the range plus deltas against the previous window.
pub fn dashboard_stats(
    reviews: &[CanonicalReview],
    range: TimeRange,
    now: DateTime<Utc>,
) -> DashboardStats {
    let current_window = window(range, now);
    let current: Vec<&CanonicalReview> = reviews
        .iter()
        .filter(|r| current_window.contains(r.submitted_at))
        .collect();

    let mut stats = DashboardStats {
        total: current.len(),
        average_rating: average_rating(current.iter().copied()),
        approval_rate: approval_rate(current.iter().copied()),
        ..Default::default()
    };

    for review in &current {
        if review.is_approved() {
            stats.approved += 1;
        }
        match review.status {
            ReviewStatus::Pending => stats.pending += 1,
            ReviewStatus::Rejected => stats.rejected += 1,
            _ => {}
        }
    }

    if let Some(previous_window) = current_window.previous() {
        let previous: Vec<&CanonicalReview> = reviews
            .iter()
            .filter(|r| previous_window.contains(r.submitted_at))
            .collect();

        if !previous.is_empty() {
            let prev_count = previous.len() as f64;
            stats.review_count_change_pct =
                Some((current.len() as f64 - prev_count) / prev_count * 100.0);

            let prev_rating = average_rating(previous.iter().copied());
            stats.rating_change = stats.average_rating.zip(prev_rating).map(|(c, p)| c - p);

            let prev_approval = approval_rate(previous.iter().copied());
            stats.approval_rate_change =
                stats.approval_rate.zip(prev_approval).map(|(c, p)| c - p);
        }
    }

    stats
}

/// Placeholder values for an empty bucket, stable for a given start time.
fn synthetic_values(bucket_start: DateTime<Utc>) -> (f64, f64) {
    let mut rng = StdRng::seed_from_u64(bucket_start.timestamp() as u64);
    let rating: f64 = rng.gen_range(3.5..=5.0);
    let approval: f64 = rng.gen_range(60.0..=100.0);
    ((rating * 10.0).round() / 10.0, approval.round())
}

/// Per-bucket rating, volume and approval for the range.
pub fn trend_series(
    reviews: &[CanonicalReview],
    range: TimeRange,
    now: DateTime<Utc>,
    fill: TrendFill,
) -> Vec<TrendPoint> {
    let earliest = reviews.iter().filter_map(|r| r.submitted_at).min();

    buckets(range, now, earliest)
        .into_iter()
        .map(|bucket| {
            let in_bucket: Vec<&CanonicalReview> = reviews
                .iter()
                .filter(|r| matches!(r.submitted_at, Some(at) if at >= bucket.start && at < bucket.end))
                .collect();

            if !in_bucket.is_empty() {
                return TrendPoint {
                    label: bucket.label,
                    start: bucket.start,
                    end: bucket.end,
                    review_count: in_bucket.len(),
                    average_rating: average_rating(in_bucket.iter().copied()),
                    approval_rate: approval_rate(in_bucket.iter().copied()),
                    source: PointSource::Observed,
                };
            }

            let (average_rating, approval_rate, source) = match fill {
                TrendFill::Sentinel => (None, None, PointSource::NoData),
                TrendFill::Synthetic => {
                    let (rating, approval) = synthetic_values(bucket.start);
                    (Some(rating), Some(approval), PointSource::Synthetic)
                }
            };

            TrendPoint {
                label: bucket.label,
                start: bucket.start,
                end: bucket.end,
                review_count: 0,
                average_rating,
                approval_rate,
                source,
            }
        })
        .collect()
}

/// Mean score per category, in the fixed category order.
pub fn category_averages<'a, I>(reviews: I) -> Vec<CategoryAverage>
where
    I: IntoIterator<Item = &'a CanonicalReview>,
{
    let mut totals: BTreeMap<ReviewCategory, (f64, usize)> = BTreeMap::new();

    for review in reviews {
        for (category, rating) in review.categories().iter() {
            let entry = totals.entry(category).or_insert((0.0, 0));
            entry.0 += rating;
            entry.1 += 1;
        }
    }

    ReviewCategory::ALL
        .iter()
        .map(|&category| {
            let (sum, count) = totals.get(&category).copied().unwrap_or((0.0, 0));
            CategoryAverage {
                category,
                average: (count > 0).then(|| sum / count as f64),
                count,
            }
        })
        .collect()
}

/// Group reviews by listing and roll each group up.
pub fn property_performance(reviews: &[CanonicalReview]) -> Vec<PropertyPerformance> {
    let mut grouped: BTreeMap<&str, Vec<&CanonicalReview>> = BTreeMap::new();

    for review in reviews {
        grouped
            .entry(review.listing_name.as_str())
            .or_default()
            .push(review);
    }

    grouped
        .into_iter()
        .map(|(listing_name, group)| {
            let average = average_rating(group.iter().copied()).unwrap_or_default();
            PropertyPerformance {
                listing_name: listing_name.to_string(),
                review_count: group.len(),
                approved_count: group.iter().filter(|r| r.is_approved()).count(),
                pending_count: group.iter().filter(|r| r.is_pending()).count(),
                average_rating: average,
                category_averages: category_averages(group.iter().copied()),
                trend: TrendDirection::classify(average),
                latest_review: group.iter().filter_map(|r| r.submitted_at).max(),
            }
        })
        .collect()
}

/// Compute the full dashboard for one range.
pub fn build_dashboard(
    reviews: &[CanonicalReview],
    range: TimeRange,
    now: DateTime<Utc>,
    options: &DashboardOptions,
) -> Dashboard {
    let current = in_window(reviews, &window(range, now));
    debug!(
        "Building {} dashboard from {} of {} reviews",
        range,
        current.len(),
        reviews.len()
    );

    let stats = dashboard_stats(reviews, range, now);
    let trend = trend_series(reviews, range, now, options.trend_fill);
    let categories = category_averages(&current);
    let properties = property_performance(&current);
    let alerts = generate_alerts(&current, &properties, &categories, &options.thresholds);
    let forecast = forecast_rating(&trend);

    Dashboard {
        range,
        generated_at: now,
        stats,
        trend,
        category_averages: categories,
        properties,
        alerts,
        forecast,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::CategoryRatings;
    use chrono::{Duration, TimeZone};

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 6, 12, 0, 0).unwrap()
    }

    /// A review whose overall rating equals `rating` (single category).
    pub(crate) fn review(id: u64, listing: &str, rating: f64, days_ago: i64) -> CanonicalReview {
        let categories: CategoryRatings =
            [(ReviewCategory::Cleanliness, rating)].into_iter().collect();
        CanonicalReview::new(id, listing, categories).submitted(Some(now() - Duration::days(days_ago)))
    }

    #[test]
    fn test_property_averages() {
        let reviews = vec![
            review(1, "Property A", 5.0, 1),
            review(2, "Property A", 4.0, 2),
            review(3, "Property A", 3.0, 3),
            review(4, "Property B", 5.0, 1),
        ];

        let properties = property_performance(&reviews);
        let a = properties.iter().find(|p| p.listing_name == "Property A").unwrap();
        let b = properties.iter().find(|p| p.listing_name == "Property B").unwrap();

        assert_eq!(a.average_rating, 4.0);
        assert_eq!(a.review_count, 3);
        assert_eq!(a.trend, TrendDirection::Stable);
        assert_eq!(b.average_rating, 5.0);
        assert_eq!(b.trend, TrendDirection::Up);
    }

    #[test]
    fn test_rollup_counts_sum_to_total() {
        let reviews: Vec<_> = (0..17)
            .map(|i| review(i, &format!("Listing {}", i % 4), (i % 5 + 1) as f64, i as i64))
            .collect();

        let properties = property_performance(&reviews);
        let total: usize = properties.iter().map(|p| p.review_count).sum();
        assert_eq!(total, reviews.len());
        assert_eq!(properties.len(), 4);
    }

    #[test]
    fn test_rollup_counts_pending_and_approved() {
        let reviews = vec![
            review(1, "Loft", 4.0, 1),
            review(2, "Loft", 2.0, 1).with_status(ReviewStatus::Pending),
            review(3, "Loft", 3.0, 1).with_status(ReviewStatus::Rejected),
        ];
        let properties = property_performance(&reviews);
        assert_eq!(properties[0].approved_count, 1);
        assert_eq!(properties[0].pending_count, 1);
        assert_eq!(properties[0].trend, TrendDirection::Down);
        assert_eq!(properties[0].latest_review, Some(now() - Duration::days(1)));
    }

    #[test]
    fn test_category_averages_fixed_order() {
        let first: CategoryRatings = [
            (ReviewCategory::Value, 4.0),
            (ReviewCategory::Cleanliness, 5.0),
        ]
        .into_iter()
        .collect();
        let second: CategoryRatings = [(ReviewCategory::Value, 2.0)].into_iter().collect();
        let reviews = vec![
            CanonicalReview::new(1, "Loft", first),
            CanonicalReview::new(2, "Loft", second),
        ];

        let averages = category_averages(&reviews);
        assert_eq!(averages.len(), 7);
        assert_eq!(averages[0].category, ReviewCategory::Cleanliness);
        assert_eq!(averages[0].average, Some(5.0));
        assert_eq!(averages[6].category, ReviewCategory::Value);
        assert_eq!(averages[6].average, Some(3.0));
        assert_eq!(averages[6].count, 2);
        assert_eq!(averages[1].average, None);
    }

    #[test]
    fn test_stats_counts_and_deltas() {
        let reviews = vec![
            review(1, "Loft", 5.0, 1),
            review(2, "Loft", 3.0, 2).with_status(ReviewStatus::Pending),
            // previous 7-day window
            review(3, "Loft", 4.0, 9),
            // outside both windows
            review(4, "Loft", 1.0, 40),
        ];

        let stats = dashboard_stats(&reviews, TimeRange::Last7Days, now());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.average_rating, Some(4.0));
        assert_eq!(stats.approval_rate, Some(50.0));
        assert_eq!(stats.review_count_change_pct, Some(100.0));
        assert_eq!(stats.rating_change, Some(0.0));
        assert_eq!(stats.approval_rate_change, Some(-50.0));
    }

    #[test]
    fn test_all_time_stats_have_no_deltas() {
        let reviews = vec![review(1, "Loft", 5.0, 400), review(2, "Loft", 3.0, 1)];
        let stats = dashboard_stats(&reviews, TimeRange::AllTime, now());
        assert_eq!(stats.total, 2);
        assert!(stats.review_count_change_pct.is_none());
        assert!(stats.rating_change.is_none());
    }

    #[test]
    fn test_empty_stats() {
        let stats = dashboard_stats(&[], TimeRange::Last30Days, now());
        assert_eq!(stats.total, 0);
        assert!(stats.average_rating.is_none());
        assert!(stats.approval_rate.is_none());
    }

    #[test]
    fn test_trend_sentinel_marks_empty_buckets() {
        let reviews = vec![review(1, "Loft", 5.0, 0), review(2, "Loft", 3.0, 0)];
        let trend = trend_series(&reviews, TimeRange::Last7Days, now(), TrendFill::Sentinel);

        assert_eq!(trend.len(), 7);
        let today = trend.last().unwrap();
        assert_eq!(today.source, PointSource::Observed);
        assert_eq!(today.review_count, 2);
        assert_eq!(today.average_rating, Some(4.0));
        assert_eq!(today.approval_rate, Some(100.0));

        assert_eq!(trend[0].source, PointSource::NoData);
        assert!(trend[0].average_rating.is_none());
        assert_eq!(trend[0].review_count, 0);
    }

    #[test]
    fn test_trend_synthetic_fill_is_bounded_and_deterministic() {
        let first = trend_series(&[], TimeRange::Last30Days, now(), TrendFill::Synthetic);
        let second = trend_series(&[], TimeRange::Last30Days, now(), TrendFill::Synthetic);
        assert_eq!(first, second);

        for point in &first {
            assert_eq!(point.source, PointSource::Synthetic);
            assert_eq!(point.review_count, 0);
            let rating = point.average_rating.unwrap();
            let approval = point.approval_rate.unwrap();
            assert!((3.5..=5.0).contains(&rating));
            assert!((60.0..=100.0).contains(&approval));
        }
    }

    #[test]
    fn test_trend_counts_match_window() {
        let reviews: Vec<_> = (0..20).map(|i| review(i, "Loft", 4.0, i as i64)).collect();
        let trend = trend_series(&reviews, TimeRange::Last7Days, now(), TrendFill::Sentinel);
        let counted: usize = trend.iter().map(|p| p.review_count).sum();
        assert_eq!(counted, 7);
    }

    #[test]
    fn test_all_time_trend_counts_every_dated_review() {
        let reviews = vec![
            review(1, "Loft", 5.0, 1),
            review(2, "Loft", 4.0, 7 * 365),
        ];
        let stats = dashboard_stats(&reviews, TimeRange::AllTime, now());
        let trend = trend_series(&reviews, TimeRange::AllTime, now(), TrendFill::Sentinel);

        let counted: usize = trend.iter().map(|p| p.review_count).sum();
        assert_eq!(counted, stats.total);
        assert_eq!(trend[0].review_count, 1);
    }

    #[test]
    fn test_monthly_trend_ignores_reviews_after_today() {
        let reviews = vec![
            review(1, "Loft", 5.0, 2),
            // Later this month, past the reference date.
            review(2, "Loft", 1.0, -10),
        ];
        for range in [TimeRange::LastYear, TimeRange::AllTime] {
            let stats = dashboard_stats(&reviews, range, now());
            let trend = trend_series(&reviews, range, now(), TrendFill::Sentinel);
            let counted: usize = trend.iter().map(|p| p.review_count).sum();
            assert_eq!(counted, stats.total, "{}", range);
        }
    }

    #[test]
    fn test_build_dashboard_uses_range_subset() {
        let reviews = vec![
            review(1, "Loft", 5.0, 1),
            review(2, "Studio", 2.0, 3),
            review(3, "Cottage", 4.0, 200),
        ];

        let dashboard = build_dashboard(
            &reviews,
            TimeRange::Last30Days,
            now(),
            &DashboardOptions::default(),
        );

        assert_eq!(dashboard.stats.total, 2);
        assert_eq!(dashboard.properties.len(), 2);
        assert_eq!(dashboard.trend.len(), 30);
        assert!(dashboard
            .alerts
            .iter()
            .any(|a| a.listing_name.as_deref() == Some("Studio")));
    }
}

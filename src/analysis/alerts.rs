//! Heuristic alerts and a simple rating forecast.

use crate::config::DashboardConfig;
use crate::models::{
    Alert, AlertSeverity, CanonicalReview, CategoryAverage, ForecastConfidence, PointSource,
    PropertyPerformance, RatingForecast, ReviewCategory, TrendDirection, TrendPoint,
    LOW_RATING_THRESHOLD,
};

/// Slope (rating per bucket) below which a forecast counts as flat.
const FLAT_SLOPE: f64 = 0.05;

/// Limits that decide when an alert fires.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    /// Alert when more than this many reviews are below 3.5.
    pub low_rating_alert_count: usize,
    /// Alert when more than this many reviews are pending.
    pub pending_alert_count: usize,
    /// Percentage of displayed reviews under which an info alert fires.
    pub min_approval_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            low_rating_alert_count: 2,
            pending_alert_count: 10,
            min_approval_rate: 50.0,
        }
    }
}

impl From<&DashboardConfig> for AlertThresholds {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            low_rating_alert_count: config.low_rating_alert_count,
            pending_alert_count: config.pending_alert_count,
            min_approval_rate: config.min_approval_rate,
        }
    }
}

fn category_recommendation(category: ReviewCategory) -> &'static str {
    match category {
        ReviewCategory::Cleanliness => {
            "Review the cleaning checklist with the housekeeping team and add a post-clean inspection."
        }
        ReviewCategory::Communication => {
            "Tighten response times and send a pre-arrival message with key details."
        }
        ReviewCategory::RespectHouseRules => {
            "Make house rules more visible in the listing and the welcome guide."
        }
        ReviewCategory::Location => {
            "Set expectations about the neighbourhood in the listing description."
        }
        ReviewCategory::Checkin => {
            "Test the self check-in flow and send access instructions earlier."
        }
        ReviewCategory::Accuracy => "Update photos and amenities so the listing matches the unit.",
        ReviewCategory::Value => "Revisit pricing against comparable listings in the area.",
    }
}

/// Build the alert list for a set of reviews and their rollups.
///
/// Alerts are ordered critical first; order within a severity follows the
/// rule order below.
pub fn generate_alerts(
    reviews: &[CanonicalReview],
    properties: &[PropertyPerformance],
    categories: &[CategoryAverage],
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if reviews.is_empty() {
        alerts.push(Alert {
            severity: AlertSeverity::Info,
            title: "No reviews in period".to_string(),
            message: "There are no reviews in the selected time range.".to_string(),
            recommendation: Some("Widen the time range or check the review feed.".to_string()),
            listing_name: None,
        });
        return alerts;
    }

    let low_rated = reviews
        .iter()
        .filter(|r| r.overall_rating() < LOW_RATING_THRESHOLD)
        .count();
    if low_rated > thresholds.low_rating_alert_count {
        alerts.push(Alert {
            severity: AlertSeverity::Critical,
            title: "Low-rated reviews".to_string(),
            message: format!(
                "{} reviews are below {} stars.",
                low_rated, LOW_RATING_THRESHOLD
            ),
            recommendation: Some(
                "Contact the affected guests and follow up with the property managers."
                    .to_string(),
            ),
            listing_name: None,
        });
    }

    let pending = reviews.iter().filter(|r| r.is_pending()).count();
    if pending > thresholds.pending_alert_count {
        alerts.push(Alert {
            severity: AlertSeverity::Warning,
            title: "Pending review backlog".to_string(),
            message: format!("{} reviews are waiting for moderation.", pending),
            recommendation: Some("Approve or reject pending reviews.".to_string()),
            listing_name: None,
        });
    }

    for property in properties
        .iter()
        .filter(|p| p.trend == TrendDirection::Down)
    {
        alerts.push(Alert {
            severity: AlertSeverity::Warning,
            title: "Property rating below target".to_string(),
            message: format!(
                "{} averages {:.1} across {} reviews.",
                property.listing_name, property.average_rating, property.review_count
            ),
            recommendation: weakest_category(property)
                .map(|c| category_recommendation(c).to_string()),
            listing_name: Some(property.listing_name.clone()),
        });
    }

    for average in categories {
        if let Some(value) = average.average {
            if value < LOW_RATING_THRESHOLD {
                alerts.push(Alert {
                    severity: AlertSeverity::Warning,
                    title: format!("Low {} scores", average.category.label().to_lowercase()),
                    message: format!(
                        "{} averages {:.1} over {} ratings.",
                        average.category, value, average.count
                    ),
                    recommendation: Some(category_recommendation(average.category).to_string()),
                    listing_name: None,
                });
            }
        }
    }

    let approved = reviews.iter().filter(|r| r.is_approved()).count();
    let approval_rate = approved as f64 / reviews.len() as f64 * 100.0;
    if approval_rate < thresholds.min_approval_rate {
        alerts.push(Alert {
            severity: AlertSeverity::Info,
            title: "Few reviews displayed".to_string(),
            message: format!(
                "Only {:.0}% of reviews are shown on the website.",
                approval_rate
            ),
            recommendation: None,
            listing_name: None,
        });
    }

    // Stable, so rule order is kept within a severity.
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}

fn weakest_category(property: &PropertyPerformance) -> Option<ReviewCategory> {
    property
        .category_averages
        .iter()
        .filter_map(|c| c.average.map(|avg| (c.category, avg)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(category, _)| category)
}

/// Project the next bucket's average rating from the observed points.
///
/// Uses a least-squares line over bucket index. Returns `None` with fewer
/// than two observed points; synthetic points are ignored.
pub fn forecast_rating(trend: &[TrendPoint]) -> Option<RatingForecast> {
    let points: Vec<(f64, f64)> = trend
        .iter()
        .enumerate()
        .filter(|(_, p)| p.source == PointSource::Observed)
        .filter_map(|(i, p)| p.average_rating.map(|avg| (i as f64, avg)))
        .collect();

    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let covariance: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let variance: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let slope = if variance > 0.0 { covariance / variance } else { 0.0 };

    let ceiling = if points.iter().any(|(_, y)| *y > 5.0) {
        10.0
    } else {
        5.0
    };
    let next_x = trend.len() as f64;
    let projected = (mean_y + slope * (next_x - mean_x)).clamp(1.0, ceiling);

    let direction = if slope > FLAT_SLOPE {
        TrendDirection::Up
    } else if slope < -FLAT_SLOPE {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let confidence = match points.len() {
        0..=2 => ForecastConfidence::Low,
        3..=5 => ForecastConfidence::Medium,
        _ => ForecastConfidence::High,
    };

    Some(RatingForecast {
        projected_rating: (projected * 100.0).round() / 100.0,
        slope,
        direction,
        confidence,
        based_on_points: points.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::tests::review;
    use crate::analysis::aggregator::{category_averages, property_performance};
    use crate::models::ReviewStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn alerts_for(reviews: &[CanonicalReview]) -> Vec<Alert> {
        let properties = property_performance(reviews);
        let categories = category_averages(reviews);
        generate_alerts(reviews, &properties, &categories, &AlertThresholds::default())
    }

    fn point(i: i64, rating: Option<f64>) -> TrendPoint {
        let start = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap() + Duration::days(i);
        TrendPoint {
            label: format!("Day {}", i),
            start,
            end: start + Duration::days(1),
            review_count: usize::from(rating.is_some()),
            average_rating: rating,
            approval_rate: rating.map(|_| 100.0),
            source: if rating.is_some() {
                PointSource::Observed
            } else {
                PointSource::NoData
            },
        }
    }

    #[test]
    fn test_low_rating_alert_is_critical() {
        let reviews = vec![
            review(1, "Loft", 2.0, 1),
            review(2, "Studio", 3.0, 1),
            review(3, "Cottage", 1.0, 1),
            review(4, "Cottage", 5.0, 1),
        ];
        let alerts = alerts_for(&reviews);

        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert!(alerts[0].message.contains("3 reviews"));
        assert!(alerts[0].recommendation.is_some());
    }

    #[test]
    fn test_low_rating_alert_needs_more_than_threshold() {
        let reviews = vec![review(1, "Loft", 2.0, 1), review(2, "Loft", 3.0, 1)];
        let alerts = alerts_for(&reviews);
        assert!(alerts.iter().all(|a| a.severity != AlertSeverity::Critical));
    }

    #[test]
    fn test_pending_backlog_alert() {
        let reviews: Vec<_> = (0..11)
            .map(|i| review(i, "Loft", 5.0, 1).with_status(ReviewStatus::Pending))
            .collect();
        let alerts = alerts_for(&reviews);
        assert!(alerts
            .iter()
            .any(|a| a.title == "Pending review backlog" && a.severity == AlertSeverity::Warning));

        let reviews: Vec<_> = (0..10)
            .map(|i| review(i, "Loft", 5.0, 1).with_status(ReviewStatus::Pending))
            .collect();
        let alerts = alerts_for(&reviews);
        assert!(alerts.iter().all(|a| a.title != "Pending review backlog"));
    }

    #[test]
    fn test_property_and_category_alerts() {
        let reviews = vec![review(1, "Loft", 3.0, 1), review(2, "Villa", 5.0, 1)];
        let alerts = alerts_for(&reviews);

        let property = alerts
            .iter()
            .find(|a| a.listing_name.as_deref() == Some("Loft"))
            .unwrap();
        assert_eq!(property.severity, AlertSeverity::Warning);
        assert!(property
            .recommendation
            .as_deref()
            .unwrap()
            .contains("cleaning"));

        // Cleanliness averages 4.0 overall, so no category alert.
        assert!(alerts.iter().all(|a| !a.title.starts_with("Low cleanliness")));
    }

    #[test]
    fn test_alerts_sorted_by_severity() {
        let reviews = vec![
            review(1, "Loft", 1.0, 1).with_status(ReviewStatus::Pending),
            review(2, "Loft", 1.0, 1).with_status(ReviewStatus::Pending),
            review(3, "Loft", 1.0, 1).with_status(ReviewStatus::Pending),
        ];
        let alerts = alerts_for(&reviews);
        assert!(alerts.len() >= 3);
        for pair in alerts.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        assert_eq!(alerts.last().unwrap().severity, AlertSeverity::Info);
    }

    #[test]
    fn test_empty_reviews_give_single_info_alert() {
        let alerts = alerts_for(&[]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
    }

    #[test]
    fn test_forecast_rising_trend() {
        let trend = vec![
            point(0, Some(3.0)),
            point(1, None),
            point(2, Some(3.5)),
            point(3, Some(4.0)),
        ];
        let forecast = forecast_rating(&trend).unwrap();
        assert_eq!(forecast.direction, TrendDirection::Up);
        assert_eq!(forecast.confidence, ForecastConfidence::Medium);
        assert_eq!(forecast.based_on_points, 3);
        assert!(forecast.projected_rating > 4.0);
        assert!(forecast.projected_rating <= 5.0);
    }

    #[test]
    fn test_forecast_needs_two_points() {
        assert!(forecast_rating(&[point(0, Some(4.0)), point(1, None)]).is_none());
        assert!(forecast_rating(&[]).is_none());
    }

    #[test]
    fn test_forecast_is_clamped() {
        let trend = vec![point(0, Some(3.0)), point(1, Some(1.0))];
        let forecast = forecast_rating(&trend).unwrap();
        assert_eq!(forecast.projected_rating, 1.0);
        assert_eq!(forecast.direction, TrendDirection::Down);
        assert_eq!(forecast.confidence, ForecastConfidence::Low);
    }
}

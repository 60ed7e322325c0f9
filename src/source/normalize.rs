//! Translation between provider records and canonical reviews.

use crate::models::{
    CanonicalReview, CategoryRatings, RawCategoryRating, RawReviewRecord, ReviewCategory,
    ReviewStatus, DEFAULT_CHANNEL,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Timestamp layout used by the provider (`2020-08-21 22:45:14`, UTC).
pub const PROVIDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a provider record into a canonical review.
///
/// Never fails: missing categories give the neutral rating, unknown
/// category names are dropped, and an unreadable timestamp becomes `None`.
pub fn normalize(raw: &RawReviewRecord) -> CanonicalReview {
    let categories = parse_categories(raw.id, &raw.review_category);

    let channel = raw
        .channel
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CHANNEL)
        .to_lowercase();

    let submitted_at = parse_timestamp(&raw.submitted_at);
    if submitted_at.is_none() && !raw.submitted_at.trim().is_empty() {
        debug!(
            "Review {}: unreadable timestamp '{}'",
            raw.id, raw.submitted_at
        );
    }

    CanonicalReview::new(raw.id, raw.listing_name.trim(), categories)
        .with_status(ReviewStatus::from(raw.status.as_str()))
        .with_review_type(raw.review_type.clone())
        .with_text(raw.public_review.trim())
        .with_guest(raw.guest_name.trim())
        .with_channel(channel)
        .submitted(submitted_at)
}

/// Normalize a whole batch, preserving order.
pub fn normalize_all(records: &[RawReviewRecord]) -> Vec<CanonicalReview> {
    records.iter().map(normalize).collect()
}

/// Turn a canonical review back into the provider's shape.
pub fn denormalize(review: &CanonicalReview) -> RawReviewRecord {
    RawReviewRecord {
        id: review.id,
        review_type: review.review_type.clone(),
        status: review.status.as_str().to_string(),
        rating: Some(review.overall_rating()),
        public_review: review.text.clone(),
        review_category: review
            .categories()
            .iter()
            .map(|(category, rating)| RawCategoryRating {
                category: category.as_str().to_string(),
                rating: Some(rating),
            })
            .collect(),
        submitted_at: review
            .submitted_at
            .map(|at| at.format(PROVIDER_TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default(),
        guest_name: review.guest_name.clone(),
        listing_name: review.listing_name.clone(),
        channel: Some(review.channel.clone()),
    }
}

fn parse_categories(id: u64, raw: &[RawCategoryRating]) -> CategoryRatings {
    raw.iter()
        .filter_map(|entry| {
            let category = match entry.category.parse::<ReviewCategory>() {
                Ok(category) => category,
                Err(_) => {
                    debug!("Review {}: dropping unknown category '{}'", id, entry.category);
                    return None;
                }
            };
            match entry.rating {
                Some(rating) if rating.is_finite() => Some((category, rating)),
                _ => {
                    debug!("Review {}: no usable score for {}", id, category.as_str());
                    None
                }
            }
        })
        .collect()
}

/// Parse provider, RFC 3339 or plain-date timestamps as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, PROVIDER_TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

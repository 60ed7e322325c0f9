//! Built-in sample reviews.
//!
//! Served whenever the provider cannot be reached or has nothing to
//! return. The content is fixed and recognisable (listing names prefixed
//! with "Sample"), so it is never mistaken for a live feed.

use crate::models::{RawCategoryRating, RawReviewRecord};

struct SampleRow {
    id: u64,
    review_type: &'static str,
    status: &'static str,
    text: &'static str,
    categories: &'static [(&'static str, f64)],
    submitted_at: &'static str,
    guest: &'static str,
    listing: &'static str,
}

const SAMPLE_ROWS: &[SampleRow] = &[
    SampleRow {
        id: 7453,
        review_type: "guest-to-host",
        status: "published",
        text: "Spotless flat and a very quick reply to every question. Would book again.",
        categories: &[
            ("cleanliness", 5.0),
            ("communication", 5.0),
            ("respect_house_rules", 5.0),
            ("location", 4.0),
            ("checkin", 5.0),
        ],
        submitted_at: "2025-09-28 18:12:44",
        guest: "Shane Finkelstein",
        listing: "Sample - 2B Shoreditch Heights",
    },
    SampleRow {
        id: 7454,
        review_type: "guest-to-host",
        status: "published",
        text: "Great location next to the market. Bathroom could have been cleaner.",
        categories: &[
            ("cleanliness", 3.0),
            ("communication", 4.0),
            ("location", 5.0),
            ("value", 4.0),
        ],
        submitted_at: "2025-09-21 09:30:02",
        guest: "Amara Okafor",
        listing: "Sample - 2B Shoreditch Heights",
    },
    SampleRow {
        id: 7455,
        review_type: "guest-to-host",
        status: "pending",
        text: "Check-in instructions arrived late and the code did not work at first.",
        categories: &[
            ("communication", 3.0),
            ("checkin", 2.0),
            ("accuracy", 4.0),
        ],
        submitted_at: "2025-09-30 22:05:51",
        guest: "Lucas Meyer",
        listing: "Sample - 2B Shoreditch Heights",
    },
    SampleRow {
        id: 7456,
        review_type: "guest-to-host",
        status: "published",
        text: "Bright studio, exactly as pictured. Quiet street and a comfortable bed.",
        categories: &[
            ("cleanliness", 5.0),
            ("accuracy", 5.0),
            ("location", 4.0),
            ("value", 5.0),
        ],
        submitted_at: "2025-09-14 14:48:10",
        guest: "Priya Raman",
        listing: "Sample - Studio Camden Lock",
    },
    SampleRow {
        id: 7457,
        review_type: "guest-to-host",
        status: "published",
        text: "Good value for central London. Small kitchen but everything we needed.",
        categories: &[
            ("cleanliness", 4.0),
            ("communication", 5.0),
            ("value", 5.0),
        ],
        submitted_at: "2025-08-30 11:02:37",
        guest: "Tomasz Nowak",
        listing: "Sample - Studio Camden Lock",
    },
    SampleRow {
        id: 7458,
        review_type: "host-to-guest",
        status: "published",
        text: "Lovely guests, left the place tidy and followed all house rules.",
        categories: &[
            ("cleanliness", 5.0),
            ("communication", 5.0),
            ("respect_house_rules", 5.0),
        ],
        submitted_at: "2025-09-02 08:15:00",
        guest: "Elena Petrova",
        listing: "Sample - Studio Camden Lock",
    },
    SampleRow {
        id: 7459,
        review_type: "guest-to-host",
        status: "published",
        text: "Heating did not work for two nights and the host was hard to reach.",
        categories: &[
            ("cleanliness", 3.0),
            ("communication", 2.0),
            ("accuracy", 3.0),
            ("value", 2.0),
        ],
        submitted_at: "2025-09-25 20:40:19",
        guest: "Daniel Brooks",
        listing: "Sample - 1B Canary Wharf Riverside",
    },
    SampleRow {
        id: 7460,
        review_type: "guest-to-host",
        status: "rejected",
        text: "Terrible. Worst stay ever.",
        categories: &[("cleanliness", 1.0), ("value", 1.0)],
        submitted_at: "2025-09-19 23:59:01",
        guest: "Anonymous",
        listing: "Sample - 1B Canary Wharf Riverside",
    },
    SampleRow {
        id: 7461,
        review_type: "guest-to-host",
        status: "pending",
        text: "River view is stunning but the flat smelled of smoke when we arrived.",
        categories: &[
            ("cleanliness", 2.0),
            ("location", 5.0),
            ("accuracy", 3.0),
        ],
        submitted_at: "2025-10-03 16:27:45",
        guest: "Hannah Schmidt",
        listing: "Sample - 1B Canary Wharf Riverside",
    },
    SampleRow {
        id: 7462,
        review_type: "guest-to-host",
        status: "published",
        text: "Family friendly and close to the park. Kids loved the garden.",
        categories: &[
            ("cleanliness", 4.0),
            ("communication", 4.0),
            ("location", 4.0),
            ("checkin", 5.0),
            ("value", 4.0),
        ],
        submitted_at: "2025-07-12 10:05:33",
        guest: "Marco Bellini",
        listing: "Sample - 3B Clapham Garden House",
    },
    SampleRow {
        id: 7463,
        review_type: "guest-to-host",
        status: "published",
        text: "Spacious house, self check-in was effortless.",
        categories: &[
            ("cleanliness", 4.0),
            ("checkin", 5.0),
            ("accuracy", 4.0),
        ],
        submitted_at: "2025-08-18 17:44:21",
        guest: "Sofia Alvarez",
        listing: "Sample - 3B Clapham Garden House",
    },
    SampleRow {
        id: 7464,
        review_type: "guest-to-host",
        status: "pending",
        text: "",
        categories: &[],
        submitted_at: "2025-10-05 07:30:00",
        guest: "Kenji Watanabe",
        listing: "Sample - 3B Clapham Garden House",
    },
];

/// The fallback review set, in a fixed order.
pub fn fallback_reviews() -> Vec<RawReviewRecord> {
    SAMPLE_ROWS
        .iter()
        .map(|row| RawReviewRecord {
            id: row.id,
            review_type: Some(row.review_type.to_string()),
            status: row.status.to_string(),
            rating: None,
            public_review: row.text.to_string(),
            review_category: row
                .categories
                .iter()
                .map(|(category, rating)| RawCategoryRating {
                    category: category.to_string(),
                    rating: Some(*rating),
                })
                .collect(),
            submitted_at: row.submitted_at.to_string(),
            guest_name: row.guest.to_string(),
            listing_name: row.listing.to_string(),
            channel: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::normalize::normalize_all;
    use std::collections::HashSet;

    #[test]
    fn test_fallback_is_stable() {
        assert_eq!(fallback_reviews(), fallback_reviews());
        assert_eq!(fallback_reviews().len(), SAMPLE_ROWS.len());
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        let ids: HashSet<u64> = fallback_reviews().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), SAMPLE_ROWS.len());
    }

    #[test]
    fn test_fallback_normalizes_cleanly() {
        let reviews = normalize_all(&fallback_reviews());
        assert!(reviews.iter().all(|r| r.submitted_at.is_some()));
        assert!(reviews.iter().all(|r| r.listing_name.starts_with("Sample")));
        assert!(reviews.iter().any(|r| r.is_pending()));
        assert!(reviews.iter().any(|r| r.categories().is_empty()));
    }
}

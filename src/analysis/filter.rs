//! In-memory filtering and ordering of canonical reviews.

use crate::models::CanonicalReview;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Filter on the publicly displayed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    Displayed,
    Hidden,
    #[default]
    All,
}

impl VisibilityFilter {
    fn accepts(&self, review: &CanonicalReview) -> bool {
        match self {
            VisibilityFilter::Displayed => review.is_approved(),
            VisibilityFilter::Hidden => !review.is_approved(),
            VisibilityFilter::All => true,
        }
    }
}

impl FromStr for VisibilityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "displayed" | "approved" | "shown" => Ok(VisibilityFilter::Displayed),
            "hidden" => Ok(VisibilityFilter::Hidden),
            "all" => Ok(VisibilityFilter::All),
            other => Err(format!(
                "invalid status '{}', expected displayed, hidden or all",
                other
            )),
        }
    }
}

impl fmt::Display for VisibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityFilter::Displayed => write!(f, "displayed"),
            VisibilityFilter::Hidden => write!(f, "hidden"),
            VisibilityFilter::All => write!(f, "all"),
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Highest rating first, most recent first within a rating.
    #[default]
    RatingDesc,
    RatingAsc,
    Newest,
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "rating" | "rating-desc" => Ok(SortOrder::RatingDesc),
            "rating-asc" => Ok(SortOrder::RatingAsc),
            "newest" | "date-desc" => Ok(SortOrder::Newest),
            "oldest" | "date-asc" => Ok(SortOrder::Oldest),
            other => Err(format!(
                "invalid sort '{}', expected rating, rating-asc, newest or oldest",
                other
            )),
        }
    }
}

/// Serializable filter state for a review list.
///
/// `channel` and `property` accept `None` or `"all"` for no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub channel: Option<String>,
    pub property: Option<String>,
    pub status: VisibilityFilter,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub sort: SortOrder,
}

fn selection(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

impl FilterCriteria {
    /// Whether one review satisfies every predicate.
    pub fn matches(&self, review: &CanonicalReview) -> bool {
        if let Some(needle) = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
        {
            let hit = [&review.text, &review.guest_name, &review.listing_name]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(min) = self.min_rating {
            if review.overall_rating() < min {
                return false;
            }
        }

        if let Some(channel) = selection(&self.channel) {
            if review.channel != channel {
                return false;
            }
        }

        if let Some(property) = selection(&self.property) {
            if review.listing_name != property {
                return false;
            }
        }

        if !self.status.accepts(review) {
            return false;
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(at) = review.submitted_at else {
                return false;
            };
            if self.date_from.is_some_and(|from| at < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| at > to) {
                return false;
            }
        }

        true
    }
}

fn compare(order: SortOrder, a: &CanonicalReview, b: &CanonicalReview) -> Ordering {
    match order {
        SortOrder::RatingDesc => b
            .overall_rating()
            .total_cmp(&a.overall_rating())
            .then_with(|| b.submitted_at.cmp(&a.submitted_at)),
        SortOrder::RatingAsc => a
            .overall_rating()
            .total_cmp(&b.overall_rating())
            .then_with(|| b.submitted_at.cmp(&a.submitted_at)),
        SortOrder::Newest => b.submitted_at.cmp(&a.submitted_at),
        // Undated reviews still go last.
        SortOrder::Oldest => match (a.submitted_at, b.submitted_at) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Sort in place. Stable: full ties keep their input order.
pub fn sort_reviews(reviews: &mut [CanonicalReview], order: SortOrder) {
    reviews.sort_by(|a, b| compare(order, a, b));
}

/// Filter and order a review list.
pub fn apply(reviews: &[CanonicalReview], criteria: &FilterCriteria) -> Vec<CanonicalReview> {
    let mut filtered: Vec<CanonicalReview> = reviews
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    sort_reviews(&mut filtered, criteria.sort);

    debug!("Filter kept {} of {} reviews", filtered.len(), reviews.len());
    filtered
}

/// Distinct listing names, sorted.
pub fn distinct_properties(reviews: &[CanonicalReview]) -> Vec<String> {
    reviews
        .iter()
        .map(|r| r.listing_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct channels, sorted.
pub fn distinct_channels(reviews: &[CanonicalReview]) -> Vec<String> {
    reviews
        .iter()
        .map(|r| r.channel.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The review set owned by one request.
#[derive(Debug, Clone, Default)]
pub struct ReviewCollection {
    reviews: Vec<CanonicalReview>,
}

impl ReviewCollection {
    pub fn new(reviews: Vec<CanonicalReview>) -> Self {
        Self { reviews }
    }

    pub fn as_slice(&self) -> &[CanonicalReview] {
        &self.reviews
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&CanonicalReview> {
        self.reviews.iter().find(|r| r.id == id)
    }

    pub fn apply(&self, criteria: &FilterCriteria) -> Vec<CanonicalReview> {
        apply(&self.reviews, criteria)
    }

    /// Show or hide a batch of reviews.
    ///
    /// All or nothing: if any id is unknown, nothing changes and `false`
    /// is returned.
    pub fn set_visibility(&mut self, ids: &[u64], displayed: bool) -> bool {
        let known: HashSet<u64> = self.reviews.iter().map(|r| r.id).collect();
        let missing: Vec<u64> = ids.iter().copied().filter(|id| !known.contains(id)).collect();
        if !missing.is_empty() {
            warn!(
                "Visibility update rejected, unknown review ids: {:?}",
                missing
            );
            return false;
        }

        let targets: HashSet<u64> = ids.iter().copied().collect();
        self.reviews = self
            .reviews
            .iter()
            .map(|r| {
                if targets.contains(&r.id) {
                    r.with_visibility(displayed)
                } else {
                    r.clone()
                }
            })
            .collect();

        debug!(
            "Set {} reviews to {}",
            targets.len(),
            if displayed { "displayed" } else { "hidden" }
        );
        true
    }

    pub fn into_inner(self) -> Vec<CanonicalReview> {
        self.reviews
    }
}

//! Aggregation, alerting and filtering over canonical reviews.

pub mod aggregator;
pub mod alerts;
pub mod filter;
pub mod range;

pub use aggregator::*;
pub use alerts::{forecast_rating, generate_alerts, AlertThresholds};
pub use filter::{
    apply, distinct_channels, distinct_properties, sort_reviews, FilterCriteria,
    ReviewCollection, SortOrder, VisibilityFilter,
};
pub use range::{Granularity, Window};

//! Review source adapter.
//!
//! Fetches raw records from the provider (or the built-in sample set) and
//! converts them to canonical reviews.

pub mod client;
pub mod feed;
pub mod normalize;
pub mod sample;

pub use client::{ClientConfig, FetchOutcome, HostawayClient, ReviewOrigin};
pub use feed::{FeedSnapshot, ReviewFeed};
pub use normalize::{denormalize, normalize, normalize_all, parse_timestamp};
pub use sample::fallback_reviews;

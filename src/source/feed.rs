//! Latest-snapshot holder for repeated fetches.
//!
//! When refreshes overlap, the one started last wins: an older fetch that
//! finishes late never replaces a newer snapshot.

use crate::models::CanonicalReview;
use crate::source::client::{FetchOutcome, HostawayClient};
use crate::source::normalize::normalize_all;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Normalized result of one refresh.
#[derive(Debug)]
pub struct FeedSnapshot {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub outcome: FetchOutcome,
    pub reviews: Vec<CanonicalReview>,
}

impl FeedSnapshot {
    pub fn new(generation: u64, outcome: FetchOutcome) -> Self {
        let reviews = normalize_all(&outcome.records);
        Self {
            generation,
            fetched_at: Utc::now(),
            outcome,
            reviews,
        }
    }
}

pub struct ReviewFeed {
    client: HostawayClient,
    generation: AtomicU64,
    latest: Mutex<Option<Arc<FeedSnapshot>>>,
}

impl ReviewFeed {
    pub fn new(client: HostawayClient) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Fetch, normalize and publish a new snapshot.
    ///
    /// Returns this refresh's own snapshot even if a newer one was
    /// published in the meantime.
    pub async fn refresh(&self) -> Arc<FeedSnapshot> {
        let ticket = self.next_ticket();
        let outcome = self.client.fetch_with_origin().await;
        let snapshot = Arc::new(FeedSnapshot::new(ticket, outcome));
        self.publish(Arc::clone(&snapshot));
        snapshot
    }

    /// The newest published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<FeedSnapshot>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store `snapshot` unless a newer generation is already stored.
    fn publish(&self, snapshot: Arc<FeedSnapshot>) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        let newer_exists = latest
            .as_ref()
            .is_some_and(|current| current.generation > snapshot.generation);
        if newer_exists {
            debug!(
                "Discarding stale review snapshot {} (have {})",
                snapshot.generation,
                latest.as_ref().map(|s| s.generation).unwrap_or_default()
            );
            return false;
        }
        *latest = Some(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::client::{ClientConfig, ReviewOrigin};
    use crate::source::sample::fallback_reviews;

    fn offline_feed() -> ReviewFeed {
        let config = ClientConfig {
            offline: true,
            ..Default::default()
        };
        ReviewFeed::new(HostawayClient::new(config, fallback_reviews()).unwrap())
    }

    fn empty_snapshot(generation: u64) -> Arc<FeedSnapshot> {
        Arc::new(FeedSnapshot::new(
            generation,
            FetchOutcome {
                records: Vec::new(),
                origin: ReviewOrigin::Live,
            },
        ))
    }

    #[tokio::test]
    async fn test_refresh_publishes_normalized_snapshot() {
        let feed = offline_feed();
        assert!(feed.latest().is_none());

        let snapshot = feed.refresh().await;
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.reviews.len(), fallback_reviews().len());
        assert!(!snapshot.outcome.origin.is_live());

        let latest = feed.latest().unwrap();
        assert_eq!(latest.generation, 1);

        feed.refresh().await;
        assert_eq!(feed.latest().unwrap().generation, 2);
    }

    #[test]
    fn test_later_request_supersedes_earlier() {
        let feed = offline_feed();
        let first = feed.next_ticket();
        let second = feed.next_ticket();

        // The second request finishes first.
        assert!(feed.publish(empty_snapshot(second)));
        assert!(!feed.publish(empty_snapshot(first)));
        assert_eq!(feed.latest().unwrap().generation, second);
    }

    #[test]
    fn test_earlier_request_may_publish_until_newer_arrives() {
        let feed = offline_feed();
        let first = feed.next_ticket();
        let second = feed.next_ticket();

        assert!(feed.publish(empty_snapshot(first)));
        assert!(feed.publish(empty_snapshot(second)));
        assert_eq!(feed.latest().unwrap().generation, second);
    }
}

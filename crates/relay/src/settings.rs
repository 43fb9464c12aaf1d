use {
    postrelay_channels::FeedId,
    std::{collections::HashSet, sync::Arc, time::Duration},
};

/// Grace period applied when none is configured.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(2500);

/// Read-only relay configuration injected into the [`Aggregator`](crate::Aggregator).
#[derive(Debug, Clone)]
pub struct RelaySettings {
    sources: Arc<HashSet<FeedId>>,
    destinations: Arc<[FeedId]>,
    grace_period: Duration,
}

impl RelaySettings {
    /// Build settings from source and destination lists.
    ///
    /// Repeated destinations are collapsed (first occurrence wins) so each
    /// feed receives a post at most once.
    pub fn new(
        sources: impl IntoIterator<Item = FeedId>,
        destinations: impl IntoIterator<Item = FeedId>,
    ) -> Self {
        let mut seen = HashSet::new();
        let destinations: Vec<FeedId> = destinations
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        Self {
            sources: Arc::new(sources.into_iter().collect()),
            destinations: destinations.into(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn is_source(&self, feed: FeedId) -> bool {
        self.sources.contains(&feed)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn destinations(&self) -> &Arc<[FeedId]> {
        &self.destinations
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

use std::sync::Arc;

use {
    futures::future::join_all,
    postrelay_channels::{FeedId, ItemId, RelayTransport},
    tracing::{error, info},
};

/// Per-destination outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<FeedId>,
    pub failed: Vec<FeedId>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn collect(results: Vec<(FeedId, bool)>) -> Self {
        let mut report = Self::default();
        for (destination, ok) in results {
            if ok {
                report.delivered.push(destination);
            } else {
                report.failed.push(destination);
            }
        }
        report
    }
}

/// Fans posts out to every destination.
///
/// Destinations are attempted concurrently and independently: a failure is
/// logged and recorded in the [`DeliveryReport`], never propagated, and never
/// stops delivery to the other destinations. There are no retries.
#[derive(Clone)]
pub struct Forwarder {
    transport: Arc<dyn RelayTransport>,
    destinations: Arc<[FeedId]>,
}

impl Forwarder {
    pub fn new(transport: Arc<dyn RelayTransport>, destinations: Arc<[FeedId]>) -> Self {
        Self {
            transport,
            destinations,
        }
    }

    pub fn destinations(&self) -> &[FeedId] {
        &self.destinations
    }

    /// Forward one post from `source` to every destination.
    pub async fn deliver_single(&self, source: FeedId, item: ItemId) -> DeliveryReport {
        let platform = self.transport.capabilities().name;
        let attempts = self.destinations.iter().map(|&destination| async move {
            match self
                .transport
                .forward_single(destination, source, item)
                .await
            {
                Ok(()) => {
                    info!(
                        platform,
                        %source,
                        %destination,
                        item = item.0,
                        "forwarded single post"
                    );
                    (destination, true)
                },
                Err(e) => {
                    error!(
                        platform,
                        %source,
                        %destination,
                        item = item.0,
                        error = %e,
                        "failed to forward single post"
                    );
                    (destination, false)
                },
            }
        });
        DeliveryReport::collect(join_all(attempts).await)
    }

    /// Forward an ordered set of posts from `source` to every destination,
    /// each destination receiving the whole set as one unit.
    ///
    /// Transports without batch forwarding get the items one by one, in
    /// order; that destination's sequence stops at its first failure.
    pub async fn deliver_ordered_set(&self, source: FeedId, items: &[ItemId]) -> DeliveryReport {
        if items.is_empty() {
            return DeliveryReport::default();
        }
        let ids: Vec<i32> = items.iter().map(|id| id.0).collect();
        let attempts = self.destinations.iter().map(|&destination| {
            let ids = &ids;
            async move {
                let platform = self.transport.capabilities().name;
                match self.forward_set_to(destination, source, items).await {
                    Ok(()) => {
                        info!(
                            platform,
                            %source,
                            %destination,
                            items = ?ids,
                            "forwarded media group"
                        );
                        (destination, true)
                    },
                    Err(e) => {
                        error!(
                            platform,
                            %source,
                            %destination,
                            items = ?ids,
                            error = %e,
                            "failed to forward media group"
                        );
                        (destination, false)
                    },
                }
            }
        });
        DeliveryReport::collect(join_all(attempts).await)
    }

    async fn forward_set_to(
        &self,
        destination: FeedId,
        source: FeedId,
        items: &[ItemId],
    ) -> postrelay_channels::Result<()> {
        let caps = self.transport.capabilities();
        if !caps.batch_forward {
            for &item in items {
                self.transport
                    .forward_single(destination, source, item)
                    .await?;
            }
            return Ok(());
        }
        for chunk in items.chunks(caps.max_batch_len.max(1)) {
            self.transport
                .forward_many(destination, source, chunk)
                .await?;
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        postrelay_channels::{Error, TransportCapabilities},
        std::sync::Mutex,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Single(i64, i32),
        Many(i64, Vec<i32>),
    }

    struct FakeTransport {
        caps: TransportCapabilities,
        failing: Vec<FeedId>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeTransport {
        fn new(caps: TransportCapabilities, failing: &[i64]) -> Arc<Self> {
            Arc::new(Self {
                caps,
                failing: failing.iter().copied().map(FeedId).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self, destination: FeedId) -> postrelay_channels::Result<()> {
            if self.failing.contains(&destination) {
                Err(Error::rejected(destination.0, "chat not found"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RelayTransport for FakeTransport {
        fn capabilities(&self) -> TransportCapabilities {
            self.caps
        }

        async fn forward_single(
            &self,
            destination: FeedId,
            _source: FeedId,
            item: ItemId,
        ) -> postrelay_channels::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Single(destination.0, item.0));
            self.check(destination)
        }

        async fn forward_many(
            &self,
            destination: FeedId,
            _source: FeedId,
            items: &[ItemId],
        ) -> postrelay_channels::Result<()> {
            self.calls.lock().unwrap().push(Call::Many(
                destination.0,
                items.iter().map(|i| i.0).collect(),
            ));
            self.check(destination)
        }
    }

    fn destinations(ids: &[i64]) -> Arc<[FeedId]> {
        ids.iter().copied().map(FeedId).collect::<Vec<_>>().into()
    }

    fn items(ids: &[i32]) -> Vec<ItemId> {
        ids.iter().copied().map(ItemId).collect()
    }

    #[tokio::test]
    async fn single_reaches_every_destination() {
        let transport = FakeTransport::new(TransportCapabilities::default(), &[]);
        let forwarder = Forwarder::new(transport.clone(), destinations(&[-1, -2, -3]));

        let report = forwarder.deliver_single(FeedId(-9), ItemId(55)).await;

        assert!(report.is_complete());
        assert_eq!(report.delivered, vec![FeedId(-1), FeedId(-2), FeedId(-3)]);
        assert_eq!(
            transport.calls(),
            vec![
                Call::Single(-1, 55),
                Call::Single(-2, 55),
                Call::Single(-3, 55)
            ]
        );
    }

    #[tokio::test]
    async fn failing_destination_does_not_block_others() {
        let transport = FakeTransport::new(TransportCapabilities::default(), &[-2]);
        let forwarder = Forwarder::new(transport.clone(), destinations(&[-1, -2, -3]));

        let report = forwarder
            .deliver_ordered_set(FeedId(-9), &items(&[1, 2]))
            .await;

        assert_eq!(report.delivered, vec![FeedId(-1), FeedId(-3)]);
        assert_eq!(report.failed, vec![FeedId(-2)]);
        assert_eq!(report.attempted(), 3);
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn sequential_fallback_without_batch_forward() {
        let caps = TransportCapabilities {
            name: "plain",
            batch_forward: false,
            max_batch_len: 1,
        };
        let transport = FakeTransport::new(caps, &[]);
        let forwarder = Forwarder::new(transport.clone(), destinations(&[-1]));

        let report = forwarder
            .deliver_ordered_set(FeedId(-9), &items(&[4, 5, 6]))
            .await;

        assert!(report.is_complete());
        assert_eq!(
            transport.calls(),
            vec![
                Call::Single(-1, 4),
                Call::Single(-1, 5),
                Call::Single(-1, 6)
            ]
        );
    }

    #[tokio::test]
    async fn sequential_fallback_stops_at_first_failure() {
        let caps = TransportCapabilities {
            name: "plain",
            batch_forward: false,
            max_batch_len: 1,
        };
        let transport = FakeTransport::new(caps, &[-1]);
        let forwarder = Forwarder::new(transport.clone(), destinations(&[-1]));

        let report = forwarder
            .deliver_ordered_set(FeedId(-9), &items(&[4, 5, 6]))
            .await;

        assert_eq!(report.failed, vec![FeedId(-1)]);
        assert_eq!(transport.calls(), vec![Call::Single(-1, 4)]);
    }

    #[tokio::test]
    async fn oversized_sets_are_split() {
        let caps = TransportCapabilities {
            name: "small",
            batch_forward: true,
            max_batch_len: 2,
        };
        let transport = FakeTransport::new(caps, &[]);
        let forwarder = Forwarder::new(transport.clone(), destinations(&[-1]));

        forwarder
            .deliver_ordered_set(FeedId(-9), &items(&[1, 2, 3]))
            .await;

        assert_eq!(
            transport.calls(),
            vec![Call::Many(-1, vec![1, 2]), Call::Many(-1, vec![3])]
        );
    }

    #[tokio::test]
    async fn empty_set_is_a_no_op() {
        let transport = FakeTransport::new(TransportCapabilities::default(), &[]);
        let forwarder = Forwarder::new(transport.clone(), destinations(&[-1, -2]));

        let report = forwarder.deliver_ordered_set(FeedId(-9), &[]).await;

        assert_eq!(report.attempted(), 0);
        assert!(transport.calls().is_empty());
    }
}

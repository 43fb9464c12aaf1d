use std::sync::Arc;

use {
    postrelay_channels::{ChannelPost, FeedId, InboundEvent, ItemId, RelayTransport},
    tracing::{debug, info, warn},
};

use crate::{
    buffer::{GroupBuffer, Take},
    forwarder::{DeliveryReport, Forwarder},
    key::GroupKey,
    settings::RelaySettings,
};

/// Why an inbound event was dropped without forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    NotChannelPost,
    UnknownSource(FeedId),
}

/// What the aggregator did with an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Ignored(IgnoreReason),
    /// Appended to a media group; `opened` is set when this post started the
    /// group and its grace-period timer.
    Buffered { group: GroupKey, opened: bool },
    /// Forwarded immediately as a single post.
    Forwarded(DeliveryReport),
}

struct Inner {
    settings: RelaySettings,
    buffer: GroupBuffer,
    forwarder: Forwarder,
}

/// Classifies inbound channel posts and relays them, holding media groups
/// back until their grace period has elapsed.
///
/// Cheap to clone; clones share the same buffer.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl Aggregator {
    pub fn new(settings: RelaySettings, transport: Arc<dyn RelayTransport>) -> Self {
        let forwarder = Forwarder::new(transport, Arc::clone(settings.destinations()));
        Self {
            inner: Arc::new(Inner {
                settings,
                buffer: GroupBuffer::new(),
                forwarder,
            }),
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.inner.settings
    }

    /// Number of media groups waiting for their grace period.
    pub fn pending_groups(&self) -> usize {
        self.inner.buffer.len()
    }

    /// Route one inbound event.
    ///
    /// Posts without a media group are forwarded before this returns. Grouped
    /// posts are buffered; the group is forwarded by its completion task once
    /// the grace period has elapsed. Delivery failures are logged, never
    /// returned.
    pub async fn on_inbound_event(&self, event: InboundEvent) -> Disposition {
        let post = match event {
            InboundEvent::ChannelPost(post) => post,
            InboundEvent::Other { description } => {
                debug!(kind = %description, "ignoring update that is not a channel post");
                return Disposition::Ignored(IgnoreReason::NotChannelPost);
            },
        };

        if !self.inner.settings.is_source(post.source) {
            debug!(source = %post.source, "ignoring post from unconfigured source");
            return Disposition::Ignored(IgnoreReason::UnknownSource(post.source));
        }

        match post.group {
            Some(group) => self.buffer_post(GroupKey::new(post.source, group), post.item),
            None => {
                let report = self.forward_single(post).await;
                Disposition::Forwarded(report)
            },
        }
    }

    fn buffer_post(&self, key: GroupKey, item: ItemId) -> Disposition {
        let appended = self.inner.buffer.append_or_open(key.clone(), item, |generation| {
            let inner = Arc::clone(&self.inner);
            let key = key.clone();
            tokio::spawn(async move { inner.complete_after_grace(key, generation).await })
        });
        info!(
            source = %key.source(),
            group_id = %key.group(),
            item = item.0,
            buffered = appended.len,
            opened = appended.opened,
            "buffered media group post"
        );
        Disposition::Buffered {
            group: key,
            opened: appended.opened,
        }
    }

    async fn forward_single(&self, post: ChannelPost) -> DeliveryReport {
        let report = self
            .inner
            .forwarder
            .deliver_single(post.source, post.item)
            .await;
        if !report.is_complete() {
            warn!(
                source = %post.source,
                item = post.item.0,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "single post not delivered everywhere"
            );
        }
        report
    }

    /// Abort every pending completion task. Groups still buffered are lost;
    /// their count is returned.
    pub fn shutdown(&self) -> usize {
        let dropped = self.inner.buffer.abort_all();
        for key in &dropped {
            warn!(
                source = %key.source(),
                group_id = %key.group(),
                "discarding media group still inside its grace period"
            );
        }
        dropped.len()
    }
}

impl Inner {
    async fn complete_after_grace(self: Arc<Self>, key: GroupKey, generation: u64) {
        tokio::time::sleep(self.settings.grace_period()).await;

        let group = match self.buffer.take(&key, generation) {
            Take::Completed(group) => group,
            Take::Missing => {
                warn!(
                    source = %key.source(),
                    group_id = %key.group(),
                    "media group vanished before completion"
                );
                return;
            },
            Take::Superseded { current } => {
                warn!(
                    source = %key.source(),
                    group_id = %key.group(),
                    generation,
                    current,
                    "media group completion superseded"
                );
                return;
            },
        };

        debug!(
            source = %key.source(),
            group_id = %key.group(),
            count = group.items.len(),
            age = ?group.age,
            "media group complete"
        );

        let report = self
            .forwarder
            .deliver_ordered_set(key.source(), &group.items)
            .await;
        if !report.is_complete() {
            warn!(
                source = %key.source(),
                group_id = %key.group(),
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "media group not delivered everywhere"
            );
        }
    }
}

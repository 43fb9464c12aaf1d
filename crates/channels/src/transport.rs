use async_trait::async_trait;

use crate::{
    Result,
    event::{FeedId, ItemId},
};

/// What a transport can do. The forwarder branches on these when relaying a
/// media group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportCapabilities {
    /// Short platform name used in log records (e.g. "telegram").
    pub name: &'static str,
    /// Whether `forward_many` relays a whole ordered set as one unit.
    pub batch_forward: bool,
    /// Largest set a single `forward_many` call accepts.
    pub max_batch_len: usize,
}

impl Default for TransportCapabilities {
    fn default() -> Self {
        Self {
            name: "unknown",
            batch_forward: true,
            max_batch_len: usize::MAX,
        }
    }
}

/// Outbound side of a messaging platform.
///
/// Every call is a single request/response against one destination. Errors
/// are returned to the caller, which decides how to contain them; adapters
/// do not retry.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities::default()
    }

    /// Relay one item from `source` to `destination`.
    async fn forward_single(&self, destination: FeedId, source: FeedId, item: ItemId)
    -> Result<()>;

    /// Relay an ordered set of items from `source` to `destination` as one
    /// logical unit.
    ///
    /// Only called when [`TransportCapabilities::batch_forward`] is set.
    async fn forward_many(
        &self,
        destination: FeedId,
        source: FeedId,
        items: &[ItemId],
    ) -> Result<()>;
}

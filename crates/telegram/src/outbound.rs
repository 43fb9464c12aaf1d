use {
    async_trait::async_trait,
    teloxide::{
        RequestError,
        prelude::*,
        types::{ChatId, MessageId},
    },
    tracing::debug,
};

use postrelay_channels::{Error, FeedId, ItemId, RelayTransport, Result, TransportCapabilities};

/// `forwardMessages` accepts at most this many message ids per call.
pub const TELEGRAM_MAX_FORWARD_BATCH: usize = 100;

/// Relays channel posts with the Bot API forward methods.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl RelayTransport for TelegramTransport {
    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities {
            name: "telegram",
            batch_forward: true,
            max_batch_len: TELEGRAM_MAX_FORWARD_BATCH,
        }
    }

    async fn forward_single(&self, destination: FeedId, source: FeedId, item: ItemId) -> Result<()> {
        debug!(%source, %destination, item = item.0, "telegram forwardMessage");
        self.bot
            .forward_message(ChatId(destination.0), ChatId(source.0), MessageId(item.0))
            .await
            .map(|_| ())
            .map_err(|e| relay_error(destination, "forwardMessage", e))
    }

    async fn forward_many(
        &self,
        destination: FeedId,
        source: FeedId,
        items: &[ItemId],
    ) -> Result<()> {
        if items.len() > TELEGRAM_MAX_FORWARD_BATCH {
            return Err(Error::invalid_input(format!(
                "forwardMessages accepts at most {TELEGRAM_MAX_FORWARD_BATCH} messages, got {}",
                items.len()
            )));
        }
        let message_ids: Vec<MessageId> = items.iter().map(|id| MessageId(id.0)).collect();
        debug!(
            %source,
            %destination,
            count = message_ids.len(),
            "telegram forwardMessages"
        );
        self.bot
            .forward_messages(ChatId(destination.0), ChatId(source.0), message_ids)
            .await
            .map(|_| ())
            .map_err(|e| relay_error(destination, "forwardMessages", e))
    }
}

/// API errors mean Telegram refused this destination; everything else is a
/// transport failure.
fn relay_error(destination: FeedId, operation: &'static str, error: RequestError) -> Error {
    match error {
        RequestError::Api(api) => Error::rejected(destination.0, api),
        other => Error::external(format!("telegram {operation}"), other),
    }
}

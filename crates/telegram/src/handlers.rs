use {
    teloxide::types::{Message, Update, UpdateKind},
    tracing::debug,
};

use {
    postrelay_channels::{ChannelPost, FeedId, GroupId, InboundEvent, ItemId},
    postrelay_relay::{Aggregator, Disposition},
};

/// Convert a Telegram update into the relay's inbound event.
pub fn inbound_event(update: &Update) -> InboundEvent {
    match &update.kind {
        UpdateKind::ChannelPost(msg) => InboundEvent::ChannelPost(channel_post(msg)),
        other => InboundEvent::other(update_kind_name(other)),
    }
}

fn channel_post(msg: &Message) -> ChannelPost {
    ChannelPost {
        source: FeedId(msg.chat.id.0),
        item: ItemId(msg.id.0),
        group: msg.media_group_id().map(|id| GroupId::new(id.to_string())),
    }
}

fn update_kind_name(kind: &UpdateKind) -> &'static str {
    match kind {
        UpdateKind::Message(_) => "message",
        UpdateKind::EditedMessage(_) => "edited_message",
        UpdateKind::ChannelPost(_) => "channel_post",
        UpdateKind::EditedChannelPost(_) => "edited_channel_post",
        UpdateKind::CallbackQuery(_) => "callback_query",
        _ => "other",
    }
}

/// Hand one polled update to the aggregator.
pub async fn handle_update(update: Update, relay: &Aggregator) -> Disposition {
    let event = inbound_event(&update);
    debug!(update_id = update.id.0, event = ?event, "received telegram update");
    relay.on_inbound_event(event).await
}

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Identity of a feed (a channel the relay reads from or writes to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(pub i64);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for FeedId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Sequence number the upstream platform assigns to a posted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ItemId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Media group identity shared by every item of one album.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One post published in a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPost {
    pub source: FeedId,
    pub item: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

impl ChannelPost {
    pub fn single(source: impl Into<FeedId>, item: impl Into<ItemId>) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            group: None,
        }
    }

    pub fn grouped(
        source: impl Into<FeedId>,
        item: impl Into<ItemId>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            group: Some(GroupId::new(group)),
        }
    }
}

/// Inbound event as delivered by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    ChannelPost(ChannelPost),
    /// Any other update category (direct messages, edits, callbacks...).
    Other { description: String },
}

impl InboundEvent {
    pub fn other(description: impl Into<String>) -> Self {
        Self::Other {
            description: description.into(),
        }
    }

    pub fn as_channel_post(&self) -> Option<&ChannelPost> {
        match self {
            Self::ChannelPost(post) => Some(post),
            Self::Other { .. } => None,
        }
    }
}

impl From<ChannelPost> for InboundEvent {
    fn from(post: ChannelPost) -> Self {
        Self::ChannelPost(post)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn item_ids_sort_numerically() {
        let mut ids = vec![ItemId(103), ItemId(101), ItemId(102)];
        ids.sort();
        assert_eq!(ids, vec![ItemId(101), ItemId(102), ItemId(103)]);
    }

    #[rstest]
    #[case(ChannelPost::single(-100_i64, 5), None)]
    #[case(ChannelPost::grouped(-100_i64, 5, "g1"), Some("g1"))]
    fn post_constructors(#[case] post: ChannelPost, #[case] group: Option<&str>) {
        assert_eq!(post.source, FeedId(-100));
        assert_eq!(post.item, ItemId(5));
        assert_eq!(post.group.as_ref().map(GroupId::as_str), group);
    }

    #[test]
    fn event_json_shape() {
        let event = InboundEvent::from(ChannelPost::grouped(-42_i64, 7, "album"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "channel_post");
        assert_eq!(json["source"], -42);
        assert_eq!(json["item"], 7);
        assert_eq!(json["group"], "album");

        let back: InboundEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn other_events_are_not_posts() {
        assert!(InboundEvent::other("message").as_channel_post().is_none());
    }
}

//! Feed identities, inbound events and the outbound transport seam.
//!
//! The relay engine only ever talks to a messaging platform through the
//! [`RelayTransport`] trait; concrete adapters (Telegram, test doubles) live
//! in their own crates.

pub mod error;
pub mod event;
pub mod transport;

pub use {
    error::{Error, Result},
    event::{ChannelPost, FeedId, GroupId, InboundEvent, ItemId},
    transport::{RelayTransport, TransportCapabilities},
};

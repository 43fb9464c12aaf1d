//! Telegram transport for postrelay.
//!
//! Receives channel posts by long-polling the Bot API and relays them with
//! `forwardMessage` / `forwardMessages`, using the teloxide library.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_support;

pub use {
    error::{Error, Result},
    outbound::TelegramTransport,
};

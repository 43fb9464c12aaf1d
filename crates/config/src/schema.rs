//! Config schema: bot credentials and the relay wiring.

use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Grace period for media groups when none is configured.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 2500;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostrelayConfig {
    pub telegram: TelegramConfig,
    pub relay: RelayConfig,
}

/// Telegram bot credentials and polling behaviour.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,
}

impl TelegramConfig {
    /// HTTP client timeout: longer than the long-poll timeout so the client
    /// never aborts a request Telegram is still holding open.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_timeout_secs) + 15)
    }

    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Which channels are relayed where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Channel ids whose posts are relayed.
    pub sources: Vec<i64>,
    /// Channel ids every post is relayed to.
    pub destinations: Vec<i64>,
    /// How long a media group is buffered after its first item (ms).
    pub grace_period_ms: u64,
}

impl RelayConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            destinations: Vec::new(),
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
        }
    }
}

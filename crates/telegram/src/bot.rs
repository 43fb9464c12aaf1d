use std::time::Duration;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, Update},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use {
    postrelay_config::TelegramConfig,
    postrelay_relay::{Aggregator, Disposition},
};

use crate::{
    error::{Error, Result},
    handlers,
};

/// Pause between failed `getUpdates` calls.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Build the bot client and verify its credentials.
///
/// The HTTP client timeout is longer than the long-polling timeout so the
/// client never aborts a request Telegram is still holding open.
pub async fn connect(config: &TelegramConfig) -> Result<Bot> {
    let bot = build_bot(config)?;
    prepare(&bot).await?;
    Ok(bot)
}

fn build_bot(config: &TelegramConfig) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| Error::external("build telegram http client", e))?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Check the token with `getMe` and drop any webhook so long polling works.
pub async fn prepare(bot: &Bot) -> Result<Option<String>> {
    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    info!(
        username = ?me.username,
        "telegram bot connected (webhook cleared)"
    );
    Ok(me.username.clone())
}

/// Long-poll for channel posts and hand each one to the relay until
/// `cancel` fires.
///
/// Returns [`Error::Conflict`] when another process polls with the same
/// token. Any other `getUpdates` failure is logged and retried after a
/// short pause.
pub async fn run_polling(
    bot: Bot,
    relay: Aggregator,
    poll_timeout_secs: u32,
    cancel: CancellationToken,
) -> Result<()> {
    info!(poll_timeout_secs, "starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::ChannelPost])
                .send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    dispatch(update, &relay).await;
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling stopped: another instance is running with this token");
                return Err(Error::Conflict);
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_RETRY_DELAY) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
    Ok(())
}

async fn dispatch(update: Update, relay: &Aggregator) {
    let update_id = update.id.0;
    match handlers::handle_update(update, relay).await {
        Disposition::Ignored(reason) => {
            debug!(update_id, ?reason, "telegram update ignored");
        },
        Disposition::Buffered { group, opened } => {
            debug!(update_id, %group, opened, "telegram post buffered");
        },
        Disposition::Forwarded(report) => {
            debug!(
                update_id,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "telegram post forwarded"
            );
        },
    }
}

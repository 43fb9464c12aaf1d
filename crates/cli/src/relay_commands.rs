use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result, bail},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use {
    postrelay_channels::FeedId,
    postrelay_config::{
        PostrelayConfig, RelayConfig, Severity, apply_env_overrides, find_config_file,
        load_config, validate::check_config,
    },
    postrelay_relay::{Aggregator, RelaySettings},
    postrelay_telegram::{TelegramTransport, bot},
};

/// `postrelay run`: relay channel posts until Ctrl-C.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let discovered = config_path.map(Path::to_path_buf).or_else(find_config_file);
    let config = load(discovered.as_deref())?;

    let bot = bot::connect(&config.telegram)
        .await
        .context("failed to connect to telegram")?;

    let relay = Aggregator::new(
        relay_settings(&config.relay),
        Arc::new(TelegramTransport::new(bot.clone())),
    );
    let settings = relay.settings();
    info!(
        sources = settings.source_count(),
        destinations = settings.destinations().len(),
        grace_period = ?settings.grace_period(),
        "relay configured"
    );

    let cancel = CancellationToken::new();
    let signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown requested"),
                Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
            }
            cancel.cancel();
        }
    });

    let result = bot::run_polling(
        bot,
        relay.clone(),
        config.telegram.poll_timeout_secs,
        cancel,
    )
    .await;
    signal.abort();

    let discarded = relay.shutdown();
    if discarded > 0 {
        warn!(
            groups = discarded,
            "discarded media groups still inside their grace period"
        );
    }

    result.context("telegram polling failed")?;
    info!("postrelay stopped");
    Ok(())
}

/// Load the config, apply env overrides and refuse to start on errors.
///
/// A config file that exists but cannot be read or parsed is an error; only
/// a missing file falls back to defaults.
fn load(config_path: Option<&Path>) -> Result<PostrelayConfig> {
    let config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        },
        None => {
            info!("no config file found, using defaults and environment");
            PostrelayConfig::default()
        },
    };
    let config = apply_env_overrides(config);

    let mut errors = 0;
    for d in check_config(&config) {
        match d.severity {
            Severity::Error => {
                errors += 1;
                error!(path = %d.path, "{}", d.message);
            },
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    if errors > 0 {
        bail!("invalid configuration ({errors} error(s)); run `postrelay check` for details");
    }
    Ok(config)
}

fn relay_settings(relay: &RelayConfig) -> RelaySettings {
    RelaySettings::new(
        relay.sources.iter().copied().map(FeedId),
        relay.destinations.iter().copied().map(FeedId),
    )
    .with_grace_period(relay.grace_period())
}

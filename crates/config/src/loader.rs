use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::PostrelayConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "postrelay.toml",
    "postrelay.yaml",
    "postrelay.yml",
    "postrelay.json",
];

/// Env var overriding `telegram.token`.
pub const ENV_TELEGRAM_TOKEN: &str = "POSTRELAY_TELEGRAM_TOKEN";
/// Env var overriding `relay.grace_period_ms`.
pub const ENV_GRACE_PERIOD_MS: &str = "POSTRELAY_GRACE_PERIOD_MS";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PostrelayConfig> {
    let value = load_config_value(path)?;
    serde_json::from_value(value).map_err(|e| Error::parse(path, e))
}

/// Read, env-substitute and parse a config file into a format-neutral value.
pub fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config_value(&raw, path)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./postrelay.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/postrelay/postrelay.{toml,yaml,yml,json}` (user-global)
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/postrelay/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "postrelay").map(|d| d.config_dir().to_path_buf())
}

/// Apply `POSTRELAY_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: PostrelayConfig) -> PostrelayConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: PostrelayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PostrelayConfig {
    if let Some(token) = lookup(ENV_TELEGRAM_TOKEN).filter(|t| !t.trim().is_empty()) {
        debug!(var = ENV_TELEGRAM_TOKEN, "telegram token taken from environment");
        config.telegram.token = Secret::new(token);
    }
    if let Some(raw) = lookup(ENV_GRACE_PERIOD_MS) {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.relay.grace_period_ms = ms,
            Err(e) => warn!(
                var = ENV_GRACE_PERIOD_MS,
                value = %raw,
                error = %e,
                "ignoring invalid grace period override"
            ),
        }
    }
    config
}

pub(crate) fn parse_config_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw).map_err(|e| Error::parse(path, e))?;
            serde_json::to_value(v).map_err(|e| Error::parse(path, e))
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value =
                serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e))?;
            serde_json::to_value(v).map_err(|e| Error::parse(path, e))
        },
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

//! Configuration loading, env substitution, env overrides and validation.
//!
//! Config files: `postrelay.toml`, `postrelay.yaml`, or `postrelay.json`
//! Searched in `./` then `~/.config/postrelay/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution anywhere in
//! the file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, find_config_file, load_config},
    schema::{DEFAULT_GRACE_PERIOD_MS, PostrelayConfig, RelayConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};

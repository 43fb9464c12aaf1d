//! Configuration validation.
//!
//! Detects unknown/misspelled fields, type errors, and relay wiring that
//! cannot work (no sources, a feed relaying into itself, ...).

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{loader, schema::PostrelayConfig};

/// Grace periods above this are almost certainly a unit mistake.
const MAX_SENSIBLE_GRACE_PERIOD_MS: u64 = 60_000;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "relay", "auth"
    pub category: &'static str,
    /// Dotted path, e.g. "relay.sources"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}] {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Known fields ────────────────────────────────────────────────────────────

const TOP_LEVEL_KEYS: &[&str] = &["telegram", "relay"];
const TELEGRAM_KEYS: &[&str] = &["token", "poll_timeout_secs"];
const RELAY_KEYS: &[&str] = &["sources", "destinations", "grace_period_ms"];

fn check_unknown_fields(value: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = value.as_object() else {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            "config root must be a table",
        ));
        return;
    };

    for (key, child) in root {
        let known: &[&str] = match key.as_str() {
            "telegram" => TELEGRAM_KEYS,
            "relay" => RELAY_KEYS,
            _ => {
                diagnostics.push(unknown_field(key, key, TOP_LEVEL_KEYS, true));
                continue;
            },
        };
        let Some(section) = child.as_object() else {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "type-error",
                key.clone(),
                "expected a table",
            ));
            continue;
        };
        for field in section.keys() {
            if !known.contains(&field.as_str()) {
                diagnostics.push(unknown_field(&format!("{key}.{field}"), field, known, false));
            }
        }
    }
}

fn unknown_field(path: &str, key: &str, known: &[&str], top_level: bool) -> Diagnostic {
    let level = if top_level {
        "at top level "
    } else {
        ""
    };
    let message = match suggest(key, known, 3) {
        Some(s) => format!("unknown field {level}(did you mean \"{s}\"?)"),
        None => format!("unknown field {level}"),
    };
    Diagnostic::new(Severity::Error, "unknown-field", path, message.trim())
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Semantic checks ─────────────────────────────────────────────────────────

/// Check a fully loaded config (after env overrides) for wiring problems.
#[must_use]
pub fn check_config(config: &PostrelayConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if !config.telegram.has_token() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "auth",
            "telegram.token",
            "bot token is required (or set POSTRELAY_TELEGRAM_TOKEN)",
        ));
    }
    if config.telegram.poll_timeout_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "relay",
            "telegram.poll_timeout_secs",
            "0 disables long polling and makes the bot poll in a tight loop",
        ));
    }

    let relay = &config.relay;
    if relay.sources.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "relay",
            "relay.sources",
            "at least one source channel is required",
        ));
    }
    if relay.destinations.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "relay",
            "relay.destinations",
            "at least one destination channel is required",
        ));
    }
    check_duplicates("relay.sources", &relay.sources, &mut diagnostics);
    check_duplicates("relay.destinations", &relay.destinations, &mut diagnostics);

    let sources: HashSet<i64> = relay.sources.iter().copied().collect();
    let mut looped: Vec<i64> = relay
        .destinations
        .iter()
        .copied()
        .filter(|d| sources.contains(d))
        .collect();
    looped.dedup();
    for id in looped {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "relay",
            "relay.destinations",
            format!("channel {id} is both a source and a destination"),
        ));
    }

    if relay.grace_period_ms == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "relay",
            "relay.grace_period_ms",
            "grace period must be greater than zero or media groups will be split",
        ));
    } else if relay.grace_period_ms > MAX_SENSIBLE_GRACE_PERIOD_MS {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "relay",
            "relay.grace_period_ms",
            format!(
                "{} ms delays every media group by over a minute; is this in seconds?",
                relay.grace_period_ms
            ),
        ));
    }

    diagnostics
}

fn check_duplicates(path: &str, ids: &[i64], diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for &id in ids {
        if !seen.insert(id) && reported.insert(id) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "relay",
                path,
                format!("channel {id} is listed more than once; duplicates are ignored"),
            ));
        }
    }
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
///
/// Environment overrides are applied before the semantic checks so a token
/// supplied through the environment satisfies validation.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults",
        )];
        diagnostics.extend(check_config(&loader::apply_env_overrides(
            PostrelayConfig::default(),
        )));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let mut result = match loader::load_config_value(&actual_path) {
        Ok(value) => validate_value(value),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                e.to_string(),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate an already parsed, env-substituted config value.
#[must_use]
pub fn validate_value(value: Value) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_unknown_fields(&value, &mut diagnostics);

    match serde_json::from_value::<PostrelayConfig>(value) {
        Ok(config) => {
            diagnostics.extend(check_config(&loader::apply_env_overrides(config)));
        },
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            e.to_string(),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

//! Configuration loading with project → global fallback.
//!
//! The shareable project config lives at `.claude/chrona.json`; credentials
//! stay local-only in `.claude/chrona.local.json` with a global fallback at
//! `~/.claude/chrona.global.json`. Missing or malformed files degrade to
//! defaults; configuration problems are never fatal.

use std::fs;
use std::path::Path;

use chrona_core::types::Autonomy;
use serde::{Deserialize, Deserializer};

/// Shareable project configuration (`.claude/chrona.json`).
///
/// Field names follow the on-disk camelCase convention of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub project_key: String,
    pub enabled: bool,
    #[serde(deserialize_with = "autonomy_from_value")]
    pub autonomy_level: Autonomy,
    /// 1-10 dial controlling rounding granularity and idle-split sensitivity.
    pub accuracy: u8,
    /// Base idle threshold in minutes.
    pub idle_threshold: i64,
    /// Base rounding granularity in minutes.
    pub time_rounding: i64,
    /// Minutes between periodic worklog flushes.
    pub worklog_interval: i64,
    pub auto_create: bool,
    /// Branch-naming regex with a `{key}` placeholder for the project key;
    /// first capture group is the issue key.
    pub branch_pattern: String,
    pub default_labels: Vec<String>,
    pub log_language: String,
    pub debug_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project_key: String::new(),
            enabled: true,
            autonomy_level: Autonomy::Cautious,
            accuracy: 5,
            idle_threshold: 15,
            time_rounding: 15,
            worklog_interval: 15,
            auto_create: false,
            branch_pattern: String::new(),
            default_labels: Vec::new(),
            log_language: String::new(),
            debug_log: false,
        }
    }
}

impl Config {
    /// Load the project config. `None` when the file is missing or
    /// unparseable; callers treat that as "feature disabled".
    pub fn load(root: &Path) -> Option<Config> {
        let path = crate::config_path(root);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed config, ignoring");
                None
            }
        }
    }

    /// Worklog language: project config → global config → "English".
    pub fn log_language(root: &Path) -> String {
        if let Some(cfg) = Config::load(root) {
            if !cfg.log_language.is_empty() {
                return cfg.log_language;
            }
        }
        let global = load_global();
        if !global.log_language.is_empty() {
            return global.log_language;
        }
        "English".to_string()
    }
}

/// Accept the legacy letter form (`"A"`/`"B"`/`"C"`) or a numeric 1-10 dial.
fn autonomy_from_value<'de, D>(deserializer: D) -> Result<Autonomy, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Autonomy::from_letter(&s)
            .or_else(|| s.trim().parse::<i64>().ok().map(Autonomy::from_level))
            .unwrap_or_default(),
        serde_json::Value::Number(n) => n.as_i64().map(Autonomy::from_level).unwrap_or_default(),
        _ => Autonomy::default(),
    })
}

/// Jira credentials, local-only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub account_id: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.base_url.is_empty() && !self.email.is_empty() && !self.api_token.is_empty()
    }
}

/// Global defaults (`~/.claude/chrona.global.json`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GlobalConfig {
    base_url: String,
    email: String,
    api_token: String,
    account_id: String,
    log_language: String,
}

fn load_global() -> GlobalConfig {
    let path = crate::global_config_path();
    fs::read_to_string(&path)
        .ok()
        .and_then(|c| serde_json::from_str(&c).ok())
        .unwrap_or_default()
}

/// Resolve credentials with per-field fallback: project-local → global.
pub fn load_credentials(root: &Path) -> Credentials {
    let path = crate::local_config_path(root);
    let mut creds: Credentials = fs::read_to_string(&path)
        .ok()
        .and_then(|c| serde_json::from_str(&c).ok())
        .unwrap_or_default();

    let global = load_global();
    if creds.base_url.is_empty() {
        creds.base_url = global.base_url;
    }
    if creds.email.is_empty() {
        creds.email = global.email;
    }
    if creds.api_token.is_empty() {
        creds.api_token = global.api_token;
    }
    if creds.account_id.is_empty() {
        creds.account_id = global.account_id;
    }
    creds
}

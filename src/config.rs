//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Nested Slack configuration for Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Operator channel where visit notifications are posted.
    pub channel_id: String,
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for posting messages (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

fn default_http_port() -> u16 {
    5000
}

fn default_slot_ttl_seconds() -> u64 {
    300
}

fn default_geo_timeout_seconds() -> u64 {
    3
}

fn default_geo_base_url() -> String {
    "http://ip-api.com".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("visit-intercom.db")
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Port for the visitor-facing HTTP surface.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Path of the shared `SQLite` hand-off store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Expiry applied to pending commands and awaiting markers.
    #[serde(default = "default_slot_ttl_seconds")]
    pub slot_ttl_seconds: u64,
    /// Upper bound on a single geolocation lookup.
    #[serde(default = "default_geo_timeout_seconds")]
    pub geo_timeout_seconds: u64,
    /// Base URL of the geolocation service.
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
    /// Slack connectivity settings.
    pub slack: SlackConfig,
    /// Slack user IDs allowed to drive the control listener. Empty
    /// disables the check (single-operator deployments).
    #[serde(default)]
    pub authorized_user_ids: Vec<String>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `visit-intercom` keyring service first, then falls back
    /// to `SLACK_APP_TOKEN` / `SLACK_BOT_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required tokens.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        Ok(())
    }

    /// TTL applied to slot writes and awaiting markers.
    #[must_use]
    pub fn slot_ttl(&self) -> Duration {
        Duration::from_secs(self.slot_ttl_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.slack.channel_id.is_empty() {
            return Err(AppError::Config("slack.channel_id must not be empty".into()));
        }

        if self.slot_ttl_seconds == 0 {
            return Err(AppError::Config(
                "slot_ttl_seconds must be greater than zero".into(),
            ));
        }

        if self.geo_base_url.is_empty() {
            return Err(AppError::Config("geo_base_url must not be empty".into()));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("visit-intercom", &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    // Fallback to environment variable.
    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}

//! Configuration loading and validation.
//!
//! Loads `telehook.toml` (or `$TELEHOOK_CONFIG_PATH`). Environment
//! variables override file values; file values override defaults. A
//! missing file is not an error: function hosts usually configure through
//! the environment alone.
//!
//! The bot token never lives in the file. `telegram.bot_token_env` names
//! the environment variable holding it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bot::http::TELEGRAM_API_BASE;
use crate::webhook::WebhookEndpoint;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "telehook.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot API access.
    pub telegram: TelegramConfig,
    /// Webhook endpoint and host settings.
    pub webhook: WebhookConfig,
}

/// Telegram-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Environment variable name holding the bot token.
    pub bot_token_env: String,

    /// Bot API base URL. Override for a local Bot API server.
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            api_base: TELEGRAM_API_BASE.to_owned(),
        }
    }
}

/// Webhook configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Public HTTPS URL registered with Telegram. Unset means Telegram
    /// uses the address it sees the registration call come from.
    pub public_url: Option<String>,

    /// Socket address for `telehook serve`, e.g. `0.0.0.0:8443`.
    pub listen: Option<String>,

    /// Route path the reusable handler is mounted on.
    pub path: String,

    /// Capacity of the update sink channel.
    pub sink_capacity: usize,

    /// Deadline for one serverless invocation, in seconds.
    pub invoke_timeout_secs: Option<u64>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            public_url: None,
            listen: None,
            path: default_path(),
            sink_capacity: default_sink_capacity(),
            invoke_timeout_secs: None,
        }
    }
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_owned()
}
fn default_path() -> String {
    "/webhook".to_owned()
}
fn default_sink_capacity() -> usize {
    1
}

impl Config {
    /// Load with precedence env vars > TOML file > defaults.
    ///
    /// `path` wins over `$TELEHOOK_CONFIG_PATH`, which wins over
    /// `./telehook.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path_with(|key| std::env::var(key).ok()),
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides. A missing file yields
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Apply environment overrides through `env`.
    ///
    /// Takes a resolver so tests do not have to mutate the process
    /// environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("TELEHOOK_BOT_TOKEN_ENV") {
            self.telegram.bot_token_env = v;
        }
        if let Some(v) = env("TELEHOOK_API_BASE") {
            self.telegram.api_base = v;
        }
        if let Some(v) = env("TELEHOOK_PUBLIC_URL") {
            self.webhook.public_url = Some(v);
        }
        if let Some(v) = env("TELEHOOK_LISTEN") {
            self.webhook.listen = Some(v);
        }
        if let Some(v) = env("TELEHOOK_INVOKE_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.webhook.invoke_timeout_secs = Some(n),
                Err(_) => tracing::warn!(
                    var = "TELEHOOK_INVOKE_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// The configured endpoint, validated.
    ///
    /// # Errors
    ///
    /// Returns an error when `public_url` is not an absolute `https` URL.
    pub fn endpoint(&self) -> Result<Option<WebhookEndpoint>> {
        let Some(raw) = self.webhook.public_url.as_deref() else {
            return Ok(None);
        };
        let parsed = url::Url::parse(raw)
            .with_context(|| format!("invalid webhook.public_url {raw:?}"))?;
        if parsed.scheme() != "https" {
            anyhow::bail!("webhook.public_url must use https, got {raw:?}");
        }
        Ok(Some(WebhookEndpoint::new(raw)))
    }

    /// Read the bot token from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the variable is unset or empty.
    pub fn bot_token(&self) -> Result<String> {
        self.bot_token_with(|key| std::env::var(key).ok())
    }

    /// Read the bot token through a custom resolver.
    ///
    /// # Errors
    ///
    /// Returns an error when the variable is unset or empty.
    pub fn bot_token_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String> {
        let var = &self.telegram.bot_token_env;
        match env(var) {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(anyhow::anyhow!("bot token variable {var} is not set")),
        }
    }
}

/// Resolve the config file path using a custom env resolver.
pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    env("TELEHOOK_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

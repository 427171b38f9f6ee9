//! Bot API credentials and notifier settings.

use std::fmt;
use std::time::Duration;

use super::{DEFAULT_API_URL, DEFAULT_MAX_CALLS, DEFAULT_PERIOD_SECS, DEFAULT_TIMEOUT_SECS};

/// Telegram Bot API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather.
    pub bot_token: String,

    /// Default chat that notifications are delivered to.
    pub chat_id: Option<String>,

    /// Base URL of the Bot API server, without a trailing slash.
    pub api_url: String,

    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl TelegramConfig {
    /// Creates a configuration with default API URL and timeout.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, chat_id: Option<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id,
            api_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TELEGRAM_BOT_TOKEN` to be set. `TELEGRAM_CHAT_ID`,
    /// `TELEGRAM_API_URL` and `TELEGRAM_TIMEOUT_SECS` are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN"))?;

        let chat_id = lookup("TELEGRAM_CHAT_ID").filter(|c| !c.trim().is_empty());

        let api_url = lookup("TELEGRAM_API_URL")
            .map_or_else(|| DEFAULT_API_URL.to_owned(), |u| u.trim_end_matches('/').to_owned());

        let timeout_secs = match lookup("TELEGRAM_TIMEOUT_SECS") {
            Some(raw) => parse_positive(&raw, "TELEGRAM_TIMEOUT_SECS")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            bot_token: bot_token.trim().to_owned(),
            chat_id,
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Returns the notification chat id or an error naming the missing variable.
    pub fn require_chat_id(&self) -> Result<&str, ConfigError> {
        self.chat_id
            .as_deref()
            .ok_or(ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID"))
    }

    /// Returns the token in a form safe for logs.
    #[must_use]
    pub fn masked_token(&self) -> String {
        mask_token(&self.bot_token)
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.masked_token())
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Rate limit settings for outgoing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierSettings {
    /// Maximum notifications within one window.
    pub max_calls: usize,

    /// Length of the sliding window.
    pub period: Duration,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            max_calls: DEFAULT_MAX_CALLS,
            period: Duration::from_secs(DEFAULT_PERIOD_SECS),
        }
    }
}

impl NotifierSettings {
    /// Creates notifier settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup_with_defaults(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env_with_defaults`] over an arbitrary lookup.
    /// Unparseable or zero values fall back to the defaults.
    #[must_use]
    pub fn from_lookup_with_defaults(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_calls = lookup("NOTIFY_MAX_CALLS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_MAX_CALLS);

        let period_secs = lookup("NOTIFY_PERIOD_SECS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(DEFAULT_PERIOD_SECS);

        Self {
            max_calls,
            period: Duration::from_secs(period_secs),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: {value:?} (must be a positive integer)")]
    InvalidNumber { name: &'static str, value: String },
}

fn parse_positive(raw: &str, name: &'static str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: raw.to_owned(),
        })
}

/// Masks a bot token for logging (keeps the bot id prefix only).
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) if !bot_id.is_empty() => format!("{bot_id}:****"),
        _ => "****".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config =
            TelegramConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat_id, None);
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_missing_token() {
        let err = TelegramConfig::from_lookup(lookup_from(&[("TELEGRAM_CHAT_ID", "42")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_config_blank_token_is_missing() {
        let err = TelegramConfig::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_config_overrides() {
        let config = TelegramConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100200300"),
            ("TELEGRAM_API_URL", "http://localhost:8081/"),
            ("TELEGRAM_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.require_chat_id().unwrap(), "-100200300");
        assert_eq!(config.api_url, "http://localhost:8081");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_invalid_timeout() {
        let err = TelegramConfig::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber { name: "TELEGRAM_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn test_require_chat_id_missing() {
        let config = TelegramConfig::new("123:abc", None);
        assert!(matches!(
            config.require_chat_id(),
            Err(ConfigError::MissingEnvVar("TELEGRAM_CHAT_ID"))
        ));
    }

    #[test]
    fn test_debug_masks_token() {
        let config = TelegramConfig::new("123456:SECRET-PART", Some("1".to_owned()));
        let debug = format!("{config:?}");
        assert!(debug.contains("123456:****"));
        assert!(!debug.contains("SECRET-PART"));
        assert_eq!(mask_token("no-colon"), "****");
    }

    #[test]
    fn test_default_notifier_settings() {
        let settings = NotifierSettings::default();
        assert_eq!(settings.max_calls, 30);
        assert_eq!(settings.period, Duration::from_secs(60));
    }

    #[test]
    fn test_notifier_settings_fall_back_on_garbage() {
        let settings = NotifierSettings::from_lookup_with_defaults(lookup_from(&[
            ("NOTIFY_MAX_CALLS", "0"),
            ("NOTIFY_PERIOD_SECS", "ten"),
        ]));
        assert_eq!(settings, NotifierSettings::default());

        let settings = NotifierSettings::from_lookup_with_defaults(lookup_from(&[
            ("NOTIFY_MAX_CALLS", "5"),
            ("NOTIFY_PERIOD_SECS", "1"),
        ]));
        assert_eq!(settings.max_calls, 5);
        assert_eq!(settings.period, Duration::from_secs(1));
    }
}

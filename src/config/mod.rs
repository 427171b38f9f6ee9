//! Configuration module.
//!
//! Loads the Bot API credentials and notifier rate limits from the
//! process environment.

mod settings;

pub use settings::{ConfigError, NotifierSettings, TelegramConfig};

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Per-request HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Notifications allowed per window.
pub const DEFAULT_MAX_CALLS: usize = 30;

/// Length of the notification window in seconds.
pub const DEFAULT_PERIOD_SECS: u64 = 60;

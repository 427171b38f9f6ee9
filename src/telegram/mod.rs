//! Telegram Bot API module.
//!
//! Provides a typed HTTP client for the handful of Bot API methods this
//! crate calls, the update payload types, and rate limiting.

mod client;
mod rate_limiter;
mod types;

pub use client::{BotClient, TelegramError};
pub use rate_limiter::SlidingWindowLimiter;
pub use types::{
    BotIdentity, CallbackQuery, Chat, ChatKind, InlineQuery, Message, Update, UpdateKind, User,
    WebhookInfo,
};

//! Notification module.
//!
//! Delivers best-effort HTML notifications to a Telegram chat under a
//! sliding-window rate limit, and reports failed operations through them.

mod guard;
mod sender;

pub use guard::{MAX_MESSAGE_CHARS, escape_html, format_error_message, with_error_notification};
pub use sender::{Notify, TelegramNotifier};

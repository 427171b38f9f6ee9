//! Rate-limited, fire-and-forget notification sender.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::config::{NotifierSettings, TelegramConfig};
use crate::telegram::{BotClient, SlidingWindowLimiter, TelegramError};

/// Something that can deliver a best-effort text notification.
///
/// Implementations must never fail the caller: delivery problems are
/// absorbed inside `send_message`.
pub trait Notify {
    /// Delivers `text` (Telegram HTML) at most once.
    fn send_message(&self, text: &str) -> impl Future<Output = ()> + Send;
}

/// Sends notifications to one chat through the Bot API.
///
/// Clones share the same rate limiter, so the cap holds for every sender
/// created from one instance.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: BotClient,
    chat_id: Option<String>,
    limiter: Arc<SlidingWindowLimiter>,
}

impl TelegramNotifier {
    /// Creates a notifier for the configured chat.
    ///
    /// A missing chat id is not an error here; sends are then dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig, settings: NotifierSettings) -> Result<Self, TelegramError> {
        let limiter = Arc::new(SlidingWindowLimiter::new(
            settings.max_calls,
            settings.period,
        ));
        Ok(Self::with_limiter(
            BotClient::new(config)?,
            config.chat_id.clone(),
            limiter,
        ))
    }

    /// Creates a notifier that shares an existing limiter.
    #[must_use]
    pub fn with_limiter(
        client: BotClient,
        chat_id: Option<String>,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Self {
        Self {
            client,
            chat_id,
            limiter,
        }
    }

    /// The limiter guarding this notifier.
    #[must_use]
    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }
}

impl Notify for TelegramNotifier {
    async fn send_message(&self, text: &str) {
        let Some(chat_id) = self.chat_id.as_deref() else {
            debug!("Notification dropped: no chat id configured");
            return;
        };

        let waited = self.limiter.wait_and_acquire().await;
        if !waited.is_zero() {
            debug!("Waited {:?} for notification rate limit", waited);
        }

        match self.client.send_message(chat_id, text).await {
            Ok(()) => debug!("Notification delivered to chat {}", chat_id),
            Err(e) => debug!("Notification dropped: {}", e),
        }
    }
}

//! Queries the Bot API for the bot's identity and the chats it has seen.

use tracing::{error, info, warn};

use super::record::{ChatRecord, aggregate_chats};
use crate::telegram::{BotClient, BotIdentity};

/// Updates fetched per `getUpdates` call; the Bot API maximum.
pub const UPDATES_PAGE_SIZE: u8 = 100;

/// Discovers chats through the update feed.
///
/// Every failure is logged and turned into an absent or empty result.
#[derive(Debug, Clone)]
pub struct ChatDiscovery {
    client: BotClient,
}

impl ChatDiscovery {
    /// Creates a discovery session over the given client.
    #[must_use]
    pub const fn new(client: BotClient) -> Self {
        Self { client }
    }

    /// Fetches the bot's own account, or `None` if the call fails.
    pub async fn get_bot_identity(&self) -> Option<BotIdentity> {
        match self.client.get_me().await {
            Ok(me) => {
                info!(
                    "Bot identity: {} (@{}, id {})",
                    me.first_name,
                    me.username.as_deref().unwrap_or("-"),
                    me.id
                );
                Some(me)
            }
            Err(e) => {
                error!("Failed to get bot info: {}", e);
                None
            }
        }
    }

    /// Returns the webhook URL if one is set.
    ///
    /// A failed call is logged and treated as "no webhook".
    pub async fn get_webhook_status(&self) -> Option<String> {
        match self.client.get_webhook_info().await {
            Ok(info) if info.url.is_empty() => None,
            Ok(info) => {
                // getUpdates is refused while a webhook is active.
                warn!(
                    "Webhook is set to {} ({} pending updates)",
                    info.url, info.pending_update_count
                );
                if let Some(last_error) = info.last_error_message {
                    warn!("Last webhook error: {}", last_error);
                }
                Some(info.url)
            }
            Err(e) => {
                warn!("Failed to get webhook info: {}", e);
                None
            }
        }
    }

    /// Fetches pending updates and returns one record per chat.
    ///
    /// Returns an empty list if the feed cannot be fetched.
    pub async fn collect_chats(&self) -> Vec<ChatRecord> {
        let updates = match self.client.get_updates(UPDATES_PAGE_SIZE).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("Failed to get updates: {}", e);
                return Vec::new();
            }
        };

        let chats = aggregate_chats(&updates);
        info!(
            "Found {} distinct chats in {} updates",
            chats.len(),
            updates.len()
        );
        chats
    }
}

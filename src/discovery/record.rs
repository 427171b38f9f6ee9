//! Chat records extracted from updates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::telegram::{CallbackQuery, Chat, ChatKind, InlineQuery, Message, Update, UpdateKind};

/// One chat the bot has seen.
///
/// Name fields hold an empty string when Telegram omitted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    /// Unix time of the update that introduced the chat, 0 if unknown.
    pub last_activity: i64,
}

impl ChatRecord {
    /// Builds a record from a chat object and the time it was seen.
    #[must_use]
    pub fn from_chat(chat: &Chat, last_activity: i64) -> Self {
        Self {
            id: chat.id,
            kind: chat.kind,
            title: chat.title.clone().unwrap_or_default(),
            first_name: chat.first_name.clone().unwrap_or_default(),
            last_name: chat.last_name.clone().unwrap_or_default(),
            username: chat.username.clone().unwrap_or_default(),
            last_activity,
        }
    }

    /// Extracts the chat an update belongs to, if it has one.
    #[must_use]
    pub fn from_update(update: &Update) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(Self::from_message(m)),
            UpdateKind::CallbackQuery(q) => Self::from_callback(q),
            UpdateKind::InlineQuery(q) => Some(Self::from_inline_query(q)),
            UpdateKind::Other => None,
        }
    }

    fn from_message(message: &Message) -> Self {
        Self::from_chat(&message.chat, message.date)
    }

    fn from_callback(query: &CallbackQuery) -> Option<Self> {
        query.message.as_ref().map(Self::from_message)
    }

    /// Inline queries carry no chat, so the querying user stands in for a
    /// private chat.
    fn from_inline_query(query: &InlineQuery) -> Self {
        let user = &query.from;
        Self {
            id: user.id,
            kind: ChatKind::Private,
            title: String::new(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone().unwrap_or_default(),
            username: user.username.clone().unwrap_or_default(),
            last_activity: 0,
        }
    }

    /// First and last name joined, for private chats.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Collapses updates into one record per chat id.
///
/// The first update mentioning a chat wins; later ones never overwrite
/// it. Records keep the order in which chats first appeared.
#[must_use]
pub fn aggregate_chats(updates: &[Update]) -> Vec<ChatRecord> {
    let mut seen = HashSet::new();
    updates
        .iter()
        .filter_map(ChatRecord::from_update)
        .filter(|record| seen.insert(record.id))
        .collect()
}

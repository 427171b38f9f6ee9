//! Grouped listing and JSON export of discovered chats.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::ChatRecord;
use crate::telegram::{BotIdentity, ChatKind};

/// Default file the report is written to.
pub const DEFAULT_REPORT_PATH: &str = "chat_ids.json";

/// Errors that can occur while saving or loading a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to access report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Chats split by kind. The four groups are disjoint and cover every record.
#[derive(Debug, Default)]
pub struct ChatGroups<'a> {
    pub private: Vec<&'a ChatRecord>,
    pub groups: Vec<&'a ChatRecord>,
    pub supergroups: Vec<&'a ChatRecord>,
    pub channels: Vec<&'a ChatRecord>,
}

impl<'a> ChatGroups<'a> {
    /// Partitions chats by their kind, keeping input order inside each group.
    #[must_use]
    pub fn partition(chats: &'a [ChatRecord]) -> Self {
        let mut groups = Self::default();
        for chat in chats {
            match chat.kind {
                ChatKind::Private => groups.private.push(chat),
                ChatKind::Group => groups.groups.push(chat),
                ChatKind::Supergroup => groups.supergroups.push(chat),
                ChatKind::Channel => groups.channels.push(chat),
            }
        }
        groups
    }

    /// Per-kind counts.
    #[must_use]
    pub fn summary(&self) -> ChatSummary {
        let private = self.private.len();
        let groups = self.groups.len();
        let supergroups = self.supergroups.len();
        let channels = self.channels.len();

        ChatSummary {
            total: private + groups + supergroups + channels,
            private,
            groups,
            supergroups,
            channels,
        }
    }
}

/// Chat counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub total: usize,
    pub private: usize,
    pub groups: usize,
    pub supergroups: usize,
    pub channels: usize,
}

/// Everything discovery found, in the shape written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub bot_info: BotIdentity,
    pub chats: Vec<ChatRecord>,
    pub summary: ChatSummary,
}

impl DiscoveryReport {
    /// Builds a report and its summary.
    #[must_use]
    pub fn new(bot_info: BotIdentity, chats: Vec<ChatRecord>) -> Self {
        let summary = ChatGroups::partition(&chats).summary();
        Self {
            bot_info,
            chats,
            summary,
        }
    }

    /// Groups the report's chats by kind.
    #[must_use]
    pub fn groups(&self) -> ChatGroups<'_> {
        ChatGroups::partition(&self.chats)
    }

    /// Writes the report as indented UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reads a report previously written by [`Self::save_to_file`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.groups();

        writeln!(f, "📋 Chats found: {}", self.summary.total)?;

        if !groups.private.is_empty() {
            writeln!(f, "\n👤 Private chats ({}):", groups.private.len())?;
            for chat in &groups.private {
                writeln!(
                    f,
                    "   ID: {} | {} | {}{}",
                    chat.id,
                    chat.display_name(),
                    username_or_none(chat),
                    last_seen(chat)
                )?;
            }
        }

        if !groups.groups.is_empty() {
            writeln!(f, "\n👥 Groups ({}):", groups.groups.len())?;
            for chat in &groups.groups {
                writeln!(f, "   ID: {} | {}{}", chat.id, title_or_untitled(chat), last_seen(chat))?;
            }
        }

        for (label, chats) in [
            ("🚀 Supergroups", &groups.supergroups),
            ("📢 Channels", &groups.channels),
        ] {
            if chats.is_empty() {
                continue;
            }
            writeln!(f, "\n{label} ({}):", chats.len())?;
            for chat in chats {
                writeln!(
                    f,
                    "   ID: {} | {} | {}{}",
                    chat.id,
                    title_or_untitled(chat),
                    username_or_none(chat),
                    last_seen(chat)
                )?;
            }
        }

        Ok(())
    }
}

fn username_or_none(chat: &ChatRecord) -> String {
    if chat.username.is_empty() {
        "no username".to_owned()
    } else {
        format!("@{}", chat.username)
    }
}

fn title_or_untitled(chat: &ChatRecord) -> &str {
    if chat.title.is_empty() {
        "Untitled"
    } else {
        &chat.title
    }
}

fn last_seen(chat: &ChatRecord) -> String {
    if chat.last_activity <= 0 {
        return String::new();
    }
    DateTime::<Utc>::from_timestamp(chat.last_activity, 0)
        .map(|at| format!(" | last seen {}", at.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default()
}

//! Chat discovery module.
//!
//! Polls the bot's update feed, reduces it to one record per chat and
//! renders the result for the operator.

mod collector;
mod record;
mod report;

pub use collector::{ChatDiscovery, UPDATES_PAGE_SIZE};
pub use record::{ChatRecord, aggregate_chats};
pub use report::{ChatGroups, ChatSummary, DEFAULT_REPORT_PATH, DiscoveryReport, ReportError};

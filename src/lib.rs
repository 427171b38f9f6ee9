//! Telegram Notify Library
//!
//! Small utilities around the Telegram Bot HTTP API.
//!
//! This crate provides the core functionality for:
//! - Sending rate-limited, fire-and-forget notifications to a chat
//! - Reporting failed operations through those notifications
//! - Discovering the chat IDs a bot has seen via its update feed

pub mod config;
pub mod discovery;
pub mod notifier;
pub mod telegram;

#[cfg(test)]
mod testing;

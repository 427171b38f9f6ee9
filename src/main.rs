//! Chat ID discovery - Main Entry Point
//!
//! Lists every chat the bot has received updates from, grouped by chat
//! type, and saves the result to a JSON file.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use telegram_notify::config::TelegramConfig;
use telegram_notify::discovery::{ChatDiscovery, DEFAULT_REPORT_PATH, DiscoveryReport};
use telegram_notify::telegram::BotClient;

const RULE: &str = "============================================================";

/// Finds the IDs of all chats your Telegram bot is in.
#[derive(Parser, Debug)]
#[command(name = "get_chat_ids")]
#[command(about = "Discover the chat IDs a Telegram bot has seen")]
#[command(version)]
struct Args {
    /// Where to write the JSON report.
    #[arg(short, long, default_value = DEFAULT_REPORT_PATH)]
    output: String,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;
    info!("Using bot token {}", config.masked_token());

    let client = BotClient::new(&config).context("Failed to create Bot API client")?;
    let discovery = ChatDiscovery::new(client);

    println!("🔍 Looking for every chat the bot is in...");
    println!("{RULE}");

    let Some(bot_info) = discovery.get_bot_identity().await else {
        println!("❌ Could not fetch bot info. Check TELEGRAM_BOT_TOKEN.");
        return Ok(());
    };

    println!("🤖 Bot info:");
    println!("   Name: {}", bot_info.first_name);
    println!(
        "   Username: @{}",
        bot_info.username.as_deref().unwrap_or("-")
    );
    println!("   ID: {}", bot_info.id);
    println!();

    match discovery.get_webhook_status().await {
        Some(url) => println!("🔗 Webhook is set: {url}"),
        None => println!("🔗 Webhook is not set"),
    }
    println!();

    let chats = discovery.collect_chats().await;
    if chats.is_empty() {
        print_no_chats_help();
        return Ok(());
    }

    let report = DiscoveryReport::new(bot_info, chats);
    println!("{RULE}");
    print!("{report}");
    println!("\n{RULE}");
    print_usage_hints();

    match report.save_to_file(&args.output) {
        Ok(()) => println!("\n💾 Results saved to '{}'", args.output),
        Err(e) => println!("\n❌ Could not save results to '{}': {}", args.output, e),
    }

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_no_chats_help() {
    println!("📭 The bot has not been seen in any chat, or there are no pending updates");
    println!("\n💡 Possible reasons:");
    println!("   - The bot has not been added to any chat yet");
    println!("   - The bot has not received any messages or updates");
    println!("   - Pending updates were already consumed or expired");
    println!("   - A webhook is set, so getUpdates returns nothing");
    println!("\n🔧 What to try:");
    println!("   1. Add the bot to a chat and send it a message");
    println!("   2. Send /start to the bot in a private chat");
    println!("   3. Wait a few minutes and run this again");
}

fn print_usage_hints() {
    println!("💡 Using these IDs:");
    println!("   - Private chats: use the numeric ID");
    println!("   - Groups and supergroups: use the numeric ID (negative)");
    println!("   - Channels: use the numeric ID (negative)");
    println!("   - Public chats: @username works too");
}

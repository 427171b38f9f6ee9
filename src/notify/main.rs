//! Command-line notifier.
//!
//! Sends a one-off message to the configured chat, or runs a command and
//! reports its failure to the chat.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::process::Command;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use telegram_notify::config::{NotifierSettings, TelegramConfig};
use telegram_notify::notifier::{Notify, TelegramNotifier, with_error_notification};

/// Rate-limited Telegram notifications.
#[derive(Parser, Debug)]
#[command(name = "notify")]
#[command(about = "Send Telegram notifications through the Bot API")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env", global = true)]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Send a message (Telegram HTML) to the configured chat.
    Send {
        /// Message text.
        text: String,
    },

    /// Run a command and send a notification if it fails.
    Run {
        /// Name used in the notification (defaults to the program name).
        #[arg(long)]
        name: Option<String>,

        /// Program and arguments to run.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(action: Action) -> Result<()> {
    let config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;
    config.require_chat_id()?;

    let notifier = TelegramNotifier::new(&config, NotifierSettings::from_env_with_defaults())
        .context("Failed to create notifier")?;

    match action {
        Action::Send { text } => {
            notifier.send_message(&text).await;
            Ok(())
        }
        Action::Run { name, command } => {
            let name = name
                .or_else(|| command.first().cloned())
                .unwrap_or_else(|| "command".to_owned());
            with_error_notification(&notifier, &name, || run_command(&command)).await
        }
    }
}

/// Runs a child process, failing on spawn errors and non-zero exits.
async fn run_command(command: &[String]) -> Result<()> {
    let Some((program, rest)) = command.split_first() else {
        bail!("No command given");
    };

    let status = Command::new(program)
        .args(rest)
        .status()
        .await
        .with_context(|| format!("Failed to start `{program}`"))?;

    if !status.success() {
        bail!("`{}` exited with {}", command.join(" "), status);
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

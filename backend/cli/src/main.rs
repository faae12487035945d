//! Console host for the imagetrace bot.
//!
//! Stands in for a messaging framework: each stdin line becomes one
//! inbound event (a JSON segment array, or plain text wrapped as a text
//! segment), and replies print to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use imagetrace_commands::ImageTraceBot;
use imagetrace_config::{load_config, ImageTraceConfig};
use imagetrace_core::{
    ContextKey, MessageEvent, MessageLookup, MessageSegment, Platform, ReplySink,
};
use imagetrace_logging::init_logger;

#[derive(Parser)]
#[command(name = "imagetrace")]
#[command(about = "Anime/Gal image recognition bot, console host")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, default_value = "imagetrace.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read message events from stdin and print replies
    Run {
        /// Platform to stamp on events ("onebot" enables quote lookup)
        #[arg(long, default_value = "console")]
        platform: String,
    },
    /// Print the effective configuration
    ShowConfig,
}

struct StdoutSink;

#[async_trait]
impl ReplySink for StdoutSink {
    async fn send(&self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

/// The console host keeps no message history to look quotes up in.
struct NoLookup;

#[async_trait]
impl MessageLookup for NoLookup {
    async fn get_message(&self, _message_id: &str) -> Result<serde_json::Value> {
        bail!("message lookup is not available on the console host")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("logs", "info");

    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run { platform } => run(config, &platform).await,
    }
}

async fn run(config: ImageTraceConfig, platform: &str) -> Result<()> {
    let platform = match platform {
        "onebot" => Platform::OneBot,
        other => Platform::Other(other.to_string()),
    };
    let bot = ImageTraceBot::new(&config, Arc::new(NoLookup));
    let context = ContextKey::new("console", "local");
    let sink: Arc<dyn ReplySink> = Arc::new(StdoutSink);

    info!("[Cli] reading events from stdin (triggers: /detect, /anime, /gal)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let segments = if line.starts_with('[') {
            match serde_json::from_str::<Vec<MessageSegment>>(line) {
                Ok(segments) => segments,
                Err(e) => {
                    warn!("[Cli] ignoring malformed segment JSON: {e}");
                    continue;
                }
            }
        } else {
            vec![MessageSegment::text(line)]
        };

        let event = MessageEvent::new(
            platform.clone(),
            context.clone(),
            segments,
            sink.clone(),
        );
        bot.handle_event(event).await;
    }

    Ok(())
}

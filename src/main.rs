//! Miniapp Notify CLI - operator access to the notification directory and dispatcher.
//!
//! This is the main binary entry point. See the `miniapp_notify` library
//! for the core functionality.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use miniapp_notify::directory::token_preview;
use miniapp_notify::{Config, DirectoryRecord, Dispatcher, Notification, RecipientIdentity};
use std::path::PathBuf;

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "miniapp-notify")]
#[command(about = "Notification directory and push dispatch for the mining mini-app")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Recipient selection shared by every subcommand.
#[derive(Args)]
struct IdentityArgs {
    /// Recipient account id
    #[arg(long)]
    id: Option<u64>,
    /// Delivery token (used with --endpoint when no id is given)
    #[arg(long)]
    token: Option<String>,
    /// Delivery endpoint (used with --token when no id is given)
    #[arg(long)]
    endpoint: Option<String>,
}

impl IdentityArgs {
    fn into_identity(self) -> Result<RecipientIdentity> {
        Ok(RecipientIdentity::from_parts(
            self.id,
            self.token,
            self.endpoint,
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send one notification
    Send {
        #[command(flatten)]
        identity: IdentityArgs,
        /// Notification title
        #[arg(long)]
        title: String,
        /// Notification body
        #[arg(long)]
        body: String,
        /// URL opened when the notification is clicked
        #[arg(long)]
        target_url: String,
        /// Explicit notification id (UUID generated otherwise)
        #[arg(long)]
        notification_id: Option<String>,
    },
    /// Send a batch of notifications read from a JSON file
    Batch {
        /// JSON array of notifications
        file: PathBuf,
    },
    /// Register (or replace) a recipient's delivery endpoint
    Register {
        #[command(flatten)]
        identity: IdentityArgs,
        /// Delivery token to store
        #[arg(long)]
        delivery_token: String,
        /// Delivery endpoint URL to store
        #[arg(long)]
        url: String,
    },
    /// Remove a recipient's delivery endpoint
    Unregister {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Show a recipient's delivery endpoint
    Lookup {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Show the effective configuration
    Config,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    if let Commands::Config = cli.command {
        return print_json(&serde_json::json!({
            "directory_url": config.directory_url,
            "directory_token": (!config.directory_token.is_empty())
                .then(|| token_preview(&config.directory_token)),
            "directory_prefix": config.directory_prefix,
            "http_timeout_secs": config.http_timeout_secs,
            "batch_grouping": config.batch_grouping,
            "config_dir": Config::config_dir()?.display().to_string(),
        }));
    }

    let dispatcher = Dispatcher::from_config(&config)?;

    match cli.command {
        Commands::Send {
            identity,
            title,
            body,
            target_url,
            notification_id,
        } => {
            let outcome = dispatcher
                .send_one(
                    identity.into_identity()?,
                    &title,
                    &body,
                    &target_url,
                    notification_id.as_deref(),
                )
                .await?;
            print_json(&outcome)
        }
        Commands::Batch { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let items: Vec<Notification> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let outcome = dispatcher.send_batch(&items).await?;
            print_json(&outcome)
        }
        Commands::Register {
            identity,
            delivery_token,
            url,
        } => {
            let record = DirectoryRecord::new(delivery_token, url);
            dispatcher
                .directory()
                .set(&identity.into_identity()?, &record)
                .await?;
            Ok(())
        }
        Commands::Unregister { identity } => {
            dispatcher
                .directory()
                .delete(&identity.into_identity()?)
                .await?;
            Ok(())
        }
        Commands::Lookup { identity } => {
            let record = dispatcher
                .directory()
                .get(&identity.into_identity()?)
                .await?;
            print_json(&record)
        }
        Commands::Config => Ok(()),
    }
}

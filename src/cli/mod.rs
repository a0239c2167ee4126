pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::app::Backends;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "docflow - maintenance commands for the document processing backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Add the optional file columns (extracted_text, metadata) if missing")]
    Migrate,

    #[command(about = "Read or rotate the shared n8n bearer token")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "n8n webhook diagnostics")]
    Webhook {
        #[command(subcommand)]
        cmd: commands::webhook::WebhookCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Configuration and Postgres backends shared by every command
pub struct CommandContext {
    pub config: AppConfig,
    pub backends: Backends,
}

impl CommandContext {
    pub async fn connect() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        let backends = Backends::postgres(pool, &config)?;
        Ok(Self { config, backends })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Webhook { cmd } => commands::webhook::handle(cmd, output_format).await,
    }
}

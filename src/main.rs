mod api;
mod commands;
mod config;
mod controller;
mod events;
mod logging;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;

#[derive(Parser)]
#[command(name = "chatdeck")]
#[command(version)]
#[command(about = "Terminal chat client for a remote conversation service", long_about = None)]
struct Cli {
    /// Base URL of the conversation API (overrides config and CHATDECK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// User id to act as (overrides config and CHATDECK_USER_ID)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all conversations
    List,
    /// Print a conversation and its messages
    Show { id: String },
    /// Send a message, starting a new conversation unless one is given
    Send {
        content: String,
        #[arg(long, short)]
        conversation: Option<String>,
    },
    /// Store a message without asking the model
    Note { id: String, content: String },
    /// Delete a conversation
    Delete { id: String },
    /// Check that the server is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(user) = cli.user {
        config.user_id = user;
    }

    match cli.command {
        None => {
            logging::init_file(&config.log_path(), cli.debug)?;
            ui::run(config).await
        }
        Some(command) => {
            logging::init_stderr(cli.debug);
            match command {
                Commands::List => commands::list_conversations(&config).await,
                Commands::Show { id } => commands::show_conversation(&config, &id).await,
                Commands::Send {
                    content,
                    conversation,
                } => commands::send_message(&config, &content, conversation.as_deref()).await,
                Commands::Note { id, content } => commands::add_note(&config, &id, &content).await,
                Commands::Delete { id } => commands::delete_conversation(&config, &id).await,
                Commands::Health => commands::health(&config).await,
            }
        }
    }
}

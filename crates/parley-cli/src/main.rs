use anyhow::Result;
use clap::{Parser, Subcommand};
use parley_core::{AppConfig, BackendKind};
use std::path::PathBuf;

mod app;
mod commands;

use app::App;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley - chat with hosted language models from the terminal")]
#[command(version)]
struct Cli {
    /// Model to use for this run (does not change saved settings)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Call the completion endpoint directly instead of going through a gateway
    #[arg(long, global = true)]
    direct: bool,

    /// Gateway URL (overrides config and PARLEY_GATEWAY_URL)
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Data directory (overrides config and PARLEY_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default)
    Chat {
        /// Conversation to open (ID or unique prefix)
        #[arg(short, long)]
        conversation: Option<String>,

        /// Start a fresh conversation
        #[arg(long, conflicts_with = "conversation")]
        new: bool,
    },
    /// Send one prompt, print the reply, save nothing
    Ask { prompt: Vec<String> },
    /// List conversations
    List {
        /// Only titles containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Print a conversation
    Show { id: String },
    /// Rename a conversation
    Rename { id: String, title: Vec<String> },
    /// Duplicate a conversation
    Duplicate { id: String },
    /// Delete a conversation
    Delete { id: String },
    /// Delete all conversations (settings are kept)
    Clear,
    /// Export conversations and settings as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a JSON export
    Import { file: PathBuf },
    /// Show or change chat settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// List supported models
    Models,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings
    Show,
    /// Set one field: model, system-prompt, temperature or max-tokens
    Set { field: String, value: Vec<String> },
    /// Forget saved settings
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.direct {
        config.session.backend = BackendKind::Direct;
    }
    if let Some(url) = cli.gateway_url {
        config.gateway.url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }

    let model = cli.model.as_deref();

    match cli.command.unwrap_or(Command::Chat {
        conversation: None,
        new: false,
    }) {
        Command::Chat { conversation, new } => {
            app::run_chat(&config, conversation.as_deref(), new, model).await?;
        }
        Command::Ask { prompt } => {
            app::run_single_prompt(&config, &prompt.join(" "), model).await?;
        }
        command => {
            let mut app = App::open(&config);
            if let Some(model) = model {
                app.use_model(model);
            }
            println!("{}", manage(&mut app, command)?);
        }
    }

    Ok(())
}

fn manage(app: &mut App, command: Command) -> Result<String> {
    match command {
        Command::List { search } => Ok(app.list_conversations(search.as_deref())),
        Command::Show { id } => app.show_conversation(&id),
        Command::Rename { id, title } => {
            let id = app.resolve_id(&id)?;
            app.rename_conversation(&id, &title.join(" "))
        }
        Command::Duplicate { id } => {
            let id = app.resolve_id(&id)?;
            app.duplicate_conversation(&id)
        }
        Command::Delete { id } => {
            let id = app.resolve_id(&id)?;
            app.delete_conversation(&id)
        }
        Command::Clear => Ok(app.clear_all()),
        Command::Export { output: Some(path) } => app.export_to(&path),
        Command::Export { output: None } => app.export_string(),
        Command::Import { file } => app.import_from(&file),
        Command::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => Ok(app.render_settings()),
            SettingsAction::Set { field, value } => app.set_setting(&field, &value.join(" ")),
            SettingsAction::Reset => Ok(app.reset_settings()),
        },
        Command::Models => Ok(app::render_models()),
        Command::Chat { .. } | Command::Ask { .. } => {
            anyhow::bail!("chat and ask are not management commands")
        }
    }
}

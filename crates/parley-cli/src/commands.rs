/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Start a fresh, unbound conversation.
    NewConversation,
    /// List saved conversations.
    ListConversations,
    /// Show the messages of the current conversation.
    ShowMessages,
    /// Load conversation by ID (or unique ID prefix).
    LoadConversation(String),
    /// Delete conversation by ID.
    DeleteConversation(String),
    /// Duplicate a conversation; `None` means the current one.
    DuplicateConversation(Option<String>),
    /// Rename the current conversation.
    RenameConversation(String),
    /// Ask for a new version of the last reply.
    Regenerate,
    /// Remove one message, by 1-based position or ID.
    DeleteMessage(String),
    /// Clear the on-screen chat; storage is kept.
    Clear,
    /// Show and dismiss the last error.
    ShowError,
    /// Change the model.
    ModelChanged(String),
    /// List supported models.
    ListModels,
    /// Show effective chat settings.
    ShowSettings,
    /// Export everything to a file.
    Export(String),
    /// Import an export file.
    Import(String),
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/new" => CommandResult::NewConversation,

        // Conversation commands
        "/list" | "/conversations" => CommandResult::ListConversations,
        "/show" => CommandResult::ShowMessages,
        "/load" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /load <conversation-id>".into())
            } else {
                CommandResult::LoadConversation(arg.to_string())
            }
        }
        "/delete" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /delete <conversation-id>".into())
            } else {
                CommandResult::DeleteConversation(arg.to_string())
            }
        }
        "/dup" | "/duplicate" => {
            CommandResult::DuplicateConversation((!arg.is_empty()).then(|| arg.to_string()))
        }
        "/rename" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /rename <new title>".into())
            } else {
                CommandResult::RenameConversation(arg.to_string())
            }
        }

        // Message commands
        "/regen" | "/retry" => CommandResult::Regenerate,
        "/rm" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /rm <message-number|message-id>".into())
            } else {
                CommandResult::DeleteMessage(arg.to_string())
            }
        }
        "/clear" => CommandResult::Clear,
        "/error" => CommandResult::ShowError,

        // Settings
        "/model" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /model <model-id>  (see /models)".into())
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/models" => CommandResult::ListModels,
        "/settings" | "/status" => CommandResult::ShowSettings,

        // Data
        "/export" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /export <file>".into())
            } else {
                CommandResult::Export(arg.to_string())
            }
        }
        "/import" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /import <file>".into())
            } else {
                CommandResult::Import(arg.to_string())
            }
        }
        "/version" => CommandResult::Message(format!("Parley CLI v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

/// Complete a partially typed command when exactly one matches.
pub fn complete_command(input: &str) -> Option<String> {
    let commands = [
        "/help", "/quit", "/new", "/list", "/show", "/load", "/delete", "/dup", "/rename",
        "/regen", "/rm", "/clear", "/error", "/model", "/models", "/settings", "/export",
        "/import", "/version",
    ];

    let matches: Vec<&&str> = commands.iter().filter(|c| c.starts_with(input)).collect();

    if matches.len() == 1 {
        Some(format!("{} ", matches[0]))
    } else {
        None
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ Parley Commands ──────────────────────────────────────────────╮

  CONVERSATIONS
    /new                      Start a fresh conversation
    /list, /conversations     List saved conversations
    /load <id>                Switch to a conversation (ID prefix is fine)
    /delete <id>              Delete a conversation
    /dup [id]                 Duplicate a conversation (default: current)
    /rename <title>           Rename the current conversation

  MESSAGES
    /show                     Show the current conversation
    /regen, /retry            Regenerate the last reply
    /rm <n|id>                Delete a message
    /clear                    Clear the screen (stored messages are kept)
    /error                    Show and dismiss the last error

  SETTINGS
    /model <id>               Change model
    /models                   List supported models
    /settings, /status        Show chat settings

  DATA
    /export <file>            Export conversations and settings
    /import <file>            Import an export file

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}

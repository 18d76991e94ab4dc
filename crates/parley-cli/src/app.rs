use anyhow::{bail, Context, Result};
use parley_core::config::{clamp_max_tokens, clamp_temperature, find_model, SUPPORTED_MODELS};
use parley_core::{
    AppConfig, BackendKind, ChatBackend, ChatSession, Conversation, ConversationManager,
    ConversationRepository, Gateway, HttpGatewayBackend, Message, OpenAiCompatClient,
    PartialSettings, Persistence, Role, SessionEvent,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};

/// What the REPL should do after a line was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Output(String),
    Silent,
    Quit,
}

/// Pick the chat backend named in the config.
pub fn build_backend(config: &AppConfig) -> Arc<dyn ChatBackend> {
    match config.session.backend {
        BackendKind::Gateway => Arc::new(HttpGatewayBackend::new(config.gateway.url.clone())),
        BackendKind::Direct => {
            let client = OpenAiCompatClient::from_config(&config.completion);
            Arc::new(Gateway::new(Arc::new(client)))
        }
    }
}

/// Conversation manager plus the chat session bound to the active conversation.
pub struct App {
    manager: ConversationManager,
    session: ChatSession,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl App {
    /// Open the data directory from `config`. Storage that cannot be opened
    /// degrades to a detached store: the session works, nothing is saved.
    pub fn open(config: &AppConfig) -> Self {
        let data_dir = config.data_dir();
        let persistence = match Persistence::open(&data_dir) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Storage unavailable ({e}); conversations will not be saved");
                Persistence::detached()
            }
        };
        tracing::debug!(dir = %data_dir.display(), "Opened data directory");
        Self::with_parts(persistence, build_backend(config))
    }

    pub fn with_parts(persistence: Persistence, backend: Arc<dyn ChatBackend>) -> Self {
        let repository = ConversationRepository::new(persistence);
        let manager = ConversationManager::new(repository.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        let session = ChatSession::new(backend, repository).with_events(tx);
        Self {
            manager,
            session,
            events: rx,
        }
    }

    pub fn manager(&self) -> &ConversationManager {
        &self.manager
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Override the stored model for this run only.
    pub fn use_model(&mut self, model: &str) {
        let mut settings = self.manager.repository().persistence().settings();
        settings.model = model.to_string();
        self.session.set_settings(Some(settings));
    }

    /// Resolve a full id or a unique prefix of one.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        let conversations = self.manager.conversations();
        if let Some(c) = conversations.iter().find(|c| c.id == id_or_prefix) {
            return Ok(c.id.clone());
        }

        let matches: Vec<&Conversation> = conversations
            .iter()
            .filter(|c| c.id.starts_with(id_or_prefix))
            .collect();

        match matches.as_slice() {
            [one] => Ok(one.id.clone()),
            [] => bail!("No conversation matches '{id_or_prefix}'"),
            _ => bail!("'{id_or_prefix}' matches {} conversations", matches.len()),
        }
    }

    // ── Binding ─────────────────────────────────────────────────────────

    /// Bind the session: a given id, a fresh chat, or the stored active one.
    pub fn open_conversation(&mut self, conversation: Option<&str>, new: bool) -> Result<()> {
        if new {
            self.manager.start_new_chat();
            self.session.bind(None);
            return Ok(());
        }

        let id = match conversation {
            Some(prefix) => Some(self.resolve_id(prefix)?),
            None => self.manager.active().map(|c| c.id),
        };

        if let Some(ref id) = id {
            self.manager.set_active(Some(id));
        }
        self.session.bind(id.as_deref());
        Ok(())
    }

    // ── Chat ────────────────────────────────────────────────────────────

    /// Run one turn. The first successful reply in an unbound session
    /// creates a conversation for it.
    pub async fn send(&mut self, content: &str) -> parley_core::error::Result<Option<Message>> {
        let reply = self.session.send_message(content).await?;

        if reply.is_some() && self.session.conversation_id().is_none() {
            let conversation = self.manager.create_conversation(None);
            self.manager
                .repository()
                .update_messages(&conversation.id, self.session.messages().to_vec());
            self.session.bind(Some(&conversation.id));
        }

        Ok(reply)
    }

    /// Handle one REPL line: a slash command or a chat message.
    pub async fn execute(&mut self, line: &str) -> Result<Reply> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Reply::Silent);
        }

        let mut result = commands::handle_command(line);
        if let CommandResult::Message(ref msg) = result {
            if msg.starts_with("Unknown command") {
                let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
                if let Some(full) = commands::complete_command(cmd) {
                    result = commands::handle_command(&format!("{full}{arg}"));
                }
            }
        }

        self.handle_command_result(result, line).await
    }

    async fn handle_command_result(&mut self, result: CommandResult, line: &str) -> Result<Reply> {
        let output = match result {
            CommandResult::NotACommand => {
                // Turn outcomes are rendered from session events.
                let _ = self.send(line).await;
                return Ok(Reply::Silent);
            }
            CommandResult::Quit => return Ok(Reply::Quit),
            CommandResult::Message(msg) => msg,
            CommandResult::NewConversation => {
                self.open_conversation(None, true)?;
                "Started a new conversation.".to_string()
            }
            CommandResult::ListConversations => self.list_conversations(None),
            CommandResult::ShowMessages => self.render_session(),
            CommandResult::LoadConversation(id) => {
                self.open_conversation(Some(&id), false)?;
                self.render_session()
            }
            CommandResult::DeleteConversation(id) => {
                let id = self.resolve_id(&id)?;
                self.delete_conversation(&id)?
            }
            CommandResult::DuplicateConversation(id) => {
                let id = match id {
                    Some(id) => self.resolve_id(&id)?,
                    None => self
                        .session
                        .conversation_id()
                        .map(str::to_string)
                        .context("No conversation is open")?,
                };
                self.duplicate_conversation(&id)?
            }
            CommandResult::RenameConversation(title) => {
                let id = self
                    .session
                    .conversation_id()
                    .map(str::to_string)
                    .context("No conversation is open")?;
                self.rename_conversation(&id, &title)?
            }
            CommandResult::Regenerate => {
                match self.session.regenerate_last_response().await {
                    Ok(None) => "Nothing to regenerate.".to_string(),
                    _ => return Ok(Reply::Silent),
                }
            }
            CommandResult::DeleteMessage(target) => self.delete_message(&target)?,
            CommandResult::Clear => {
                self.session.clear_messages();
                "Cleared. The stored conversation is unchanged; /load it to bring the messages back."
                    .to_string()
            }
            CommandResult::ShowError => match self.session.error().map(str::to_string) {
                Some(error) => {
                    self.session.clear_error();
                    format!("Last error: {error}")
                }
                None => "No error.".to_string(),
            },
            CommandResult::ModelChanged(model) => self.set_setting("model", &model)?,
            CommandResult::ListModels => render_models(),
            CommandResult::ShowSettings => self.render_settings(),
            CommandResult::Export(path) => self.export_to(Path::new(&path))?,
            CommandResult::Import(path) => {
                let out = self.import_from(Path::new(&path))?;
                let active = self.manager.active_id();
                self.session.bind(active.as_deref());
                out
            }
        };

        Ok(Reply::Output(output))
    }

    /// Render pending session events as printable lines.
    pub fn drain_events(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::MessageAppended(m) if m.role == Role::Assistant => {
                    out.push(format!("\n{}\n", m.content));
                }
                SessionEvent::TurnFailed(error) => {
                    out.push(format!("Error: {error}\n(Send again or /regen to retry.)"));
                }
                SessionEvent::Persisted {
                    conversation_id,
                    messages,
                } => {
                    tracing::debug!(%conversation_id, messages, "Conversation saved");
                }
                SessionEvent::RolledBack { messages } => {
                    tracing::debug!(messages, "Turn rolled back");
                }
                _ => {}
            }
        }
        out
    }

    // ── Management ──────────────────────────────────────────────────────

    pub fn list_conversations(&self, search: Option<&str>) -> String {
        let conversations = match search {
            Some(q) => self.manager.search(q),
            None => self.manager.conversations(),
        };

        if conversations.is_empty() {
            return "No conversations.".to_string();
        }

        let active = self.manager.active_id();
        conversations
            .iter()
            .map(|c| {
                let marker = if active.as_deref() == Some(c.id.as_str()) { "*" } else { " " };
                format!(
                    "{marker} {}  {}  ({} messages, {})",
                    c.id,
                    c.title,
                    c.messages.len(),
                    format_time(c.last_activity())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn show_conversation(&self, id: &str) -> Result<String> {
        let id = self.resolve_id(id)?;
        let conversation = self
            .manager
            .get(&id)
            .with_context(|| format!("Conversation {id} not found"))?;
        Ok(render_conversation(&conversation.title, &conversation.messages))
    }

    pub fn rename_conversation(&self, id: &str, title: &str) -> Result<String> {
        let renamed = self
            .manager
            .rename_conversation(id, title)
            .context("Title must not be empty, and the conversation must exist")?;
        Ok(format!("Renamed to \"{}\".", renamed.title))
    }

    pub fn duplicate_conversation(&self, id: &str) -> Result<String> {
        let copy = self
            .manager
            .duplicate_conversation(id)
            .with_context(|| format!("Conversation {id} not found"))?;
        Ok(format!("Created {}  {}", copy.id, copy.title))
    }

    pub fn delete_conversation(&mut self, id: &str) -> Result<String> {
        let conversation = self
            .manager
            .get(id)
            .with_context(|| format!("Conversation {id} not found"))?;
        self.manager.delete_conversation(id);
        if self.session.conversation_id() == Some(id) {
            self.session.bind(None);
        }
        Ok(format!("Deleted \"{}\".", conversation.title))
    }

    pub fn clear_all(&mut self) -> String {
        let count = self.manager.conversations().len();
        self.manager.clear_all();
        self.session.bind(None);
        format!("Deleted {count} conversations. Settings were kept.")
    }

    fn delete_message(&mut self, target: &str) -> Result<String> {
        let id = match target.parse::<usize>() {
            Ok(n) if n >= 1 => self
                .session
                .messages()
                .get(n - 1)
                .map(|m| m.id.clone())
                .with_context(|| format!("No message #{n}"))?,
            _ => target.to_string(),
        };

        if self.session.delete_message(&id) {
            Ok("Message deleted.".to_string())
        } else {
            bail!("No message with id {id}")
        }
    }

    pub fn export_to(&self, path: &Path) -> Result<String> {
        let json = self.manager.export()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(format!(
            "Exported {} conversations to {}.",
            self.manager.conversations().len(),
            path.display()
        ))
    }

    pub fn export_string(&self) -> Result<String> {
        Ok(self.manager.export()?)
    }

    pub fn import_from(&self, path: &Path) -> Result<String> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = self.manager.import(&json)?;

        let mut parts = Vec::new();
        if let Some(n) = report.conversations {
            parts.push(format!("{n} conversations"));
        }
        if report.settings {
            parts.push("settings".to_string());
        }
        if parts.is_empty() {
            Ok("Nothing to import.".to_string())
        } else {
            Ok(format!("Imported {}.", parts.join(" and ")))
        }
    }

    // ── Settings ────────────────────────────────────────────────────────

    pub fn render_settings(&self) -> String {
        let s = self.session.settings();
        let model = find_model(&s.model)
            .map(|m| format!("{} ({})", m.name, m.id))
            .unwrap_or_else(|| s.model.clone());
        format!(
            "Model:         {model}\nTemperature:   {}\nMax tokens:    {}\nSystem prompt: {}",
            s.temperature, s.max_tokens, s.system_prompt
        )
    }

    pub fn set_setting(&mut self, field: &str, value: &str) -> Result<String> {
        let patch = parse_setting(field, value)?;
        if let Some(ref model) = patch.model {
            if find_model(model).is_none() {
                tracing::warn!("{model} is not in the built-in model list");
            }
        }
        let session_override = self.session_override();
        let updated = self.manager.repository().persistence().save_settings(&patch);
        if let Some(current) = session_override {
            self.session.set_settings(Some(current.merged(&patch)));
        }
        Ok(format!(
            "Saved. Model {}, temperature {}, max tokens {}.",
            updated.model, updated.temperature, updated.max_tokens
        ))
    }

    pub fn reset_settings(&mut self) -> String {
        self.manager.repository().persistence().reset_settings();
        self.session.set_settings(None);
        "Settings reset to defaults.".to_string()
    }

    fn session_override(&self) -> Option<parley_core::ChatSettings> {
        let stored = self.manager.repository().persistence().settings();
        let current = self.session.settings();
        (current != stored).then_some(current)
    }

    fn render_session(&self) -> String {
        let title = self
            .session
            .conversation_id()
            .and_then(|id| self.manager.get(id))
            .map(|c| c.title)
            .unwrap_or_else(|| "New conversation".to_string());
        render_conversation(&title, self.session.messages())
    }
}

/// Parse `settings set <field> <value>`. Numbers are clamped into range.
pub fn parse_setting(field: &str, value: &str) -> Result<PartialSettings> {
    let mut patch = PartialSettings::default();
    match field {
        "model" => {
            if value.trim().is_empty() {
                bail!("Model must not be empty");
            }
            patch.model = Some(value.trim().to_string());
        }
        "system-prompt" | "system_prompt" | "systemPrompt" => {
            patch.system_prompt = Some(value.to_string());
        }
        "temperature" => {
            let t: f64 = value
                .parse()
                .with_context(|| format!("Temperature must be a number, got '{value}'"))?;
            patch.temperature = Some(clamp_temperature(t));
        }
        "max-tokens" | "max_tokens" | "maxTokens" => {
            let n: f64 = value
                .parse()
                .with_context(|| format!("Max tokens must be a number, got '{value}'"))?;
            patch.max_tokens = Some(clamp_max_tokens(n));
        }
        other => bail!(
            "Unknown setting '{other}'. Use model, system-prompt, temperature or max-tokens."
        ),
    }
    Ok(patch)
}

pub fn render_models() -> String {
    SUPPORTED_MODELS
        .iter()
        .map(|m| format!("{:<40} {:<16} {}", m.id, m.name, m.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_conversation(title: &str, messages: &[Message]) -> String {
    let mut out = format!("── {title} ──");
    if messages.is_empty() {
        out.push_str("\n(no messages)");
    }
    for (i, m) in messages.iter().enumerate() {
        let who = match m.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        out.push_str(&format!(
            "\n\n#{} {who} · {}\n{}",
            i + 1,
            format_time(m.timestamp),
            m.content
        ));
    }
    out
}

fn format_time(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(config: &AppConfig, prompt: &str, model: Option<&str>) -> Result<()> {
    let mut app = App::with_parts(Persistence::detached(), build_backend(config));
    if let Some(model) = model {
        app.use_model(model);
    }

    match app.session.send_message(prompt).await? {
        Some(reply) => println!("{}", reply.content),
        None => bail!("Prompt is empty"),
    }
    Ok(())
}

// ── Interactive chat ────────────────────────────────────────────────────

pub async fn run_chat(
    config: &AppConfig,
    conversation: Option<&str>,
    new: bool,
    model: Option<&str>,
) -> Result<()> {
    let mut app = App::open(config);
    if let Some(model) = model {
        app.use_model(model);
    }
    app.open_conversation(conversation, new)?;

    println!("Parley v{}. Type /help for commands.", env!("CARGO_PKG_VERSION"));
    if !app.session.messages().is_empty() {
        println!("{}", app.render_session());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match app.execute(&line).await {
            Ok(Reply::Quit) => break,
            Ok(Reply::Output(text)) => println!("{text}"),
            Ok(Reply::Silent) => {}
            Err(e) => eprintln!("Error: {e:#}"),
        }

        for text in app.drain_events() {
            println!("{text}");
        }
    }

    Ok(())
}

use crate::config::ChatSettings;
use crate::conversation::ConversationRepository;
use crate::error::ParleyError;
use crate::llm::{Message, Role};
use crate::session::backend::ChatBackend;
use crate::session::state::{SessionEvent, SessionState, TurnState};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Owns the message list of the active conversation and runs chat turns.
///
/// A turn appends optimistically, calls the backend, then either commits
/// (append reply, persist the full sequence) or rolls back to exactly the
/// pre-turn message list. Turns take `&mut self`, so one session never has
/// two turns in flight.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    repository: ConversationRepository,
    settings: Option<ChatSettings>,
    state: SessionState,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, repository: ConversationRepository) -> Self {
        Self {
            backend,
            repository,
            settings: None,
            state: SessionState::default(),
            events: None,
        }
    }

    /// Use these settings instead of the stored ones.
    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn set_settings(&mut self, settings: Option<ChatSettings>) {
        self.settings = settings;
    }

    /// Settings for the next turn: explicit ones, else whatever is stored.
    pub fn settings(&self) -> ChatSettings {
        self.settings
            .clone()
            .unwrap_or_else(|| self.repository.persistence().settings())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.state.conversation_id.as_deref()
    }

    pub fn turn_state(&self) -> TurnState {
        self.state.turn_state()
    }

    /// Rebuild the message list from storage for `conversation_id`.
    /// `None` starts an empty, unbound session. An id that is not stored
    /// leaves the session untouched.
    pub fn bind(&mut self, conversation_id: Option<&str>) {
        match conversation_id {
            Some(id) => {
                if let Some(conversation) = self.repository.get(id) {
                    self.state.messages = conversation.messages;
                    self.state.conversation_id = Some(conversation.id);
                    self.state.error = None;
                } else {
                    tracing::debug!(id, "bind to unknown conversation ignored");
                }
            }
            None => {
                self.state.messages.clear();
                self.state.conversation_id = None;
                self.state.error = None;
            }
        }
    }

    /// Send a user message and wait for the reply.
    ///
    /// Returns `Ok(None)` without touching state when `content` is blank.
    /// On failure the user message is removed again, the error is recorded
    /// and also returned.
    pub async fn send_message(&mut self, content: &str) -> Result<Option<Message>, ParleyError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let rollback_len = self.state.messages.len();
        let user_message = Message::user(content);
        self.state.messages.push(user_message.clone());
        self.begin_turn(false);
        self.emit(SessionEvent::MessageAppended(user_message));

        let settings = self.settings();
        match self
            .backend
            .complete_turn(&self.state.messages, &settings)
            .await
        {
            Ok(reply) => Ok(Some(self.commit_reply(reply))),
            Err(e) => {
                self.state.messages.truncate(rollback_len);
                Err(self.fail_turn(e))
            }
        }
    }

    /// Replace the most recent assistant reply with a fresh one.
    ///
    /// No-op (`Ok(None)`) unless there are at least two messages and one of
    /// them is from the assistant. On failure the full original list is
    /// restored.
    pub async fn regenerate_last_response(&mut self) -> Result<Option<Message>, ParleyError> {
        if self.state.messages.len() < 2 {
            return Ok(None);
        }

        let Some(last_assistant) = self
            .state
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        else {
            return Ok(None);
        };

        let original = self.state.messages.clone();
        self.state.messages.truncate(last_assistant);
        self.begin_turn(true);

        let settings = self.settings();
        match self
            .backend
            .complete_turn(&self.state.messages, &settings)
            .await
        {
            Ok(reply) => Ok(Some(self.commit_reply(reply))),
            Err(e) => {
                self.state.messages = original;
                Err(self.fail_turn(e))
            }
        }
    }

    /// Remove a message and persist right away. Returns whether it existed.
    pub fn delete_message(&mut self, message_id: &str) -> bool {
        let before = self.state.messages.len();
        self.state.messages.retain(|m| m.id != message_id);
        let removed = self.state.messages.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Empty the on-screen conversation. Storage is left as it is, so
    /// rebinding brings the messages back.
    pub fn clear_messages(&mut self) {
        self.state.messages.clear();
        self.state.error = None;
    }

    fn begin_turn(&mut self, regenerate: bool) {
        self.state.is_loading = true;
        self.state.error = None;
        self.emit(SessionEvent::TurnStarted { regenerate });
        tracing::debug!(
            regenerate,
            messages = self.state.messages.len(),
            "Chat turn started"
        );
    }

    fn commit_reply(&mut self, reply: String) -> Message {
        let assistant = Message::assistant(reply);
        self.state.messages.push(assistant.clone());
        self.state.is_loading = false;
        self.state.error = None;
        self.emit(SessionEvent::MessageAppended(assistant.clone()));
        self.persist();
        assistant
    }

    fn fail_turn(&mut self, error: ParleyError) -> ParleyError {
        let message = error.display_message();
        tracing::warn!("Chat turn failed: {message}");

        self.state.is_loading = false;
        self.state.error = Some(message.clone());
        self.emit(SessionEvent::TurnFailed(message));
        self.emit(SessionEvent::RolledBack {
            messages: self.state.messages.len(),
        });
        error
    }

    fn persist(&self) {
        if let Some(ref id) = self.state.conversation_id {
            self.repository
                .update_messages(id, self.state.messages.clone());
            self.emit(SessionEvent::Persisted {
                conversation_id: id.clone(),
                messages: self.state.messages.len(),
            });
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event);
        }
    }
}

use crate::llm::Message;

/// Where the session is in the chat-turn lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Error,
}

/// In-memory state of the active chat. Never persisted as such.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub conversation_id: Option<String>,
}

impl SessionState {
    pub fn turn_state(&self) -> TurnState {
        if self.is_loading {
            TurnState::Sending
        } else if self.error.is_some() {
            TurnState::Error
        } else {
            TurnState::Idle
        }
    }
}

/// Events emitted while a session runs - the shared interface for front ends.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    TurnStarted { regenerate: bool },
    MessageAppended(Message),
    Persisted { conversation_id: String, messages: usize },
    TurnFailed(String),
    RolledBack { messages: usize },
}

use crate::config::ChatSettings;
use crate::error::CompletionError;
use crate::ids;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A single chat message. Never edited after creation, only removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: ids::message_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Same role, content and timestamp under a freshly minted id.
    pub fn with_new_id(&self) -> Self {
        Self {
            id: ids::message_id(),
            ..self.clone()
        }
    }
}

/// Character-count usage approximation reported by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// A remote chat-completion endpoint.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the conversation (system prompt is taken from `settings`) and
    /// return the assistant's reply text.
    async fn complete(
        &self,
        messages: &[Message],
        settings: &ChatSettings,
    ) -> Result<String, CompletionError>;

    /// Live round-trip check used by the health endpoint.
    async fn probe(&self) -> bool {
        let settings = ChatSettings::probe();
        let hello = Message::user(crate::constants::defaults::PROBE_MESSAGE);
        match self.complete(std::slice::from_ref(&hello), &settings).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Completion endpoint probe failed: {e}");
                false
            }
        }
    }
}

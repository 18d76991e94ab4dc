use crate::constants::defaults;
use crate::llm::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A titled, ordered sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True while the title is still the placeholder given at creation.
    pub fn has_placeholder_title(&self) -> bool {
        self.title == defaults::NEW_CHAT_TITLE
    }

    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == Role::User)
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

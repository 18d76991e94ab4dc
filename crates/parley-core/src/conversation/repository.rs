use crate::constants::defaults;
use crate::conversation::{derive_title, Conversation};
use crate::ids;
use crate::llm::Message;
use crate::storage::Persistence;
use chrono::Utc;

/// CRUD over the stored conversation list.
///
/// Every operation is a read-modify-write of the whole list. The list keeps
/// creation order (newest first); updates replace entries in place and do
/// not move them to the front.
#[derive(Clone)]
pub struct ConversationRepository {
    persistence: Persistence,
}

impl ConversationRepository {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn list(&self) -> Vec<Conversation> {
        self.persistence.conversations()
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.list().into_iter().find(|c| c.id == id)
    }

    /// Create and store a conversation. Its title comes from `first_message`
    /// when one is given, otherwise it starts as "New Chat".
    pub fn create(&self, first_message: Option<Message>) -> Conversation {
        let title = first_message
            .as_ref()
            .map(|m| derive_title(&m.content))
            .unwrap_or_else(|| defaults::NEW_CHAT_TITLE.to_string());

        let mut conversation = Conversation::new(ids::conversation_id(), title);
        conversation.messages.extend(first_message);

        self.save(&conversation);
        tracing::debug!(id = %conversation.id, "Created conversation");
        conversation
    }

    /// Upsert by id: replace in place, or insert at the head.
    pub fn save(&self, conversation: &Conversation) {
        let mut conversations = self.list();

        match conversations.iter().position(|c| c.id == conversation.id) {
            Some(index) => conversations[index] = conversation.clone(),
            None => conversations.insert(0, conversation.clone()),
        }

        self.persistence.save_conversations(&conversations);
    }

    pub fn delete(&self, id: &str) {
        let mut conversations = self.list();
        let before = conversations.len();
        conversations.retain(|c| c.id != id);

        if conversations.len() != before {
            self.persistence.save_conversations(&conversations);
            tracing::debug!(id, "Deleted conversation");
        }
    }

    /// Replace a conversation's messages and bump `updated_at`. A
    /// conversation still titled "New Chat" takes its title from the first
    /// user message. Unknown ids are ignored.
    pub fn update_messages(&self, id: &str, messages: Vec<Message>) {
        let Some(mut conversation) = self.get(id) else {
            tracing::debug!(id, "update_messages on unknown conversation");
            return;
        };

        conversation.messages = messages;
        conversation.updated_at = Utc::now();

        if conversation.has_placeholder_title() {
            if let Some(first) = conversation.first_user_message() {
                conversation.title = derive_title(&first.content);
            }
        }

        self.save(&conversation);
    }

    /// Copy a conversation under a new id. Messages get fresh ids but keep
    /// their role, content and timestamp.
    pub fn duplicate(&self, id: &str) -> Option<Conversation> {
        let original = self.get(id)?;

        let mut copy = Conversation::new(
            ids::conversation_id(),
            format!("{}{}", original.title, defaults::COPY_SUFFIX),
        );
        copy.messages = original.messages.iter().map(Message::with_new_id).collect();

        self.save(&copy);
        Some(copy)
    }

    /// Give a conversation a user-chosen title.
    pub fn rename(&self, id: &str, title: &str) -> Option<Conversation> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let mut conversation = self.get(id)?;
        conversation.title = title.to_string();
        conversation.updated_at = Utc::now();
        self.save(&conversation);
        Some(conversation)
    }

    /// Case-insensitive title match, in list order.
    pub fn search(&self, query: &str) -> Vec<Conversation> {
        let query_lower = query.to_lowercase();
        self.list()
            .into_iter()
            .filter(|c| c.title.to_lowercase().contains(&query_lower))
            .collect()
    }

    /// Drop every conversation and the active pointer. Settings survive.
    pub fn clear_all(&self) {
        self.persistence.save_conversations(&[]);
        self.persistence.set_active_conversation_id(None);
    }
}

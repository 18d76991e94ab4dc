use crate::conversation::{Conversation, ConversationRepository};
use crate::error::ParleyError;
use crate::llm::Message;
use crate::storage::ImportReport;

/// Conversation list plus the active-conversation pointer.
///
/// This is the layer a sidebar talks to: it creates and activates
/// conversations, keeps the pointer consistent when the active one goes
/// away, and fronts import/export.
#[derive(Clone)]
pub struct ConversationManager {
    repository: ConversationRepository,
}

impl ConversationManager {
    pub fn new(repository: ConversationRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &ConversationRepository {
        &self.repository
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.repository.list()
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.repository.get(id)
    }

    pub fn active_id(&self) -> Option<String> {
        self.repository.persistence().active_conversation_id()
    }

    pub fn active(&self) -> Option<Conversation> {
        self.active_id().and_then(|id| self.repository.get(&id))
    }

    pub fn set_active(&self, id: Option<&str>) {
        self.repository.persistence().set_active_conversation_id(id);
    }

    /// Create a conversation and make it the active one.
    pub fn create_conversation(&self, first_message: Option<Message>) -> Conversation {
        let conversation = self.repository.create(first_message);
        self.set_active(Some(&conversation.id));
        conversation
    }

    /// Leave the current conversation; nothing is deleted.
    pub fn start_new_chat(&self) {
        self.set_active(None);
    }

    /// Delete a conversation. The active pointer is cleared only when it
    /// pointed at the deleted conversation.
    pub fn delete_conversation(&self, id: &str) {
        self.repository.delete(id);
        if self.active_id().as_deref() == Some(id) {
            self.set_active(None);
        }
    }

    pub fn duplicate_conversation(&self, id: &str) -> Option<Conversation> {
        self.repository.duplicate(id)
    }

    pub fn rename_conversation(&self, id: &str, title: &str) -> Option<Conversation> {
        self.repository.rename(id, title)
    }

    pub fn search(&self, query: &str) -> Vec<Conversation> {
        self.repository.search(query)
    }

    pub fn clear_all(&self) {
        self.repository.clear_all();
    }

    pub fn export(&self) -> Result<String, ParleyError> {
        self.repository.persistence().export()
    }

    pub fn import(&self, json: &str) -> Result<ImportReport, ParleyError> {
        self.repository.persistence().import(json)
    }
}

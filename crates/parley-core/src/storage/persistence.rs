use crate::config::{ChatSettings, PartialSettings};
use crate::constants::storage as keys;
use crate::conversation::Conversation;
use crate::error::ParleyError;
use crate::storage::store::{DetachedStore, FileStore, KeyValueStore, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Typed view over a [`KeyValueStore`].
///
/// Reads never fail: a missing, unreadable or malformed value is logged and
/// replaced by its default (empty list, default settings, no active id).
/// Failed writes are logged and dropped.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Open a file-backed store in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ParleyError> {
        Ok(Self::new(Arc::new(FileStore::with_dir(dir)?)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// No backing storage at all.
    pub fn detached() -> Self {
        Self::new(Arc::new(DetachedStore))
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Error loading {key}: {e}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Error saving {key}: {e}");
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!("Error removing {key}: {e}");
        }
    }

    // ── Conversations ───────────────────────────────────────────────────

    pub fn conversations(&self) -> Vec<Conversation> {
        let Some(raw) = self.read(keys::CONVERSATIONS_KEY) else {
            return Vec::new();
        };

        match serde_json::from_str(&raw) {
            Ok(conversations) => conversations,
            Err(e) => {
                tracing::warn!("Error loading conversations: {e}");
                Vec::new()
            }
        }
    }

    pub fn save_conversations(&self, conversations: &[Conversation]) {
        match serde_json::to_string(conversations) {
            Ok(json) => self.write(keys::CONVERSATIONS_KEY, &json),
            Err(e) => tracing::warn!("Error serializing conversations: {e}"),
        }
    }

    // ── Settings ────────────────────────────────────────────────────────

    /// Stored settings overlaid on the defaults, field by field. A field
    /// of the wrong type keeps its default without discarding the others.
    pub fn settings(&self) -> ChatSettings {
        let mut settings = ChatSettings::default();
        let Some(raw) = self.read(keys::SETTINGS_KEY) else {
            return settings;
        };

        let fields = match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&raw)
        {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("Error loading settings: {e}");
                return settings;
            }
        };

        for (key, value) in fields {
            let single = serde_json::Map::from_iter([(key.clone(), value)]);
            match serde_json::from_value::<PartialSettings>(serde_json::Value::Object(single)) {
                Ok(field) => settings.apply(&field),
                Err(e) => tracing::warn!(field = %key, "Ignoring stored setting: {e}"),
            }
        }
        settings
    }

    /// Merge `patch` over the current settings and store the result.
    pub fn save_settings(&self, patch: &PartialSettings) -> ChatSettings {
        let updated = self.settings().merged(patch);
        match serde_json::to_string(&updated) {
            Ok(json) => self.write(keys::SETTINGS_KEY, &json),
            Err(e) => tracing::warn!("Error serializing settings: {e}"),
        }
        updated
    }

    pub fn reset_settings(&self) {
        self.delete(keys::SETTINGS_KEY);
    }

    // ── Active conversation ─────────────────────────────────────────────

    pub fn active_conversation_id(&self) -> Option<String> {
        self.read(keys::ACTIVE_CONVERSATION_KEY)
            .filter(|id| !id.is_empty())
    }

    pub fn set_active_conversation_id(&self, id: Option<&str>) {
        match id {
            Some(id) if !id.is_empty() => self.write(keys::ACTIVE_CONVERSATION_KEY, id),
            _ => self.delete(keys::ACTIVE_CONVERSATION_KEY),
        }
    }

    /// Remove every key this crate stores, settings included.
    pub fn reset(&self) {
        for key in keys::ALL_KEYS {
            self.delete(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn persistence_with(key: &str, raw: &str) -> Persistence {
        let store = Arc::new(MemoryStore::new());
        store.set(key, raw).unwrap();
        Persistence::new(store)
    }

    #[test]
    fn test_corrupt_conversations_read_as_empty() {
        let p = persistence_with(keys::CONVERSATIONS_KEY, "{not json");
        assert!(p.conversations().is_empty());

        let p = persistence_with(keys::CONVERSATIONS_KEY, r#"{"id": "x"}"#);
        assert!(p.conversations().is_empty());
    }

    #[test]
    fn test_bad_timestamp_reads_as_empty() {
        let raw = r#"[{"id":"c","title":"t","messages":[],
            "createdAt":"yesterday","updatedAt":"2024-01-01T00:00:00Z"}]"#;
        let p = persistence_with(keys::CONVERSATIONS_KEY, raw);
        assert!(p.conversations().is_empty());
    }

    #[test]
    fn test_timestamps_reconstructed_on_read() {
        let p = Persistence::in_memory();
        let mut conv = Conversation::new("conv-1", "Hello");
        conv.messages.push(Message::user("Hello"));
        p.save_conversations(std::slice::from_ref(&conv));

        let loaded = p.conversations();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], conv);
        assert_eq!(loaded[0].messages[0].timestamp, conv.messages[0].timestamp);
    }

    #[test]
    fn test_settings_default_when_absent_or_corrupt() {
        assert_eq!(Persistence::in_memory().settings(), ChatSettings::default());

        let p = persistence_with(keys::SETTINGS_KEY, "[1, 2]");
        assert_eq!(p.settings(), ChatSettings::default());
    }

    #[test]
    fn test_partial_stored_settings_overlay_defaults() {
        let p = persistence_with(keys::SETTINGS_KEY, r#"{"model":"openrouter/openai/gpt-4o"}"#);
        let settings = p.settings();
        assert_eq!(settings.model, "openrouter/openai/gpt-4o");
        assert_eq!(settings.max_tokens, ChatSettings::default().max_tokens);
    }

    #[test]
    fn test_save_settings_merges() {
        let p = Persistence::in_memory();
        p.save_settings(&PartialSettings {
            temperature: Some(1.2),
            ..Default::default()
        });
        let updated = p.save_settings(&PartialSettings {
            max_tokens: Some(100),
            ..Default::default()
        });

        assert_eq!(updated.temperature, 1.2);
        assert_eq!(updated.max_tokens, 100);
        assert_eq!(p.settings(), updated);
    }

    #[test]
    fn test_active_id_set_and_clear() {
        let p = Persistence::in_memory();
        assert_eq!(p.active_conversation_id(), None);
        p.set_active_conversation_id(Some("conv-1"));
        assert_eq!(p.active_conversation_id().as_deref(), Some("conv-1"));
        p.set_active_conversation_id(None);
        assert_eq!(p.active_conversation_id(), None);
    }

    #[test]
    fn test_detached_degrades_to_defaults() {
        let p = Persistence::detached();
        p.save_conversations(&[Conversation::new("c", "t")]);
        p.set_active_conversation_id(Some("c"));
        assert!(p.conversations().is_empty());
        assert_eq!(p.active_conversation_id(), None);
        assert_eq!(p.settings(), ChatSettings::default());
    }

    #[test]
    fn test_reset_removes_everything() {
        let p = Persistence::in_memory();
        p.save_conversations(&[Conversation::new("c", "t")]);
        p.save_settings(&PartialSettings {
            model: Some("m".into()),
            ..Default::default()
        });
        p.set_active_conversation_id(Some("c"));

        p.reset();
        assert!(p.conversations().is_empty());
        assert_eq!(p.settings(), ChatSettings::default());
        assert_eq!(p.active_conversation_id(), None);
    }
}

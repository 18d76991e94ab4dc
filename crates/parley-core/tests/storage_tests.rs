use parley_core::storage::{FileStore, KeyValueStore, MemoryStore};
use parley_core::{
    ChatSettings, ConversationManager, ConversationRepository, Message, PartialSettings,
    Persistence,
};
use std::sync::Arc;
use tempfile::TempDir;

fn repository() -> ConversationRepository {
    ConversationRepository::new(Persistence::in_memory())
}

// ========================================================================
// Repository
// ========================================================================

#[test]
fn test_create_lists_newest_first() {
    let repo = repository();
    let a = repo.create(None);
    let b = repo.create(Some(Message::user("Second one")));

    let ids: Vec<_> = repo.list().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);
    assert_eq!(a.title, "New Chat");
    assert_eq!(b.title, "Second one");
    assert_eq!(b.messages.len(), 1);
}

#[test]
fn test_update_does_not_reorder() {
    let repo = repository();
    let older = repo.create(None);
    let newer = repo.create(None);

    repo.update_messages(&older.id, vec![Message::user("late edit")]);

    let ids: Vec<_> = repo.list().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[test]
fn test_lazy_title_truncates_long_first_message() {
    let repo = repository();
    let conv = repo.create(None);
    let content = "Plan my trip to Japan for 10 days, covering Tokyo, Kyoto and Osaka";

    repo.update_messages(&conv.id, vec![Message::user(content)]);

    let title = repo.get(&conv.id).unwrap().title;
    let expected: String = content.chars().take(50).collect();
    assert_eq!(title, format!("{expected}..."));
}

#[test]
fn test_lazy_title_only_replaces_placeholder() {
    let repo = repository();
    let conv = repo.create(None);
    repo.rename(&conv.id, "Travel").unwrap();

    repo.update_messages(&conv.id, vec![Message::user("Something else entirely")]);
    assert_eq!(repo.get(&conv.id).unwrap().title, "Travel");
}

#[test]
fn test_lazy_title_waits_for_user_message() {
    let repo = repository();
    let conv = repo.create(None);

    repo.update_messages(&conv.id, vec![Message::assistant("Welcome")]);
    assert_eq!(repo.get(&conv.id).unwrap().title, "New Chat");
}

#[test]
fn test_update_unknown_id_is_noop() {
    let repo = repository();
    repo.create(None);
    let before = repo.list();

    repo.update_messages("conv-missing", vec![Message::user("hi")]);
    assert_eq!(repo.list(), before);
}

#[test]
fn test_update_bumps_updated_at() {
    let repo = repository();
    let conv = repo.create(None);

    repo.update_messages(&conv.id, vec![Message::user("hi")]);
    let stored = repo.get(&conv.id).unwrap();
    assert!(stored.updated_at >= conv.updated_at);
    assert_eq!(stored.created_at, conv.created_at);
}

#[test]
fn test_duplicate_copies_with_fresh_ids() {
    let repo = repository();
    let conv = repo.create(Some(Message::user("Original question")));
    repo.update_messages(
        &conv.id,
        vec![Message::user("Original question"), Message::assistant("Answer")],
    );
    let original = repo.get(&conv.id).unwrap();

    let copy = repo.duplicate(&conv.id).unwrap();

    assert_ne!(copy.id, original.id);
    assert_eq!(copy.title, "Original question (Copy)");
    assert_eq!(copy.messages.len(), original.messages.len());
    for (a, b) in copy.messages.iter().zip(&original.messages) {
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, b.role);
        assert_eq!(a.content, b.content);
        assert_eq!(a.timestamp, b.timestamp);
    }
    assert_eq!(repo.get(&conv.id).unwrap(), original);
    assert_eq!(repo.list()[0].id, copy.id);
}

#[test]
fn test_duplicate_unknown_is_none() {
    assert!(repository().duplicate("conv-missing").is_none());
}

#[test]
fn test_save_upserts() {
    let repo = repository();
    let mut conv = repo.create(None);
    conv.title = "Edited".into();
    repo.save(&conv);

    assert_eq!(repo.list().len(), 1);
    assert_eq!(repo.get(&conv.id).unwrap().title, "Edited");
}

#[test]
fn test_delete_and_clear_all_keep_settings() {
    let repo = repository();
    let a = repo.create(None);
    repo.create(None);
    repo.persistence().save_settings(&PartialSettings {
        temperature: Some(1.2),
        ..Default::default()
    });

    repo.delete(&a.id);
    repo.delete("conv-missing");
    assert_eq!(repo.list().len(), 1);

    repo.clear_all();
    assert!(repo.list().is_empty());
    assert_eq!(repo.persistence().settings().temperature, 1.2);
}

#[test]
fn test_search_is_case_insensitive() {
    let repo = repository();
    repo.create(Some(Message::user("Rust lifetimes")));
    repo.create(Some(Message::user("Japan trip")));

    let hits = repo.search("RUST");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Rust lifetimes");
}

// ========================================================================
// Manager
// ========================================================================

#[test]
fn test_delete_active_clears_pointer() {
    let manager = ConversationManager::new(repository());
    let conv = manager.create_conversation(None);

    manager.delete_conversation(&conv.id);
    assert!(manager.active_id().is_none());
}

#[test]
fn test_delete_inactive_keeps_pointer() {
    let manager = ConversationManager::new(repository());
    let other = manager.create_conversation(None);
    let active = manager.create_conversation(None);

    manager.delete_conversation(&other.id);
    assert_eq!(manager.active_id(), Some(active.id));
}

// ========================================================================
// Persistence
// ========================================================================

#[test]
fn test_corrupt_values_degrade_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    store.set("conversations", "{not json").unwrap();
    store.set("settings", "[1, 2]").unwrap();

    let persistence = Persistence::new(store);
    assert!(persistence.conversations().is_empty());
    assert_eq!(persistence.settings(), ChatSettings::default());
}

#[test]
fn test_partial_stored_settings_overlay_defaults() {
    let store = Arc::new(MemoryStore::new());
    store.set("settings", r#"{"model":"openrouter/openai/gpt-4o"}"#).unwrap();

    let settings = Persistence::new(store).settings();
    assert_eq!(settings.model, "openrouter/openai/gpt-4o");
    assert_eq!(settings.max_tokens, ChatSettings::default().max_tokens);
}

#[test]
fn test_mistyped_stored_field_keeps_the_others() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            "settings",
            r#"{"model":"openrouter/openai/gpt-4o","maxTokens":1.5,"temperature":"hot","systemPrompt":"Be terse."}"#,
        )
        .unwrap();

    let settings = Persistence::new(store).settings();
    let defaults = ChatSettings::default();
    assert_eq!(settings.model, "openrouter/openai/gpt-4o");
    assert_eq!(settings.system_prompt, "Be terse.");
    assert_eq!(settings.max_tokens, defaults.max_tokens);
    assert_eq!(settings.temperature, defaults.temperature);
}

#[test]
fn test_detached_store_reads_defaults_and_drops_writes() {
    let repo = ConversationRepository::new(Persistence::detached());
    repo.create(None);
    assert!(repo.list().is_empty());
    assert_eq!(repo.persistence().settings(), ChatSettings::default());
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let conv = {
        let repo = ConversationRepository::new(Persistence::open(dir.path()).unwrap());
        let conv = repo.create(Some(Message::user("Persist me")));
        repo.persistence().set_active_conversation_id(Some(&conv.id));
        conv
    };

    let persistence = Persistence::open(dir.path()).unwrap();
    let repo = ConversationRepository::new(persistence.clone());
    assert_eq!(repo.get(&conv.id), Some(conv.clone()));
    assert_eq!(persistence.active_conversation_id(), Some(conv.id));
}

#[test]
fn test_file_store_remove() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::with_dir(dir.path()).unwrap();

    store.set("settings", "{}").unwrap();
    assert_eq!(store.get("settings").unwrap().as_deref(), Some("{}"));

    store.remove("settings").unwrap();
    store.remove("settings").unwrap();
    assert!(store.get("settings").unwrap().is_none());
}

// ========================================================================
// Export / import
// ========================================================================

#[test]
fn test_export_import_round_trip() {
    let source = repository();
    let conv = source.create(Some(Message::user("Hello")));
    source.update_messages(
        &conv.id,
        vec![Message::user("Hello"), Message::assistant("Hi!")],
    );
    source.create(None);
    source.persistence().save_settings(&PartialSettings {
        system_prompt: Some("Be brief.".into()),
        temperature: Some(0.2),
        ..Default::default()
    });

    let json = source.persistence().export().unwrap();

    let target = repository();
    let report = target.persistence().import(&json).unwrap();

    assert_eq!(report.conversations, Some(2));
    assert!(report.settings);
    assert_eq!(target.list(), source.list());
    assert_eq!(
        target.persistence().settings(),
        source.persistence().settings()
    );
}

#[test]
fn test_import_rejects_garbage_without_writing() {
    let repo = repository();
    let conv = repo.create(None);

    assert!(repo.persistence().import("definitely not json").is_err());
    assert!(repo
        .persistence()
        .import(r#"{"conversations": [{"id": 1}]}"#)
        .is_err());

    assert_eq!(repo.list().len(), 1);
    assert_eq!(repo.list()[0].id, conv.id);
}

#[test]
fn test_import_settings_only_keeps_conversations() {
    let repo = repository();
    repo.create(None);

    let report = repo
        .persistence()
        .import(r#"{"settings": {"maxTokens": 512}}"#)
        .unwrap();

    assert_eq!(report.conversations, None);
    assert!(report.settings);
    assert_eq!(repo.list().len(), 1);
    assert_eq!(repo.persistence().settings().max_tokens, 512);
}

use parley_cli::app::App;
use parley_cli::commands::{complete_command, handle_command, CommandResult};
use parley_cli::{parse_setting, Reply};
use parley_core::{ChatBackend, ChatSettings, Message, ParleyError, Persistence};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

#[test]
fn test_help_command() {
    let result = handle_command("/help");
    if let CommandResult::Message(msg) = result {
        assert!(msg.contains("Parley Commands"));
        assert!(msg.contains("/regen"));
    } else {
        panic!("expected help text");
    }
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/quit", "/exit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit);
    }
}

#[test]
fn test_conversation_commands() {
    assert_eq!(handle_command("/new"), CommandResult::NewConversation);
    assert_eq!(handle_command("/list"), CommandResult::ListConversations);
    assert_eq!(
        handle_command("/load conv-123"),
        CommandResult::LoadConversation("conv-123".into())
    );
    assert_eq!(
        handle_command("/delete conv-123"),
        CommandResult::DeleteConversation("conv-123".into())
    );
    assert_eq!(handle_command("/dup"), CommandResult::DuplicateConversation(None));
    assert_eq!(
        handle_command("/dup conv-1"),
        CommandResult::DuplicateConversation(Some("conv-1".into()))
    );
    assert_eq!(
        handle_command("/rename  Trip planning  "),
        CommandResult::RenameConversation("Trip planning".into())
    );
}

#[test]
fn test_message_commands() {
    assert_eq!(handle_command("/regen"), CommandResult::Regenerate);
    assert_eq!(handle_command("/retry"), CommandResult::Regenerate);
    assert_eq!(handle_command("/rm 2"), CommandResult::DeleteMessage("2".into()));
    assert_eq!(handle_command("/clear"), CommandResult::Clear);
    assert_eq!(handle_command("/error"), CommandResult::ShowError);
}

#[test]
fn test_commands_missing_arguments_show_usage() {
    for cmd in ["/load", "/delete", "/rename", "/rm", "/model", "/export", "/import"] {
        match handle_command(cmd) {
            CommandResult::Message(msg) => assert!(msg.starts_with("Usage:"), "{cmd}: {msg}"),
            other => panic!("{cmd} gave {other:?}"),
        }
    }
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(handle_command("hello there"), CommandResult::NotACommand);
}

#[test]
fn test_unknown_command() {
    match handle_command("/frobnicate") {
        CommandResult::Message(msg) => assert!(msg.contains("Unknown command: /frobnicate")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_complete_command_unique_prefix_only() {
    assert_eq!(complete_command("/reg"), Some("/regen ".to_string()));
    assert_eq!(complete_command("/mod"), None);
    assert_eq!(complete_command("/zzz"), None);
}

#[test]
fn test_parse_setting_clamps_and_validates() {
    assert_eq!(parse_setting("temperature", "5").unwrap().temperature, Some(2.0));
    assert_eq!(parse_setting("max-tokens", "-3").unwrap().max_tokens, Some(1));
    assert_eq!(
        parse_setting("model", "openrouter/openai/gpt-4o").unwrap().model.as_deref(),
        Some("openrouter/openai/gpt-4o")
    );
    assert!(parse_setting("temperature", "warm").is_err());
    assert!(parse_setting("colour", "blue").is_err());
}

// ========================================================================
// App Tests (app.rs)
// ========================================================================

struct ScriptedBackend {
    replies: Mutex<Vec<Result<String, ParleyError>>>,
}

#[async_trait::async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete_turn(
        &self,
        _messages: &[Message],
        _settings: &ChatSettings,
    ) -> Result<String, ParleyError> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok("Mock response".to_string())
        } else {
            replies.remove(0)
        }
    }
}

fn app_with(replies: Vec<Result<String, ParleyError>>) -> App {
    App::with_parts(
        Persistence::in_memory(),
        Arc::new(ScriptedBackend {
            replies: Mutex::new(replies),
        }),
    )
}

#[tokio::test]
async fn test_first_reply_creates_and_titles_conversation() {
    let mut app = app_with(vec![Ok("Sure!".into())]);

    assert_eq!(app.execute("Plan a weekend in Lisbon").await.unwrap(), Reply::Silent);

    let events = app.drain_events();
    assert!(events.iter().any(|e| e.contains("Sure!")));

    let conversations = app.manager().conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].title, "Plan a weekend in Lisbon");
    assert_eq!(conversations[0].messages.len(), 2);
    assert_eq!(app.session().conversation_id(), Some(conversations[0].id.as_str()));
}

#[tokio::test]
async fn test_failed_first_turn_creates_nothing() {
    let mut app = app_with(vec![Err(ParleyError::gateway(503, "Network error. Please try again."))]);

    app.execute("hello").await.unwrap();

    let events = app.drain_events();
    assert!(events.iter().any(|e| e.contains("Network error. Please try again.")));
    assert!(app.manager().conversations().is_empty());
    assert!(app.session().messages().is_empty());

    match app.execute("/error").await.unwrap() {
        Reply::Output(text) => assert!(text.contains("Network error")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(app.session().error().is_none());
}

#[tokio::test]
async fn test_new_load_and_prefix_completion() {
    let mut app = app_with(vec![]);
    app.execute("first chat").await.unwrap();
    let first = app.session().conversation_id().unwrap().to_string();

    app.execute("/new").await.unwrap();
    assert!(app.session().conversation_id().is_none());
    assert!(app.manager().active_id().is_none());

    app.execute(&format!("/lo {first}")).await.unwrap();
    assert_eq!(app.session().conversation_id(), Some(first.as_str()));
    assert_eq!(app.manager().active_id(), Some(first));
    assert_eq!(app.session().messages().len(), 2);
}

#[tokio::test]
async fn test_clear_is_soft_and_load_restores() {
    let mut app = app_with(vec![]);
    app.execute("remember this").await.unwrap();
    let id = app.session().conversation_id().unwrap().to_string();

    app.execute("/clear").await.unwrap();
    assert!(app.session().messages().is_empty());

    app.execute(&format!("/load {id}")).await.unwrap();
    assert_eq!(app.session().messages().len(), 2);
}

#[tokio::test]
async fn test_failed_rm_after_clear_keeps_stored_messages() {
    let mut app = app_with(vec![]);
    app.execute("remember this").await.unwrap();
    let id = app.session().conversation_id().unwrap().to_string();

    app.execute("/clear").await.unwrap();
    let err = app.execute("/rm msg-does-not-exist").await.unwrap_err();
    assert!(err.to_string().contains("No message with id msg-does-not-exist"));

    assert_eq!(app.manager().get(&id).unwrap().messages.len(), 2);
    app.execute(&format!("/load {id}")).await.unwrap();
    assert_eq!(app.session().messages().len(), 2);
}

#[tokio::test]
async fn test_rm_by_position() {
    let mut app = app_with(vec![]);
    app.execute("question").await.unwrap();
    let id = app.session().conversation_id().unwrap().to_string();

    app.execute("/rm 2").await.unwrap();
    assert_eq!(app.session().messages().len(), 1);
    assert_eq!(app.manager().get(&id).unwrap().messages.len(), 1);

    assert!(app.execute("/rm 9").await.is_err());
}

#[tokio::test]
async fn test_delete_current_unbinds() {
    let mut app = app_with(vec![]);
    app.execute("to be deleted").await.unwrap();
    let id = app.session().conversation_id().unwrap().to_string();

    app.execute(&format!("/delete {id}")).await.unwrap();
    assert!(app.session().conversation_id().is_none());
    assert!(app.manager().active_id().is_none());
    assert!(app.manager().get(&id).is_none());
}

#[tokio::test]
async fn test_regen_with_nothing_to_regenerate() {
    let mut app = app_with(vec![]);
    assert_eq!(
        app.execute("/regen").await.unwrap(),
        Reply::Output("Nothing to regenerate.".into())
    );
}

#[test]
fn test_settings_set_and_reset() {
    let mut app = app_with(vec![]);

    app.set_setting("temperature", "1.5").unwrap();
    assert_eq!(app.session().settings().temperature, 1.5);

    app.reset_settings();
    assert_eq!(app.session().settings(), ChatSettings::default());
}

#[test]
fn test_model_override_survives_setting_changes() {
    let mut app = app_with(vec![]);
    app.use_model("openrouter/anthropic/claude-3-haiku");

    app.set_setting("max-tokens", "100").unwrap();

    let settings = app.session().settings();
    assert_eq!(settings.model, "openrouter/anthropic/claude-3-haiku");
    assert_eq!(settings.max_tokens, 100);
}

#[tokio::test]
async fn test_export_then_import_into_fresh_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.json");

    let mut source = app_with(vec![]);
    source.execute("hello").await.unwrap();
    source.export_to(&path).unwrap();

    let target = App::with_parts(
        Persistence::open(dir.path().join("data")).unwrap(),
        Arc::new(ScriptedBackend {
            replies: Mutex::new(vec![]),
        }),
    );
    let out = target.import_from(&path).unwrap();
    assert_eq!(out, "Imported 1 conversations and settings.");
    assert_eq!(target.manager().conversations(), source.manager().conversations());
}

#[test]
fn test_resolve_id_prefix_rules() {
    let app = app_with(vec![]);
    let a = app.manager().create_conversation(None);
    let b = app.manager().create_conversation(None);

    assert_eq!(app.resolve_id(&a.id).unwrap(), a.id);
    assert!(app.resolve_id("conv-").is_err());
    assert!(app.resolve_id("nope").is_err());
    assert_ne!(a.id, b.id);
}

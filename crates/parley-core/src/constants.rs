/// Centralized constants.
/// Storage keys, defaults, limits and endpoints live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const CLAUDE_SONNET_4: &str = "openrouter/anthropic/claude-sonnet-4";
    pub const GPT_4O: &str = "openrouter/openai/gpt-4o";
    pub const CLAUDE_3_HAIKU: &str = "openrouter/anthropic/claude-3-haiku";

    /// Model used by the gateway health probe.
    pub const PROBE_MODEL: &str = CLAUDE_SONNET_4;
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const COMPLETION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
    pub const GATEWAY_BIND: &str = "127.0.0.1:3000";
    pub const GATEWAY_URL: &str = "http://127.0.0.1:3000/api/chat";
    pub const CHAT_ROUTE: &str = "/api/chat";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Provide clear, accurate, and helpful responses to user questions. Be conversational but professional.";
    pub const MODEL: &str = super::models::CLAUDE_SONNET_4;
    pub const TEMPERATURE: f32 = 0.7;
    pub const MAX_TOKENS: u32 = 2000;
    pub const API_KEY_ENV: &str = "PARLEY_API_KEY";

    pub const NEW_CHAT_TITLE: &str = "New Chat";
    pub const COPY_SUFFIX: &str = " (Copy)";

    /// Reply text used when the endpoint answers without any content.
    pub const NO_RESPONSE: &str = "No response received";

    pub const PROBE_SYSTEM_PROMPT: &str = "Respond with just \"OK\"";
    pub const PROBE_MESSAGE: &str = "Hello";
    pub const PROBE_MAX_TOKENS: u32 = 10;
}

// ─── Limits ───────────────────────────────────────────────────────────────────

pub mod limits {
    pub const TITLE_MAX_CHARS: usize = 50;
    pub const TITLE_ELLIPSIS: &str = "...";
    pub const MIN_TEMPERATURE: f32 = 0.0;
    pub const MAX_TEMPERATURE: f32 = 2.0;
    pub const MIN_MAX_TOKENS: u32 = 1;
    pub const MAX_MAX_TOKENS: u32 = 4000;
}

// ─── Storage ──────────────────────────────────────────────────────────────────

pub mod storage {
    pub const CONVERSATIONS_KEY: &str = "conversations";
    pub const SETTINGS_KEY: &str = "settings";
    pub const ACTIVE_CONVERSATION_KEY: &str = "active_conversation";
    pub const ALL_KEYS: &[&str] = &[CONVERSATIONS_KEY, SETTINGS_KEY, ACTIVE_CONVERSATION_KEY];
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "parley";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const DATA_DIR: &str = "parley";
    pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";
    pub const GATEWAY_URL_ENV: &str = "PARLEY_GATEWAY_URL";
}

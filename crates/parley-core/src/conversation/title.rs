use crate::constants::limits::{TITLE_ELLIPSIS, TITLE_MAX_CHARS};
use regex::Regex;
use std::sync::OnceLock;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Derive a conversation title from message text: trimmed, whitespace runs
/// collapsed to one space, cut to 50 characters with `...` appended when
/// anything was dropped.
pub fn derive_title(content: &str) -> String {
    let cleaned = whitespace_run().replace_all(content.trim(), " ");

    if cleaned.chars().count() > TITLE_MAX_CHARS {
        let head: String = cleaned.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}{TITLE_ELLIPSIS}")
    } else {
        cleaned.into_owned()
    }
}

use chrono::Utc;
use uuid::Uuid;

/// Generate an id of the form `<prefix>-<unix-millis>-<random>`.
///
/// The random suffix comes from a v4 UUID, so ids minted within the same
/// millisecond still differ.
pub fn generate_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), &random[..12])
}

pub fn conversation_id() -> String {
    generate_id("conv")
}

pub fn message_id() -> String {
    generate_id("msg")
}

// Library interface for parley-cli
// This allows integration tests to access internal modules

// NOTE: Since app.rs and commands.rs are also declared in main.rs,
// we need to use a path attribute to reference the same source file
// to avoid "file loaded multiple times" errors.

#[path = "commands.rs"]
pub mod commands;

#[path = "app.rs"]
pub mod app;

// Re-export commonly used items for easier testing
pub use app::{parse_setting, App, Reply};
pub use commands::{handle_command, CommandResult};

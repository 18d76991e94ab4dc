pub mod error;
pub mod constants;
pub mod ids;
pub mod config;
pub mod llm;
pub mod storage;
pub mod conversation;
pub mod session;
pub mod gateway;

// Re-export key types
pub use error::{CompletionError, ErrorClass, ParleyError};
pub use config::{AppConfig, BackendKind, ChatSettings, PartialSettings};
pub use llm::{CompletionClient, Message, OpenAiCompatClient, Role, Usage};
pub use storage::{KeyValueStore, Persistence};
pub use conversation::{Conversation, ConversationManager, ConversationRepository};
pub use session::{ChatBackend, ChatSession, HttpGatewayBackend, SessionEvent, SessionState, TurnState};
pub use gateway::{Gateway, GatewayError};

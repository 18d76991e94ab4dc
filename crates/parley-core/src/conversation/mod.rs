mod model;
mod title;
pub mod repository;
pub mod manager;

pub use model::Conversation;
pub use title::derive_title;
pub use repository::ConversationRepository;
pub use manager::ConversationManager;

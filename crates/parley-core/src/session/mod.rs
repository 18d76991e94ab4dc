mod state;
mod backend;
mod controller;

pub use state::{SessionEvent, SessionState, TurnState};
pub use backend::{ChatBackend, HttpGatewayBackend};
pub use controller::ChatSession;

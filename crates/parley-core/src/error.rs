use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("{message}")]
    Gateway { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ParleyError {
    pub fn gateway(status: u16, message: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            message: message.into(),
        }
    }

    /// Text shown to the user when a chat turn fails.
    pub fn display_message(&self) -> String {
        match self {
            Self::Gateway { message, .. } => message.clone(),
            Self::Completion(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;

/// Coarse failure class of a completion call. Drives the gateway's status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Upstream,
    Transport,
    Unknown,
}

impl ErrorClass {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Upstream => 502,
            Self::Transport => 503,
            Self::Unknown => 500,
        }
    }
}

/// Typed failure returned by a [`crate::llm::CompletionClient`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Authentication { status: u16, message: String },

    #[error("{message}")]
    RateLimited { message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("{0}")]
    Unknown(String),
}

impl CompletionError {
    /// Classify a non-success HTTP status from the completion endpoint.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Authentication { status, message },
            429 => Self::RateLimited { message },
            500..=599 => Self::Server { status, message },
            _ => Self::Upstream {
                status: Some(status),
                message,
            },
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Authentication { .. }
            | Self::RateLimited { .. }
            | Self::Server { .. }
            | Self::Upstream { .. } => ErrorClass::Upstream,
            Self::Transport(_) => ErrorClass::Transport,
            Self::Unknown(_) => ErrorClass::Unknown,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.class().status_code()
    }

    /// Friendly, retry-oriented wording for end users.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            Self::Authentication { .. } => {
                "Authentication error. Please check your API key and try again.".to_string()
            }
            Self::RateLimited { .. } => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            Self::Server { .. } => {
                "AI service is temporarily unavailable. Please try again in a few moments."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            Self::Transport(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), e.to_string())
        } else if e.is_decode() || e.is_body() {
            Self::Upstream {
                status: None,
                message: format!("Failed to read AI service response: {e}"),
            }
        } else {
            Self::Unknown(e.to_string())
        }
    }
}

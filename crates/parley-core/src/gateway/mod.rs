//! Request gateway: validates a chat turn sent by a client, fills in and
//! clamps settings, runs the completion, and maps failures to HTTP status
//! codes. Framework-agnostic; `parley-gateway` puts it behind axum.

use crate::config::{clamp_max_tokens, clamp_temperature, ChatSettings};
use crate::constants::defaults;
use crate::error::{CompletionError, ErrorClass, ParleyError};
use crate::llm::{CompletionClient, Message, Role, Usage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A rejected or failed chat turn, carrying the status the gateway answers with.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct GatewayError {
    pub status: u16,
    pub message: String,
}

impl GatewayError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

impl From<CompletionError> for GatewayError {
    fn from(e: CompletionError) -> Self {
        let status = e.status_code();
        match e.class() {
            ErrorClass::Transport => Self::new(status, "Network error. Please try again."),
            _ => Self::new(status, e.to_string()),
        }
    }
}

impl From<GatewayError> for ParleyError {
    fn from(e: GatewayError) -> Self {
        ParleyError::Gateway {
            status: e.status,
            message: e.message,
        }
    }
}

/// A turn that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub messages: Vec<Message>,
    pub settings: ChatSettings,
}

/// Successful gateway answer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub model: String,
    pub usage: Usage,
}

/// Check the request body and turn it into messages plus effective settings.
pub fn validate_request(body: &Value) -> Result<ValidatedRequest, GatewayError> {
    let raw_messages = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::bad_request("Messages array is required"))?;

    if raw_messages.is_empty() {
        return Err(GatewayError::bad_request("At least one message is required"));
    }

    let now = Utc::now();
    let messages = raw_messages
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_message(index, raw, now))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidatedRequest {
        messages,
        settings: resolve_settings(body.get("settings")),
    })
}

fn parse_message(index: usize, raw: &Value, now: DateTime<Utc>) -> Result<Message, GatewayError> {
    let content = raw
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            GatewayError::bad_request(format!("Message at index {index} must have content"))
        })?;

    let role = raw
        .get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse)
        .ok_or_else(|| {
            GatewayError::bad_request(format!("Message at index {index} must have a valid role"))
        })?;

    let id = raw
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("msg-{}-{}", now.timestamp_millis(), index));

    let timestamp = raw
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(now);

    Ok(Message {
        id,
        role,
        content: content.to_string(),
        timestamp,
    })
}

/// Effective settings for a turn: non-empty strings win over defaults,
/// numbers are clamped into range, anything else falls back to defaults.
pub fn resolve_settings(raw: Option<&Value>) -> ChatSettings {
    let field = |name: &str| raw.and_then(|s| s.get(name));
    let text = |name: &str, default: &str| {
        field(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    ChatSettings {
        system_prompt: text("systemPrompt", defaults::SYSTEM_PROMPT),
        model: text("model", defaults::MODEL),
        temperature: field("temperature")
            .and_then(Value::as_f64)
            .map(clamp_temperature)
            .unwrap_or(defaults::TEMPERATURE),
        max_tokens: field("maxTokens")
            .and_then(Value::as_f64)
            .map(clamp_max_tokens)
            .unwrap_or(defaults::MAX_TOKENS),
    }
}

/// Health of the gateway and its completion endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_service: Option<ServiceState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Connected,
    Disconnected,
}

impl HealthReport {
    pub fn status_code(&self) -> u16 {
        match self.status {
            HealthStatus::Unhealthy => 503,
            _ => 200,
        }
    }
}

/// Validates turns and forwards them to a [`CompletionClient`].
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn CompletionClient>,
}

impl Gateway {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Run one chat turn from a raw request body.
    pub async fn chat(&self, body: &Value) -> Result<ChatReply, GatewayError> {
        let request = validate_request(body)?;
        self.complete(request).await
    }

    pub async fn complete(&self, request: ValidatedRequest) -> Result<ChatReply, GatewayError> {
        let ValidatedRequest { messages, settings } = request;

        let reply = self
            .client
            .complete(&messages, &settings)
            .await
            .map_err(|e| {
                tracing::error!("Chat completion failed: {e}");
                GatewayError::from(e)
            })?;

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::new(500, "AI service returned empty response"));
        }

        Ok(ChatReply {
            message: trimmed.to_string(),
            model: settings.model,
            usage: Usage {
                prompt_tokens: messages.iter().map(|m| m.content.chars().count()).sum(),
                completion_tokens: reply.chars().count(),
            },
        })
    }

    /// Live probe of the completion endpoint.
    pub async fn health(&self) -> HealthReport {
        let client = self.client.clone();
        let probe = tokio::spawn(async move { client.probe().await }).await;

        match probe {
            Ok(connected) => HealthReport {
                status: if connected {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                ai_service: Some(if connected {
                    ServiceState::Connected
                } else {
                    ServiceState::Disconnected
                }),
                error: None,
                timestamp: Utc::now(),
            },
            Err(e) => HealthReport {
                status: HealthStatus::Unhealthy,
                ai_service: None,
                error: Some(e.to_string()),
                timestamp: Utc::now(),
            },
        }
    }
}

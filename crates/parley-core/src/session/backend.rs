use crate::config::ChatSettings;
use crate::error::ParleyError;
use crate::gateway::Gateway;
use crate::llm::Message;
use serde::{Deserialize, Serialize};

/// Whatever turns a message sequence into the next assistant reply.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete_turn(
        &self,
        messages: &[Message],
        settings: &ChatSettings,
    ) -> Result<String, ParleyError>;
}

#[derive(Debug, Serialize)]
struct TurnRequest<'a> {
    messages: &'a [Message],
    settings: &'a ChatSettings,
}

#[derive(Debug, Deserialize)]
struct TurnResponse {
    message: Option<String>,
    error: Option<String>,
}

/// Sends turns to a running gateway over HTTP.
pub struct HttpGatewayBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpGatewayBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpGatewayBackend {
    async fn complete_turn(
        &self,
        messages: &[Message],
        settings: &ChatSettings,
    ) -> Result<String, ParleyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&TurnRequest { messages, settings })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<TurnResponse>(&text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(ParleyError::gateway(status.as_u16(), message));
        }

        let parsed = parsed.ok_or_else(|| {
            ParleyError::Other(format!("Unexpected response from gateway: {text}"))
        })?;

        if let Some(error) = parsed.error {
            return Err(ParleyError::gateway(status.as_u16(), error));
        }

        parsed
            .message
            .ok_or_else(|| ParleyError::Other("Gateway response had no message".into()))
    }
}

/// Runs the gateway in-process, skipping the HTTP hop. The turn goes through
/// the same validation and clamping a remote gateway would apply.
#[async_trait::async_trait]
impl ChatBackend for Gateway {
    async fn complete_turn(
        &self,
        messages: &[Message],
        settings: &ChatSettings,
    ) -> Result<String, ParleyError> {
        let body = serde_json::to_value(TurnRequest { messages, settings })?;
        let reply = self.chat(&body).await?;
        Ok(reply.message)
    }
}

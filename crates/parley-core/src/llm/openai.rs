use crate::config::{ChatSettings, CompletionConfig};
use crate::constants::defaults;
use crate::error::CompletionError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client for any endpoint speaking the OpenAI chat-completions format.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    headers: BTreeMap<String, String>,
}

impl OpenAiCompatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &CompletionConfig) -> Self {
        let mut client = Self::new(config.endpoint.clone());
        client.api_key = config.api_key();
        client.headers = config.headers.clone();
        client
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn build_request(messages: &[Message], settings: &ChatSettings) -> CompletionRequest {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: settings.system_prompt.clone(),
        });
        wire.extend(messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: m.content.clone(),
        }));

        CompletionRequest {
            model: settings.model.clone(),
            messages: wire,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Some providers report failures inside a 2xx body. Any truthy `error`
/// value counts, whatever its shape.
fn embedded_error(status: u16, error: &serde_json::Value) -> Option<CompletionError> {
    use serde_json::Value;

    let present = match error {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(_) | Value::Object(_) => true,
    };
    if !present {
        return None;
    }

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .unwrap_or("AI service returned an error");

    Some(CompletionError::Upstream {
        status: Some(status),
        message: message.to_string(),
    })
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(
        &self,
        messages: &[Message],
        settings: &ChatSettings,
    ) -> Result<String, CompletionError> {
        let request_body = Self::build_request(messages, settings);

        let mut request = self.client.post(&self.endpoint).json(&request_body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(
            model = %settings.model,
            messages = messages.len(),
            "Sending completion request"
        );

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response_text)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    format!("API request failed with status {}", status.as_u16())
                });
            return Err(CompletionError::from_status(status.as_u16(), message));
        }

        let api_response: CompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| CompletionError::Unknown(format!("Failed to parse response: {e}")))?;

        if let Some(err) = api_response
            .error
            .as_ref()
            .and_then(|e| embedded_error(status.as_u16(), e))
        {
            return Err(err);
        }

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| defaults::NO_RESPONSE.to_string());

        Ok(content)
    }
}

use crate::constants::{defaults, limits, models};
use serde::{Deserialize, Serialize};

/// Per-profile chat preferences sent along with every turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub system_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_prompt: defaults::SYSTEM_PROMPT.to_string(),
            model: defaults::MODEL.to_string(),
            temperature: defaults::TEMPERATURE,
            max_tokens: defaults::MAX_TOKENS,
        }
    }
}

impl ChatSettings {
    /// Settings used for the health-check round trip.
    pub fn probe() -> Self {
        Self {
            system_prompt: defaults::PROBE_SYSTEM_PROMPT.to_string(),
            model: models::PROBE_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: defaults::PROBE_MAX_TOKENS,
        }
    }

    /// Overlay every field present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &PartialSettings) {
        if let Some(ref prompt) = patch.system_prompt {
            self.system_prompt = prompt.clone();
        }
        if let Some(ref model) = patch.model {
            self.model = model.clone();
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
    }

    pub fn merged(mut self, patch: &PartialSettings) -> Self {
        self.apply(patch);
        self
    }
}

/// A settings object where every field is optional, as stored or as sent
/// by a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

pub fn clamp_temperature(value: f64) -> f32 {
    if value.is_nan() {
        return defaults::TEMPERATURE;
    }
    value.clamp(limits::MIN_TEMPERATURE as f64, limits::MAX_TEMPERATURE as f64) as f32
}

pub fn clamp_max_tokens(value: f64) -> u32 {
    if value.is_nan() {
        return defaults::MAX_TOKENS;
    }
    value.clamp(limits::MIN_MAX_TOKENS as f64, limits::MAX_MAX_TOKENS as f64) as u32
}

/// Entry of the built-in model catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const SUPPORTED_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: models::CLAUDE_SONNET_4,
        name: "Claude Sonnet 4",
        description: "Advanced reasoning and coding tasks",
    },
    ModelInfo {
        id: models::GPT_4O,
        name: "GPT-4o",
        description: "OpenAI's latest multimodal model",
    },
    ModelInfo {
        id: models::CLAUDE_3_HAIKU,
        name: "Claude 3 Haiku",
        description: "Fast and efficient responses",
    },
];

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    SUPPORTED_MODELS.iter().find(|m| m.id == id)
}

use serde::{Deserialize, Serialize};

use super::{
    has_key_shape, Completion, ErrorMessages, GenerationParams, HttpRequest, Prompt, Provider,
    ProviderConfig, ProviderDescriptor, ProviderId,
};
use crate::errors::ProviderError;
use crate::language_utils::default_languages;

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::OpenAI,
    name: "OpenAI",
    description: "OpenAI GPT models through the Chat Completions API",
    requires_key: true,
    default_model: "gpt-4o-mini",
};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI capability table
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAI;

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Provider for OpenAI {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    fn storage_key(&self) -> &'static str {
        "openaiApiKey"
    }

    fn default_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: None,
            base_url: DEFAULT_ENDPOINT.to_string(),
            model: DESCRIPTOR.default_model.to_string(),
            generation: GenerationParams {
                temperature: 0.3,
                max_tokens: 2048,
                top_p: Some(1.0),
                top_k: None,
            },
            timeout_secs: 30,
            languages: default_languages(),
            messages: ErrorMessages::for_provider("OpenAI"),
        }
    }

    fn is_key_well_formed(&self, key: &str) -> bool {
        has_key_shape(key, "sk-")
    }

    fn build_request(&self, config: &ProviderConfig, api_key: &str, prompt: &Prompt) -> Result<HttpRequest, ProviderError> {
        let request = OpenAIRequest {
            model: config.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: Some(prompt.system.clone()),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: Some(prompt.user.clone()),
                },
            ],
            temperature: config.generation.temperature,
            max_tokens: prompt.max_tokens.unwrap_or(config.generation.max_tokens),
            top_p: config.generation.top_p,
        };

        let body = serde_json::to_value(&request).map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(HttpRequest::post(format!("{}/chat/completions", config.endpoint()), body)
            .header("Authorization", format!("Bearer {}", api_key))
            .timeout(config.timeout()))
    }

    fn parse_response(&self, body: &str) -> Result<Completion, ProviderError> {
        let response: OpenAIResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::ParseError(format!("OpenAI: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("OpenAI returned no choices".to_string()))?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::ParseError("OpenAI returned an empty message".to_string()));
        }

        Ok(Completion {
            clean_stop: choice.finish_reason.as_deref() == Some("stop"),
            finish_reason: choice.finish_reason,
            text,
        })
    }
}

use serde::{Deserialize, Serialize};

use super::{
    has_key_shape, Completion, ErrorMessages, GenerationParams, HttpRequest, Prompt, Provider,
    ProviderConfig, ProviderDescriptor, ProviderId,
};
use crate::errors::ProviderError;
use crate::language_utils::default_languages;

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Claude,
    name: "Anthropic Claude",
    description: "Anthropic Claude models through the Messages API",
    requires_key: true,
    default_model: "claude-3-haiku-20240307",
};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";

const API_VERSION: &str = "2023-06-01";

/// Claude capability table
#[derive(Debug, Clone, Copy, Default)]
pub struct Claude;

/// Claude message request
#[derive(Debug, Serialize)]
pub struct ClaudeRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ClaudeMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,

    /// Top probability mass to consider (nucleus sampling)
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    /// Top k tokens to consider
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

/// Claude message format
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaudeMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Claude response
#[derive(Debug, Deserialize)]
pub struct ClaudeResponse {
    /// The content of the response
    #[serde(default)]
    pub content: Vec<ClaudeContent>,
    /// Why generation stopped (`end_turn`, `max_tokens`, `stop_sequence`)
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Individual content block in a Claude response
#[derive(Debug, Deserialize)]
pub struct ClaudeContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl ClaudeRequest {
    /// Create a new Claude request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            temperature: None,
            max_tokens,
            top_p: None,
            top_k: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ClaudeMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top_p (nucleus sampling)
    pub fn top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the top_k
    pub fn top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }
}

impl Claude {
    /// Extract text from Claude response
    pub fn extract_text(response: &ClaudeResponse) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

impl Provider for Claude {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    fn storage_key(&self) -> &'static str {
        "claudeApiKey"
    }

    fn default_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: None,
            base_url: DEFAULT_ENDPOINT.to_string(),
            model: DESCRIPTOR.default_model.to_string(),
            generation: GenerationParams {
                temperature: 0.3,
                max_tokens: 2048,
                top_p: None,
                top_k: None,
            },
            timeout_secs: 60,
            languages: default_languages(),
            messages: ErrorMessages::for_provider("Claude"),
        }
    }

    fn is_key_well_formed(&self, key: &str) -> bool {
        has_key_shape(key, "sk-ant-")
    }

    fn build_request(&self, config: &ProviderConfig, api_key: &str, prompt: &Prompt) -> Result<HttpRequest, ProviderError> {
        let request = ClaudeRequest::new(&config.model, prompt.max_tokens.unwrap_or(config.generation.max_tokens))
            .system(&prompt.system)
            .add_message("user", &prompt.user)
            .temperature(config.generation.temperature)
            .top_p(config.generation.top_p)
            .top_k(config.generation.top_k);

        let body = serde_json::to_value(&request).map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(HttpRequest::post(format!("{}/messages", config.endpoint()), body)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(config.timeout()))
    }

    fn parse_response(&self, body: &str) -> Result<Completion, ProviderError> {
        let response: ClaudeResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::ParseError(format!("Claude: {}", e)))?;

        let text = Self::extract_text(&response);
        if text.trim().is_empty() {
            return Err(ProviderError::ParseError("Claude returned no text content".to_string()));
        }

        Ok(Completion {
            clean_stop: response.stop_reason.as_deref() == Some("end_turn"),
            finish_reason: response.stop_reason,
            text,
        })
    }
}

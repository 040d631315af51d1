use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    has_key_shape, Completion, ErrorMessages, GenerationParams, HttpRequest, Prompt, Provider,
    ProviderConfig, ProviderDescriptor, ProviderId,
};
use crate::errors::ProviderError;
use crate::language_utils::default_languages;

pub const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Gemini,
    name: "Google Gemini",
    description: "Google's Gemini models through the Generative Language API",
    requires_key: true,
    default_model: "gemini-1.5-flash",
};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Finish reason Gemini reports for a natural stop
const CLEAN_STOP: &str = "STOP";

/// Gemini capability table
#[derive(Debug, Clone, Copy, Default)]
pub struct Gemini;

/// generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GeminiGenerationConfig,
}

/// A turn in the conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

/// generateContent response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl Provider for Gemini {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    fn storage_key(&self) -> &'static str {
        "geminiApiKey"
    }

    fn default_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: None,
            base_url: DEFAULT_ENDPOINT.to_string(),
            model: DESCRIPTOR.default_model.to_string(),
            generation: GenerationParams {
                temperature: 0.3,
                max_tokens: 2048,
                top_p: Some(0.95),
                top_k: Some(40),
            },
            timeout_secs: 30,
            languages: default_languages(),
            messages: ErrorMessages::for_provider("Gemini"),
        }
    }

    fn is_key_well_formed(&self, key: &str) -> bool {
        has_key_shape(key, "AIza")
    }

    fn build_request(&self, config: &ProviderConfig, api_key: &str, prompt: &Prompt) -> Result<HttpRequest, ProviderError> {
        let mut url = Url::parse(&format!("{}/models/{}:generateContent", config.endpoint(), config.model))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Gemini endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", api_key);

        // The instructions travel in the same user turn as the text
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: format!("{}\n\n{}", prompt.system, prompt.user),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: config.generation.temperature,
                top_k: config.generation.top_k,
                top_p: config.generation.top_p,
                max_output_tokens: prompt.max_tokens.unwrap_or(config.generation.max_tokens),
            },
        };

        let body = serde_json::to_value(&request).map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(HttpRequest::post(url.to_string(), body).timeout(config.timeout()))
    }

    fn parse_response(&self, body: &str) -> Result<Completion, ProviderError> {
        let response: GeminiResponse =
            serde_json::from_str(body).map_err(|e| ProviderError::ParseError(format!("Gemini: {}", e)))?;

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            ProviderError::ParseError(format!("Gemini returned no candidates: {}", reason))
        })?;

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::ParseError("Gemini returned an empty candidate".to_string()));
        }

        Ok(Completion {
            clean_stop: candidate.finish_reason.as_deref() == Some(CLEAN_STOP),
            finish_reason: candidate.finish_reason,
            text,
        })
    }
}

/*!
 * Provider implementations for the supported translation backends.
 *
 * Every backend is described by a `Provider` capability table: how to build
 * its HTTP request, how to parse its response and error bodies, and how its
 * API keys look. The shared adapter in `translation::adapter` drives all
 * three through this one trait:
 * - Gemini: Google Generative Language API
 * - OpenAI: Chat Completions API
 * - Claude: Anthropic Messages API
 */

use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ProviderError, TranslateError};
use crate::language_utils::LanguageDescriptor;

pub mod claude;
pub mod gemini;
pub mod openai;
pub mod transport;

pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Identifier of a supported backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Claude,
}

impl ProviderId {
    /// Stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Claude => "claude",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "claude" => Ok(Self::Claude),
            _ => Err(TranslateError::ProviderNotFound(s.to_string())),
        }
    }
}

/// Immutable identity of a backend, safe to show to users
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    /// Display name
    pub name: &'static str,
    pub description: &'static str,
    pub requires_key: bool,
    pub default_model: &'static str,
}

static REGISTRY: [ProviderDescriptor; 3] = [
    gemini::DESCRIPTOR,
    openai::DESCRIPTOR,
    claude::DESCRIPTOR,
];

/// All supported backends, in display order
pub fn registry() -> &'static [ProviderDescriptor] {
    &REGISTRY
}

/// Capability table for a backend
pub fn provider_for(id: ProviderId) -> Arc<dyn Provider> {
    match id {
        ProviderId::Gemini => Arc::new(gemini::Gemini),
        ProviderId::OpenAI => Arc::new(openai::OpenAI),
        ProviderId::Claude => Arc::new(claude::Claude),
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// User-facing message templates for the error taxonomy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessages {
    pub api_key_missing: String,
    pub api_key_invalid: String,
    pub rate_limit: String,
    pub network: String,
    pub generic: String,
}

impl ErrorMessages {
    /// Templates naming the provider
    pub fn for_provider(name: &str) -> Self {
        Self {
            api_key_missing: format!("{} API key is not set. Add it in the settings.", name),
            api_key_invalid: format!("{} API key is invalid. Check the key in the settings.", name),
            rate_limit: format!("{} rate limit exceeded. Try again later.", name),
            network: format!("Could not reach {}. Check your connection.", name),
            generic: format!("{} translation failed", name),
        }
    }
}

/// Mutable per-adapter configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Credential; serialized masked
    #[serde(serialize_with = "serialize_masked")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub generation: GenerationParams,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Ordered supported-language table
    pub languages: Vec<LanguageDescriptor>,
    pub messages: ErrorMessages,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn serialize_masked<S: Serializer>(key: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.serialize_some(&mask_key(key)),
        None => serializer.serialize_none(),
    }
}

/// Hide all but the edges of a credential
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Instructions sent to a model
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Standing instructions
    pub system: String,
    /// The text-bearing message
    pub user: String,
    /// Overrides the configured output budget when set
    pub max_tokens: Option<u32>,
}

/// Normalized model output
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Raw finish/stop reason reported by the provider
    pub finish_reason: Option<String>,
    /// Whether the provider signalled a clean stop
    pub clean_stop: bool,
}

/// Capability table every backend implements
pub trait Provider: Send + Sync + Debug {
    fn descriptor(&self) -> &'static ProviderDescriptor;

    /// Key under which the credential is persisted
    fn storage_key(&self) -> &'static str;

    /// Built-in configuration, before overrides and the stored credential
    fn default_config(&self) -> ProviderConfig;

    /// Cheap shape check of a credential; never a live verification
    fn is_key_well_formed(&self, key: &str) -> bool;

    /// Build the provider-native request
    fn build_request(&self, config: &ProviderConfig, api_key: &str, prompt: &Prompt) -> Result<HttpRequest, ProviderError>;

    /// Parse a successful response body
    fn parse_response(&self, body: &str) -> Result<Completion, ProviderError>;

    /// Message carried by an error body, if any
    ///
    /// All three APIs nest it under `error.message`.
    fn extract_error_message(&self, body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(|message| message.as_str())
            .map(str::to_string)
    }
}

/// Minimum credential length shared by all providers
pub const MIN_KEY_LENGTH: usize = 20;

/// Shape check used by the providers: prefix plus minimum length
pub(crate) fn has_key_shape(key: &str, prefix: &str) -> bool {
    let key = key.trim();
    key.starts_with(prefix) && key.len() >= MIN_KEY_LENGTH && !key.chars().any(char::is_whitespace)
}

/*!
 * Generic provider adapter.
 *
 * One `ProviderAdapter` drives any backend through its `Provider` capability
 * table. It owns the backend's mutable configuration and translation cache,
 * loads and persists the credential through a `KeyValueStore`, and sends
 * requests through an `HttpTransport` with retry and backoff.
 */

use chrono::Utc;
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app_config::{Config, Limits, ProviderOverrides};
use crate::errors::{ErrorKind, ProviderError, RateLimitWindow, TranslateError};
use crate::language_utils::{
    fallback_detect, parse_detected_language, resolve_language, LanguageDescriptor, AUTO_CODE,
};
use crate::providers::{
    Completion, HttpRequest, HttpTransport, Prompt, Provider, ProviderConfig, ProviderDescriptor,
    ProviderId,
};
use crate::storage::KeyValueStore;
use crate::translation::cache::TranslationCache;
use crate::translation::prompts::{detection_prompt, translation_prompt};
use crate::translation::retry::RetryPolicy;

/// Confidence reported when the provider signals a clean stop
pub const CLEAN_STOP_CONFIDENCE: f32 = 1.0;

/// Confidence reported for truncated or otherwise unclean completions
pub const PARTIAL_CONFIDENCE: f32 = 0.8;

/// Outcome of a translation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: LanguageDescriptor,
    pub target_language: LanguageDescriptor,
    /// 0.0 - 1.0, derived from the provider's finish reason
    pub confidence: f32,
    /// Unix time in milliseconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Error,
}

/// Result of a liveness probe
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    pub status: HealthStatus,
    pub message: String,
    /// Error kind when the probe failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ApiStatus {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: message.into(),
            error_kind: None,
        }
    }

    pub fn error(error: &TranslateError) -> Self {
        Self {
            status: HealthStatus::Error,
            message: error.to_string(),
            error_kind: Some(error.kind()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Collaborators and settings shared by every adapter of a process
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub store: Arc<dyn KeyValueStore>,
    pub transport: Arc<dyn HttpTransport>,
    pub limits: Limits,
    pub retry: RetryPolicy,
    pub overrides: Vec<ProviderOverrides>,
}

impl AdapterContext {
    /// Context with default limits and retry settings
    pub fn new(store: Arc<dyn KeyValueStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            store,
            transport,
            limits: Limits::default(),
            retry: RetryPolicy::default(),
            overrides: Vec::new(),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            store,
            transport,
            limits: config.limits.clone(),
            retry: RetryPolicy::from(&config.retry),
            overrides: config.providers.clone(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_overrides(mut self, overrides: ProviderOverrides) -> Self {
        self.overrides.retain(|o| o.provider != overrides.provider);
        self.overrides.push(overrides);
        self
    }

    fn overrides_for(&self, id: ProviderId) -> Option<&ProviderOverrides> {
        self.overrides.iter().find(|o| o.provider == id)
    }
}

/// Uniform translate/detect contract over one backend
pub struct ProviderAdapter {
    provider: Arc<dyn Provider>,
    config: RwLock<ProviderConfig>,
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn HttpTransport>,
    cache: TranslationCache,
    limits: Limits,
    retry: RetryPolicy,
    initialized: AtomicBool,
    /// Serializes `initialize` so the credential is loaded once
    init_lock: tokio::sync::Mutex<()>,
}

impl ProviderAdapter {
    /// Create an adapter; call `initialize` before use
    pub fn new(provider: Arc<dyn Provider>, context: &AdapterContext) -> Self {
        let mut config = provider.default_config();
        if let Some(overrides) = context.overrides_for(provider.descriptor().id) {
            apply_overrides(&mut config, overrides);
        }

        Self {
            provider,
            config: RwLock::new(config),
            store: Arc::clone(&context.store),
            transport: Arc::clone(&context.transport),
            cache: TranslationCache::new(context.limits.cache_capacity, context.limits.cache_ttl()),
            limits: context.limits.clone(),
            retry: context.retry,
            initialized: AtomicBool::new(false),
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        self.provider.descriptor()
    }

    pub fn id(&self) -> ProviderId {
        self.descriptor().id
    }

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> ProviderConfig {
        self.config.read().clone()
    }

    pub fn supported_languages(&self) -> Vec<LanguageDescriptor> {
        self.config.read().languages.clone()
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Load the persisted credential once; later calls are no-ops
    pub async fn initialize(&self) -> Result<(), TranslateError> {
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        self.load_configuration().await?;
        self.initialized.store(true, Ordering::Release);
        info!("{} adapter initialized", self.name());
        Ok(())
    }

    /// Read the credential from the key/value store into the configuration
    ///
    /// A missing stored key leaves the in-memory key untouched.
    pub async fn load_configuration(&self) -> Result<(), TranslateError> {
        let storage_key = self.provider.storage_key();
        let mut values = self.store.get(&[storage_key]).await.map_err(|e| {
            error!("Failed to load {} configuration: {:#}", self.name(), e);
            TranslateError::Translation {
                status_code: None,
                message: format!("Failed to load {} configuration: {}", self.name(), e),
            }
        })?;

        if let Some(key) = values.remove(storage_key).filter(|key| !key.trim().is_empty()) {
            debug!("Loaded stored {} API key", self.name());
            self.config.write().api_key = Some(key);
        }

        Ok(())
    }

    /// Use `key` from now on and persist it; a blank key clears the credential
    ///
    /// Persistence is best effort: failures are logged and the in-memory key
    /// stays usable.
    pub async fn set_api_key(&self, key: &str) {
        let key = key.trim();
        let storage_key = self.provider.storage_key();

        if key.is_empty() {
            self.config.write().api_key = None;
            if let Err(e) = self.store.remove(&[storage_key]).await {
                error!("Failed to remove {} API key from storage: {:#}", self.name(), e);
            }
            return;
        }

        self.config.write().api_key = Some(key.to_string());

        let items = HashMap::from([(storage_key.to_string(), key.to_string())]);
        if let Err(e) = self.store.set(items).await {
            error!("Failed to persist {} API key: {:#}", self.name(), e);
        }
    }

    /// Shape check of the configured credential; returns the key when usable
    pub fn validate_api_key(&self) -> Result<String, TranslateError> {
        let config = self.config.read();
        let key = match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(TranslateError::ApiKeyMissing {
                    message: config.messages.api_key_missing.clone(),
                })
            }
        };

        if !self.provider.is_key_well_formed(key) {
            return Err(TranslateError::ApiKeyInvalid {
                message: config.messages.api_key_invalid.clone(),
            });
        }

        Ok(key.to_string())
    }

    fn validate_text(&self, text: &str) -> Result<(), TranslateError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.chars().count() < self.limits.min_text_length {
            return Err(TranslateError::TextEmpty);
        }

        let length = text.chars().count();
        if length > self.limits.max_text_length {
            return Err(TranslateError::TextTooLong {
                length,
                max: self.limits.max_text_length,
            });
        }

        Ok(())
    }

    /// Detect the language of `text`; never fails
    ///
    /// Falls back to the script heuristic when the key is unusable or the
    /// remote call fails. The answer is cached either way.
    pub async fn detect_language(&self, text: &str) -> LanguageDescriptor {
        if text.trim().is_empty() {
            return LanguageDescriptor::auto();
        }

        let languages = self.supported_languages();

        let api_key = match self.validate_api_key() {
            Ok(key) => key,
            Err(e) => {
                warn!("{}: {}; using offline language detection", self.name(), e);
                let detected = fallback_detect(text, &languages);
                self.cache.set_detection(text, detected.clone());
                return detected;
            }
        };

        if let Some(cached) = self.cache.get_detection(text) {
            return cached;
        }

        let detected = match self.call_provider_api(&api_key, &detection_prompt(text)).await {
            Ok(completion) => {
                let detected = parse_detected_language(&completion.text, &languages);
                debug!("{} detected '{}' from answer '{}'", self.name(), detected.code, completion.text.trim());
                detected
            }
            Err(e) => {
                warn!("{} language detection failed: {}; using offline detection", self.name(), e);
                fallback_detect(text, &languages)
            }
        };

        self.cache.set_detection(text, detected.clone());
        detected
    }

    /// Translate `text` into `target_language`
    ///
    /// `source_language` may be omitted or `auto`, in which case it is
    /// detected first.
    pub async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<TranslationResult, TranslateError> {
        let api_key = self.validate_api_key()?;
        self.validate_text(text)?;

        let source_code = source_language
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(AUTO_CODE);
        let target_code = target_language.trim();

        if let Some(cached) = self.cache.get_translation(text, source_code, target_code) {
            return Ok(cached);
        }

        let languages = self.supported_languages();
        let source = if source_code.eq_ignore_ascii_case(AUTO_CODE) {
            self.detect_language(text).await
        } else {
            resolve_language(&languages, source_code)
        };
        let target = resolve_language(&languages, target_code);

        let prompt = translation_prompt(text, &source, &target);
        let completion = self
            .call_provider_api(&api_key, &prompt)
            .await
            .map_err(|e| self.handle_api_error(&e))?;

        let result = TranslationResult {
            original_text: text.to_string(),
            translated_text: completion.text.trim().to_string(),
            source_language: source,
            target_language: target,
            confidence: if completion.clean_stop {
                CLEAN_STOP_CONFIDENCE
            } else {
                PARTIAL_CONFIDENCE
            },
            timestamp: Utc::now().timestamp_millis(),
        };

        self.cache.set_translation(text, source_code, target_code, result.clone());
        Ok(result)
    }

    /// Send a prompt to the provider with retry and backoff
    pub async fn call_provider_api(&self, api_key: &str, prompt: &Prompt) -> Result<Completion, ProviderError> {
        let request = {
            let config = self.config.read();
            self.provider.build_request(&config, api_key, prompt)?
        };

        let label = format!("{} API request", self.name());
        self.retry
            .run(&label, |_| self.send_once(request.clone()))
            .await
    }

    async fn send_once(&self, request: HttpRequest) -> Result<Completion, ProviderError> {
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let message = self
                .provider
                .extract_error_message(&response.body)
                .unwrap_or_else(|| fallback_error_message(response.status, &response.body));
            return Err(ProviderError::ApiError {
                status_code: response.status,
                message,
            });
        }

        self.provider.parse_response(&response.body)
    }

    /// Map a remote failure onto the caller-facing taxonomy
    ///
    /// The HTTP status and transport kind decide first; message text is only
    /// consulted when those are inconclusive.
    pub fn handle_api_error(&self, error: &ProviderError) -> TranslateError {
        let messages = self.config.read().messages.clone();
        let raw = error.message();
        let lower = raw.to_lowercase();

        let rate_limited = || TranslateError::RateLimitExceeded {
            window: RateLimitWindow::from_message(raw),
            message: format!("{} ({})", messages.rate_limit, raw),
        };
        let key_missing = || TranslateError::ApiKeyMissing {
            message: messages.api_key_missing.clone(),
        };
        let key_invalid = || TranslateError::ApiKeyInvalid {
            message: format!("{} ({})", messages.api_key_invalid, raw),
        };
        let network = || TranslateError::NetworkError {
            message: format!("{} ({})", messages.network, raw),
        };

        match (error, error.status_code()) {
            (_, Some(429)) => return rate_limited(),
            (_, Some(401)) | (_, Some(403)) => {
                return if mentions_missing_key(&lower) {
                    key_missing()
                } else {
                    key_invalid()
                };
            }
            (ProviderError::ConnectionError(_), _) => return network(),
            _ => {}
        }

        if QUOTA_MARKERS.iter().any(|marker| lower.contains(marker)) {
            rate_limited()
        } else if mentions_missing_key(&lower) {
            key_missing()
        } else if KEY_MARKERS.iter().any(|marker| lower.contains(marker)) {
            key_invalid()
        } else if NETWORK_MARKERS.iter().any(|marker| lower.contains(marker)) {
            network()
        } else {
            TranslateError::Translation {
                status_code: error.status_code(),
                message: format!("{}: {}", messages.generic, raw),
            }
        }
    }

    /// Re-read the stored configuration and report whether the adapter is usable
    pub async fn check_status(&self) -> ApiStatus {
        if let Err(e) = self.load_configuration().await {
            return ApiStatus::error(&e);
        }

        match self.validate_api_key() {
            Ok(_) => ApiStatus::healthy(format!("{} is configured", self.name())),
            Err(e) => ApiStatus::error(&e),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("provider", &self.id())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

const QUOTA_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "rate_limit",
    "too many requests",
    "resource_exhausted",
];

const KEY_MARKERS: &[&str] = &[
    "api key",
    "api_key",
    "x-api-key",
    "unauthorized",
    "authentication",
    "permission denied",
];

const NETWORK_MARKERS: &[&str] = &["network", "connection", "timed out", "timeout", "dns", "fetch"];

fn mentions_missing_key(lower: &str) -> bool {
    ["missing api key", "api key is missing", "no api key", "didn't provide an api key"]
        .iter()
        .any(|marker| lower.contains(marker))
}

fn fallback_error_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.chars().take(200).collect()
    }
}

fn apply_overrides(config: &mut ProviderConfig, overrides: &ProviderOverrides) {
    if let Some(endpoint) = &overrides.endpoint {
        config.base_url = endpoint.clone();
    }
    if let Some(model) = &overrides.model {
        config.model = model.clone();
    }
    if let Some(temperature) = overrides.temperature {
        config.generation.temperature = temperature;
    }
    if let Some(max_tokens) = overrides.max_tokens {
        config.generation.max_tokens = max_tokens;
    }
    if overrides.top_p.is_some() {
        config.generation.top_p = overrides.top_p;
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
}

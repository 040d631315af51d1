/*!
 * Provider manager: registry of adapters and routing to the active one.
 *
 * A manager is built once per process from an `AdapterContext`. Adapters are
 * constructed and initialized on first use, then kept for the manager's
 * lifetime, so switching back to a provider reuses its instance and cache.
 */

use log::info;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::TranslateError;
use crate::language_utils::LanguageDescriptor;
use crate::providers::{provider_for, registry, HttpTransport, ProviderConfig, ProviderDescriptor, ProviderId};
use crate::storage::KeyValueStore;
use crate::translation::adapter::{AdapterContext, ApiStatus, ProviderAdapter, TranslationResult};

/// Identity and configuration of the active provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    pub id: ProviderId,
    pub name: String,
    pub description: String,
    pub config: ProviderConfig,
}

/// Registry of provider adapters with a single active one
#[derive(Debug)]
pub struct ProviderManager {
    context: AdapterContext,
    adapters: RwLock<HashMap<ProviderId, Arc<ProviderAdapter>>>,
    current: RwLock<Option<ProviderId>>,
    /// Serializes adapter construction
    construct_lock: tokio::sync::Mutex<()>,
}

impl ProviderManager {
    pub fn new(context: AdapterContext) -> Self {
        Self {
            context,
            adapters: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            construct_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self::new(AdapterContext::from_config(config, store, transport))
    }

    /// Descriptors of every supported provider; no configuration or secrets
    pub fn available_apis(&self) -> &'static [ProviderDescriptor] {
        registry()
    }

    pub fn current_provider(&self) -> Option<ProviderId> {
        *self.current.read()
    }

    /// Construct (on first use) and activate the adapter for `id`
    pub async fn load_api_handler(&self, id: &str) -> Result<Arc<ProviderAdapter>, TranslateError> {
        let provider_id: ProviderId = id.parse()?;
        let adapter = self.adapter(provider_id).await?;

        let previous = self.current.write().replace(provider_id);
        if previous != Some(provider_id) {
            info!("Active translation provider: {}", adapter.descriptor().name);
        }

        Ok(adapter)
    }

    /// Make `id` the active provider
    pub async fn switch_api(&self, id: &str) -> Result<Arc<ProviderAdapter>, TranslateError> {
        self.load_api_handler(id).await
    }

    /// Adapter for `id`, constructing and initializing it when missing
    async fn adapter(&self, id: ProviderId) -> Result<Arc<ProviderAdapter>, TranslateError> {
        let existing = self.adapters.read().get(&id).cloned();
        if let Some(adapter) = existing {
            return Ok(adapter);
        }

        let _guard = self.construct_lock.lock().await;
        let existing = self.adapters.read().get(&id).cloned();
        if let Some(adapter) = existing {
            return Ok(adapter);
        }

        let adapter = Arc::new(ProviderAdapter::new(provider_for(id), &self.context));
        adapter.initialize().await?;
        self.adapters.write().insert(id, Arc::clone(&adapter));

        Ok(adapter)
    }

    fn current_adapter(&self) -> Option<Arc<ProviderAdapter>> {
        let id = self.current_provider()?;
        self.adapters.read().get(&id).cloned()
    }

    pub async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<TranslationResult, TranslateError> {
        let adapter = self.current_adapter().ok_or(TranslateError::NoProviderSelected)?;
        adapter.translate_text(text, target_language, source_language).await
    }

    pub async fn detect_language(&self, text: &str) -> Result<LanguageDescriptor, TranslateError> {
        let adapter = self.current_adapter().ok_or(TranslateError::NoProviderSelected)?;
        Ok(adapter.detect_language(text).await)
    }

    /// Set the key of any provider without changing the active one
    pub async fn set_api_key(&self, id: &str, key: &str) -> Result<(), TranslateError> {
        let provider_id: ProviderId = id.parse()?;
        self.adapter(provider_id).await?.set_api_key(key).await;
        Ok(())
    }

    /// Probe `id`, or the active provider; never fails
    pub async fn check_api_status(&self, id: Option<&str>) -> ApiStatus {
        let provider_id = match id {
            Some(id) => match id.parse::<ProviderId>() {
                Ok(provider_id) => provider_id,
                Err(e) => return ApiStatus::error(&e),
            },
            None => match self.current_provider() {
                Some(provider_id) => provider_id,
                None => return ApiStatus::error(&TranslateError::NoProviderSelected),
            },
        };

        match self.adapter(provider_id).await {
            Ok(adapter) => adapter.check_status().await,
            Err(e) => ApiStatus::error(&e),
        }
    }

    /// Languages of `id` when it resolves, else of the active provider, else none
    pub async fn supported_languages(&self, id: Option<&str>) -> Vec<LanguageDescriptor> {
        if let Some(provider_id) = id.and_then(|id| id.parse::<ProviderId>().ok()) {
            if let Ok(adapter) = self.adapter(provider_id).await {
                return adapter.supported_languages();
            }
        }

        self.current_adapter()
            .map(|adapter| adapter.supported_languages())
            .unwrap_or_default()
    }

    pub fn current_api_info(&self) -> Option<ApiInfo> {
        let adapter = self.current_adapter()?;
        let descriptor = adapter.descriptor();

        Some(ApiInfo {
            id: descriptor.id,
            name: descriptor.name.to_string(),
            description: descriptor.description.to_string(),
            config: adapter.config(),
        })
    }

    /// Clear the active adapter's cache; no-op without one
    pub fn clear_cache(&self) {
        if let Some(adapter) = self.current_adapter() {
            adapter.clear_cache();
        }
    }
}

/*!
 * Tests for app configuration functionality
 */

use std::sync::Arc;
use std::time::Duration;

use lingobridge::app_config::{Config, LogLevel, ProviderOverrides};
use lingobridge::providers::ProviderId;
use lingobridge::translation::{AdapterContext, RetryPolicy};
use tempfile::TempDir;

use crate::common::{CountingStore, ScriptedTransport};

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.limits.max_text_length, 5000);

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.limits, config.limits);
    assert_eq!(reloaded.retry, config.retry);
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "default_provider": "claude",
            "log_level": "debug",
            "limits": { "cache_capacity": 10 },
            "providers": [ { "provider": "openai", "model": "gpt-4o" } ]
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();
    assert_eq!(config.default_provider, Some(ProviderId::Claude));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.limits.cache_capacity, 10);
    assert_eq!(config.limits.cache_ttl_secs, 86_400);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(
        config.overrides_for(ProviderId::OpenAI).and_then(|o| o.model.as_deref()),
        Some("gpt-4o")
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_validate_withBadOverrides_shouldFail() {
    let mut config = Config::default();
    let mut overrides = ProviderOverrides::new(ProviderId::Gemini);
    overrides.endpoint = Some("not a url".to_string());
    config.providers.push(overrides);
    assert!(config.validate().is_err());

    let mut config = Config::default();
    let mut overrides = ProviderOverrides::new(ProviderId::Claude);
    overrides.top_p = Some(1.5);
    config.providers.push(overrides);
    assert!(config.validate().is_err());
}

#[test]
fn test_adapterContext_fromConfig_shouldCarryLimitsAndRetry() {
    let mut config = Config::default();
    config.limits.max_text_length = 200;
    config.retry.max_attempts = 5;
    config.retry.backoff_base_ms = 250;

    let context = AdapterContext::from_config(
        &config,
        Arc::new(CountingStore::new()),
        Arc::new(ScriptedTransport::new()),
    );

    assert_eq!(context.limits.max_text_length, 200);
    assert_eq!(context.retry, RetryPolicy::new(5, Duration::from_millis(250)));
}

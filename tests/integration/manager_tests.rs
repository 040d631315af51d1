/*!
 * Integration tests for the provider manager
 */

use std::sync::Arc;
use std::time::Duration;

use lingobridge::errors::{ErrorKind, RateLimitWindow, TranslateError};
use lingobridge::providers::ProviderId;
use lingobridge::translation::{AdapterContext, HealthStatus, ProviderManager, RetryPolicy};

use crate::common::{
    error_body, init_logging, success_body, test_context, valid_key, CountingStore, ScriptedTransport,
};

fn manager() -> (ProviderManager, Arc<ScriptedTransport>, Arc<CountingStore>) {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(CountingStore::new());
    let manager = ProviderManager::new(test_context(store.clone(), transport.clone()));
    (manager, transport, store)
}

#[tokio::test]
async fn test_availableApis_shouldListClosedRegistry() {
    let (manager, _, _) = manager();
    let ids: Vec<ProviderId> = manager.available_apis().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![ProviderId::Gemini, ProviderId::OpenAI, ProviderId::Claude]);
}

#[tokio::test]
async fn test_switchApi_shouldRouteToSelectedProvider() {
    let (manager, transport, _) = manager();
    manager.set_api_key("gemini", valid_key(ProviderId::Gemini)).await.unwrap();
    manager.set_api_key("claude", valid_key(ProviderId::Claude)).await.unwrap();

    manager.switch_api("gemini").await.unwrap();
    manager.switch_api("claude").await.unwrap();
    transport.push_response(200, success_body(ProviderId::Claude, "Merhaba"));

    let result = manager.translate_text("Hello", "tr", Some("en")).await.unwrap();

    assert_eq!(result.translated_text, "Merhaba");
    assert_eq!(transport.call_count(), 1);
    assert!(transport.last_request().unwrap().url.ends_with("/messages"));
}

#[tokio::test]
async fn test_switchApi_backAndForth_shouldReuseSameAdapter() {
    let (manager, _, store) = manager();

    let first = manager.switch_api("openai").await.unwrap();
    let other = manager.switch_api("gemini").await.unwrap();
    let again = manager.switch_api("openai").await.unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(manager.current_provider(), Some(ProviderId::OpenAI));

    // One credential load per constructed adapter
    assert_eq!(store.gets(), 2);
}

#[tokio::test]
async fn test_switchApi_backAndForth_shouldKeepAdapterCache() {
    let (manager, transport, _) = manager();
    manager.set_api_key("openai", valid_key(ProviderId::OpenAI)).await.unwrap();
    transport.respond_always(200, success_body(ProviderId::OpenAI, "Merhaba"));

    manager.switch_api("openai").await.unwrap();
    manager.translate_text("Hello", "tr", Some("en")).await.unwrap();
    manager.switch_api("gemini").await.unwrap();
    manager.switch_api("openai").await.unwrap();
    manager.translate_text("Hello", "tr", Some("en")).await.unwrap();

    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_loadApiHandler_withFailingStorage_shouldNotCacheAdapter() {
    let (manager, _, store) = manager();
    store.fail_get.store(true, std::sync::atomic::Ordering::SeqCst);

    assert!(manager.load_api_handler("gemini").await.is_err());
    assert_eq!(manager.current_provider(), None);

    store.fail_get.store(false, std::sync::atomic::Ordering::SeqCst);
    let adapter = manager.load_api_handler("gemini").await.unwrap();
    assert!(adapter.is_initialized());
}

#[tokio::test]
async fn test_supportedLanguages_shouldResolveTargetThenCurrent() {
    let (manager, _, _) = manager();
    assert!(manager.supported_languages(None).await.is_empty());
    assert!(manager.supported_languages(Some("nope")).await.is_empty());

    assert_eq!(manager.supported_languages(Some("claude")).await.len(), 30);
    assert_eq!(manager.current_provider(), None);

    manager.switch_api("gemini").await.unwrap();
    assert_eq!(manager.supported_languages(Some("nope")).await[0].code, "en");
}

#[tokio::test]
async fn test_clearCache_shouldOnlyAffectCurrentAdapter() {
    let (manager, transport, _) = manager();
    manager.set_api_key("openai", valid_key(ProviderId::OpenAI)).await.unwrap();
    transport.respond_always(200, success_body(ProviderId::OpenAI, "Merhaba"));

    let adapter = manager.switch_api("openai").await.unwrap();
    manager.translate_text("Hello", "tr", Some("en")).await.unwrap();
    assert_eq!(adapter.cache().translation_len(), 1);

    manager.clear_cache();
    assert_eq!(adapter.cache().translation_len(), 0);
}

// Scenario: source omitted, detection then translation, then a cache hit
#[tokio::test]
async fn test_translateText_withDetectedSource_shouldCacheSecondCall() {
    init_logging();
    let (manager, transport, _) = manager();
    manager.set_api_key("gemini", valid_key(ProviderId::Gemini)).await.unwrap();
    manager.switch_api("gemini").await.unwrap();

    transport.push_response(200, success_body(ProviderId::Gemini, "en"));
    transport.push_response(200, success_body(ProviderId::Gemini, "Merhaba"));

    let first = manager.translate_text("Hello", "tr", None).await.unwrap();
    assert_eq!(first.source_language.code, "en");
    assert_eq!(first.target_language.code, "tr");
    assert_eq!(first.translated_text, "Merhaba");
    assert_eq!(transport.call_count(), 2);

    let second = manager.translate_text("Hello", "tr", None).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(transport.call_count(), 2);
}

// Scenario: source omitted and detection unavailable, heuristic decides
#[tokio::test]
async fn test_translateText_withFailingDetection_shouldUseHeuristicSource() {
    let (manager, transport, _) = manager();
    manager.set_api_key("openai", valid_key(ProviderId::OpenAI)).await.unwrap();
    manager.switch_api("openai").await.unwrap();

    transport.push_response(500, error_body("boom"));
    transport.push_response(500, error_body("boom"));
    transport.push_response(500, error_body("boom"));
    transport.push_response(200, success_body(ProviderId::OpenAI, "Merhaba"));

    let result = manager.translate_text("Hello", "tr", Some("auto")).await.unwrap();
    assert_eq!(result.source_language.code, "en");
    assert_eq!(transport.call_count(), 4);
}

// Scenario: text over the limit fails without touching the network
#[tokio::test]
async fn test_translateText_withTooLongText_shouldFailImmediately() {
    let (manager, transport, _) = manager();
    manager.set_api_key("claude", valid_key(ProviderId::Claude)).await.unwrap();
    manager.switch_api("claude").await.unwrap();

    let text = "x".repeat(5001);
    let error = manager.translate_text(&text, "tr", None).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::TextTooLong);
    assert_eq!(transport.call_count(), 0);
}

// Scenario: unknown provider reported as a status, not an error
#[tokio::test]
async fn test_checkApiStatus_withUnknownProvider_shouldReturnErrorStatus() {
    let (manager, _, _) = manager();

    let status = manager.check_api_status(Some("unknown-provider-id")).await;

    assert_eq!(status.status, HealthStatus::Error);
    assert_eq!(status.error_kind, Some(ErrorKind::ProviderNotFound));
    assert!(status.message.contains("unknown-provider-id"));
}

// Scenario: HTTP 429 is retried, then surfaces as a rate-limit error
#[tokio::test(start_paused = true)]
async fn test_translateText_withRateLimit_shouldFailAfterRetries() {
    let transport = Arc::new(ScriptedTransport::new());
    let context = AdapterContext::new(Arc::new(CountingStore::new()), transport.clone())
        .with_retry(RetryPolicy::new(3, Duration::from_secs(1)));
    let manager = ProviderManager::new(context);
    manager.set_api_key("openai", valid_key(ProviderId::OpenAI)).await.unwrap();
    manager.switch_api("openai").await.unwrap();
    transport.respond_always(
        429,
        error_body("Rate limit reached for gpt-4o-mini on requests per day (RPD): Limit 200, Used 200"),
    );

    let start = tokio::time::Instant::now();
    let error = manager.translate_text("Hello", "tr", Some("en")).await.unwrap_err();

    assert!(matches!(error, TranslateError::RateLimitExceeded { .. }));
    assert_eq!(error.rate_limit_window(), Some(RateLimitWindow::Daily));
    assert_eq!(transport.call_count(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test]
async fn test_checkApiStatus_withConfiguredProvider_shouldBeHealthy() {
    let (manager, transport, _) = manager();
    manager.set_api_key("gemini", valid_key(ProviderId::Gemini)).await.unwrap();

    let status = manager.check_api_status(Some("gemini")).await;
    assert!(status.is_healthy());
    assert_eq!(transport.call_count(), 0);

    let status = manager.check_api_status(Some("openai")).await;
    assert_eq!(status.error_kind, Some(ErrorKind::ApiKeyMissing));
}

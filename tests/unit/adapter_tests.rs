/*!
 * Tests for the generic provider adapter
 */

use std::sync::atomic::Ordering;

use lingobridge::errors::{ErrorKind, ProviderError, TranslateError};
use lingobridge::providers::ProviderId;
use lingobridge::translation::HealthStatus;
use lingobridge::KeyValueStore;

use crate::common::{init_logging, success_body, test_adapter, valid_key};

const ALL_PROVIDERS: [ProviderId; 3] = [ProviderId::Gemini, ProviderId::OpenAI, ProviderId::Claude];

#[tokio::test]
async fn test_translateText_withoutKey_shouldFailBeforeNetwork() {
    init_logging();
    for id in ALL_PROVIDERS {
        let (adapter, transport, _) = test_adapter(id);
        adapter.initialize().await.unwrap();

        let error = adapter.translate_text("Hello", "tr", None).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ApiKeyMissing, "provider {}", id);
        assert!(matches!(adapter.validate_api_key(), Err(TranslateError::ApiKeyMissing { .. })));
        assert_eq!(transport.call_count(), 0);
    }
}

#[tokio::test]
async fn test_translateText_withMalformedKey_shouldFailBeforeNetwork() {
    for id in ALL_PROVIDERS {
        let (adapter, transport, _) = test_adapter(id);
        adapter.set_api_key("not-a-real-key-but-long-enough").await;

        let error = adapter.translate_text("Hello", "tr", Some("en")).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ApiKeyInvalid, "provider {}", id);
        assert_eq!(transport.call_count(), 0);
    }
}

#[tokio::test]
async fn test_validateApiKey_withShortKey_shouldBeInvalid() {
    let (adapter, _, _) = test_adapter(ProviderId::OpenAI);
    adapter.set_api_key("sk-short").await;
    assert_eq!(adapter.validate_api_key().unwrap_err().kind(), ErrorKind::ApiKeyInvalid);

    adapter.set_api_key("   ").await;
    assert_eq!(adapter.validate_api_key().unwrap_err().kind(), ErrorKind::ApiKeyMissing);
}

#[tokio::test]
async fn test_initialize_calledTwice_shouldLoadOnce() {
    let (adapter, _, store) = test_adapter(ProviderId::Gemini);

    adapter.initialize().await.unwrap();
    adapter.initialize().await.unwrap();

    assert!(adapter.is_initialized());
    assert_eq!(store.gets(), 1);
}

#[tokio::test]
async fn test_initialize_withStorageFailure_shouldPropagateOnceAndStayUninitialized() {
    let (adapter, _, store) = test_adapter(ProviderId::Claude);
    store.fail_get.store(true, Ordering::SeqCst);

    assert!(adapter.initialize().await.is_err());
    assert!(!adapter.is_initialized());

    store.fail_get.store(false, Ordering::SeqCst);
    adapter.initialize().await.unwrap();
    assert!(adapter.is_initialized());
}

#[tokio::test]
async fn test_initialize_withStoredKey_shouldLoadIt() {
    let (adapter, _, store) = test_adapter(ProviderId::OpenAI);
    store
        .set([("openaiApiKey".to_string(), valid_key(ProviderId::OpenAI).to_string())].into())
        .await
        .unwrap();

    adapter.initialize().await.unwrap();
    assert_eq!(adapter.validate_api_key().unwrap(), valid_key(ProviderId::OpenAI));
}

#[tokio::test]
async fn test_setApiKey_shouldPersistUnderProviderKey() {
    let expected = [
        (ProviderId::Gemini, "geminiApiKey"),
        (ProviderId::OpenAI, "openaiApiKey"),
        (ProviderId::Claude, "claudeApiKey"),
    ];

    for (id, storage_key) in expected {
        let (adapter, _, store) = test_adapter(id);
        adapter.set_api_key(valid_key(id)).await;
        assert_eq!(store.peek(storage_key).await.as_deref(), Some(valid_key(id)));
    }
}

#[tokio::test]
async fn test_setApiKey_withStorageFailure_shouldKeepKeyInMemory() {
    let (adapter, transport, store) = test_adapter(ProviderId::OpenAI);
    store.fail_set.store(true, Ordering::SeqCst);
    transport.respond_always(200, success_body(ProviderId::OpenAI, "Merhaba"));

    adapter.set_api_key(valid_key(ProviderId::OpenAI)).await;

    assert_eq!(store.set_calls.load(Ordering::SeqCst), 1);
    let result = adapter.translate_text("Hello", "tr", Some("en")).await.unwrap();
    assert_eq!(result.translated_text, "Merhaba");
}

#[tokio::test]
async fn test_translateText_withInvalidText_shouldFailBeforeNetwork() {
    let (adapter, transport, _) = test_adapter(ProviderId::Gemini);
    adapter.set_api_key(valid_key(ProviderId::Gemini)).await;

    let error = adapter.translate_text("   \n\t", "tr", None).await.unwrap_err();
    assert!(matches!(error, TranslateError::TextEmpty));

    let error = adapter.translate_text("", "tr", None).await.unwrap_err();
    assert!(matches!(error, TranslateError::TextEmpty));

    let long_text = "a".repeat(5001);
    let error = adapter.translate_text(&long_text, "tr", None).await.unwrap_err();
    assert!(matches!(error, TranslateError::TextTooLong { length: 5001, max: 5000 }));

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_translateText_withMaximumLength_shouldBeAccepted() {
    let (adapter, transport, _) = test_adapter(ProviderId::Gemini);
    adapter.set_api_key(valid_key(ProviderId::Gemini)).await;
    transport.respond_always(200, success_body(ProviderId::Gemini, "ok"));

    // Multi-byte characters count once each
    let text = "ş".repeat(5000);
    assert!(adapter.translate_text(&text, "en", Some("tr")).await.is_ok());
}

#[tokio::test]
async fn test_translateText_shouldTrimAndResolveLanguages() {
    let (adapter, transport, _) = test_adapter(ProviderId::Claude);
    adapter.set_api_key(valid_key(ProviderId::Claude)).await;
    transport.push_response(200, success_body(ProviderId::Claude, "\n  Hallo Welt  \n"));

    let result = adapter.translate_text("Hello world", "de", Some("en")).await.unwrap();

    assert_eq!(result.original_text, "Hello world");
    assert_eq!(result.translated_text, "Hallo Welt");
    assert_eq!(result.source_language.name, "English");
    assert_eq!(result.target_language.native_name, "Deutsch");
    assert_eq!(result.confidence, 1.0);
    assert!(result.timestamp > 0);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_translateText_withUnknownTarget_shouldUseStubDescriptor() {
    let (adapter, transport, _) = test_adapter(ProviderId::OpenAI);
    adapter.set_api_key(valid_key(ProviderId::OpenAI)).await;
    transport.push_response(200, success_body(ProviderId::OpenAI, "tlhIngan"));

    let result = adapter.translate_text("Klingon", "tlh", Some("en")).await.unwrap();
    assert_eq!(result.target_language.code, "tlh");
    assert_eq!(result.target_language.name, "tlh");
}

#[tokio::test]
async fn test_translateText_withUncleanStop_shouldReduceConfidence() {
    let (adapter, transport, _) = test_adapter(ProviderId::OpenAI);
    adapter.set_api_key(valid_key(ProviderId::OpenAI)).await;
    transport.push_response(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"Merh"},"finish_reason":"length"}]}"#,
    );

    let result = adapter.translate_text("Hello", "tr", Some("en")).await.unwrap();
    assert_eq!(result.confidence, 0.8);
}

#[tokio::test]
async fn test_translateText_withRemoteFailure_shouldRetryThenMapError() {
    let (adapter, transport, _) = test_adapter(ProviderId::Gemini);
    adapter.set_api_key(valid_key(ProviderId::Gemini)).await;
    transport.fail_always(ProviderError::ConnectionError("error trying to connect".to_string()));

    let error = adapter.translate_text("Hello", "tr", Some("en")).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NetworkError);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_translateText_failTwiceThenSucceed_shouldReturnResult() {
    let (adapter, transport, _) = test_adapter(ProviderId::OpenAI);
    adapter.set_api_key(valid_key(ProviderId::OpenAI)).await;
    transport.push_response(500, crate::common::error_body("The server had an error"));
    transport.push_error(ProviderError::ConnectionError("connection reset".to_string()));
    transport.push_response(200, success_body(ProviderId::OpenAI, "Merhaba"));

    let result = adapter.translate_text("Hello", "tr", Some("en")).await.unwrap();
    assert_eq!(result.translated_text, "Merhaba");
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_detectLanguage_shouldNeverFail() {
    let inputs = ["", "   ", "😀🎉", "Hello Привет 你好", "Günaydın", "12345", "Привет мир"];

    for id in ALL_PROVIDERS {
        let (adapter, transport, _) = test_adapter(id);
        adapter.set_api_key(valid_key(id)).await;
        transport.fail_always(ProviderError::ConnectionError("offline".to_string()));

        for text in inputs {
            let language = adapter.detect_language(text).await;
            assert!(!language.code.is_empty());
        }

        assert_eq!(adapter.detect_language("Привет мир").await.code, "ru");
        assert_eq!(adapter.detect_language("😀🎉").await.code, "auto");
    }
}

#[tokio::test]
async fn test_detectLanguage_withoutKey_shouldUseHeuristicWithoutNetwork() {
    let (adapter, transport, _) = test_adapter(ProviderId::Claude);

    assert_eq!(adapter.detect_language("こんにちは").await.code, "ja");
    assert_eq!(adapter.detect_language("Hello").await.code, "en");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_detectLanguage_shouldParseAndCacheRemoteAnswer() {
    let (adapter, transport, _) = test_adapter(ProviderId::Gemini);
    adapter.set_api_key(valid_key(ProviderId::Gemini)).await;
    transport.push_response(200, success_body(ProviderId::Gemini, "fr\n"));

    let first = adapter.detect_language("Bonjour tout le monde").await;
    let second = adapter.detect_language("Bonjour tout le monde").await;

    assert_eq!(first.code, "fr");
    assert_eq!(first.name, "French");
    assert_eq!(second, first);
    assert_eq!(transport.call_count(), 1);

    let request = transport.last_request().unwrap();
    assert_eq!(request.body["generationConfig"]["maxOutputTokens"], 10);
}

#[tokio::test]
async fn test_detectLanguage_withUnmatchedAnswer_shouldReturnSentinel() {
    let (adapter, transport, _) = test_adapter(ProviderId::OpenAI);
    adapter.set_api_key(valid_key(ProviderId::OpenAI)).await;
    transport.push_response(200, success_body(ProviderId::OpenAI, "xx"));

    let language = adapter.detect_language("Qapla'").await;
    assert!(language.is_auto());
}

#[tokio::test]
async fn test_detectLanguage_fallbackResult_shouldBeCached() {
    let (adapter, transport, _) = test_adapter(ProviderId::OpenAI);
    adapter.set_api_key(valid_key(ProviderId::OpenAI)).await;
    transport.push_error(ProviderError::ConnectionError("offline".to_string()));
    transport.push_error(ProviderError::ConnectionError("offline".to_string()));
    transport.push_error(ProviderError::ConnectionError("offline".to_string()));

    assert_eq!(adapter.detect_language("Merhaba dünya, nasılsın").await.code, "tr");
    assert_eq!(adapter.detect_language("Merhaba dünya, nasılsın").await.code, "tr");
    assert_eq!(transport.call_count(), 3);
    assert_eq!(adapter.cache().detection_len(), 1);
}

#[tokio::test]
async fn test_checkStatus_shouldReflectStoredKey() {
    let (adapter, _, store) = test_adapter(ProviderId::Gemini);

    let status = adapter.check_status().await;
    assert_eq!(status.status, HealthStatus::Error);
    assert_eq!(status.error_kind, Some(ErrorKind::ApiKeyMissing));

    store
        .set([("geminiApiKey".to_string(), valid_key(ProviderId::Gemini).to_string())].into())
        .await
        .unwrap();
    let status = adapter.check_status().await;
    assert!(status.is_healthy());

    store.fail_get.store(true, Ordering::SeqCst);
    assert_eq!(adapter.check_status().await.status, HealthStatus::Error);
}

#[tokio::test]
async fn test_clearCache_shouldForceNewRemoteCall() {
    let (adapter, transport, _) = test_adapter(ProviderId::Claude);
    adapter.set_api_key(valid_key(ProviderId::Claude)).await;
    transport.respond_always(200, success_body(ProviderId::Claude, "Merhaba"));

    adapter.translate_text("Hello", "tr", Some("en")).await.unwrap();
    adapter.translate_text("Hello", "tr", Some("en")).await.unwrap();
    assert_eq!(transport.call_count(), 1);

    adapter.clear_cache();
    adapter.translate_text("Hello", "tr", Some("en")).await.unwrap();
    assert_eq!(transport.call_count(), 2);
}

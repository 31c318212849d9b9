/*!
 * Tests for model requests: retries, sampling and request logs
 */

use std::sync::Arc;

use parking_lot::Mutex;

use chunkwise::errors::{ProviderError, TranslationError};
use chunkwise::llm::Increasable;
use chunkwise::providers::mock::MockProvider;

use crate::common::{create_temp_dir, llm_for};

fn echo(text: &str) -> Result<String, TranslationError> {
    Ok(text.to_string())
}

#[tokio::test]
async fn test_retry_shouldRaiseSamplingOnEveryAttempt() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let provider = MockProvider::working().with_handler(move |request, count| {
        recorded.lock().push((request.temperature, request.top_p));
        if count < 2 {
            Err(ProviderError::ConnectionError("reset by peer".to_string()))
        } else {
            Ok("```TXT\nok\n```".to_string())
        }
    });
    let llm = llm_for(provider)
        .with_temperature(Increasable::range(0.2, 1.0))
        .with_top_p(Increasable::fixed(0.9));

    let text = llm.request_text("prompt", "TXT", "data", 16, echo).await.unwrap();

    assert_eq!(text, "ok");
    let seen = seen.lock();
    let temperatures: Vec<f32> = seen.iter().map(|(t, _)| t.unwrap()).collect();
    assert_eq!(temperatures.len(), 3);
    assert!((temperatures[0] - 0.2).abs() < 1e-6);
    assert!((temperatures[1] - 0.6).abs() < 1e-6);
    assert!((temperatures[2] - 1.0).abs() < 1e-6);
    assert!(seen.iter().all(|(_, top_p)| *top_p == Some(0.9)));
}

#[tokio::test]
async fn test_retry_withPermanentError_shouldFailAtOnce() {
    let provider = MockProvider::working()
        .with_handler(|_, _| Err(ProviderError::AuthenticationError("bad key".to_string())));
    let counter = provider.clone();
    let llm = llm_for(provider);

    let result = llm.request_text("prompt", "TXT", "data", 16, echo).await;

    assert!(matches!(result, Err(TranslationError::Provider(ProviderError::AuthenticationError(_)))));
    assert_eq!(counter.request_count(), 1);
    assert_eq!(llm.usage().failures, 1);
}

#[tokio::test]
async fn test_retry_withServerErrors_shouldGiveUpAfterRetryTimes() {
    let provider = MockProvider::failing();
    let counter = provider.clone();
    let llm = llm_for(provider);

    let result = llm.request_text("prompt", "TXT", "data", 16, echo).await;

    assert!(matches!(result, Err(TranslationError::Provider(ProviderError::ApiError { status_code: 500, .. }))));
    assert_eq!(counter.request_count(), 3);
}

#[tokio::test]
async fn test_request_shouldTrackUsage() {
    let llm = llm_for(MockProvider::working());

    llm.request_text("prompt", "TXT", "Hello", 16, echo).await.unwrap();
    llm.request_text("prompt", "TXT", "world", 16, echo).await.unwrap();

    let usage = llm.usage();
    assert_eq!(usage.requests, 2);
    assert_eq!(usage.failures, 0);
    assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    assert!(usage.summary().contains("Requests: 2"));
}

#[tokio::test]
async fn test_requestLogDir_shouldWriteOneTranscriptPerRequest() {
    let dir = create_temp_dir().unwrap();
    let log_dir = dir.path().join("requests");
    let llm = llm_for(MockProvider::working()).with_request_log_dir(&log_dir);

    llm.request_text("system prompt", "TXT", "Hello", 16, echo).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(&log_dir).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(entries.len(), 1);
    let transcript = std::fs::read_to_string(&entries[0]).unwrap();
    assert!(transcript.contains("system prompt"));
    assert!(transcript.contains("[TRANSLATED] Hello"));
}

/*!
 * Scripted providers for pipeline tests
 *
 * Built on `MockProvider` with custom handlers so that no test ever reaches
 * a real API. Replies follow the two-step protocol: a fenced TXT block for
 * the free translation, then a `<response>` document.
 */

use std::sync::Arc;

use parking_lot::Mutex;

use chunkwise::errors::ProviderError;
use chunkwise::providers::mock::MockProvider;
use chunkwise::providers::ChatRequest;

/// Whether the request is the structured (second) step
pub fn is_format_request(request: &ChatRequest) -> bool {
    request.user.trim_start().starts_with("```XML")
}

/// Replies to successive requests with `replies`, in order
pub fn scripted_provider(replies: Vec<String>) -> MockProvider {
    let replies = Arc::new(Mutex::new(replies.into_iter()));
    MockProvider::working().with_handler(move |_, count| {
        replies
            .lock()
            .next()
            .ok_or_else(|| ProviderError::RequestFailed(format!("no scripted reply for request #{}", count + 1)))
    })
}

/// Default replies with every request recorded
pub fn recording_provider() -> (MockProvider, Arc<Mutex<Vec<ChatRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    let provider = MockProvider::working().with_handler(move |request, _| {
        recorded.lock().push(request.clone());
        Ok(MockProvider::default_reply(request))
    });
    (provider, requests)
}

/// Default replies, except a permanent failure for any request mentioning `marker`
pub fn failing_on(marker: &str) -> MockProvider {
    let marker = marker.to_string();
    MockProvider::working().with_handler(move |request, _| {
        if request.user.contains(&marker) {
            Err(ProviderError::AuthenticationError(format!("rejected request about {}", marker)))
        } else {
            Ok(MockProvider::default_reply(request))
        }
    })
}

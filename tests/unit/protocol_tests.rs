/*!
 * Tests for the two-step translation protocol
 */

use chunkwise::errors::TranslationError;
use chunkwise::llm::response::parse_element;
use chunkwise::providers::mock::MockProvider;
use chunkwise::translation::protocol::{build_request_xml, normalize_user_input, parse_translated_response};
use chunkwise::translation::TranslationProtocol;

use crate::common::mock_providers::{is_format_request, recording_provider, scripted_provider};
use crate::common::{llm_for, texts};

#[test]
fn test_normalize_shouldCollapseBlankRuns() {
    assert_eq!(
        normalize_user_input(&["", "Hello", "", "", "", "world", " "]),
        Some("Hello\n\n\nworld".to_string())
    );
    assert_eq!(normalize_user_input(&["", "\t"]), None);
}

#[test]
fn test_buildRequest_shouldListFragmentsWithIds() {
    let xml = build_request_xml(&texts(&["Hello", "world", "."])).unwrap();
    let element = parse_element(&xml).unwrap();

    assert_eq!(element.name, "request");
    assert_eq!(element.children.len(), 3);
    assert_eq!(element.children[2].attribute("id"), Some("3"));
    assert_eq!(element.children[2].text, ".");
}

#[test]
fn test_parseResponse_withOutOfRangeId_shouldFail() {
    let element = parse_element(r#"<response><fragment id="4">x</fragment></response>"#).unwrap();
    let result = parse_translated_response(&element, 3);
    assert!(matches!(result, Err(TranslationError::InvalidFragmentId(id)) if id == "4"));
}

#[test]
fn test_parseResponse_withMissingOrBadIds_shouldLeaveSlotsEmpty() {
    let element = parse_element(
        r#"<response><fragment id="2">deux</fragment><fragment id="x">?</fragment><fragment>??</fragment></response>"#,
    )
    .unwrap();
    assert_eq!(parse_translated_response(&element, 3).unwrap(), texts(&["", "deux", ""]));
}

#[test]
fn test_parseResponse_withOutOfRangeIdAndNoText_shouldStillFail() {
    let element = parse_element(r#"<response><fragment id="1">un</fragment><fragment id="9">  </fragment></response>"#).unwrap();
    let result = parse_translated_response(&element, 3);
    assert!(matches!(result, Err(TranslationError::InvalidFragmentId(id)) if id == "9"));
}

#[tokio::test]
async fn test_translateTexts_shouldCapRepliesByBodyTokens() {
    let (provider, requests) = recording_provider();
    let llm = llm_for(provider);
    let protocol = TranslationProtocol::new("French", Some("A long list of rules that must not count"));

    protocol
        .translate_texts(&llm, &texts(&["Some head context", "Hello", "world", "."]), 3)
        .await
        .unwrap();

    let max_tokens: Vec<Option<u32>> = requests.lock().iter().map(|request| request.max_tokens).collect();
    assert_eq!(max_tokens, vec![Some(6), Some(8)]);
}

#[tokio::test]
async fn test_translateTexts_shouldSendTextThenXmlRequest() {
    let provider = scripted_provider(vec![
        "Sure!\n```TXT\nBonjour monde.\n```".to_string(),
        "```xml\n<response>\n<fragment id=\"1\">Bonjour</fragment>\n<fragment id=\"2\">monde</fragment>\n<fragment id=\"3\">.</fragment>\n</response>\n```".to_string(),
    ]);
    let counter = provider.clone();
    let llm = llm_for(provider);
    let protocol = TranslationProtocol::new("French", None);

    let translated = protocol.translate_texts(&llm, &texts(&["Hello", "world", "."]), 3).await.unwrap();

    assert_eq!(translated, texts(&["Bonjour", "monde", "."]));
    assert_eq!(counter.request_count(), 2);
}

#[tokio::test]
async fn test_translateTexts_withRules_shouldWrapUserData() {
    let (provider, requests) = recording_provider();
    let llm = llm_for(provider);
    let protocol = TranslationProtocol::new("German", Some("  Keep names.  \n\n"));

    protocol.translate_texts(&llm, &texts(&["Anna sings."]), 3).await.unwrap();

    let requests = requests.lock();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].user, "<rules>Keep names.</rules>\n\nAnna sings.");
    assert!(requests[0].system.contains("German"));
    assert!(requests[0].system.contains("Keep names."));
    assert!(is_format_request(&requests[1]));
    assert!(!requests[1].system.contains("Keep names."));
    assert!(requests[1].user.contains(r#"<fragment id="1">Anna sings.</fragment>"#));
    assert!(requests[1].user.ends_with("[TRANSLATED] <rules>Keep names.</rules>\n\nAnna sings."));
}

#[tokio::test]
async fn test_translateTexts_withBlankInput_shouldSkipModel() {
    let provider = MockProvider::failing();
    let counter = provider.clone();
    let llm = llm_for(provider);

    let translated = TranslationProtocol::new("French", None)
        .translate_texts(&llm, &texts(&["", "  "]), 0)
        .await
        .unwrap();

    assert_eq!(translated, texts(&["", ""]));
    assert_eq!(counter.request_count(), 0);
}

#[tokio::test]
async fn test_translateTexts_withoutFence_shouldFailWithNoValidText() {
    let llm = llm_for(scripted_provider(vec!["Bonjour".to_string()]));

    let result = TranslationProtocol::new("French", None)
        .translate_texts(&llm, &texts(&["Hello"]), 1)
        .await;

    assert!(matches!(result, Err(TranslationError::NoValidText { tag }) if tag == "TXT"));
}

#[tokio::test]
async fn test_translateTexts_withoutResponseElement_shouldFailWithNoValidXml() {
    let llm = llm_for(scripted_provider(vec![
        "```TXT\nBonjour\n```".to_string(),
        "I could not align this text.".to_string(),
    ]));

    let result = TranslationProtocol::new("French", None)
        .translate_texts(&llm, &texts(&["Hello"]), 1)
        .await;

    assert!(matches!(result, Err(TranslationError::NoValidXml)));
}

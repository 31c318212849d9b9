/*!
 * Tests for ordered emission of chunk translations
 */

use futures::stream::{self, StreamExt};

use chunkwise::errors::TranslationError;
use chunkwise::translation::{reorder, Chunk, Completion, OrderedEmitter};

use crate::common::texts;

fn completion(index: usize, tokens: usize, body: &[&str]) -> Completion {
    let chunk = Chunk {
        index,
        hash: vec![index as u8],
        head: Vec::new(),
        body: texts(body),
        tail: Vec::new(),
        tokens_count: tokens,
    };
    let translated = body.iter().map(|text| text.to_uppercase()).collect();
    Ok((chunk, translated))
}

#[tokio::test]
async fn test_reorder_withShuffledCompletions_shouldEmitDocumentOrder() {
    let completions = stream::iter(vec![
        completion(2, 1, &["e"]),
        completion(0, 2, &["a", "b"]),
        completion(1, 2, &["c", "d"]),
    ]);
    let mut progress = Vec::new();

    let emitted: Vec<String> = reorder(completions, 5, |p| progress.push(p))
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(emitted, texts(&["A", "B", "C", "D", "E"]));
    assert_eq!(progress.len(), 3);
    assert!((progress[0] - 0.2).abs() < 1e-9);
    assert!((progress[1] - 0.6).abs() < 1e-9);
    assert!((progress[2] - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_reorder_withError_shouldStopAfterReleasedTexts() {
    let completions = stream::iter(vec![
        completion(0, 1, &["a"]),
        completion(2, 1, &["c"]),
        Err(TranslationError::NoValidXml),
        completion(1, 1, &["b"]),
    ]);

    let emitted: Vec<Result<String, TranslationError>> = reorder(completions, 3, |_| {}).collect().await;

    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0].as_ref().unwrap(), "A");
    assert!(matches!(emitted[1], Err(TranslationError::NoValidXml)));
}

#[test]
fn test_emitter_withEmptyBodies_shouldStillAdvance() {
    let mut emitter = OrderedEmitter::new(2);

    assert!(emitter.accept(1, 1, Vec::new()).is_empty());
    assert_eq!(emitter.accept(0, 1, texts(&["only"])), texts(&["only"]));
    assert_eq!(emitter.next_index(), 2);
    assert!((emitter.progress() - 1.0).abs() < f64::EPSILON);
}

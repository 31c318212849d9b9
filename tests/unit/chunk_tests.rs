/*!
 * Tests for matching chunk ranges with fragments
 */

use std::sync::Arc;

use chunkwise::translation::chunk::{crop_texts, hash_texts, CropSide};
use chunkwise::translation::{split_into_chunks, Chunk, ChunkMatcher, ChunkRange, GreedySegmenter, TokenCodec, WordPieceCodec};

use crate::common::{fragments, texts};

fn range(index: usize, head: usize, body: usize, tail: usize, count: usize, remain: (usize, usize)) -> ChunkRange {
    ChunkRange {
        index,
        head_index: head,
        body_index: body,
        tail_index: tail,
        fragments_count: count,
        head_remain_tokens: remain.0,
        tail_remain_tokens: remain.1,
        tokens_count: tail - body,
    }
}

fn codec() -> Arc<dyn TokenCodec> {
    Arc::new(WordPieceCodec::new())
}

#[test]
fn test_matcher_withOverlappingContext_shouldSplitHeadBodyTail() {
    let ranges = vec![range(0, 0, 0, 2, 3, (0, 10)), range(1, 1, 2, 4, 3, (10, 0))];
    let chunks: Vec<Chunk> = ChunkMatcher::new(codec(), "fr", ranges, fragments(&["A", "B", "C", "D"])).collect();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].head, Vec::<String>::new());
    assert_eq!(chunks[0].body, texts(&["A", "B"]));
    assert_eq!(chunks[0].tail, texts(&["C"]));
    assert_eq!(chunks[1].head, texts(&["B"]));
    assert_eq!(chunks[1].body, texts(&["C", "D"]));
    assert!(chunks[1].tail.is_empty());
    assert_eq!(chunks[1].source_texts(), texts(&["B", "C", "D"]));
}

#[test]
fn test_matcher_withSplitterRanges_shouldCoverEveryFragmentOnce() {
    let codec = codec();
    let source = fragments(&["one two", "three", "four five six", "seven", "eight nine", "ten"]);
    let ranges: Vec<ChunkRange> = split_into_chunks(codec.as_ref(), &GreedySegmenter, source.clone(), 6, 0.34)
        .collect::<Result<_, _>>()
        .unwrap();

    let bodies: Vec<String> = ChunkMatcher::new(Arc::clone(&codec), "de", ranges, source.clone())
        .flat_map(|chunk| chunk.body)
        .collect();

    let expected: Vec<String> = source.into_iter().map(|f| f.text).collect();
    assert_eq!(bodies, expected);
}

#[test]
fn test_matcher_withTightContextBudget_shouldCropButHashFullContext() {
    let ranges = vec![range(0, 0, 1, 2, 3, (1, 2))];
    let chunk = ChunkMatcher::new(
        codec(),
        "fr",
        ranges,
        fragments(&["first second third", "Body.", "fourth fifth sixth"]),
    )
    .next()
    .unwrap();

    assert_eq!(chunk.head, texts(&["third"]));
    assert_eq!(chunk.tail, texts(&["fourth fifth "]));
    let full = hash_texts(
        "fr",
        [&texts(&["first second third"]), &texts(&["Body."]), &texts(&["fourth fifth sixth"])],
    );
    assert_eq!(chunk.hash, full);
}

#[test]
fn test_hash_shouldDependOnLanguageAndBoundaries() {
    let base = hash_texts("fr", [&texts(&["ab"]), &texts(&["c"])]);

    assert_eq!(base, hash_texts("fr", [&texts(&["ab"]), &texts(&["c"])]));
    assert_ne!(base, hash_texts("de", [&texts(&["ab"]), &texts(&["c"])]));
    assert_ne!(base, hash_texts("fr", [&texts(&["a"]), &texts(&["bc"])]));
    assert_eq!(base.len(), 64);
}

#[test]
fn test_crop_withZeroBudget_shouldKeepNothing() {
    let codec = WordPieceCodec::new();
    let context = texts(&["one two", "three"]);

    assert!(crop_texts(&codec, &context, CropSide::Head, 0).is_empty());
    assert!(crop_texts(&codec, &context, CropSide::Tail, 0).is_empty());
    assert_eq!(crop_texts(&codec, &context, CropSide::Head, 10), context);
}

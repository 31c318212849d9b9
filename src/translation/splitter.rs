/*!
 * Conversion of fragments into chunk ranges.
 *
 * Fragments are weighted by the token codec and handed to the segmenter;
 * the resulting groups are flattened into fragment index bounds.
 */

use crate::errors::TranslationError;

use super::chunk::ChunkRange;
use super::fragment::{Fragment, Incision};
use super::segmentation::{Resource, SegmentGroup, SegmentOptions, SegmentPart, Segmenter};
use super::tokens::TokenCodec;

/// Share of the context budget given to the tail
const TAIL_RATE: f64 = 0.5;

/// Contiguous fragment span of a group part, bounds inclusive
#[derive(Debug, Clone, Copy)]
struct PartSpan {
    start: usize,
    end: usize,
    tokens: usize,
}

/// Split fragments into chunk ranges of at most `max_chunk_tokens` tokens
pub fn split_into_chunks<I>(
    codec: &dyn TokenCodec,
    segmenter: &dyn Segmenter,
    fragments: I,
    max_chunk_tokens: usize,
    gap_rate: f64,
) -> impl Iterator<Item = Result<ChunkRange, TranslationError>>
where
    I: IntoIterator<Item = Fragment>,
{
    let resources: Vec<Resource> = fragments
        .into_iter()
        .enumerate()
        .map(|(payload, fragment)| Resource {
            count: codec.count(&fragment.text),
            start_incision: fragment.start_incision,
            end_incision: fragment.end_incision,
            payload,
        })
        .collect();

    let options = SegmentOptions {
        max_segment_count: max_chunk_tokens,
        gap_rate,
        tail_rate: TAIL_RATE,
        border_incision: Incision::Impossible,
    };

    segmenter
        .split(resources, &options)
        .into_iter()
        .enumerate()
        .map(|(index, group)| chunk_range(index, &group))
}

fn chunk_range(index: usize, group: &SegmentGroup) -> Result<ChunkRange, TranslationError> {
    let body = group_part(&group.body)?.ok_or_else(|| {
        TranslationError::InconsistentSegments("group body must contain at least one resource".to_string())
    })?;

    let head_index = match group_part(&group.head)? {
        Some(head) => {
            if head.end + 1 != body.start {
                return Err(TranslationError::InconsistentSegments(format!(
                    "head ends at {} but body starts at {}",
                    head.end, body.start
                )));
            }
            head.start
        }
        None => body.start,
    };

    let (tail_index, fragments_count) = match group_part(&group.tail)? {
        Some(tail) => {
            if body.end + 1 != tail.start {
                return Err(TranslationError::InconsistentSegments(format!(
                    "body ends at {} but tail starts at {}",
                    body.end, tail.start
                )));
            }
            (tail.start, tail.end - head_index + 1)
        }
        None => (body.end + 1, body.end + 1 - head_index),
    };

    Ok(ChunkRange {
        index,
        head_index,
        body_index: body.start,
        tail_index,
        fragments_count,
        head_remain_tokens: group.head_remain_count,
        tail_remain_tokens: group.tail_remain_count,
        tokens_count: body.tokens,
    })
}

fn group_part(parts: &[SegmentPart]) -> Result<Option<PartSpan>, TranslationError> {
    let mut span: Option<PartSpan> = None;

    for resource in parts.iter().flat_map(|part| part.resources()) {
        span = Some(match span {
            None => PartSpan {
                start: resource.payload,
                end: resource.payload,
                tokens: resource.count,
            },
            Some(span) => {
                if resource.payload != span.end + 1 {
                    return Err(TranslationError::InconsistentSegments(format!(
                        "resource {} does not follow resource {}",
                        resource.payload, span.end
                    )));
                }
                PartSpan {
                    end: resource.payload,
                    tokens: span.tokens + resource.count,
                    ..span
                }
            }
        });
    }
    Ok(span)
}

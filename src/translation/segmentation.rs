/*!
 * Segmentation of weighted resources into body/context groups.
 *
 * The `Segmenter` trait is the seam for the segmentation algorithm that
 * decides where chunk boundaries fall. `GreedySegmenter` is the built-in
 * implementation: it packs resources into bodies under a token budget,
 * prefers cutting at `Possible` incisions and avoids `Impossible` ones,
 * and attaches neighbouring resources as head/tail context.
 */

use std::ops::Range;

use log::debug;

use super::fragment::Incision;

/// A weighted, incision-annotated unit handed to the segmenter
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Token weight
    pub count: usize,
    /// Incision before this resource
    pub start_incision: Incision,
    /// Incision after this resource
    pub end_incision: Incision,
    /// Position of the originating fragment
    pub payload: usize,
}

/// Resources that must stay together
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Total token weight
    pub count: usize,
    /// Grouped resources, in order
    pub resources: Vec<Resource>,
}

/// One item of a group's head, body or tail
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentPart {
    Resource(Resource),
    Segment(Segment),
}

impl SegmentPart {
    /// Resources covered by this part, in order
    pub fn resources(&self) -> &[Resource] {
        match self {
            Self::Resource(resource) => std::slice::from_ref(resource),
            Self::Segment(segment) => &segment.resources,
        }
    }

    /// Token weight of this part
    pub fn count(&self) -> usize {
        match self {
            Self::Resource(resource) => resource.count,
            Self::Segment(segment) => segment.count,
        }
    }
}

/// A body to translate plus optional context on either side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentGroup {
    pub head: Vec<SegmentPart>,
    pub body: Vec<SegmentPart>,
    pub tail: Vec<SegmentPart>,
    /// Tokens of head context the model may see
    pub head_remain_count: usize,
    /// Tokens of tail context the model may see
    pub tail_remain_count: usize,
}

/// Parameters of a segmentation run
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Token budget of a whole group (body plus context)
    pub max_segment_count: usize,
    /// Share of the budget reserved for head and tail context
    pub gap_rate: f64,
    /// Share of the context budget given to the tail
    pub tail_rate: f64,
    /// Incision assumed before the first and after the last resource
    pub border_incision: Incision,
}

impl SegmentOptions {
    /// Split the budget into (body, head, tail) token counts
    pub fn budgets(&self) -> (usize, usize, usize) {
        let max = self.max_segment_count.max(1);
        let gap = ((max as f64) * self.gap_rate.clamp(0.0, 1.0)).floor() as usize;
        let gap = gap.min(max - 1);
        let tail = ((gap as f64) * self.tail_rate.clamp(0.0, 1.0)).floor() as usize;
        (max - gap, gap - tail, tail)
    }
}

/// Groups resources into segments
pub trait Segmenter: Send + Sync {
    /// Split resources into groups whose bodies partition the input
    fn split(&self, resources: Vec<Resource>, options: &SegmentOptions) -> Vec<SegmentGroup>;
}

/// Greedy packing segmenter
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySegmenter;

impl Segmenter for GreedySegmenter {
    fn split(&self, resources: Vec<Resource>, options: &SegmentOptions) -> Vec<SegmentGroup> {
        let (body_budget, head_budget, tail_budget) = options.budgets();
        debug!(
            "Segmenting {} resources (body {}, head {}, tail {} tokens)",
            resources.len(),
            body_budget,
            head_budget,
            tail_budget
        );

        let bodies = pack_bodies(&resources, body_budget, options.border_incision);
        bodies
            .into_iter()
            .map(|body| {
                let head = head_range(&resources, body.start, head_budget);
                let tail = tail_range(&resources, body.end, tail_budget);
                SegmentGroup {
                    head: build_parts(&resources, head, options.border_incision),
                    body: build_parts(&resources, body, options.border_incision),
                    tail: build_parts(&resources, tail, options.border_incision),
                    head_remain_count: head_budget,
                    tail_remain_count: tail_budget,
                }
            })
            .collect()
    }
}

/// Incision of the boundary right before `position`
fn boundary(resources: &[Resource], position: usize, border: Incision) -> Incision {
    let left = position.checked_sub(1).and_then(|i| resources.get(i));
    let right = resources.get(position);
    let (left, right) = match (left, right) {
        (Some(left), Some(right)) => (left.end_incision, right.start_incision),
        _ => return border,
    };
    if left == Incision::Impossible || right == Incision::Impossible {
        Incision::Impossible
    } else if left == Incision::Possible || right == Incision::Possible {
        Incision::Possible
    } else {
        Incision::Unset
    }
}

fn pack_bodies(resources: &[Resource], budget: usize, border: Incision) -> Vec<Range<usize>> {
    let mut bodies = Vec::new();
    let mut start = 0;
    let mut tokens = 0;
    let mut position = 0;

    while position < resources.len() {
        let count = resources[position].count;
        if position > start && tokens + count > budget {
            let cut = best_cut(resources, start, position, border);
            bodies.push(start..cut);
            start = cut;
            tokens = resources[start..position].iter().map(|r| r.count).sum();
            continue;
        }
        tokens += count;
        position += 1;
    }
    if start < resources.len() {
        bodies.push(start..resources.len());
    }
    bodies
}

/// Latest cut in `(start, end]`, preferring `Possible` then `Unset` boundaries
fn best_cut(resources: &[Resource], start: usize, end: usize, border: Incision) -> usize {
    let candidates = (start + 1..=end).rev();
    let find = |wanted: Incision| {
        candidates
            .clone()
            .find(|&position| boundary(resources, position, border) == wanted)
    };
    find(Incision::Possible)
        .or_else(|| find(Incision::Unset))
        .unwrap_or(end)
}

fn head_range(resources: &[Resource], body_start: usize, budget: usize) -> Range<usize> {
    let mut start = body_start;
    let mut tokens = 0;
    while budget > 0 && start > 0 && tokens < budget {
        start -= 1;
        tokens += resources[start].count;
    }
    start..body_start
}

fn tail_range(resources: &[Resource], body_end: usize, budget: usize) -> Range<usize> {
    let mut end = body_end;
    let mut tokens = 0;
    while budget > 0 && end < resources.len() && tokens < budget {
        tokens += resources[end].count;
        end += 1;
    }
    body_end..end
}

/// Glue runs joined by `Impossible` boundaries into segments
fn build_parts(resources: &[Resource], range: Range<usize>, border: Incision) -> Vec<SegmentPart> {
    let mut parts = Vec::new();
    let mut run: Vec<Resource> = Vec::new();

    for position in range {
        if !run.is_empty() && boundary(resources, position, border) != Incision::Impossible {
            parts.push(into_part(std::mem::take(&mut run)));
        }
        run.push(resources[position].clone());
    }
    if !run.is_empty() {
        parts.push(into_part(run));
    }
    parts
}

fn into_part(mut run: Vec<Resource>) -> SegmentPart {
    if run.len() == 1 {
        if let Some(resource) = run.pop() {
            return SegmentPart::Resource(resource);
        }
    }
    SegmentPart::Segment(Segment {
        count: run.iter().map(|r| r.count).sum(),
        resources: run,
    })
}

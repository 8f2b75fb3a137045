//! Polygon stitcher: rebuild closed loops from unordered directed segments.
//!
//! Passes, in order:
//! 1. Index segments by quantized start point.
//! 2. Walk chains from every unvisited segment until no unvisited segment
//!    continues them; chains that end on their first point are closed, the
//!    rest become open fragments.
//! 3. Drop open fragments that collapse to a single point.
//! 4. Bridge gaps between open fragments, smallest gap first.
//! 5. Drop closed loops whose perimeter is below the minimum.

use std::collections::HashMap;

use polymesh_math::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cut::Segment;
use crate::path::Polygon;
use crate::SliceSettings;

/// A point snapped to the stitching grid. Two points match exactly when
/// their keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey {
    x: i64,
    y: i64,
}

impl PointKey {
    /// Snap `p` to a grid of cell size `resolution`.
    pub fn new(p: &Point2, resolution: f64) -> Self {
        Self {
            x: (p.x / resolution).round() as i64,
            y: (p.y / resolution).round() as i64,
        }
    }
}

/// Counters describing one stitching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchStats {
    /// Input segments.
    pub segments: usize,
    /// Chains that closed during the walk.
    pub closed_chains: usize,
    /// Chains left open after the walk.
    pub open_fragments: usize,
    /// Open fragments dropped because all their points coincide.
    pub collapsed_fragments: usize,
    /// Fragment merges during gap stitching.
    pub merges: usize,
    /// Loops closed during gap stitching.
    pub gap_closed: usize,
    /// Open fragments with no match within the gap limit.
    pub dropped_open: usize,
    /// Closed loops removed by the perimeter filter.
    pub too_small: usize,
}

/// Output of [`stitch`].
#[derive(Debug, Clone, Default)]
pub struct Stitched {
    /// Closed loops that passed the perimeter filter.
    pub polygons: Vec<Polygon>,
    /// Pass counters.
    pub stats: StitchStats,
}

/// Segment indices grouped by quantized start point, in input order.
struct SegmentIndex {
    starts: HashMap<PointKey, Vec<usize>>,
}

impl SegmentIndex {
    fn new(segments: &[Segment], resolution: f64) -> Self {
        let mut starts: HashMap<PointKey, Vec<usize>> = HashMap::with_capacity(segments.len());
        for (i, seg) in segments.iter().enumerate() {
            starts
                .entry(PointKey::new(&seg.start, resolution))
                .or_default()
                .push(i);
        }
        Self { starts }
    }

    /// First unvisited segment starting at `key`.
    fn next_unvisited(&self, key: &PointKey, visited: &[bool]) -> Option<usize> {
        self.starts
            .get(key)?
            .iter()
            .copied()
            .find(|&i| !visited[i])
    }
}

/// Which endpoint of a candidate fragment matched a fragment's end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    /// The candidate's start: append it as is.
    Forward,
    /// The candidate's end: append it reversed.
    Reversed,
}

/// Proposed join of the end of fragment `from` to an endpoint of `to`.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    from: usize,
    to: usize,
    attach: Attach,
    score: f64,
}

/// Stitch directed segments into closed polygons.
///
/// Never fails: fragments that cannot be closed are dropped and counted in
/// [`StitchStats`].
pub fn stitch(segments: &[Segment], settings: &SliceSettings) -> Stitched {
    let resolution = settings.grid_resolution;
    let mut stats = StitchStats {
        segments: segments.len(),
        ..Default::default()
    };

    let (mut closed, open) = walk_chains(segments, resolution);
    stats.closed_chains = closed.len();
    stats.open_fragments = open.len();

    let open: Vec<Vec<Point2>> = open
        .into_iter()
        .filter(|fragment| {
            let keep = !is_collapsed(fragment, resolution);
            if !keep {
                stats.collapsed_fragments += 1;
            }
            keep
        })
        .collect();

    closed.extend(stitch_gaps(open, settings, &mut stats));

    let polygons: Vec<Polygon> = closed
        .into_iter()
        .map(Polygon::new)
        .filter(|polygon| {
            let keep = polygon.perimeter_at_least(settings.min_perimeter);
            if !keep {
                stats.too_small += 1;
            }
            keep
        })
        .collect();

    debug!(
        segments = stats.segments,
        closed = stats.closed_chains,
        open = stats.open_fragments,
        merges = stats.merges,
        dropped = stats.dropped_open,
        too_small = stats.too_small,
        polygons = polygons.len(),
        "Stitched segments"
    );

    Stitched { polygons, stats }
}

/// Walk every segment into a chain. Returns `(closed, open)` point lists;
/// closed loops do not repeat their first point.
fn walk_chains(segments: &[Segment], resolution: f64) -> (Vec<Vec<Point2>>, Vec<Vec<Point2>>) {
    let index = SegmentIndex::new(segments, resolution);
    let mut visited = vec![false; segments.len()];
    let mut closed = Vec::new();
    let mut open = Vec::new();

    for first in 0..segments.len() {
        if visited[first] {
            continue;
        }

        let start_key = PointKey::new(&segments[first].start, resolution);
        let mut points = vec![segments[first].start];
        let mut count = 0;
        let mut current = Some(first);

        while let Some(i) = current {
            visited[i] = true;
            count += 1;
            points.push(segments[i].end);

            let end_key = PointKey::new(&segments[i].end, resolution);
            current = index.next_unvisited(&end_key, &visited);
        }

        let last_key = points.last().map(|p| PointKey::new(p, resolution));
        if count >= 2 && last_key == Some(start_key) {
            points.pop();
            closed.push(points);
        } else {
            open.push(points);
        }
    }

    (closed, open)
}

/// True for an empty fragment or one whose points all share a key.
fn is_collapsed(fragment: &[Point2], resolution: f64) -> bool {
    let Some(first) = fragment.first() else {
        return true;
    };
    let key = PointKey::new(first, resolution);
    fragment.iter().all(|p| PointKey::new(p, resolution) == key)
}

/// Close the smallest gap among all open fragments, one merge at a time,
/// until no match lies within `max_gap`. Fragments left over are dropped.
fn stitch_gaps(
    fragments: Vec<Vec<Point2>>,
    settings: &SliceSettings,
    stats: &mut StitchStats,
) -> Vec<Vec<Point2>> {
    let resolution = settings.grid_resolution;
    let limit = settings.max_gap.map(|gap| gap * gap);
    let mut live: Vec<Option<Vec<Point2>>> = fragments.into_iter().map(Some).collect();
    let mut closed = Vec::new();

    while let Some(best) = closest_gap(&live, resolution) {
        if limit.is_some_and(|limit| best.score > limit) {
            trace!(gap = best.score.sqrt(), "Smallest gap exceeds limit");
            break;
        }

        if best.from == best.to {
            if let Some(mut points) = live[best.from].take() {
                drop_repeated_start(&mut points, resolution);
                stats.gap_closed += 1;
                closed.push(points);
            }
            continue;
        }

        stats.merges += 1;
        merge(&mut live, best, resolution);
    }

    stats.dropped_open += live.iter().flatten().count();
    closed
}

/// Globally closest endpoint pair. Each live fragment's end is scanned in
/// order against the starts of all live fragments (its own start included)
/// and then against the ends of the other live fragments. Only a strictly
/// smaller score replaces the best match, and an exact key match ends the
/// scan.
fn closest_gap(live: &[Option<Vec<Point2>>], resolution: f64) -> Option<Candidate> {
    let endpoints = |fragment: &Option<Vec<Point2>>| {
        let points = fragment.as_ref()?;
        Some((*points.first()?, *points.last()?))
    };

    let mut best: Option<Candidate> = None;
    for (from, fragment) in live.iter().enumerate() {
        let Some((_, end)) = endpoints(fragment) else {
            continue;
        };
        let end_key = PointKey::new(&end, resolution);
        let score = |p: &Point2| {
            if PointKey::new(p, resolution) == end_key {
                0.0
            } else {
                (p - end).norm_squared()
            }
        };

        let starts = live
            .iter()
            .enumerate()
            .filter_map(|(to, other)| Some((to, Attach::Forward, endpoints(other)?.0)));
        let ends = live
            .iter()
            .enumerate()
            .filter(|&(to, _)| to != from)
            .filter_map(|(to, other)| Some((to, Attach::Reversed, endpoints(other)?.1)));

        for (to, attach, p) in starts.chain(ends) {
            let candidate = Candidate {
                from,
                to,
                attach,
                score: score(&p),
            };
            if best.map_or(true, |b| candidate.score < b.score) {
                best = Some(candidate);
            }
            if candidate.score == 0.0 {
                return best;
            }
        }
    }
    best
}

/// Merge the two fragments of `candidate`. A forward match appends `to`
/// onto `from`; a reversed match appends the shorter fragment reversed onto
/// the longer one, `from` onto `to` when they are equally long.
fn merge(live: &mut [Option<Vec<Point2>>], candidate: Candidate, resolution: f64) {
    let Candidate { from, to, .. } = candidate;
    let (Some(a), Some(b)) = (live[from].take(), live[to].take()) else {
        return;
    };

    match candidate.attach {
        Attach::Forward => live[from] = Some(join(a, b.into_iter(), resolution)),
        Attach::Reversed if a.len() > b.len() => {
            live[from] = Some(join(a, b.into_iter().rev(), resolution));
        }
        Attach::Reversed => live[to] = Some(join(b, a.into_iter().rev(), resolution)),
    }
}

/// Append `tail` to `head`, skipping a first point that coincides with the
/// end of `head`.
fn join(
    mut head: Vec<Point2>,
    tail: impl Iterator<Item = Point2>,
    resolution: f64,
) -> Vec<Point2> {
    let mut tail = tail.peekable();
    if let (Some(last), Some(next)) = (head.last(), tail.peek()) {
        if PointKey::new(last, resolution) == PointKey::new(next, resolution) {
            tail.next();
        }
    }
    head.extend(tail);
    head
}

fn drop_repeated_start(points: &mut Vec<Point2>, resolution: f64) {
    if points.len() > 1 {
        let first = PointKey::new(&points[0], resolution);
        if points
            .last()
            .is_some_and(|last| PointKey::new(last, resolution) == first)
        {
            points.pop();
        }
    }
}

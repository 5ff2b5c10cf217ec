//! Topology-preserving Douglas–Peucker simplification
//!
//! Each ring is reduced with Douglas–Peucker, but a chain is only replaced by
//! its shortcut when
//! - every dropped vertex lies within `epsilon` of the shortcut,
//! - the shortcut meets no other current segment except at shared endpoints,
//! - no other ring lies inside the area swept between chain and shortcut.
//!
//! Otherwise the chain is split at its farthest vertex. The current segments
//! are the input segments not yet replaced plus the shortcuts taken so far,
//! over all rings, so rings can neither cross each other nor themselves.
//! A ring that would fall below three vertices or flip its winding is kept
//! as it was.

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Area, Coord, Line, LineString, MultiPolygon, Polygon};

use super::segment::{point_segment_distance, segments_conflict};

/// Reduce the vertex count of every ring of `shape`, moving no boundary point
/// by more than `epsilon` and preserving ring topology and winding.
pub fn simplify_preserve_topology(
    shape: &MultiPolygon<f64>,
    epsilon: f64,
) -> MultiPolygon<f64> {
    // (polygon index, closed ring vertices), exterior of each polygon first
    let mut layout: Vec<(usize, usize)> = Vec::new();
    let mut rings: Vec<Vec<Coord<f64>>> = Vec::new();
    for (p, poly) in shape.iter().enumerate() {
        for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
            layout.push((p, rings.len()));
            rings.push(anchored_ring(ring));
        }
    }

    let before: usize = rings.iter().map(|r| r.len().saturating_sub(1)).sum();
    let mut index = SegmentIndex::new(rings);
    let simplified: Vec<Vec<Coord<f64>>> = (0..index.rings.len())
        .map(|ring| simplify_ring(&mut index, ring, epsilon))
        .collect();
    let after: usize = simplified.iter().map(|r| r.len().saturating_sub(1)).sum();
    tracing::debug!(epsilon, rings = simplified.len(), before, after, "simplified rings");

    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for (p, ring) in layout {
        let line_string = LineString::from(simplified[ring].clone());
        if p == polygons.len() {
            polygons.push((line_string, Vec::new()));
        } else {
            polygons[p].1.push(line_string);
        }
    }
    polygons
        .into_iter()
        .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
        .collect()
}

/// Closed ring with repeated neighbours removed, rotated to start at its
/// lowest-then-leftmost vertex. That vertex is always a true corner, so
/// keeping the ring start fixed never pins a redundant vertex.
fn anchored_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut open: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for &c in &ring.0 {
        if open.last() != Some(&c) {
            open.push(c);
        }
    }
    if open.len() > 1 && open.first() == open.last() {
        open.pop();
    }
    if open.is_empty() {
        return open;
    }

    let start = open
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    open.rotate_left(start);
    open.push(open[0]);
    open
}

struct Shortcut {
    ring: usize,
    line: Line<f64>,
}

/// The current segments of every ring
struct SegmentIndex {
    rings: Vec<Vec<Coord<f64>>>,
    /// Per ring, whether each input segment is still in place
    live: Vec<Vec<bool>>,
    shortcuts: Vec<Shortcut>,
}

impl SegmentIndex {
    fn new(rings: Vec<Vec<Coord<f64>>>) -> Self {
        let live = rings
            .iter()
            .map(|r| vec![true; r.len().saturating_sub(1)])
            .collect();
        Self {
            rings,
            live,
            shortcuts: Vec::new(),
        }
    }

    /// Whether replacing vertices `start..=end` of `ring` by a single
    /// segment would break topology
    fn blocks(&self, ring: usize, start: usize, end: usize) -> bool {
        let candidate = Line::new(self.rings[ring][start], self.rings[ring][end]);

        for (r, vertices) in self.rings.iter().enumerate() {
            for (s, window) in vertices.windows(2).enumerate() {
                if !self.live[r][s] || (r == ring && (start..end).contains(&s)) {
                    continue;
                }
                if segments_conflict(candidate, Line::new(window[0], window[1])) {
                    return true;
                }
            }
        }
        if self
            .shortcuts
            .iter()
            .any(|s| segments_conflict(candidate, s.line))
        {
            return true;
        }

        // A whole ring can sit between chain and shortcut without any crossing.
        // Ring starts are never dropped, so testing them is enough.
        let swept = Polygon::new(
            LineString::from(self.rings[ring][start..=end].to_vec()),
            vec![],
        );
        self.rings
            .iter()
            .enumerate()
            .filter(|(r, vertices)| *r != ring && !vertices.is_empty())
            .any(|(_, vertices)| swept.coordinate_position(&vertices[0]) == CoordPos::Inside)
    }

    fn replace(&mut self, ring: usize, start: usize, end: usize) {
        for live in &mut self.live[ring][start..end] {
            *live = false;
        }
        self.shortcuts.push(Shortcut {
            ring,
            line: Line::new(self.rings[ring][start], self.rings[ring][end]),
        });
    }

    fn restore(&mut self, ring: usize) {
        self.live[ring].fill(true);
        self.shortcuts.retain(|s| s.ring != ring);
    }
}

fn simplify_ring(index: &mut SegmentIndex, ring: usize, epsilon: f64) -> Vec<Coord<f64>> {
    let vertices = index.rings[ring].clone();
    // Triangles have nothing to drop
    if vertices.len() < 5 {
        return vertices;
    }
    let last = vertices.len() - 1;

    let split = (1..last)
        .max_by(|&a, &b| {
            distance(vertices[0], vertices[a]).total_cmp(&distance(vertices[0], vertices[b]))
        })
        .unwrap_or(last / 2);

    let mut keep = vec![false; vertices.len()];
    keep[0] = true;
    keep[split] = true;
    keep[last] = true;

    let mut stack = vec![(split, last), (0, split)];
    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }
        let shortcut = Line::new(vertices[start], vertices[end]);
        let (far, dist) = ((start + 1)..end)
            .map(|i| (i, point_segment_distance(vertices[i], shortcut)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((start + 1, 0.0));

        if dist <= epsilon && !index.blocks(ring, start, end) {
            index.replace(ring, start, end);
        } else {
            keep[far] = true;
            stack.push((far, end));
            stack.push((start, far));
        }
    }

    let kept: Vec<Coord<f64>> = vertices
        .iter()
        .zip(&keep)
        .filter(|&(_, &k)| k)
        .map(|(&c, _)| c)
        .collect();

    let original_area = signed_ring_area(&vertices);
    let kept_area = signed_ring_area(&kept);
    if kept.len() < 4 || kept_area == 0.0 || kept_area.signum() != original_area.signum() {
        index.restore(ring);
        return vertices;
    }
    kept
}

fn signed_ring_area(closed: &[Coord<f64>]) -> f64 {
    Polygon::new(LineString::from(closed.to_vec()), vec![]).signed_area()
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

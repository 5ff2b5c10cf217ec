//! Inward offset (negative buffer) with mitred joins
//!
//! The shrunk polygon is the input minus everything within `distance` of its
//! boundary. That region is assembled from one band per edge, reaching
//! `distance` to both sides of the edge, plus a mitre patch at each reflex
//! vertex where the bands leave a wedge uncovered. Convex vertices need no
//! patch: the offset edges meet there in a sharp corner on their own.
//!
//! A mitre patch spans the vertex, the two offset edge ends and the mitre
//! point. When the mitre point is farther than `mitre_limit * distance` from
//! the vertex, the patch is bevelled at that reach. A limit below 1 would
//! bevel inside the disc of radius `distance` and is not accepted.
//!
//! The boolean ops snap coordinates to an integer grid, so pieces that merely
//! share an edge can leave hairline gaps that reach back to the boundary.
//! Every piece therefore reaches a little past its neighbours: bands run on
//! beyond their edge ends and sit a hair wider than `distance`, and patches
//! start a little way back inside their bands. The overlap is tied to the
//! polygon extent and stays far above the grid step.

use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BooleanOps, BoundingRect, Coord, Line, LineString, MultiPolygon, Polygon};

use super::segment::{cross, dot, left_normal};

/// Normal sums shorter than this mark an edge folding back onto itself
const FOLD_TOLERANCE: f64 = 1e-12;

/// Overlap between neighbouring pieces, as a fraction of the polygon extent
const OVERLAP: f64 = 1e-7;

/// Shrink `polygon` towards its interior by `distance`.
///
/// Every point of the result is at least `distance` from the boundary of
/// `polygon`. The result is empty when the polygon is nowhere wider than
/// `2 * distance`, and may have several parts when a narrow waist closes.
/// Exteriors come back counter-clockwise, holes clockwise.
pub fn inward_offset(
    polygon: &Polygon<f64>,
    distance: f64,
    mitre_limit: f64,
) -> MultiPolygon<f64> {
    debug_assert!(distance > 0.0);
    debug_assert!(mitre_limit >= 1.0);

    let Some(rect) = polygon.bounding_rect() else {
        return MultiPolygon(vec![]);
    };
    let overlap = OVERLAP * rect.width().max(rect.height());
    let reach = distance + overlap;

    // Exterior CCW, holes CW: the polygon interior is left of every edge
    let oriented = polygon.orient(Direction::Default);

    let mut pieces = Vec::new();
    for ring in std::iter::once(oriented.exterior()).chain(oriented.interiors()) {
        let vertices = open_ring(ring);
        let n = vertices.len();
        if n < 3 {
            continue;
        }
        for i in 0..n {
            let edge = Line::new(vertices[i], vertices[(i + 1) % n]);
            let Some(normal) = left_normal(edge) else {
                continue;
            };
            pieces.push(edge_band(edge, normal, reach, overlap));

            let next = Line::new(vertices[(i + 1) % n], vertices[(i + 2) % n]);
            let Some(next_normal) = left_normal(next) else {
                continue;
            };
            // A right turn with the interior on the left is a reflex vertex
            if cross(edge.delta(), next.delta()) < 0.0
                && let Some(patch) =
                    mitre_patch(edge.end, normal, next_normal, reach, mitre_limit, overlap)
            {
                pieces.push(patch);
            }
        }
    }

    let piece_count = pieces.len();
    let removed = union_all(pieces);
    let remainder = MultiPolygon(vec![oriented]).difference(&removed);

    let result = drop_slivers(remainder, sliver_area(polygon)).orient(Direction::Default);
    tracing::debug!(
        distance,
        mitre_limit,
        pieces = piece_count,
        parts = result.0.len(),
        area = result.unsigned_area(),
        "inward offset"
    );
    result
}

/// Union of all pieces, merged pairwise so every step works on shapes of
/// similar size
fn union_all(pieces: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut shapes: Vec<MultiPolygon<f64>> =
        pieces.into_iter().map(|p| MultiPolygon(vec![p])).collect();
    while shapes.len() > 1 {
        shapes = shapes
            .chunks(2)
            .map(|pair| {
                pair[1..]
                    .iter()
                    .fold(pair[0].clone(), |acc, shape| acc.union(shape))
            })
            .collect();
    }
    shapes.pop().unwrap_or_else(|| MultiPolygon(vec![]))
}

/// Unit direction of the edge whose left normal is `normal`
fn edge_direction(normal: Coord<f64>) -> Coord<f64> {
    geo::coord! { x: normal.y, y: -normal.x }
}

/// Ring vertices without the closing coordinate or repeated neighbours
fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut vertices: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for &c in &ring.0 {
        if vertices.last() != Some(&c) {
            vertices.push(c);
        }
    }
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

fn edge_band(edge: Line<f64>, normal: Coord<f64>, reach: f64, overlap: f64) -> Polygon<f64> {
    let off = normal * reach;
    let along = edge_direction(normal) * overlap;
    let (start, end) = (edge.start - along, edge.end + along);
    Polygon::new(
        LineString::from(vec![start - off, end - off, end + off, start + off]),
        vec![],
    )
}

fn mitre_patch(
    vertex: Coord<f64>,
    n_in: Coord<f64>,
    n_out: Coord<f64>,
    reach: f64,
    mitre_limit: f64,
    overlap: f64,
) -> Option<Polygon<f64>> {
    let sum = n_in + n_out;
    let sum_len = sum.x.hypot(sum.y);
    if sum_len < FOLD_TOLERANCE {
        return None;
    }
    let bisector = sum / sum_len;
    let cos_half = dot(bisector, n_in);
    let mitre_len = reach / cos_half;

    // Offset edge ends, pulled back into their bands
    let a = vertex + n_in * reach - edge_direction(n_in) * overlap;
    let b = vertex + n_out * reach + edge_direction(n_out) * overlap;
    let mitre = vertex + bisector * mitre_len;

    let limit = mitre_limit * reach;
    let ring = if mitre_len <= limit {
        vec![vertex, a, mitre, b]
    } else {
        // Point on the way from `from` to the mitre whose reach along the
        // bisector equals the limit
        let bevel = |from: Coord<f64>| {
            let along = dot(from - vertex, bisector);
            let span = mitre_len - along;
            if span <= 0.0 {
                return from;
            }
            from + (mitre - from) * ((limit - along) / span).clamp(0.0, 1.0)
        };
        vec![vertex, a, bevel(a), bevel(b), b]
    };
    Some(Polygon::new(LineString::from(ring), vec![]))
}

/// Area below which leftover parts and holes count as numeric noise
fn sliver_area(polygon: &Polygon<f64>) -> f64 {
    polygon
        .bounding_rect()
        .map(|r| 1e-10 * (r.width() * r.width() + r.height() * r.height()))
        .unwrap_or(0.0)
}

fn drop_slivers(shape: MultiPolygon<f64>, min_area: f64) -> MultiPolygon<f64> {
    shape
        .into_iter()
        .filter(|p| p.unsigned_area() > min_area)
        .map(|p| {
            let (exterior, interiors) = p.into_inner();
            let interiors = interiors
                .into_iter()
                .filter(|ring| Polygon::new(ring.clone(), vec![]).unsigned_area() > min_area)
                .collect();
            Polygon::new(exterior, interiors)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::segment::distance_to_boundary;
    use crate::geometry::validate_polygon;
    use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
    use geo::{CoordsIter, polygon};

    /// Circle of radius 10 with deterministic radial jitter up to `jitter`
    fn jittered_circle(n: usize, jitter: f64, seed: f64) -> Vec<(f64, f64)> {
        (0..n)
            .map(|i| {
                let noise = ((i as f64 * 12.9898 + seed * 78.233).sin() * 43758.5453).fract();
                let r = 10.0 + jitter * noise;
                let angle = std::f64::consts::TAU * i as f64 / n as f64;
                (r * angle.cos(), r * angle.sin())
            })
            .collect()
    }

    fn assert_clear_of_boundary(poly: &Polygon<f64>, shrunk: &MultiPolygon<f64>, distance: f64) {
        for c in shrunk.coords_iter() {
            assert_eq!(poly.coordinate_position(&c), CoordPos::Inside);
            assert!(distance_to_boundary(poly, c) >= distance);
        }
        for part in shrunk {
            let report = validate_polygon(part);
            assert!(report.is_valid(), "{}", report.summary());
        }
    }

    fn l_shape() -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 2.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ]
    }

    #[test]
    fn test_square_shrinks_evenly() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ];
        let shrunk = inward_offset(&square, 1.0, 2.0);
        assert_eq!(shrunk.0.len(), 1);
        assert!((shrunk.unsigned_area() - 64.0).abs() < 1e-4);

        let rect = shrunk.bounding_rect().unwrap();
        assert!((rect.min().x - 1.0).abs() < 1e-5);
        assert!((rect.max().y - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_reflex_corner_is_mitred() {
        let shrunk = inward_offset(&l_shape(), 0.5, 2.0);
        assert_eq!(shrunk.0.len(), 1);
        assert!((shrunk.unsigned_area() - 5.0).abs() < 1e-4);
        assert!(
            shrunk
                .coords_iter()
                .any(|c| (c.x - 1.5).abs() < 1e-5 && (c.y - 1.5).abs() < 1e-5)
        );
    }

    #[test]
    fn test_mitre_limit_bevels_reflex_corner() {
        // A right-angle mitre reaches sqrt(2) * distance, beyond a limit of 1
        let shrunk = inward_offset(&l_shape(), 0.5, 1.0);
        let kept_corner = 0.5 * (0.5 * (2.0 - 2f64.sqrt())).powi(2);
        assert!((shrunk.unsigned_area() - (5.0 + kept_corner)).abs() < 1e-4);
    }

    #[test]
    fn test_every_vertex_keeps_distance() {
        let poly = l_shape();
        for limit in [1.0, 2.0, 5.0] {
            let shrunk = inward_offset(&poly, 0.3, limit);
            assert_clear_of_boundary(&poly, &shrunk, 0.3);
        }
    }

    #[test]
    fn test_hole_grows() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 4.0, y: 6.0), (x: 6.0, y: 6.0), (x: 6.0, y: 4.0)]]
        );
        let shrunk = inward_offset(&poly, 1.0, 2.0);
        assert_eq!(shrunk.0.len(), 1);
        assert_eq!(shrunk.0[0].interiors().len(), 1);
        assert!((shrunk.unsigned_area() - 48.0).abs() < 1e-4);
    }

    #[test]
    fn test_jittered_circle_stays_clear_of_boundary() {
        for n in [24, 50, 100, 200] {
            for seed in 0..5 {
                let poly = Polygon::new(
                    LineString::from(jittered_circle(n, 0.6, seed as f64)),
                    vec![],
                );
                let shrunk = inward_offset(&poly, 0.05, 2.0);
                assert_eq!(shrunk.0.len(), 1);
                assert_clear_of_boundary(&poly, &shrunk, 0.05);
            }
        }
    }

    #[test]
    fn test_jittered_holes_stay_clear_of_boundary() {
        let holes = (0..3)
            .map(|k| {
                let angle = std::f64::consts::TAU * k as f64 / 3.0;
                let (cx, cy) = (4.0 * angle.cos(), 4.0 * angle.sin());
                let ring: Vec<(f64, f64)> = jittered_circle(12, 0.6, k as f64 + 1.0)
                    .into_iter()
                    .map(|(x, y)| (cx + x * 0.1, cy + y * 0.1))
                    .collect();
                LineString::from(ring)
            })
            .collect();
        let poly = Polygon::new(LineString::from(jittered_circle(50, 0.6, 0.0)), holes);
        assert!(validate_polygon(&poly).is_valid());

        let shrunk = inward_offset(&poly, 0.05, 2.0);
        assert_eq!(shrunk.0.len(), 1);
        assert_eq!(shrunk.0[0].interiors().len(), 3);
        assert_clear_of_boundary(&poly, &shrunk, 0.05);
    }

    #[test]
    fn test_narrow_polygon_collapses() {
        let strip = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        assert!(inward_offset(&strip, 0.5, 2.0).0.is_empty());
        assert!(inward_offset(&strip, 0.75, 2.0).0.is_empty());
        assert!(!inward_offset(&strip, 0.25, 2.0).0.is_empty());
    }

    #[test]
    fn test_waist_splits_polygon() {
        // Two 4x4 squares joined by a corridor 1 wide
        let dumbbell = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 1.5),
            (x: 6.0, y: 1.5),
            (x: 6.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 4.0),
            (x: 6.0, y: 4.0),
            (x: 6.0, y: 2.5),
            (x: 4.0, y: 2.5),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ];
        let shrunk = inward_offset(&dumbbell, 0.6, 2.0);
        assert_eq!(shrunk.0.len(), 2);
    }

    #[test]
    fn test_clockwise_input_is_handled() {
        let cw = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 10.0),
            (x: 10.0, y: 10.0),
            (x: 10.0, y: 0.0),
        ];
        let shrunk = inward_offset(&cw, 1.0, 2.0);
        assert!((shrunk.unsigned_area() - 64.0).abs() < 1e-4);
    }
}

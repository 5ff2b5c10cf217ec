//! Small planar helpers shared by validation, offsetting and simplification

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Coord, Line, Polygon};

/// Distance from `p` to the closed segment `line`
pub fn point_segment_distance(p: Coord<f64>, line: Line<f64>) -> f64 {
    let d = line.delta();
    let len_sq = d.x * d.x + d.y * d.y;
    if len_sq == 0.0 {
        return (p.x - line.start.x).hypot(p.y - line.start.y);
    }
    let t = (((p.x - line.start.x) * d.x + (p.y - line.start.y) * d.y) / len_sq).clamp(0.0, 1.0);
    let foot = line.start + d * t;
    (p.x - foot.x).hypot(p.y - foot.y)
}

/// Distance from `p` to the nearest segment of any ring of `polygon`
pub fn distance_to_boundary(polygon: &Polygon<f64>, p: Coord<f64>) -> f64 {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .flat_map(|ring| ring.lines())
        .map(|line| point_segment_distance(p, line))
        .fold(f64::INFINITY, f64::min)
}

/// Unit left normal of a segment; `None` for a zero-length segment
pub fn left_normal(line: Line<f64>) -> Option<Coord<f64>> {
    let d = line.delta();
    let len = d.x.hypot(d.y);
    if len == 0.0 {
        return None;
    }
    Some(geo::coord! { x: -d.y / len, y: d.x / len })
}

/// z-component of `a × b`
pub fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

pub fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Whether two segments meet anywhere other than at an endpoint they share.
///
/// Adjacent ring segments touch at their common vertex and do not conflict.
/// Any other contact, including one segment's endpoint resting on the other's
/// interior or a collinear overlap, does.
pub fn segments_conflict(a: Line<f64>, b: Line<f64>) -> bool {
    match line_intersection(a, b) {
        None => false,
        Some(LineIntersection::Collinear { intersection }) => {
            intersection.start != intersection.end || !is_shared_endpoint(intersection.start, a, b)
        }
        Some(LineIntersection::SinglePoint {
            intersection,
            is_proper,
        }) => is_proper || !is_shared_endpoint(intersection, a, b),
    }
}

fn is_shared_endpoint(p: Coord<f64>, a: Line<f64>, b: Line<f64>) -> bool {
    (p == a.start || p == a.end) && (p == b.start || p == b.end)
}

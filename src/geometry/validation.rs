//! Hazard polygon validation
//!
//! Checks a polygon before any geometric operation runs on it:
//! - Every coordinate is finite
//! - Every ring has at least three distinct vertices and non-zero area
//! - No ring touches or crosses itself
//! - Rings are pairwise disjoint
//! - Holes lie inside the outer ring and not inside each other
//!
//! Nothing is repaired. Consecutive duplicate vertices are tolerated and
//! only counted.

use std::fmt;

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::algorithm::line_intersection::line_intersection;
use geo::{Area, BoundingRect, Coord, Line, LineString, Polygon};
use thiserror::Error;

use super::segment::segments_conflict;

/// Identifies one ring of a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingId {
    Exterior,
    Hole(usize),
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingId::Exterior => write!(f, "outer ring"),
            RingId::Hole(i) => write!(f, "hole {}", i),
        }
    }
}

/// Why a polygon was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{ring} has {count} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: RingId, count: usize },
    #[error("{ring} has a non-finite coordinate at vertex {index}")]
    NonFiniteCoordinate { ring: RingId, index: usize },
    #[error("{ring} encloses no area")]
    ZeroArea { ring: RingId },
    #[error("{ring} intersects itself between segments {first} and {second}")]
    SelfIntersection {
        ring: RingId,
        first: usize,
        second: usize,
    },
    #[error("{first} and {second} intersect")]
    RingsIntersect { first: RingId, second: RingId },
    #[error("hole {hole} is not inside the outer ring")]
    HoleOutsideShell { hole: usize },
    #[error("hole {inner} lies inside hole {outer}")]
    NestedHoles { outer: usize, inner: usize },
}

/// Result of polygon validation
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Number of rings inspected
    pub rings: usize,
    /// Distinct vertices over all rings
    pub vertices: usize,
    /// Consecutive repeated vertices that were skipped
    pub duplicate_vertices: usize,
    /// Every problem found, in the order the checks ran
    pub issues: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "Polygon valid: {} rings, {} vertices ({} duplicates skipped)",
                self.rings, self.vertices, self.duplicate_vertices
            )
        } else {
            format!(
                "Polygon invalid: {} issues, first: {}",
                self.issues.len(),
                self.issues[0]
            )
        }
    }

    /// The first issue as an error, if any
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.issues.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct Ring {
    id: RingId,
    vertices: Vec<Coord<f64>>,
}

impl Ring {
    fn segments(&self) -> impl Iterator<Item = Line<f64>> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| Line::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

/// Validate a polygon and return a detailed report
pub fn validate_polygon(polygon: &Polygon<f64>) -> ValidationReport {
    let mut report = ValidationReport::default();

    let labelled = std::iter::once((RingId::Exterior, polygon.exterior())).chain(
        polygon
            .interiors()
            .iter()
            .enumerate()
            .map(|(i, ring)| (RingId::Hole(i), ring)),
    );

    let mut rings = Vec::new();
    for (id, line_string) in labelled {
        report.rings += 1;
        if let Some(ring) = check_ring(id, line_string, &mut report) {
            rings.push(ring);
        }
    }

    // Pairwise checks only make sense on rings that passed on their own
    if report.issues.is_empty() {
        check_rings_disjoint(&rings, &mut report);
    }
    if report.issues.is_empty() {
        check_nesting(&rings, &mut report);
    }

    report
}

fn check_ring(
    id: RingId,
    line_string: &LineString<f64>,
    report: &mut ValidationReport,
) -> Option<Ring> {
    let mut vertices: Vec<Coord<f64>> = Vec::with_capacity(line_string.0.len());
    for (index, &c) in line_string.0.iter().enumerate() {
        if !c.x.is_finite() || !c.y.is_finite() {
            report
                .issues
                .push(ValidationError::NonFiniteCoordinate { ring: id, index });
            return None;
        }
        if vertices.last() == Some(&c) {
            report.duplicate_vertices += 1;
            continue;
        }
        vertices.push(c);
    }
    // Closing coordinate
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    if vertices.len() < 3 {
        report.issues.push(ValidationError::TooFewVertices {
            ring: id,
            count: vertices.len(),
        });
        return None;
    }
    report.vertices += vertices.len();

    let ring = Ring { id, vertices };

    let segments: Vec<Line<f64>> = ring.segments().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            let hit = if adjacent {
                segments_conflict(segments[i], segments[j])
            } else {
                line_intersection(segments[i], segments[j]).is_some()
            };
            if hit {
                report.issues.push(ValidationError::SelfIntersection {
                    ring: id,
                    first: i,
                    second: j,
                });
                return None;
            }
        }
    }

    // A self-intersecting ring can cancel its own area, so this runs second
    let area_poly = Polygon::new(LineString::from(ring.vertices.clone()), vec![]);
    let extent = area_poly
        .bounding_rect()
        .map(|r| r.width().hypot(r.height()))
        .unwrap_or(0.0);
    if area_poly.unsigned_area() <= 1e-12 * extent * extent {
        report.issues.push(ValidationError::ZeroArea { ring: id });
        return None;
    }

    Some(ring)
}

fn check_rings_disjoint(rings: &[Ring], report: &mut ValidationReport) {
    for (a_idx, a) in rings.iter().enumerate() {
        for b in &rings[a_idx + 1..] {
            let touches = a.segments().any(|sa| {
                b.segments()
                    .any(|sb| line_intersection(sa, sb).is_some())
            });
            if touches {
                report.issues.push(ValidationError::RingsIntersect {
                    first: a.id,
                    second: b.id,
                });
            }
        }
    }
}

fn check_nesting(rings: &[Ring], report: &mut ValidationReport) {
    let Some((shell, holes)) = rings.split_first() else {
        return;
    };
    let shell_area = Polygon::new(LineString::from(shell.vertices.clone()), vec![]);

    let hole_areas: Vec<Polygon<f64>> = holes
        .iter()
        .map(|h| Polygon::new(LineString::from(h.vertices.clone()), vec![]))
        .collect();

    // Rings are disjoint at this point, so one vertex decides containment
    for (i, hole) in holes.iter().enumerate() {
        if shell_area.coordinate_position(&hole.vertices[0]) != CoordPos::Inside {
            report
                .issues
                .push(ValidationError::HoleOutsideShell { hole: i });
        }
        for (j, other) in hole_areas.iter().enumerate() {
            if i != j && other.coordinate_position(&hole.vertices[0]) == CoordPos::Inside {
                report
                    .issues
                    .push(ValidationError::NestedHoles { outer: j, inner: i });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> LineString<f64> {
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])
    }

    #[test]
    fn test_valid_polygon_with_hole() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0, 10.0), vec![square(2.0, 2.0, 4.0, 4.0)]);
        let report = validate_polygon(&poly);
        assert!(report.is_valid(), "{}", report.summary());
        assert_eq!(report.rings, 2);
        assert_eq!(report.vertices, 8);
    }

    #[test]
    fn test_duplicates_are_counted_not_rejected() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let report = validate_polygon(&poly);
        assert!(report.is_valid());
        assert_eq!(report.duplicate_vertices, 1);
        assert_eq!(report.vertices, 3);
    }

    #[test]
    fn test_bowtie_rejected() {
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
        ];
        let err = validate_polygon(&bowtie).into_result().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::SelfIntersection {
                ring: RingId::Exterior,
                ..
            }
        ));
    }

    #[test]
    fn test_too_few_vertices() {
        let poly = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]), vec![]);
        let err = validate_polygon(&poly).into_result().unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooFewVertices {
                ring: RingId::Exterior,
                count: 2
            }
        );
    }

    #[test]
    fn test_collinear_ring_has_zero_area() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]),
            vec![],
        );
        let err = validate_polygon(&poly).into_result().unwrap_err();
        assert_eq!(
            err,
            ValidationError::ZeroArea {
                ring: RingId::Exterior
            }
        );
    }

    #[test]
    fn test_non_finite_coordinate() {
        let poly = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]),
            vec![],
        );
        let err = validate_polygon(&poly).into_result().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonFiniteCoordinate {
                ring: RingId::Exterior,
                index: 1
            }
        );
    }

    #[test]
    fn test_hole_crossing_shell() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0, 10.0), vec![square(8.0, 2.0, 12.0, 4.0)]);
        let err = validate_polygon(&poly).into_result().unwrap_err();
        assert_eq!(
            err,
            ValidationError::RingsIntersect {
                first: RingId::Exterior,
                second: RingId::Hole(0)
            }
        );
    }

    #[test]
    fn test_hole_outside_shell() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0, 10.0), vec![square(20.0, 2.0, 24.0, 4.0)]);
        let err = validate_polygon(&poly).into_result().unwrap_err();
        assert_eq!(err, ValidationError::HoleOutsideShell { hole: 0 });
    }

    #[test]
    fn test_nested_holes() {
        let poly = Polygon::new(
            square(0.0, 0.0, 10.0, 10.0),
            vec![square(1.0, 1.0, 9.0, 9.0), square(3.0, 3.0, 4.0, 4.0)],
        );
        let report = validate_polygon(&poly);
        assert_eq!(
            report.issues,
            vec![ValidationError::NestedHoles { outer: 0, inner: 1 }]
        );
    }

    #[test]
    fn test_summary_names_first_issue() {
        let poly = Polygon::new(square(0.0, 0.0, 10.0, 10.0), vec![square(20.0, 2.0, 24.0, 4.0)]);
        let summary = validate_polygon(&poly).summary();
        assert!(summary.contains("hole 0 is not inside the outer ring"));
    }
}

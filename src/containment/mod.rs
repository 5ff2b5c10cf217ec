//! Containment-guaranteeing simplification of hazard polygons
//!
//! The published polygon is produced in two stages:
//! 1. shrink the true polygon inward by epsilon (mitred negative buffer),
//!    so every remaining point is at least epsilon inside;
//! 2. drop vertices with topology-preserving Douglas–Peucker, moving no
//!    boundary point by more than epsilon.
//!
//! Stage 2 can undo at most what stage 1 added, so the published polygon
//! never leaves the true one. Swapping the stages loses that guarantee.

pub mod error;

use std::fmt;

use geo::algorithm::coordinate_position::{CoordPos, CoordinatePosition};
use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, CoordsIter, MultiPolygon, Polygon, Winding};

use crate::domain::{HazardPolygon, SimplifiedPolygon, ring_vertex_count};
use crate::geometry::segment::distance_to_boundary;
use crate::geometry::{inward_offset, simplify_preserve_topology, validate_polygon};

pub use error::{ContainmentError, ParameterError};

/// Mitre limit used by the closure figures
pub const DEFAULT_MITRE_LIMIT: f64 = 2.0;

/// Why no safe simplified polygon exists at the requested tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// The inward offset left nothing: the polygon is narrower than twice
    /// epsilon everywhere.
    Collapsed,
    /// A hole grew into the outer boundary and stopped being a hole.
    HoleBreached { given: usize, surviving: usize },
    /// The inward offset came out invalid or closer than epsilon to the true
    /// boundary, so it cannot back a containment guarantee.
    InvalidIntermediate,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateReason::Collapsed => write!(f, "inward offset left an empty polygon"),
            DegenerateReason::HoleBreached { given, surviving } => write!(
                f,
                "only {} of {} holes survived the inward offset",
                surviving, given
            ),
            DegenerateReason::InvalidIntermediate => {
                write!(f, "inward offset is invalid or too close to the boundary")
            }
        }
    }
}

/// An empty or broken intermediate, reported instead of a published polygon.
///
/// The caller decides whether to retry with a smaller epsilon or to abstain
/// from publishing. The unshrunk polygon is never a substitute.
#[derive(Debug, Clone)]
pub struct DegenerateResult {
    pub reason: DegenerateReason,
    pub epsilon: f64,
    /// What the inward offset produced, possibly empty
    pub intermediate: MultiPolygon<f64>,
}

#[derive(Debug, Clone)]
pub enum SimplifyOutcome {
    Simplified(SimplifiedPolygon),
    Degenerate(DegenerateResult),
}

impl SimplifyOutcome {
    pub fn simplified(&self) -> Option<&SimplifiedPolygon> {
        match self {
            SimplifyOutcome::Simplified(s) => Some(s),
            SimplifyOutcome::Degenerate(_) => None,
        }
    }

    pub fn degenerate(&self) -> Option<&DegenerateResult> {
        match self {
            SimplifyOutcome::Simplified(_) => None,
            SimplifyOutcome::Degenerate(d) => Some(d),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, SimplifyOutcome::Degenerate(_))
    }
}

/// Turns true hazard polygons into reduced polygons safe to publish.
///
/// Holds only its parameters, so one simplifier can serve any number of
/// threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainmentSimplifier {
    epsilon: f64,
    mitre_limit: f64,
}

impl ContainmentSimplifier {
    pub fn new(epsilon: f64) -> Result<Self, ParameterError> {
        Self::with_mitre_limit(epsilon, DEFAULT_MITRE_LIMIT)
    }

    pub fn with_mitre_limit(epsilon: f64, mitre_limit: f64) -> Result<Self, ParameterError> {
        if !epsilon.is_finite() {
            return Err(ParameterError::NonFiniteEpsilon(epsilon));
        }
        if epsilon <= 0.0 {
            return Err(ParameterError::NonPositiveEpsilon(epsilon));
        }
        if !mitre_limit.is_finite() || mitre_limit < 1.0 {
            return Err(ParameterError::MitreLimitTooSmall(mitre_limit));
        }
        Ok(Self {
            epsilon,
            mitre_limit,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn mitre_limit(&self) -> f64 {
        self.mitre_limit
    }

    /// Validate `polygon`, shrink it by epsilon and reduce its vertices.
    ///
    /// Output rings follow the orientation of the input's outer ring, holes
    /// the opposite one.
    pub fn simplify(&self, polygon: &Polygon<f64>) -> Result<SimplifyOutcome, ContainmentError> {
        validate_polygon(polygon).into_result()?;

        let direction = if polygon.exterior().is_cw() {
            Direction::Reversed
        } else {
            Direction::Default
        };

        let intermediate =
            inward_offset(polygon, self.epsilon, self.mitre_limit).orient(direction);
        if intermediate.0.is_empty() {
            tracing::debug!(epsilon = self.epsilon, "inward offset collapsed");
            return Ok(self.degenerate(DegenerateReason::Collapsed, intermediate));
        }

        if !offset_is_sound(polygon, &intermediate, self.epsilon) {
            tracing::warn!(epsilon = self.epsilon, "inward offset failed its checks");
            return Ok(self.degenerate(DegenerateReason::InvalidIntermediate, intermediate));
        }

        let given = polygon.interiors().len();
        let surviving = surviving_holes(polygon, &intermediate);
        if surviving < given {
            tracing::debug!(epsilon = self.epsilon, given, surviving, "hole breached");
            return Ok(self.degenerate(
                DegenerateReason::HoleBreached { given, surviving },
                intermediate,
            ));
        }

        let shape = simplify_preserve_topology(&intermediate, self.epsilon).orient(direction);
        tracing::debug!(
            epsilon = self.epsilon,
            parts = shape.0.len(),
            intermediate_vertices = ring_vertex_count(&intermediate),
            published_vertices = ring_vertex_count(&shape),
            published_area = shape.unsigned_area(),
            "simplified hazard polygon"
        );
        Ok(SimplifyOutcome::Simplified(SimplifiedPolygon::new(
            shape,
            intermediate,
            self.epsilon,
        )))
    }

    pub fn simplify_hazard(
        &self,
        hazard: &HazardPolygon,
    ) -> Result<SimplifyOutcome, ContainmentError> {
        self.simplify(&hazard.to_geo())
    }

    fn degenerate(
        &self,
        reason: DegenerateReason,
        intermediate: MultiPolygon<f64>,
    ) -> SimplifyOutcome {
        SimplifyOutcome::Degenerate(DegenerateResult {
            reason,
            epsilon: self.epsilon,
            intermediate,
        })
    }
}

/// Whether every part of the offset is a valid polygon and every vertex lies
/// at least `epsilon` inside `truth`
fn offset_is_sound(truth: &Polygon<f64>, intermediate: &MultiPolygon<f64>, epsilon: f64) -> bool {
    let floor = epsilon * (1.0 - 1e-9);
    intermediate
        .iter()
        .all(|part| validate_polygon(part).is_valid())
        && intermediate.coords_iter().all(|c| {
            truth.coordinate_position(&c) == CoordPos::Inside
                && distance_to_boundary(truth, c) >= floor
        })
}

/// Input holes still enclosed by the outer ring of some offset part.
///
/// A breached hole ends up outside every part. Holes closed off by a
/// narrow waist do not count.
fn surviving_holes(truth: &Polygon<f64>, intermediate: &MultiPolygon<f64>) -> usize {
    let shells: Vec<Polygon<f64>> = intermediate
        .iter()
        .map(|part| Polygon::new(part.exterior().clone(), vec![]))
        .collect();
    truth
        .interiors()
        .iter()
        .filter(|hole| {
            hole.0.first().is_some_and(|c| {
                shells
                    .iter()
                    .any(|shell| shell.coordinate_position(c) == CoordPos::Inside)
            })
        })
        .count()
}

/// Simplify `hazard` at tolerance `epsilon` with the default mitre limit
pub fn simplify(
    hazard: &HazardPolygon,
    epsilon: f64,
) -> Result<SimplifyOutcome, ContainmentError> {
    ContainmentSimplifier::new(epsilon)?.simplify_hazard(hazard)
}

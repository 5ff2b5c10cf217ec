//! drc-contain - containment-guaranteeing simplification of hazard polygons

pub mod config;
pub mod containment;
pub mod domain;
pub mod geometry;

pub use containment::{
    ContainmentError, ContainmentSimplifier, DegenerateReason, DegenerateResult, ParameterError,
    SimplifyOutcome, simplify,
};
pub use domain::{HazardPolygon, SimplifiedPolygon};

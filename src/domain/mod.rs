pub mod hazard;
pub mod published;

pub use hazard::HazardPolygon;
pub use published::{RenderedShape, RingSet, SimplifiedPolygon, ring_vertex_count};

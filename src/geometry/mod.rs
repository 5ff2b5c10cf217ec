pub mod bounds;
pub mod offset;
pub mod segment;
pub mod simplify;
pub mod validation;

pub use bounds::Bounds;
pub use offset::inward_offset;
pub use simplify::simplify_preserve_topology;
pub use validation::{RingId, ValidationError, ValidationReport, validate_polygon};

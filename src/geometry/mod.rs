pub mod curve;
pub mod plane;
pub mod polyline;
pub mod segment;

pub use curve::Curve;
pub use plane::Plane;
pub use polyline::Polyline;
pub use segment::Segment;

//! Planar geometry kernel: Boolean algebra on lines and polygonal regions,
//! multi-distance polyline offsetting and reconstruction of nested regions
//! from unordered segments.

pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod topology;

pub use error::{KernelError, Result, Warning};
pub use math::Tolerance;

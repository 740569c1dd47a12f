pub mod distance_2d;
pub mod intersect_2d;
pub mod intersect_3d;
pub mod polygon_2d;
pub mod polygon_3d;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Default distance tolerance used by [`Tolerance::default`].
pub const DEFAULT_DISTANCE_TOLERANCE: f64 = 1e-6;

/// Default angle tolerance in radians used by [`Tolerance::default`].
pub const DEFAULT_ANGLE_TOLERANCE: f64 = 1e-6;

/// Tolerances shared by every kernel operation.
///
/// - `distance`: two points closer than this are the same point; segments
///   shorter than this are degenerate.
/// - `angle`: two directions closer than this (in radians) are parallel.
/// - `fine`: tie-break threshold for boundary predicates, always small
///   compared to `distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    pub distance: f64,
    pub angle: f64,
    pub fine: f64,
}

impl Tolerance {
    /// Creates a tolerance set from a distance tolerance, deriving the
    /// fine tolerance as `distance * 1e-3`.
    #[must_use]
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            angle: DEFAULT_ANGLE_TOLERANCE,
            fine: distance * 1e-3,
        }
    }

    /// Replaces the angle tolerance.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Replaces the fine tolerance.
    #[must_use]
    pub fn with_fine(mut self, fine: f64) -> Self {
        self.fine = fine;
        self
    }

    /// Squared distance tolerance, for comparisons against squared distances.
    #[must_use]
    pub fn distance_sq(&self) -> f64 {
        self.distance * self.distance
    }

    /// Returns `true` when `a` and `b` are the same point within tolerance.
    #[must_use]
    pub fn same_point(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm_squared() <= self.distance_sq()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE_TOLERANCE)
    }
}

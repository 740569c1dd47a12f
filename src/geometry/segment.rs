use crate::math::{Point3, Tolerance, Vector3};

/// A finite straight segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub start: Point3,
    pub end: Point3,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Returns the segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Returns `true` when the segment is no longer than the distance tolerance.
    #[must_use]
    pub fn is_degenerate(&self, tol: &Tolerance) -> bool {
        self.length() <= tol.distance
    }

    /// Returns the unit direction, or `None` for a zero-length segment.
    #[must_use]
    pub fn direction(&self) -> Option<Vector3> {
        (self.end - self.start).try_normalize(crate::math::TOLERANCE)
    }

    /// Returns the point at parameter `t` (`0` = start, `1` = end).
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.start + (self.end - self.start) * t
    }

    /// Returns the midpoint.
    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        nalgebra::center(&self.start, &self.end)
    }

    /// Returns the segment with start and end swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }

    /// Distance from `point` to the closest point of the segment.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        let d = self.end - self.start;
        let len_sq = d.norm_squared();
        if len_sq < 1e-20 {
            return (point - self.start).norm();
        }
        let t = ((point - self.start).dot(&d) / len_sq).clamp(0.0, 1.0);
        (point - self.point_at(t)).norm()
    }

    /// Distance from `point` to the infinite line through the segment.
    #[must_use]
    pub fn line_distance_to(&self, point: &Point3) -> f64 {
        match self.direction() {
            Some(dir) => (point - self.start).cross(&dir).norm(),
            None => (point - self.start).norm(),
        }
    }

    /// Returns `true` when both segments lie on the same infinite line within
    /// tolerance. Degenerate segments are never collinear with anything.
    #[must_use]
    pub fn is_collinear_with(&self, other: &Segment, tol: &Tolerance) -> bool {
        if self.is_degenerate(tol) || other.is_degenerate(tol) {
            return false;
        }
        let (base, probe) = if self.length() >= other.length() {
            (self, other)
        } else {
            (other, self)
        };
        base.line_distance_to(&probe.start) <= tol.distance
            && base.line_distance_to(&probe.end) <= tol.distance
    }

    /// Returns `true` when the two segments share an endpoint within tolerance.
    #[must_use]
    pub fn touches(&self, other: &Segment, tol: &Tolerance) -> bool {
        tol.same_point(&self.start, &other.start)
            || tol.same_point(&self.start, &other.end)
            || tol.same_point(&self.end, &other.start)
            || tol.same_point(&self.end, &other.end)
    }
}

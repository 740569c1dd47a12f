use super::distance_2d::point_to_boundary_dist_sq_2d;
use super::{Point3, TOLERANCE};

/// Classification of a point relative to a closed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
}

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Rotates a closed polygon so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y. Ensures deterministic output for tests.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point3]) -> Vec<Point3> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let best = leftmost_bottom_index(points);
    if best == 0 {
        return points.to_vec();
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Returns the index of the leftmost-bottommost point (smallest x, then smallest y).
#[must_use]
pub fn leftmost_bottom_index(points: &[Point3]) -> usize {
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    best
}

/// Classifies `point` against the closed polygon `polygon` in the XY plane.
///
/// Points within `tol` of an edge are [`OnBoundary`](PointClassification::OnBoundary);
/// otherwise the winding number decides.
#[must_use]
pub fn classify_point_2d(point: &Point3, polygon: &[Point3], tol: f64) -> PointClassification {
    if polygon.len() < 3 {
        return PointClassification::Outside;
    }
    if point_to_boundary_dist_sq_2d(point, polygon) <= tol * tol {
        return PointClassification::OnBoundary;
    }
    if winding_number_2d(point.x, point.y, polygon) == 0 {
        PointClassification::Outside
    } else {
        PointClassification::Inside
    }
}

/// Point-in-polygon test in the XY plane.
///
/// Boundary points count as inside only when `include_boundary` is set.
#[must_use]
pub fn point_in_polygon_2d(
    point: &Point3,
    polygon: &[Point3],
    include_boundary: bool,
    tol: f64,
) -> bool {
    match classify_point_2d(point, polygon, tol) {
        PointClassification::Inside => true,
        PointClassification::OnBoundary => include_boundary,
        PointClassification::Outside => false,
    }
}

/// Winding number of point `(px, py)` with respect to polygon `verts`.
///
/// Non-zero => inside, zero => outside.
fn winding_number_2d(px: f64, py: f64, verts: &[Point3]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let (x0, y0) = (verts[i].x, verts[i].y);
        let (x1, y1) = (verts[(i + 1) % n].x, verts[(i + 1) % n].y);

        if y0 <= py {
            if y1 > py && cross_2d(x1 - x0, y1 - y0, px - x0, py - y0) > 0.0 {
                winding += 1;
            }
        } else if y1 <= py && cross_2d(x1 - x0, y1 - y0, px - x0, py - y0) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// 2D cross product: `(ax * by - ay * bx)`.
#[inline]
#[must_use]
pub fn cross_2d(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

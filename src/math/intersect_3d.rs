use super::{Point3, TOLERANCE};

/// Closest approach of two finite segments `a0→a1` and `b0→b1`.
///
/// Returns `(s, t, pa, pb)` where `pa = a0 + s * (a1 - a0)` and
/// `pb = b0 + t * (b1 - b0)` are the closest points, `s, t ∈ [0, 1]`.
#[must_use]
#[allow(clippy::many_single_char_names, clippy::similar_names)]
pub fn segment_segment_closest_3d(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
) -> (f64, f64, Point3, Point3) {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a < TOLERANCE && e < TOLERANCE {
        (0.0, 0.0)
    } else if a < TOLERANCE {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e < TOLERANCE {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom.abs() > TOLERANCE * a * e {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (s, t, a0 + d1 * s, b0 + d2 * t)
}

/// Intersection point of two finite, non-parallel segments in 3D.
///
/// The segments intersect when their closest approach is within `tol`; the
/// returned point is the midpoint of the two closest points. Parallel
/// segments return `None`: collinear overlap is a line Boolean concern.
#[must_use]
pub fn segment_intersection_3d(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
    tol: f64,
) -> Option<Point3> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let len1 = d1.norm();
    let len2 = d2.norm();
    if len1 < TOLERANCE || len2 < TOLERANCE {
        return None;
    }
    if d1.cross(&d2).norm() / (len1 * len2) < TOLERANCE {
        return None;
    }
    let (_, _, pa, pb) = segment_segment_closest_3d(a0, a1, b0, b1);
    if (pa - pb).norm() <= tol {
        Some(nalgebra::center(&pa, &pb))
    } else {
        None
    }
}

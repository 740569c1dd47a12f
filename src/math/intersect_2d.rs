use super::{Point3, Vector3, TOLERANCE};

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point3,
    d1: &Vector3,
    p2: &Point3,
    d2: &Vector3,
) -> Option<(f64, f64)> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < TOLERANCE {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    let u = (dx * d1.y - dy * d1.x) / cross;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// `tol` is a distance: crossings that land within `tol` beyond either end of
/// a segment still count, and are clamped onto it. Parallel segments never
/// intersect here; overlap of collinear segments is handled by the line
/// Boolean operations.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point3,
    a1: &Point3,
    b0: &Point3,
    b1: &Point3,
    tol: f64,
) -> Option<(Point3, f64, f64)> {
    let da = Vector3::new(a1.x - a0.x, a1.y - a0.y, 0.0);
    let db = Vector3::new(b1.x - b0.x, b1.y - b0.y, 0.0);
    let len_a = da.norm();
    let len_b = db.norm();
    if len_a < TOLERANCE || len_b < TOLERANCE {
        return None;
    }

    let cross = da.x * db.y - da.y * db.x;
    if (cross / (len_a * len_b)).abs() < TOLERANCE {
        return None;
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = (dx * db.y - dy * db.x) / cross;
    let u = (dx * da.y - dy * da.x) / cross;

    let eps_t = tol / len_a;
    let eps_u = tol / len_b;
    if t >= -eps_t && t <= 1.0 + eps_t && u >= -eps_u && u <= 1.0 + eps_u {
        let t_clamped = t.clamp(0.0, 1.0);
        let pt = Point3::new(a0.x + da.x * t_clamped, a0.y + da.y * t_clamped, a0.z);
        Some((pt, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn crossing_segments() {
        let (p, t, u) = segment_segment_intersect_2d(
            &pt(0.0, 0.0),
            &pt(2.0, 2.0),
            &pt(0.0, 2.0),
            &pt(2.0, 0.0),
            1e-9,
        )
        .unwrap();
        assert!((p.x - 1.0).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12 && (u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn near_miss_within_tolerance_is_clamped() {
        // B stops 1e-4 short of A.
        let hit = segment_segment_intersect_2d(
            &pt(0.0, 0.0),
            &pt(2.0, 0.0),
            &pt(1.0, 1.0),
            &pt(1.0, 1e-4),
            1e-3,
        );
        let (p, _, u) = hit.unwrap();
        assert!((p.x - 1.0).abs() < 1e-12 && p.y.abs() < 1e-12);
        assert!((u - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(segment_segment_intersect_2d(
            &pt(0.0, 0.0),
            &pt(2.0, 0.0),
            &pt(0.0, 1.0),
            &pt(2.0, 1.0),
            1e-6,
        )
        .is_none());
    }

    #[test]
    fn line_line_parameters() {
        let (t, u) = line_line_intersect_2d(
            &pt(0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &pt(3.0, -1.0),
            &Vector3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!((t - 3.0).abs() < 1e-12);
        assert!((u - 1.0).abs() < 1e-12);
    }
}

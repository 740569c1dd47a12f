use super::Point3;

/// Returns the parameter in `[0, 1]` of the point on segment `a`→`b` closest
/// to `p`, working in the XY plane.
#[must_use]
pub fn closest_param_on_segment_2d(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-20 {
        return 0.0;
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq;
    t.clamp(0.0, 1.0)
}

/// Returns the squared minimum distance from `p` to the segment `a`→`b` in
/// the XY plane.
#[must_use]
pub fn point_to_segment_dist_sq_2d(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let t = closest_param_on_segment_2d(p, a, b);
    let closest_x = a.x + t * (b.x - a.x);
    let closest_y = a.y + t * (b.y - a.y);
    (p.x - closest_x).powi(2) + (p.y - closest_y).powi(2)
}

/// Returns the minimum distance from `p` to the segment `a`→`b` in the XY plane.
#[must_use]
pub fn point_to_segment_dist_2d(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    point_to_segment_dist_sq_2d(p, a, b).sqrt()
}

/// Returns the squared distance from `p` to the closest edge of the closed
/// polygon `polygon` (XY plane).
#[must_use]
pub fn point_to_boundary_dist_sq_2d(p: &Point3, polygon: &[Point3]) -> f64 {
    let n = polygon.len();
    let mut best = f64::MAX;
    for i in 0..n {
        let d = point_to_segment_dist_sq_2d(p, &polygon[i], &polygon[(i + 1) % n]);
        best = best.min(d);
    }
    best
}

use crate::geometry::plane::Plane;

use super::{Point3, Vector3, TOLERANCE};

/// A plane fitted to a point set, with the largest out-of-plane deviation.
#[derive(Debug, Clone)]
pub struct FittedPlane {
    pub plane: Plane,
    pub deviation: f64,
}

/// Newell normal of a closed polygon, scaled by twice its area.
///
/// Zero for fewer than three points or a zero-area loop.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    if n < 3 {
        return normal;
    }
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Signed area of a closed polygon with respect to `normal`.
///
/// Positive when the polygon winds counter-clockwise seen from the tip of `normal`.
#[must_use]
pub fn polygon_signed_area_3d(points: &[Point3], normal: &Vector3) -> f64 {
    let len = normal.norm();
    if len < TOLERANCE {
        return 0.0;
    }
    0.5 * newell_normal(points).dot(normal) / len
}

/// Normal from the first non-collinear triple of an ordered point sequence.
///
/// Used for open curves where a Newell normal is not meaningful.
#[must_use]
pub fn normal_from_triples(points: &[Point3], angle_tol: f64) -> Option<Vector3> {
    let first = points.first()?;
    for (i, a) in points.iter().enumerate().skip(1) {
        let da = a - first;
        if da.norm() < TOLERANCE {
            continue;
        }
        for b in &points[i + 1..] {
            let db = b - a;
            if db.norm() < TOLERANCE {
                continue;
            }
            let cross = da.cross(&db);
            let sin = cross.norm() / (da.norm() * db.norm());
            if sin > angle_tol {
                return Some(cross.normalize());
            }
        }
    }
    None
}

/// Fits a plane through `points`.
///
/// Returns `None` when there are fewer than three points or they are all
/// collinear within `tol`. The plane passes through the centroid; its normal
/// follows the Newell normal of the sequence when that is non-zero, so a
/// counter-clockwise loop gets the normal it winds around.
#[must_use]
pub fn fit_plane(points: &[Point3], tol: f64) -> Option<FittedPlane> {
    if points.len() < 3 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f64;
    let centroid = Point3::from(
        points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / count,
    );

    // Widest spread from the centroid gives the first in-plane axis.
    let far = points
        .iter()
        .max_by(|a, b| {
            (*a - centroid)
                .norm_squared()
                .total_cmp(&(*b - centroid).norm_squared())
        })?;
    let u = far - centroid;
    if u.norm() <= tol {
        return None;
    }

    let (best_cross, best_len) = points
        .iter()
        .map(|p| {
            let c = u.cross(&(p - centroid));
            let len = c.norm();
            (c, len)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    // Perpendicular spread of the best point off the first axis.
    if best_len / u.norm() <= tol {
        return None;
    }
    let mut normal = best_cross / best_len;

    let newell = newell_normal(points);
    if newell.norm() > TOLERANCE && newell.dot(&normal) < 0.0 {
        normal = -normal;
    }

    let plane = Plane::from_normal(centroid, normal).ok()?;
    let deviation = points
        .iter()
        .map(|p| plane.signed_distance(p).abs())
        .fold(0.0, f64::max);

    Some(FittedPlane { plane, deviation })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_square() -> Vec<Point3> {
        vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn newell_normal_of_ccw_square_points_up() {
        let n = newell_normal(&unit_square());
        assert!((n.z - 2.0).abs() < 1e-12);
        assert!(n.x.abs() < 1e-12 && n.y.abs() < 1e-12);
    }

    #[test]
    fn signed_area_follows_normal() {
        let up = Vector3::new(0.0, 0.0, 1.0);
        assert!((polygon_signed_area_3d(&unit_square(), &up) - 1.0).abs() < 1e-12);
        assert!((polygon_signed_area_3d(&unit_square(), &-up) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_plane_of_tilted_square() {
        let pts: Vec<Point3> = unit_square().iter().map(|q| p(q.x, q.y, q.x)).collect();
        let fitted = fit_plane(&pts, 1e-9).unwrap();
        assert!(fitted.deviation < 1e-9);
        let n = fitted.plane.plane_normal();
        let expected = Vector3::new(-1.0, 0.0, 1.0).normalize();
        assert!((n - expected).norm() < 1e-9, "normal {n:?}");
    }

    #[test]
    fn fit_plane_rejects_collinear_points() {
        let pts = vec![p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0)];
        assert!(fit_plane(&pts, 1e-9).is_none());
    }

    #[test]
    fn fit_plane_reports_deviation() {
        let mut pts = unit_square();
        pts.push(p(0.5, 0.5, 0.1));
        let fitted = fit_plane(&pts, 1e-9).unwrap();
        assert!(fitted.deviation > 0.01);
    }

    #[test]
    fn triples_skip_collinear_prefix() {
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 1.0, 0.0),
        ];
        let n = normal_from_triples(&pts, 1e-9).unwrap();
        assert!((n.z - 1.0).abs() < 1e-12);
        assert!(normal_from_triples(&pts[..3], 1e-9).is_none());
    }
}

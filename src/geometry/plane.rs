use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space with an orthonormal local frame.
///
/// Defined by an origin point and two orthogonal unit directions
/// (`u_dir`, `v_dir`). The normal is `u_dir × v_dir`.
///
/// Local coordinates are `(u, v, w)` with `w` the signed distance along the
/// normal, so planar algorithms can run on the XY components of
/// [`to_local`](Self::to_local) and map results back with
/// [`to_world`](Self::to_world).
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new plane from an origin and two direction vectors.
    ///
    /// `v_dir` only needs to be non-parallel to `u_dir`; it is
    /// re-orthogonalised against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length
    /// or parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let v_len = v_dir.norm();
        if v_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }

        let u_dir = u_dir / u_len;
        let normal = u_dir.cross(&(v_dir / v_len));
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("plane directions are parallel".into()).into(),
            );
        }
        let normal = normal / normal_len;
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let v_dir = normal.cross(&reference).normalize();
        let u_dir = v_dir.cross(&normal);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the normal vector of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the same plane with the normal (and V direction) flipped.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            u_dir: self.u_dir,
            v_dir: -self.v_dir,
            normal: -self.normal,
        }
    }

    /// Signed distance from `point` to the plane along the normal.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Expresses a world point in local `(u, v, w)` coordinates.
    #[must_use]
    pub fn to_local(&self, point: &Point3) -> Point3 {
        let diff = point - self.origin;
        Point3::new(
            diff.dot(&self.u_dir),
            diff.dot(&self.v_dir),
            diff.dot(&self.normal),
        )
    }

    /// Maps local `(u, v, w)` coordinates back to world space.
    #[must_use]
    pub fn to_world(&self, local: &Point3) -> Point3 {
        self.origin + self.u_dir * local.x + self.v_dir * local.y + self.normal * local.z
    }

    /// Projects `points` into the plane's XY frame, dropping the normal component.
    #[must_use]
    pub fn flatten(&self, points: &[Point3]) -> Vec<Point3> {
        points
            .iter()
            .map(|p| {
                let local = self.to_local(p);
                Point3::new(local.x, local.y, 0.0)
            })
            .collect()
    }

    /// Maps flattened XY points back onto the plane in world space.
    #[must_use]
    pub fn unflatten(&self, points: &[Point3]) -> Vec<Point3> {
        points
            .iter()
            .map(|p| self.to_world(&Point3::new(p.x, p.y, 0.0)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    #[test]
    fn new_orthogonalises_v() {
        let plane = Plane::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(1.0, 1.0, 0.0)).unwrap();
        assert!(plane.u_dir().dot(plane.v_dir()).abs() < TOLERANCE);
        assert!((plane.plane_normal() - v(0.0, 0.0, 1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn parallel_directions_are_rejected() {
        assert!(Plane::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(2.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn from_normal_is_right_handed() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 2.0)).unwrap();
        let n = plane.u_dir().cross(plane.v_dir());
        assert!((n - plane.plane_normal()).norm() < TOLERANCE);
    }

    #[test]
    fn local_world_roundtrip() {
        let plane = Plane::from_normal(p(1.0, 2.0, 3.0), v(1.0, 1.0, 1.0)).unwrap();
        let q = p(4.0, -2.0, 0.5);
        let back = plane.to_world(&plane.to_local(&q));
        assert!((back - q).norm() < 1e-12);
    }

    #[test]
    fn project_removes_normal_component() {
        let plane = Plane::from_normal(p(0.0, 0.0, 1.0), v(0.0, 0.0, 1.0)).unwrap();
        let q = plane.project(&p(3.0, 4.0, 7.0));
        assert!((q - p(3.0, 4.0, 1.0)).norm() < 1e-12);
        assert!((plane.signed_distance(&p(0.0, 0.0, -1.0)) + 2.0).abs() < 1e-12);
    }
}

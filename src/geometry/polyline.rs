use crate::math::polygon_2d::{classify_point_2d, PointClassification};
use crate::math::polygon_3d::{fit_plane, newell_normal, polygon_signed_area_3d, FittedPlane};
use crate::math::{Point3, Tolerance, Vector3};

use super::segment::Segment;

/// An ordered sequence of control points joined by straight segments.
///
/// For closed polylines the last point connects back to the first; the
/// closing point is never stored twice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polyline {
    pub points: Vec<Point3>,
    pub closed: bool,
}

impl Polyline {
    /// Creates a polyline from its points and closure flag.
    #[must_use]
    pub fn new(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Creates an open polyline.
    #[must_use]
    pub fn open(points: Vec<Point3>) -> Self {
        Self::new(points, false)
    }

    /// Creates a closed polyline.
    #[must_use]
    pub fn closed(points: Vec<Point3>) -> Self {
        Self::new(points, true)
    }

    /// Creates a polyline from raw points, treating it as closed when the
    /// first and last points coincide within tolerance (the duplicate is dropped).
    #[must_use]
    pub fn from_points(mut points: Vec<Point3>, tol: &Tolerance) -> Self {
        let closes = points.len() > 3
            && tol.same_point(&points[0], &points[points.len() - 1]);
        if closes {
            points.pop();
        }
        Self::new(points, closes)
    }

    /// Returns the number of control points.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of segments in this polyline.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let n = self.points.len();
        if n < 2 {
            return 0;
        }
        if self.closed {
            n
        } else {
            n - 1
        }
    }

    /// Returns segment `i` (the closing segment for `i == n - 1` on closed polylines).
    #[must_use]
    pub fn segment(&self, i: usize) -> Segment {
        let n = self.points.len();
        Segment::new(self.points[i], self.points[(i + 1) % n])
    }

    /// Returns all segments in order.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        (0..self.segment_count()).map(|i| self.segment(i)).collect()
    }

    /// First control point.
    #[must_use]
    pub fn start(&self) -> Option<&Point3> {
        self.points.first()
    }

    /// Last point reached when walking the polyline (the first point again
    /// for closed polylines).
    #[must_use]
    pub fn end(&self) -> Option<&Point3> {
        if self.closed {
            self.points.first()
        } else {
            self.points.last()
        }
    }

    /// Returns a new polyline with the points in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            points,
            closed: self.closed,
        }
    }

    /// Total length (perimeter for closed polylines).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments().iter().map(Segment::length).sum()
    }

    /// Average of the control points.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        if self.points.is_empty() {
            return Point3::origin();
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.points.len() as f64;
        Point3::from(
            self.points
                .iter()
                .fold(Vector3::zeros(), |acc, p| acc + p.coords)
                / count,
        )
    }

    /// Signed area with respect to `normal` (zero for open polylines).
    ///
    /// Positive when the loop winds counter-clockwise seen from the tip of `normal`.
    #[must_use]
    pub fn signed_area(&self, normal: &Vector3) -> f64 {
        if !self.closed {
            return 0.0;
        }
        polygon_signed_area_3d(&self.points, normal)
    }

    /// Unsigned enclosed area (zero for open polylines).
    #[must_use]
    pub fn area(&self) -> f64 {
        if !self.closed {
            return 0.0;
        }
        0.5 * newell_normal(&self.points).norm()
    }

    /// Returns `true` when the loop winds clockwise seen from the tip of `normal`.
    #[must_use]
    pub fn is_clockwise(&self, normal: &Vector3) -> bool {
        self.signed_area(normal) < 0.0
    }

    /// Fits a plane through the control points.
    #[must_use]
    pub fn plane(&self, tol: &Tolerance) -> Option<FittedPlane> {
        fit_plane(&self.points, tol.distance)
    }

    /// Returns `true` if every point of `points` lies inside this closed
    /// polyline. Boundary points count only with `include_boundary`.
    #[must_use]
    pub fn contains_points(&self, points: &[Point3], include_boundary: bool, tol: &Tolerance) -> bool {
        if !self.closed {
            return false;
        }
        let Some(fitted) = self.plane(tol) else {
            return false;
        };
        let flat = fitted.plane.flatten(&self.points);
        points.iter().all(|p| {
            if fitted.plane.signed_distance(p).abs() > tol.distance {
                return false;
            }
            let q = fitted.plane.flatten(std::slice::from_ref(p))[0];
            match classify_point_2d(&q, &flat, tol.distance) {
                PointClassification::Inside => true,
                PointClassification::OnBoundary => include_boundary,
                PointClassification::Outside => false,
            }
        })
    }

    /// Returns a copy without consecutive duplicate points (and without a
    /// duplicated closing point for closed polylines).
    #[must_use]
    pub fn without_degenerate_segments(&self, tol: &Tolerance) -> Self {
        let mut points: Vec<Point3> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if points.last().is_some_and(|last| tol.same_point(last, p)) {
                continue;
            }
            points.push(*p);
        }
        if self.closed {
            while points.len() > 1 && tol.same_point(&points[0], &points[points.len() - 1]) {
                points.pop();
            }
        }
        Self {
            points,
            closed: self.closed,
        }
    }

    /// Returns a copy with interior vertices removed where the polyline runs
    /// straight through them (the vertex is within tolerance of the line through
    /// its neighbours and does not reverse direction).
    #[must_use]
    pub fn without_collinear_vertices(&self, tol: &Tolerance) -> Self {
        let mut points = self.without_degenerate_segments(tol).points;
        let mut changed = true;
        while changed && points.len() > 2 {
            changed = false;
            let n = points.len();
            let (first, last) = if self.closed { (0, n) } else { (1, n - 1) };
            for i in first..last {
                let prev = points[(i + n - 1) % n];
                let next = points[(i + 1) % n];
                let cur = points[i];
                let chord = Segment::new(prev, next);
                let straight = (cur - prev).dot(&(next - cur)) > 0.0;
                if straight && chord.line_distance_to(&cur) <= tol.distance {
                    points.remove(i);
                    changed = true;
                    break;
                }
            }
            if self.closed && points.len() < 3 {
                break;
            }
        }
        Self {
            points,
            closed: self.closed,
        }
    }

    /// Splits the polyline at every point of `cuts` lying on it (within
    /// tolerance), returning the open pieces in walking order.
    ///
    /// A closed polyline cut at `k >= 1` stations yields `k` pieces, the
    /// first starting at the first station; with a single station the piece
    /// starts and ends there. Cuts off the polyline are ignored. An uncut
    /// polyline is returned whole (closed polylines stay closed).
    #[must_use]
    pub fn split_at_points(&self, cuts: &[Point3], tol: &Tolerance) -> Vec<Polyline> {
        let n = self.points.len();
        let seg_count = self.segment_count();
        if seg_count == 0 {
            return Vec::new();
        }

        // Stations per segment as (t, point); vertex hits are stored at t = 0
        // of the outgoing segment.
        let mut stations: Vec<Vec<(f64, Point3)>> = vec![Vec::new(); seg_count];
        for cut in cuts {
            let Some(i) = (0..seg_count).find(|&i| self.segment(i).distance_to(cut) <= tol.distance)
            else {
                continue;
            };
            let seg = self.segment(i);
            if tol.same_point(&seg.start, cut) {
                push_station(&mut stations[i], 0.0, seg.start, tol);
            } else if tol.same_point(&seg.end, cut) {
                if i + 1 < seg_count {
                    push_station(&mut stations[i + 1], 0.0, seg.end, tol);
                } else if self.closed {
                    push_station(&mut stations[0], 0.0, seg.end, tol);
                }
            } else {
                let d = seg.end - seg.start;
                let t = (cut - seg.start).dot(&d) / d.norm_squared();
                push_station(&mut stations[i], t, seg.point_at(t), tol);
            }
        }

        // Flatten into a walk of (point, is_cut).
        let mut walk: Vec<(Point3, bool)> = Vec::with_capacity(n + cuts.len());
        for (i, seg_stations) in stations.iter_mut().enumerate() {
            seg_stations.sort_by(|a, b| a.0.total_cmp(&b.0));
            let starts_with_cut = seg_stations.first().is_some_and(|s| s.0 <= 0.0);
            walk.push((self.points[i], starts_with_cut));
            for &(_, p) in seg_stations.iter().filter(|s| s.0 > 0.0) {
                walk.push((p, true));
            }
        }
        if !self.closed {
            walk.push((self.points[n - 1], false));
        }

        let Some(first_cut) = walk.iter().position(|w| w.1) else {
            return vec![self.without_degenerate_segments(tol)];
        };

        if self.closed {
            walk.rotate_left(first_cut);
            walk.push(walk[0]);
        }

        let mut pieces = Vec::new();
        let mut current: Vec<Point3> = Vec::new();
        for (k, &(p, is_cut)) in walk.iter().enumerate() {
            if current.last().is_none_or(|last| !tol.same_point(last, &p)) {
                current.push(p);
            }
            if is_cut && k > 0 {
                finish_piece(&mut pieces, std::mem::take(&mut current), tol);
                current.push(p);
            }
        }
        finish_piece(&mut pieces, current, tol);
        pieces
    }
}

fn push_station(stations: &mut Vec<(f64, Point3)>, t: f64, p: Point3, tol: &Tolerance) {
    if stations.iter().any(|(_, q)| tol.same_point(q, &p)) {
        return;
    }
    stations.push((t, p));
}

fn finish_piece(pieces: &mut Vec<Polyline>, points: Vec<Point3>, tol: &Tolerance) {
    let piece = Polyline::open(points);
    if piece.points.len() >= 2 && piece.length() > tol.distance {
        pieces.push(piece);
    }
}

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::{Curve, Polyline, Segment};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::polygon_2d::{classify_point_2d, signed_area_2d, PointClassification};
use crate::math::{Point3, Tolerance};
use crate::topology::{bounded_faces, LineGraph};

/// Splits a closed region along cutting lines.
///
/// The boundary and the cutting lines are cut at every mutual crossing.
/// Pieces of cutting lines outside the region are discarded and dangling
/// chord ends are pruned. Every bounded face of the resulting planar graph
/// is then returned; together the faces partition the region. Faces are
/// counter-clockwise about the region's own normal. A degenerate region
/// yields no faces.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] for an open polyline,
/// [`OperationError::NotPlanar`] when the region deviates from its fitted
/// plane by more than the distance tolerance, and
/// [`OperationError::SelfIntersecting`] when two non-adjacent boundary edges
/// meet.
pub fn split(outer: &Polyline, cutting_lines: &[Segment], tol: &Tolerance) -> Result<Vec<Polyline>> {
    if !outer.closed {
        return Err(OperationError::InvalidInput("split requires a closed region".into()).into());
    }
    let outer = outer.without_degenerate_segments(tol);
    let Some(fitted) = outer.plane(tol) else {
        return Ok(Vec::new());
    };
    if fitted.deviation > tol.distance {
        return Err(OperationError::NotPlanar {
            deviation: fitted.deviation,
        }
        .into());
    }
    let plane = fitted.plane;

    let mut boundary = plane.flatten(&outer.points);
    if let Some(p) = first_self_intersection(&boundary, tol) {
        let w = plane.to_world(&p);
        return Err(OperationError::SelfIntersecting {
            x: w.x,
            y: w.y,
            z: w.z,
        }
        .into());
    }
    if signed_area_2d(&boundary) < 0.0 {
        boundary.reverse();
    }

    let n = boundary.len();
    let mut segments: Vec<Segment> = (0..n)
        .map(|i| Segment::new(boundary[i], boundary[(i + 1) % n]))
        .collect();
    let boundary_count = segments.len();
    segments.extend(cutting_lines.iter().map(|c| {
        let flat = plane.flatten(&[c.start, c.end]);
        Segment::new(flat[0], flat[1])
    }));

    let pieces = split_at_crossings(&segments, tol);
    let inside: Vec<Segment> = pieces
        .into_iter()
        .filter(|(index, piece)| {
            *index < boundary_count
                || classify_point_2d(&piece.midpoint(), &boundary, tol.distance)
                    == PointClassification::Inside
        })
        .map(|(_, piece)| piece)
        .collect();

    let mut graph = LineGraph::from_segments(&inside, tol.distance);
    let pruned = graph.prune_dangling();
    let faces = bounded_faces(&graph, tol.distance_sq());
    debug!(
        cuts = cutting_lines.len(),
        pruned,
        faces = faces.len(),
        "region split"
    );

    Ok(faces
        .into_iter()
        .map(|face| {
            Polyline::closed(face)
                .without_collinear_vertices(tol)
                .points
        })
        .map(|pts| Polyline::closed(plane.unflatten(&pts)))
        .collect())
}

/// Cuts every segment at its crossings with every other segment, keeping
/// the index of the segment each piece came from.
fn split_at_crossings(segments: &[Segment], tol: &Tolerance) -> Vec<(usize, Segment)> {
    let mut cuts: Vec<Vec<Point3>> = vec![Vec::new(); segments.len()];
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            let (a, b) = (&segments[i], &segments[j]);
            if let Some((p, _, _)) =
                segment_segment_intersect_2d(&a.start, &a.end, &b.start, &b.end, tol.distance)
            {
                cuts[i].push(p);
                cuts[j].push(p);
            }
        }
    }
    segments
        .iter()
        .zip(cuts)
        .enumerate()
        .flat_map(|(index, (seg, points))| {
            Curve::Line(*seg)
                .split_at_points(&points, tol)
                .into_iter()
                .filter_map(move |piece| match piece {
                    Curve::Line(s) => Some((index, s)),
                    Curve::Polyline(_) => None,
                })
        })
        .collect()
}

/// First crossing between two non-adjacent edges of a closed loop.
fn first_self_intersection(points: &[Point3], tol: &Tolerance) -> Option<Point3> {
    let n = points.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a0, a1) = (&points[i], &points[(i + 1) % n]);
            let (b0, b1) = (&points[j], &points[(j + 1) % n]);
            if let Some((p, _, _)) = segment_segment_intersect_2d(a0, a1, b0, b1, tol.distance) {
                return Some(p);
            }
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::KernelError;
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square() -> Polyline {
        Polyline::closed(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)])
    }

    #[test]
    fn single_chord_gives_two_faces() {
        let cut = [Segment::new(p(2.0, -1.0), p(2.0, 5.0))];
        let faces = split(&square(), &cut, &Tolerance::default()).unwrap();
        assert_eq!(faces.len(), 2);
        for face in &faces {
            assert_eq!(face.vertex_count(), 4);
            assert_relative_eq!(face.signed_area(&Vector3::z()), 8.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn off_centre_chords_give_unequal_faces() {
        let tol = Tolerance::default();
        for cut in [
            Segment::new(p(1.0, -1.0), p(1.0, 5.0)),
            Segment::new(p(3.0, 5.0), p(3.0, -1.0)),
            Segment::new(p(-1.0, 3.0), p(5.0, 3.0)),
        ] {
            let faces = split(&square(), &[cut], &tol).unwrap();
            assert_eq!(faces.len(), 2);
            let mut areas: Vec<f64> = faces
                .iter()
                .map(|f| f.signed_area(&Vector3::z()))
                .collect();
            areas.sort_by(f64::total_cmp);
            assert_relative_eq!(areas[0], 4.0, epsilon = 1e-9);
            assert_relative_eq!(areas[1], 12.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn crossing_chords_partition_the_region() {
        let cuts = [
            Segment::new(p(2.0, -1.0), p(2.0, 5.0)),
            Segment::new(p(-1.0, 1.0), p(5.0, 1.0)),
        ];
        let faces = split(&square(), &cuts, &Tolerance::default()).unwrap();
        assert_eq!(faces.len(), 4);
        let total: f64 = faces.iter().map(Polyline::area).sum();
        assert_relative_eq!(total, 16.0, epsilon = 1e-9);
    }

    #[test]
    fn dangling_cut_changes_nothing() {
        let cut = [Segment::new(p(2.0, -1.0), p(2.0, 2.0))];
        let faces = split(&square(), &cut, &Tolerance::default()).unwrap();
        assert_eq!(faces.len(), 1);
        assert_relative_eq!(faces[0].area(), 16.0, epsilon = 1e-9);
        assert_eq!(faces[0].vertex_count(), 4);
    }

    #[test]
    fn self_intersecting_region_is_rejected() {
        let bowtie = Polyline::closed(vec![p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)]);
        let err = split(&bowtie, &[], &Tolerance::default()).unwrap_err();
        assert!(matches!(
            err,
            KernelError::Operation(OperationError::SelfIntersecting { .. })
        ));
    }

    #[test]
    fn non_planar_region_is_rejected() {
        let warped = Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 1.0),
            Point3::new(0.0, 4.0, 0.0),
        ]);
        let err = split(&warped, &[], &Tolerance::default()).unwrap_err();
        assert!(matches!(
            err,
            KernelError::Operation(OperationError::NotPlanar { .. })
        ));
    }

    #[test]
    fn open_polyline_is_invalid() {
        let open = Polyline::open(vec![p(0.0, 0.0), p(1.0, 0.0)]);
        assert!(split(&open, &[], &Tolerance::default()).is_err());
    }
}

//! Segment soup preparation: merge overlaps, split at crossings, snap ends.

use tracing::trace;

use crate::geometry::{Polyline, Segment};
use crate::math::intersect_3d::segment_intersection_3d;
use crate::math::{Point3, Tolerance};
use crate::operations::boolean::union_all_lines;
use crate::operations::cluster::cull_duplicate_points;

/// Merges collinear overlaps, splits every segment at every crossing with
/// another one and snaps all endpoints onto a culled vertex set.
pub(super) fn prepare_segments(segments: &[Segment], tol: &Tolerance) -> Vec<Segment> {
    let merged = union_all_lines(segments, tol);

    let mut cuts: Vec<Vec<Point3>> = vec![Vec::new(); merged.len()];
    for (i, a) in merged.iter().enumerate() {
        for (j, b) in merged.iter().enumerate().skip(i + 1) {
            if let Some(p) = segment_intersection_3d(&a.start, &a.end, &b.start, &b.end, tol.distance) {
                cuts[i].push(p);
                cuts[j].push(p);
            }
        }
    }

    let mut candidates: Vec<Point3> = merged.iter().flat_map(|s| [s.start, s.end]).collect();
    candidates.extend(cuts.iter().flatten().copied());
    let vertices = cull_duplicate_points(&candidates, tol);
    let snap = |p: &Point3| {
        vertices
            .iter()
            .find(|v| tol.same_point(v, p))
            .copied()
            .unwrap_or(*p)
    };

    let pieces: Vec<Segment> = merged
        .iter()
        .zip(&cuts)
        .flat_map(|(seg, cuts)| Polyline::open(vec![seg.start, seg.end]).split_at_points(cuts, tol))
        .flat_map(|piece| piece.segments())
        .map(|s| Segment::new(snap(&s.start), snap(&s.end)))
        .filter(|s| !s.is_degenerate(tol))
        .collect();
    trace!(input = segments.len(), merged = merged.len(), pieces = pieces.len(), "segments prepared");
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point3::new(x0, y0, 0.0), Point3::new(x1, y1, 0.0))
    }

    #[test]
    fn crossing_segments_are_split() {
        let pieces = prepare_segments(&[seg(0.0, 0.0, 2.0, 0.0), seg(1.0, -1.0, 1.0, 1.0)], &Tolerance::default());
        assert_eq!(pieces.len(), 4);
        assert!(pieces.iter().all(|s| (s.length() - 1.0).abs() < 1e-9));
    }

    #[test]
    fn overlaps_merge_before_splitting() {
        let pieces = prepare_segments(&[seg(0.0, 0.0, 1.5, 0.0), seg(1.0, 0.0, 2.0, 0.0)], &Tolerance::default());
        assert_eq!(pieces.len(), 1);
        assert!((pieces[0].length() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn touching_corners_stay_whole() {
        let pieces = prepare_segments(&[seg(0.0, 0.0, 2.0, 0.0), seg(2.0, 0.0, 2.0, 3.0)], &Tolerance::default());
        assert_eq!(pieces.len(), 2);
    }
}

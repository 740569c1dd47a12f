//! Boolean algebra on straight segments.
//!
//! Collinear pairs reduce to interval arithmetic along the first segment's
//! direction. Non-collinear pairs never merge.

use crate::geometry::Segment;
use crate::math::intersect_3d::segment_intersection_3d;
use crate::math::{Point3, Tolerance};

use super::select::BooleanOp;

/// Union of two segments.
///
/// Collinear segments that overlap or touch merge into the segment spanning
/// their extreme points; anything else returns both inputs unchanged.
#[must_use]
pub fn line_union(a: &Segment, b: &Segment, tol: &Tolerance) -> Vec<Segment> {
    match (a.is_degenerate(tol), b.is_degenerate(tol)) {
        (true, true) => return Vec::new(),
        (true, false) => return vec![*b],
        (false, true) => return vec![*a],
        (false, false) => {}
    }
    if !a.is_collinear_with(b, tol) {
        return vec![*a, *b];
    }
    let pieces = collinear_boolean(a, b, BooleanOp::Union, tol);
    if pieces.len() == 1 {
        pieces
    } else {
        vec![*a, *b]
    }
}

/// Overlap of two segments, oriented along `a`.
///
/// Non-collinear segments share at most a point, which is degenerate, so the
/// result is empty.
#[must_use]
pub fn line_intersection(a: &Segment, b: &Segment, tol: &Tolerance) -> Vec<Segment> {
    if a.is_degenerate(tol) || b.is_degenerate(tol) || !a.is_collinear_with(b, tol) {
        return Vec::new();
    }
    collinear_boolean(a, b, BooleanOp::Intersection, tol)
}

/// The parts of `a` not covered by `b`.
///
/// A non-collinear `b` crossing the interior of `a` splits it at the crossing.
#[must_use]
pub fn line_difference(a: &Segment, b: &Segment, tol: &Tolerance) -> Vec<Segment> {
    if a.is_degenerate(tol) {
        return Vec::new();
    }
    if b.is_degenerate(tol) {
        return vec![*a];
    }
    if a.is_collinear_with(b, tol) {
        return collinear_boolean(a, b, BooleanOp::Difference, tol);
    }
    match segment_intersection_3d(&a.start, &a.end, &b.start, &b.end, tol.distance) {
        Some(p) if !tol.same_point(&p, &a.start) && !tol.same_point(&p, &a.end) => {
            vec![Segment::new(a.start, p), Segment::new(p, a.end)]
        }
        _ => vec![*a],
    }
}

/// Union of `a` with every segment of `set`.
#[must_use]
pub fn lines_union(a: &Segment, set: &[Segment], tol: &Tolerance) -> Vec<Segment> {
    let mut all = Vec::with_capacity(set.len() + 1);
    all.push(*a);
    all.extend_from_slice(set);
    union_all_lines(&all, tol)
}

/// The parts of `a` covered by at least one segment of `set`.
#[must_use]
pub fn lines_intersection(a: &Segment, set: &[Segment], tol: &Tolerance) -> Vec<Segment> {
    let covered: Vec<Segment> = set
        .iter()
        .flat_map(|b| line_intersection(a, b, tol))
        .collect();
    union_all_lines(&covered, tol)
}

/// The parts of `a` covered by no segment of `set`.
#[must_use]
pub fn lines_difference(a: &Segment, set: &[Segment], tol: &Tolerance) -> Vec<Segment> {
    let mut pieces = vec![*a];
    for b in set {
        pieces = pieces
            .iter()
            .flat_map(|p| line_difference(p, b, tol))
            .collect();
        if pieces.is_empty() {
            break;
        }
    }
    pieces
}

/// Merges every overlapping or touching collinear pair until no pair merges.
///
/// Degenerate segments are dropped.
#[must_use]
pub fn union_all_lines(set: &[Segment], tol: &Tolerance) -> Vec<Segment> {
    let mut lines: Vec<Segment> = set.iter().copied().filter(|s| !s.is_degenerate(tol)).collect();
    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..lines.len() {
            for j in (i + 1)..lines.len() {
                if !lines[i].is_collinear_with(&lines[j], tol) {
                    continue;
                }
                let pieces = collinear_boolean(&lines[i], &lines[j], BooleanOp::Union, tol);
                if let [single] = pieces.as_slice() {
                    lines[i] = *single;
                    lines.swap_remove(j);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }
    lines
}

/// Interval arithmetic for collinear, non-degenerate segments.
///
/// The four endpoint parameters along `a` are sorted and merged within
/// tolerance into stations; each elementary interval between stations is
/// tagged by which operands cover its midpoint, and consecutive selected
/// intervals are reassembled into segments.
fn collinear_boolean(a: &Segment, b: &Segment, op: BooleanOp, tol: &Tolerance) -> Vec<Segment> {
    let Some(dir) = a.direction() else {
        return Vec::new();
    };
    let origin = a.start;
    let param = |p: &Point3| (p - origin).dot(&dir);

    let a_range = (0.0, a.length());
    let (tb0, tb1) = (param(&b.start), param(&b.end));
    let b_range = (tb0.min(tb1), tb0.max(tb1));

    let mut raw = [a_range.0, a_range.1, b_range.0, b_range.1];
    raw.sort_by(f64::total_cmp);
    let mut stations: Vec<f64> = Vec::with_capacity(4);
    for t in raw {
        if stations.last().is_none_or(|&last| t - last > tol.distance) {
            stations.push(t);
        }
    }
    // Snap the operand ranges onto the merged stations.
    let snap = |t: f64| {
        stations
            .iter()
            .copied()
            .find(|s| (s - t).abs() <= tol.distance)
            .unwrap_or(t)
    };
    let a_range = (snap(a_range.0), snap(a_range.1));
    let b_range = (snap(b_range.0), snap(b_range.1));

    let mut runs: Vec<(f64, f64)> = Vec::new();
    for w in stations.windows(2) {
        let mid = 0.5 * (w[0] + w[1]);
        let in_a = mid > a_range.0 && mid < a_range.1;
        let in_b = mid > b_range.0 && mid < b_range.1;
        let keep = match op {
            BooleanOp::Union => in_a || in_b,
            BooleanOp::Intersection => in_a && in_b,
            BooleanOp::Difference => in_a && !in_b,
        };
        if !keep {
            continue;
        }
        match runs.last_mut() {
            Some(run) if (run.1 - w[0]).abs() <= f64::EPSILON => run.1 = w[1],
            _ => runs.push((w[0], w[1])),
        }
    }

    runs.into_iter()
        .map(|(t0, t1)| Segment::new(origin + dir * t0, origin + dir * t1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seg(x0: f64, x1: f64) -> Segment {
        Segment::new(Point3::new(x0, 0.0, 0.0), Point3::new(x1, 0.0, 0.0))
    }

    fn tol() -> Tolerance {
        Tolerance::new(1e-6)
    }

    #[test]
    fn union_of_overlapping_collinear_spans_extremes() {
        let out = line_union(&seg(0.0, 2.0), &seg(3.0, 1.0), &tol());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].start.x, 0.0);
        assert_relative_eq!(out[0].end.x, 3.0);
    }

    #[test]
    fn union_of_touching_collinear_merges() {
        let out = line_union(&seg(0.0, 1.0), &seg(1.0, 2.0), &tol());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].length(), 2.0);
    }

    #[test]
    fn union_of_disjoint_collinear_keeps_both() {
        let a = seg(0.0, 1.0);
        let b = seg(2.0, 3.0);
        assert_eq!(line_union(&a, &b, &tol()), vec![a, b]);
    }

    #[test]
    fn union_of_crossing_lines_keeps_both() {
        let a = seg(0.0, 2.0);
        let b = Segment::new(Point3::new(1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(line_union(&a, &b, &tol()), vec![a, b]);
    }

    #[test]
    fn intersection_of_partial_overlap() {
        let out = line_intersection(&seg(0.0, 2.0), &seg(1.0, 3.0), &tol());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].start.x, 1.0);
        assert_relative_eq!(out[0].end.x, 2.0);
    }

    #[test]
    fn intersection_of_exact_overlap_is_the_segment() {
        let out = line_intersection(&seg(0.0, 2.0), &seg(2.0, 0.0), &tol());
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].length(), 2.0);
    }

    #[test]
    fn intersection_of_crossing_lines_is_empty() {
        let b = Segment::new(Point3::new(1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        assert!(line_intersection(&seg(0.0, 2.0), &b, &tol()).is_empty());
    }

    #[test]
    fn difference_of_contained_leaves_two_pieces() {
        let out = line_difference(&seg(0.0, 4.0), &seg(1.0, 2.0), &tol());
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].end.x, 1.0);
        assert_relative_eq!(out[1].start.x, 2.0);
        assert_relative_eq!(out[1].end.x, 4.0);
    }

    #[test]
    fn difference_of_itself_is_empty() {
        assert!(line_difference(&seg(0.0, 1.0), &seg(0.0, 1.0), &tol()).is_empty());
    }

    #[test]
    fn difference_splits_at_crossing() {
        let b = Segment::new(Point3::new(1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let out = line_difference(&seg(0.0, 2.0), &b, &tol());
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].end.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn set_operations() {
        let a = seg(0.0, 10.0);
        let set = [seg(1.0, 2.0), seg(5.0, 6.0), seg(1.5, 3.0)];
        let covered = lines_intersection(&a, &set, &tol());
        let total: f64 = covered.iter().map(Segment::length).sum();
        assert_relative_eq!(total, 3.0, epsilon = 1e-9);

        let rest = lines_difference(&a, &set, &tol());
        let total: f64 = rest.iter().map(Segment::length).sum();
        assert_relative_eq!(total, 7.0, epsilon = 1e-9);
        assert_eq!(rest.len(), 3);

        assert_eq!(lines_union(&seg(0.0, 1.0), &[seg(1.0, 2.0), seg(2.0, 3.0)], &tol()).len(), 1);
    }

    #[test]
    fn union_all_reaches_fixed_point() {
        // Merging the first two only later connects the third.
        let set = [seg(0.0, 1.0), seg(2.0, 3.0), seg(0.5, 2.5), seg(5.0, 6.0)];
        let out = union_all_lines(&set, &tol());
        assert_eq!(out.len(), 2);
        let total: f64 = out.iter().map(Segment::length).sum();
        assert_relative_eq!(total, 4.0, epsilon = 1e-9);
    }
}

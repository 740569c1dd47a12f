//! Pairwise Boolean algebra on closed coplanar regions.
//!
//! Both boundaries are flattened into the first operand's plane frame and
//! made counter-clockwise. They are cut at every crossing or touching point.
//! Each arc is classified against the other region and kept, flipped or
//! discarded by the decision table. The kept arcs are then joined back into
//! loops.

use tracing::{debug, warn};

use crate::error::Warning;
use crate::geometry::{Curve, Plane, Polyline};
use crate::math::distance_2d::{point_to_boundary_dist_sq_2d, point_to_segment_dist_sq_2d};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::polygon_2d::{classify_point_2d, signed_area_2d, PointClassification};
use crate::math::{Point3, Tolerance};
use crate::operations::cluster::cull_duplicate_points;
use crate::topology::nest_loops;

use super::join::join;
use super::select::{should_keep_arc, ArcSource, BooleanOp, KeepDecision};

/// Result of a region Boolean.
///
/// `combined` is `false` when the operands could not be combined (they are
/// not coplanar); `regions` then holds the operands unchanged. Outer loops
/// are counter-clockwise and holes clockwise about the plane normal of the
/// first operand, each hole following its outer loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutput {
    pub regions: Vec<Polyline>,
    pub combined: bool,
    pub warnings: Vec<Warning>,
}

impl RegionOutput {
    pub(crate) fn combined(regions: Vec<Polyline>) -> Self {
        Self {
            regions,
            combined: true,
            warnings: Vec::new(),
        }
    }
}

/// Union of two closed regions.
#[must_use]
pub fn region_union(a: &Polyline, b: &Polyline, tol: &Tolerance) -> RegionOutput {
    region_boolean(a, b, BooleanOp::Union, tol)
}

/// Intersection of two closed regions.
#[must_use]
pub fn region_intersection(a: &Polyline, b: &Polyline, tol: &Tolerance) -> RegionOutput {
    region_boolean(a, b, BooleanOp::Intersection, tol)
}

/// Difference `a - b` of two closed regions.
#[must_use]
pub fn region_difference(a: &Polyline, b: &Polyline, tol: &Tolerance) -> RegionOutput {
    region_boolean(a, b, BooleanOp::Difference, tol)
}

/// Returns `true` for a closed, non-degenerate, plane-fittable loop.
pub(crate) fn is_region(polyline: &Polyline, tol: &Tolerance) -> bool {
    polyline.closed
        && polyline.vertex_count() >= 3
        && polyline.area() > tol.distance_sq()
        && polyline.plane(tol).is_some()
}

fn region_boolean(a: &Polyline, b: &Polyline, op: BooleanOp, tol: &Tolerance) -> RegionOutput {
    let a = a.without_degenerate_segments(tol);
    let b = b.without_degenerate_segments(tol);
    let (a_ok, b_ok) = (is_region(&a, tol), is_region(&b, tol));
    if !a_ok || !b_ok {
        debug!(?op, a_ok, b_ok, "degenerate operand");
        let regions = match op {
            BooleanOp::Union => [(a_ok, a), (b_ok, b)]
                .into_iter()
                .filter_map(|(ok, r)| ok.then_some(r))
                .collect(),
            BooleanOp::Intersection => Vec::new(),
            BooleanOp::Difference if a_ok => vec![a],
            BooleanOp::Difference => Vec::new(),
        };
        return RegionOutput::combined(regions);
    }

    let Some(fitted) = a.plane(tol) else {
        return RegionOutput::combined(Vec::new());
    };
    let plane = fitted.plane;
    let deviation = a
        .points
        .iter()
        .chain(&b.points)
        .map(|p| plane.signed_distance(p).abs())
        .fold(0.0, f64::max);
    if deviation > tol.distance {
        debug!(deviation, "regions are not coplanar, returning operands unchanged");
        return RegionOutput {
            regions: vec![a, b],
            combined: false,
            warnings: Vec::new(),
        };
    }
    let mut warnings = Vec::new();
    if deviation > tol.fine {
        warn!(deviation, "regions projected onto a common plane");
        warnings.push(Warning::ProjectedToPlane { deviation });
    }

    let fa = counter_clockwise(plane.flatten(&a.points));
    let fb = counter_clockwise(plane.flatten(&b.points));
    let loops = flat_boolean(&fa, &fb, op, tol);

    RegionOutput {
        regions: finish_loops(loops, &plane, tol),
        combined: true,
        warnings,
    }
}

fn counter_clockwise(mut points: Vec<Point3>) -> Vec<Point3> {
    if signed_area_2d(&points) < 0.0 {
        points.reverse();
    }
    points
}

fn flat_boolean(fa: &[Point3], fb: &[Point3], op: BooleanOp, tol: &Tolerance) -> Vec<Vec<Point3>> {
    let cuts = boundary_crossings(fa, fb, tol);
    if cuts.is_empty() {
        return containment_result(fa, fb, op, tol);
    }

    let arcs_a = split_loop(fa, &cuts, tol);
    let arcs_b = split_loop(fb, &cuts, tol);
    let classes_a = classify_arcs(&arcs_a, fb, tol);
    let classes_b = classify_arcs(&arcs_b, fa, tol);

    let mut kept = Vec::new();
    for (source, arcs, classes, other) in [
        (ArcSource::A, &arcs_a, &classes_a, fb),
        (ArcSource::B, &arcs_b, &classes_b, fa),
    ] {
        for (arc, &class) in arcs.iter().zip(classes) {
            let same = class == PointClassification::OnBoundary && runs_with(arc, other, tol);
            match should_keep_arc(source, class, same, op) {
                KeepDecision::Keep => kept.push(arc.clone()),
                KeepDecision::KeepFlipped => kept.push(arc.reversed()),
                KeepDecision::Discard => {}
            }
        }
    }
    debug!(?op, cuts = cuts.len(), arcs = arcs_a.len() + arcs_b.len(), kept = kept.len(), "arcs selected");

    join(&kept, tol)
        .into_iter()
        .filter(|pl| pl.closed)
        .map(|pl| pl.points)
        .collect()
}

/// Every point where the two boundaries cross or touch, with duplicates culled.
fn boundary_crossings(fa: &[Point3], fb: &[Point3], tol: &Tolerance) -> Vec<Point3> {
    let (na, nb) = (fa.len(), fb.len());
    let mut points = Vec::new();
    for i in 0..na {
        let (a0, a1) = (&fa[i], &fa[(i + 1) % na]);
        for j in 0..nb {
            let (b0, b1) = (&fb[j], &fb[(j + 1) % nb]);
            if let Some((p, _, _)) = segment_segment_intersect_2d(a0, a1, b0, b1, tol.distance) {
                points.push(p);
            }
        }
    }
    // Vertices lying on the other boundary cover collinear overlaps.
    for (own, other) in [(fa, fb), (fb, fa)] {
        points.extend(
            own.iter()
                .filter(|v| point_to_boundary_dist_sq_2d(v, other) <= tol.distance_sq()),
        );
    }
    cull_duplicate_points(&points, tol)
}

fn split_loop(points: &[Point3], cuts: &[Point3], tol: &Tolerance) -> Vec<Polyline> {
    Curve::Polyline(Polyline::closed(points.to_vec()))
        .split_at_points(cuts, tol)
        .into_iter()
        .map(Curve::into_polyline)
        .collect()
}

/// Outcome of sampling one arc against the other region.
struct ArcSample {
    class: PointClassification,
    ambiguous: bool,
    representative: Point3,
}

fn sample_arc(arc: &Polyline, other: &[Point3], tol: &Tolerance) -> ArcSample {
    let pts = &arc.points;
    let interior = pts.iter().skip(1).take(pts.len().saturating_sub(2)).copied();
    let midpoints = pts.windows(2).map(|w| nalgebra::center(&w[0], &w[1]));

    let (mut inside, mut outside) = (0usize, 0usize);
    let mut representative = None;
    for s in interior.chain(midpoints) {
        match classify_point_2d(&s, other, tol.distance) {
            PointClassification::Inside => inside += 1,
            PointClassification::Outside => outside += 1,
            PointClassification::OnBoundary => continue,
        }
        representative.get_or_insert(s);
    }

    let class = if inside == 0 && outside == 0 {
        PointClassification::OnBoundary
    } else if inside > outside {
        PointClassification::Inside
    } else {
        PointClassification::Outside
    };
    let fallback = pts
        .first()
        .zip(pts.get(1))
        .map_or_else(Point3::origin, |(a, b)| nalgebra::center(a, b));
    ArcSample {
        class,
        ambiguous: inside > 0 && inside == outside,
        representative: representative.unwrap_or(fallback),
    }
}

/// Classifies every arc against the other region.
///
/// When the cut produced exactly two arcs that classify alike and at least
/// one of them is ambiguous, the arc closer to the centroid of the other
/// region's control points is taken as inside and the other as outside.
///
/// Distance is measured from each arc's first interior sample, not from its
/// endpoint: the two arcs share both endpoints, so endpoint distances cannot
/// tell them apart. The tie-break only runs when the sample vote is split.
fn classify_arcs(arcs: &[Polyline], other: &[Point3], tol: &Tolerance) -> Vec<PointClassification> {
    let samples: Vec<ArcSample> = arcs.iter().map(|a| sample_arc(a, other, tol)).collect();
    let mut classes: Vec<PointClassification> = samples.iter().map(|s| s.class).collect();

    if let [s0, s1] = samples.as_slice() {
        if s0.class == s1.class
            && s0.class != PointClassification::OnBoundary
            && (s0.ambiguous || s1.ambiguous)
        {
            let centroid = Polyline::closed(other.to_vec()).centroid();
            let d0 = (s0.representative - centroid).norm();
            let d1 = (s1.representative - centroid).norm();
            if (d0 - d1).abs() > tol.fine {
                let first_inside = d0 < d1;
                classes[0] = pick(first_inside);
                classes[1] = pick(!first_inside);
                debug!(d0, d1, "two-arc split disambiguated by centroid distance");
            }
        }
    }
    classes
}

fn pick(inside: bool) -> PointClassification {
    if inside {
        PointClassification::Inside
    } else {
        PointClassification::Outside
    }
}

/// Returns `true` when a boundary arc runs in the same direction as the
/// nearest edge of the other loop.
fn runs_with(arc: &Polyline, other: &[Point3], tol: &Tolerance) -> bool {
    let Some(seg) = arc.segments().into_iter().find(|s| !s.is_degenerate(tol)) else {
        return false;
    };
    let mid = seg.midpoint();
    let n = other.len();
    let nearest = (0..n).min_by(|&i, &j| {
        let di = point_to_segment_dist_sq_2d(&mid, &other[i], &other[(i + 1) % n]);
        let dj = point_to_segment_dist_sq_2d(&mid, &other[j], &other[(j + 1) % n]);
        di.total_cmp(&dj)
    });
    nearest.is_some_and(|k| (seg.end - seg.start).dot(&(other[(k + 1) % n] - other[k])) > 0.0)
}

/// Result loops when the boundaries neither cross nor touch.
fn containment_result(fa: &[Point3], fb: &[Point3], op: BooleanOp, tol: &Tolerance) -> Vec<Vec<Point3>> {
    let a_in_b = classify_point_2d(&fa[0], fb, tol.distance) == PointClassification::Inside;
    let b_in_a = classify_point_2d(&fb[0], fa, tol.distance) == PointClassification::Inside;
    debug!(?op, a_in_b, b_in_a, "boundaries do not meet");
    let reversed_b = || fb.iter().rev().copied().collect::<Vec<_>>();
    match op {
        BooleanOp::Union if a_in_b => vec![fb.to_vec()],
        BooleanOp::Union if b_in_a => vec![fa.to_vec()],
        BooleanOp::Union => vec![fa.to_vec(), fb.to_vec()],
        BooleanOp::Intersection if a_in_b => vec![fa.to_vec()],
        BooleanOp::Intersection if b_in_a => vec![fb.to_vec()],
        BooleanOp::Intersection => Vec::new(),
        BooleanOp::Difference if a_in_b => Vec::new(),
        BooleanOp::Difference if b_in_a => vec![fa.to_vec(), reversed_b()],
        BooleanOp::Difference => vec![fa.to_vec()],
    }
}

/// Cleans flat loops, nests them and lifts them back into the plane.
pub(crate) fn finish_loops(loops: Vec<Vec<Point3>>, plane: &Plane, tol: &Tolerance) -> Vec<Polyline> {
    let cleaned: Vec<Vec<Point3>> = loops
        .into_iter()
        .map(|l| Polyline::closed(l).without_collinear_vertices(tol).points)
        .filter(|l| l.len() >= 3 && signed_area_2d(l).abs() > tol.distance_sq())
        .collect();
    nest_loops(cleaned, tol.distance)
        .into_iter()
        .flat_map(|n| std::iter::once(n.boundary).chain(n.holes))
        .map(|pts| Polyline::closed(plane.unflatten(&pts)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use approx::assert_relative_eq;

    fn poly(coords: &[(f64, f64)]) -> Polyline {
        Polyline::closed(coords.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect())
    }

    fn unit_square() -> Polyline {
        poly(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
    }

    fn shifted_square() -> Polyline {
        poly(&[(0.5, 0.0), (1.5, 0.0), (1.5, 1.0), (0.5, 1.0)])
    }

    fn total_area(out: &RegionOutput) -> f64 {
        let z = Vector3::z();
        out.regions.iter().map(|r| r.signed_area(&z)).sum()
    }

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn overlapping_squares() {
        let (a, b) = (unit_square(), shifted_square());
        let union = region_union(&a, &b, &tol());
        let inter = region_intersection(&a, &b, &tol());
        let diff = region_difference(&a, &b, &tol());
        assert!(union.combined && inter.combined && diff.combined);
        assert_eq!(union.regions.len(), 1);
        assert_eq!(union.regions[0].vertex_count(), 4);
        assert_relative_eq!(total_area(&union), 1.5, epsilon = 1e-9);
        assert_relative_eq!(total_area(&inter), 0.5, epsilon = 1e-9);
        assert_relative_eq!(total_area(&diff), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn inclusion_exclusion_for_crossing_shapes() {
        let a = poly(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let b = poly(&[(2.0, -1.0), (5.0, 2.0), (2.0, 5.0), (-1.0, 2.0)]);
        let union = total_area(&region_union(&a, &b, &tol()));
        let inter = total_area(&region_intersection(&a, &b, &tol()));
        assert_relative_eq!(union, 16.0 + 18.0 - inter, epsilon = 1e-9);
        assert!(inter > 0.0 && inter < 16.0);
    }

    #[test]
    fn intersection_is_symmetric() {
        let (a, b) = (unit_square(), shifted_square());
        let ab = total_area(&region_intersection(&a, &b, &tol()));
        let ba = total_area(&region_intersection(&b, &a, &tol()));
        assert_relative_eq!(ab, ba, epsilon = 1e-9);
    }

    #[test]
    fn self_operations() {
        let a = unit_square();
        assert!(region_difference(&a, &a, &tol()).regions.is_empty());
        let union = region_union(&a, &a, &tol());
        assert_eq!(union.regions.len(), 1);
        assert_relative_eq!(total_area(&union), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn contained_operand_becomes_hole() {
        let outer = poly(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let inner = poly(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]);
        let diff = region_difference(&outer, &inner, &tol());
        assert_eq!(diff.regions.len(), 2);
        assert!(!diff.regions[0].is_clockwise(&Vector3::z()));
        assert!(diff.regions[1].is_clockwise(&Vector3::z()));
        assert_relative_eq!(total_area(&diff), 15.0, epsilon = 1e-9);

        let union = region_union(&inner, &outer, &tol());
        assert_eq!(union.regions.len(), 1);
        assert_relative_eq!(total_area(&union), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_regions() {
        let a = unit_square();
        let b = poly(&[(3.0, 0.0), (4.0, 0.0), (4.0, 1.0), (3.0, 1.0)]);
        assert_eq!(region_union(&a, &b, &tol()).regions.len(), 2);
        assert!(region_intersection(&a, &b, &tol()).regions.is_empty());
        let diff = region_difference(&a, &b, &tol());
        assert_eq!(diff.regions.len(), 1);
        assert_relative_eq!(total_area(&diff), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn edge_adjacent_squares_merge() {
        let a = unit_square();
        let b = poly(&[(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)]);
        let union = region_union(&a, &b, &tol());
        assert_eq!(union.regions.len(), 1);
        assert_eq!(union.regions[0].vertex_count(), 4);
        assert_relative_eq!(total_area(&union), 2.0, epsilon = 1e-9);
        assert_relative_eq!(total_area(&region_difference(&a, &b, &tol())), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn clockwise_input_is_normalised() {
        let a = unit_square().reversed();
        let out = region_union(&a, &shifted_square(), &tol());
        assert_eq!(out.regions.len(), 1);
        assert_relative_eq!(out.regions[0].area(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn non_coplanar_regions_are_not_combined() {
        let a = unit_square();
        let b = Polyline::closed(vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(0.0, 1.0, 1.0),
        ]);
        let out = region_union(&a, &b, &tol());
        assert!(!out.combined);
        assert_eq!(out.regions, vec![a, b]);
    }

    #[test]
    fn degenerate_operand_is_trivial() {
        let a = unit_square();
        let flat = poly(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(region_union(&a, &flat, &tol()).regions, vec![a.clone()]);
        assert!(region_intersection(&a, &flat, &tol()).regions.is_empty());
        assert!(region_difference(&flat, &a, &tol()).regions.is_empty());
    }
}

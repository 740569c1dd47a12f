use crate::math::polygon_2d::{classify_point_2d, signed_area_2d, PointClassification};
use crate::math::Point3;

/// An outer loop (counter-clockwise) with the loops directly inside it
/// (clockwise).
#[derive(Debug, Clone, PartialEq)]
pub struct NestedLoop {
    pub boundary: Vec<Point3>,
    pub holes: Vec<Vec<Point3>>,
}

/// Nests closed XY loops by containment depth.
///
/// A loop at even depth is a boundary; a loop at odd depth is a hole of the
/// smallest enclosing boundary. Boundaries are returned counter-clockwise in
/// input order and holes clockwise. Loops that coincide with each other are
/// not considered nested.
#[must_use]
pub fn nest_loops(loops: Vec<Vec<Point3>>, tol: f64) -> Vec<NestedLoop> {
    let loops: Vec<Vec<Point3>> = loops
        .into_iter()
        .filter(|l| l.len() >= 3)
        .map(|mut l| {
            if signed_area_2d(&l) < 0.0 {
                l.reverse();
            }
            l
        })
        .collect();
    let areas: Vec<f64> = loops.iter().map(|l| signed_area_2d(l)).collect();

    // parents[i]: loops strictly enclosing loop i.
    let parents: Vec<Vec<usize>> = (0..loops.len())
        .map(|i| {
            (0..loops.len())
                .filter(|&j| j != i && areas[j] > areas[i] && encloses(&loops[j], &loops[i], tol))
                .collect()
        })
        .collect();
    let depth: Vec<usize> = parents.iter().map(Vec::len).collect();

    let mut nested: Vec<NestedLoop> = Vec::new();
    let mut slot_of: Vec<Option<usize>> = vec![None; loops.len()];
    for i in (0..loops.len()).filter(|&i| depth[i] % 2 == 0) {
        slot_of[i] = Some(nested.len());
        nested.push(NestedLoop {
            boundary: loops[i].clone(),
            holes: Vec::new(),
        });
    }
    for i in (0..loops.len()).filter(|&i| depth[i] % 2 == 1) {
        let owner = parents[i]
            .iter()
            .copied()
            .filter(|&j| depth[j] + 1 == depth[i])
            .min_by(|&a, &b| areas[a].total_cmp(&areas[b]));
        let Some(slot) = owner.and_then(|j| slot_of[j]) else {
            continue;
        };
        let mut hole = loops[i].clone();
        hole.reverse();
        nested[slot].holes.push(hole);
    }
    nested
}

/// Returns `true` when `inner` lies inside `outer`, judged by the first
/// vertex or edge midpoint of `inner` that is not on `outer`'s boundary.
fn encloses(outer: &[Point3], inner: &[Point3], tol: f64) -> bool {
    let n = inner.len();
    let samples = inner
        .iter()
        .copied()
        .chain((0..n).map(|k| nalgebra::center(&inner[k], &inner[(k + 1) % n])));
    for s in samples {
        match classify_point_2d(&s, outer, tol) {
            PointClassification::Inside => return true,
            PointClassification::Outside => return false,
            PointClassification::OnBoundary => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point3> {
        vec![
            Point3::new(x0, y0, 0.0),
            Point3::new(x0 + size, y0, 0.0),
            Point3::new(x0 + size, y0 + size, 0.0),
            Point3::new(x0, y0 + size, 0.0),
        ]
    }

    #[test]
    fn hole_is_assigned_and_reoriented() {
        let mut hole = square(1.0, 1.0, 1.0);
        hole.reverse();
        let out = nest_loops(vec![hole, square(0.0, 0.0, 4.0)], 1e-6);
        assert_eq!(out.len(), 1);
        assert!(signed_area_2d(&out[0].boundary) > 0.0);
        assert_eq!(out[0].holes.len(), 1);
        assert!(signed_area_2d(&out[0].holes[0]) < 0.0);
    }

    #[test]
    fn island_in_hole_is_a_boundary() {
        let out = nest_loops(
            vec![
                square(0.0, 0.0, 10.0),
                square(1.0, 1.0, 8.0),
                square(2.0, 2.0, 2.0),
            ],
            1e-6,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].holes.len(), 1);
        assert!(out[1].holes.is_empty());
    }

    #[test]
    fn disjoint_loops_are_separate_boundaries() {
        let out = nest_loops(vec![square(0.0, 0.0, 1.0), square(3.0, 0.0, 1.0)], 1e-6);
        assert_eq!(out.len(), 2);
    }
}

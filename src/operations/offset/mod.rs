//! Multi-distance offsetting of planar polylines.
//!
//! Each vertex travels along the miter bisector of its two segments while
//! every segment line advances at unit speed. The offset is advanced in steps
//! bounded by the next topology change: a shrinking segment reaching zero
//! length (local event) or a vertex striking a non-adjacent segment (global
//! event, which splits the loop).

mod chain;
mod corner;
mod engine;
mod step;

use tracing::{debug, warn};

use crate::error::{GeometryError, OperationError, Result, Warning};
use crate::geometry::{Plane, Polyline};
use crate::math::polygon_3d::{fit_plane, normal_from_triples};
use crate::math::{Point3, Tolerance, Vector3, TOLERANCE};

use chain::OffsetChain;
use engine::{run_group, Context};

/// Default bound on offset iterations per [`MultiOffset::execute`] call.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Behaviour switches of the offset engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetOptions {
    /// Clean input and output polylines, and collapse shrinking segments
    /// once they are shorter than the distance tolerance.
    pub remove_short_segments: bool,
    /// Repair corners where the polyline doubles back on itself.
    pub handle_parallel_segments: bool,
    /// Stop at and collapse vanishing segments.
    pub handle_local_self_intersections: bool,
    /// Stop where a vertex strikes another part of the polyline and split
    /// the loop there. Implies local handling.
    pub handle_global_self_intersections: bool,
    /// After a split keep only the largest loop (closed input) or the piece
    /// carrying the original ends (open input).
    pub only_largest_per_step: bool,
    /// Iteration cap; reaching it returns the last state with a warning.
    pub max_iterations: usize,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        Self {
            remove_short_segments: true,
            handle_parallel_segments: true,
            handle_local_self_intersections: true,
            handle_global_self_intersections: true,
            only_largest_per_step: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl OffsetOptions {
    fn effective(mut self) -> Self {
        if self.handle_global_self_intersections {
            self.handle_local_self_intersections = true;
        }
        self
    }
}

/// Polylines produced for one requested offset.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetLevel {
    pub offset: f64,
    pub polylines: Vec<Polyline>,
}

/// Result of a [`MultiOffset`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OffsetOutput {
    /// One level per requested offset, in request order.
    pub levels: Vec<OffsetLevel>,
    pub warnings: Vec<Warning>,
}

impl OffsetOutput {
    /// Flattens every level into one list, in request order.
    #[must_use]
    pub fn into_polylines(self) -> Vec<Polyline> {
        self.levels.into_iter().flat_map(|l| l.polylines).collect()
    }
}

/// Offsets one polyline by several distances at once.
///
/// Positive distances move along `tangent x normal`: outward for a closed
/// polyline paired with its own counter-clockwise normal. Distances of the
/// same sign are reached incrementally, each level continuing from the
/// previous one.
#[derive(Debug, Clone)]
pub struct MultiOffset {
    polyline: Polyline,
    offsets: Vec<f64>,
    normal: Option<Vector3>,
    options: OffsetOptions,
    tolerance: Tolerance,
}

impl MultiOffset {
    /// Creates a new offset operation.
    #[must_use]
    pub fn new(polyline: Polyline, offsets: Vec<f64>) -> Self {
        Self {
            polyline,
            offsets,
            normal: None,
            options: OffsetOptions::default(),
            tolerance: Tolerance::default(),
        }
    }

    /// Sets the plane normal instead of deriving it from the polyline.
    #[must_use]
    pub fn with_normal(mut self, normal: Vector3) -> Self {
        self.normal = Some(normal);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: OffsetOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the offset.
    ///
    /// Degenerate input (no segment, or a closed polyline without area)
    /// yields empty levels.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` if the given normal has zero
    /// length, or `OperationError::NormalUndetermined` if no normal was given
    /// and the open polyline is straight.
    pub fn execute(&self) -> Result<OffsetOutput> {
        let tol = self.tolerance;
        let options = self.options.effective();
        let mut output = OffsetOutput {
            levels: self
                .offsets
                .iter()
                .map(|&offset| OffsetLevel {
                    offset,
                    polylines: Vec::new(),
                })
                .collect(),
            warnings: Vec::new(),
        };

        let mut source = self.polyline.without_degenerate_segments(&tol);
        if options.remove_short_segments {
            source = source.without_collinear_vertices(&tol);
        }
        if source.segment_count() == 0 || (source.closed && source.vertex_count() < 3) {
            debug!("degenerate offset input");
            return Ok(output);
        }

        let Some(normal) = self.resolve_normal(&source, &tol)? else {
            debug!("closed offset input has no plane");
            return Ok(output);
        };
        let points = project_if_needed(&source.points, normal, &tol, &mut output.warnings)?;
        let source = Polyline::new(points, source.closed);

        for (level, &offset) in output.levels.iter_mut().zip(&self.offsets) {
            if offset.abs() <= tol.fine {
                level.polylines.push(source.clone());
            }
        }

        let mut ctx = Context {
            options: &options,
            tol: &tol,
            iterations: 0,
            warnings: Vec::new(),
        };
        for side in [1.0, -1.0] {
            let mut targets: Vec<(usize, f64)> = self
                .offsets
                .iter()
                .enumerate()
                .filter(|&(_, &o)| o * side > tol.fine)
                .map(|(i, &o)| (i, o.abs()))
                .collect();
            if targets.is_empty() {
                continue;
            }
            targets.sort_by(|a, b| a.1.total_cmp(&b.1));
            let Some(chain) =
                OffsetChain::from_points(&source.points, source.closed, normal, side, 0.0, &tol)
            else {
                continue;
            };
            for (level, polyline) in run_group(chain, &targets, &mut ctx) {
                if let Some(l) = output.levels.get_mut(level) {
                    l.polylines.push(polyline);
                }
            }
        }
        debug!(iterations = ctx.iterations, "offset finished");
        output.warnings.append(&mut ctx.warnings);
        Ok(output)
    }

    fn resolve_normal(&self, source: &Polyline, tol: &Tolerance) -> Result<Option<Vector3>> {
        if let Some(normal) = self.normal {
            return normal
                .try_normalize(TOLERANCE)
                .map(Some)
                .ok_or_else(|| GeometryError::ZeroVector.into());
        }
        if source.closed {
            return Ok(fit_plane(&source.points, tol.distance).map(|f| *f.plane.plane_normal()));
        }
        normal_from_triples(&source.points, tol.angle)
            .map(Some)
            .ok_or_else(|| OperationError::NormalUndetermined.into())
    }
}

/// Projects the points onto their mean plane when they stray from it by more
/// than the fine tolerance.
fn project_if_needed(
    points: &[Point3],
    normal: Vector3,
    tol: &Tolerance,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Point3>> {
    #[allow(clippy::cast_precision_loss)]
    let count = points.len() as f64;
    let centroid = Point3::from(points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / count);
    let plane = Plane::from_normal(centroid, normal)?;
    let deviation = points
        .iter()
        .map(|p| plane.signed_distance(p).abs())
        .fold(0.0, f64::max);
    if deviation <= tol.fine {
        return Ok(points.to_vec());
    }
    warn!(deviation, "offset input projected onto its plane");
    warnings.push(Warning::ProjectedToPlane { deviation });
    Ok(points.iter().map(|p| plane.project(p)).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::KernelError;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn unit_square() -> Polyline {
        Polyline::closed(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)])
    }

    fn notched_rectangle() -> Polyline {
        Polyline::closed(vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 4.0),
            p(6.0, 4.0),
            p(5.0, 1.0),
            p(4.0, 4.0),
            p(0.0, 4.0),
        ])
    }

    fn counts(output: &OffsetOutput) -> Vec<usize> {
        output.levels.iter().map(|l| l.polylines.len()).collect()
    }

    #[test]
    fn square_grows_outward() {
        let out = MultiOffset::new(unit_square(), vec![0.1]).execute().unwrap();
        assert_eq!(counts(&out), vec![1]);
        let grown = &out.levels[0].polylines[0];
        assert!(grown.closed);
        assert_eq!(grown.vertex_count(), 4);
        assert_relative_eq!(grown.area(), 1.44, epsilon = 1e-9);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn offset_round_trip_restores_the_square() {
        let grown = MultiOffset::new(unit_square(), vec![0.1])
            .execute()
            .unwrap()
            .into_polylines()
            .remove(0);
        let back = MultiOffset::new(grown, vec![-0.1])
            .execute()
            .unwrap()
            .into_polylines()
            .remove(0);
        assert_relative_eq!(back.area(), 1.0, epsilon = 1e-9);
        for corner in unit_square().points {
            assert!(back.points.iter().any(|q| (q - corner).norm() < 1e-9));
        }
    }

    #[test]
    fn square_vanishes_when_shrunk_past_its_inradius() {
        let out = MultiOffset::new(unit_square(), vec![-0.25, -0.6]).execute().unwrap();
        assert_eq!(counts(&out), vec![1, 0]);
        assert_relative_eq!(out.levels[0].polylines[0].area(), 0.25, epsilon = 1e-9);
    }

    #[test]
    fn zero_offset_returns_the_input() {
        let out = MultiOffset::new(unit_square(), vec![0.0]).execute().unwrap();
        assert_eq!(out.levels[0].polylines, vec![unit_square()]);
    }

    #[test]
    fn notch_splits_the_rectangle() {
        let out = MultiOffset::new(notched_rectangle(), vec![-0.2, -0.4, -0.6])
            .execute()
            .unwrap();
        assert_eq!(counts(&out), vec![1, 2, 2]);
        for piece in &out.levels[2].polylines {
            assert!(piece.closed);
            assert!(!piece.is_clockwise(&Vector3::z()));
        }
    }

    #[test]
    fn notch_without_global_handling_stays_one_loop() {
        let options = OffsetOptions {
            handle_global_self_intersections: false,
            ..OffsetOptions::default()
        };
        let out = MultiOffset::new(notched_rectangle(), vec![-0.2, -0.4, -0.6])
            .with_options(options)
            .execute()
            .unwrap();
        assert_eq!(counts(&out), vec![1, 1, 1]);
    }

    #[test]
    fn only_largest_keeps_one_piece() {
        let options = OffsetOptions {
            only_largest_per_step: true,
            ..OffsetOptions::default()
        };
        let out = MultiOffset::new(notched_rectangle(), vec![-0.4])
            .with_options(options)
            .execute()
            .unwrap();
        assert_eq!(counts(&out), vec![1]);
    }

    #[test]
    fn levels_follow_request_order() {
        let out = MultiOffset::new(unit_square(), vec![0.2, -0.1, 0.1]).execute().unwrap();
        let offsets: Vec<f64> = out.levels.iter().map(|l| l.offset).collect();
        assert_eq!(offsets, vec![0.2, -0.1, 0.1]);
        assert_relative_eq!(out.levels[0].polylines[0].area(), 1.96, epsilon = 1e-9);
        assert_relative_eq!(out.levels[1].polylines[0].area(), 0.64, epsilon = 1e-9);
        assert_relative_eq!(out.levels[2].polylines[0].area(), 1.44, epsilon = 1e-9);
    }

    #[test]
    fn open_line_moves_to_the_right_of_travel() {
        let line = Polyline::open(vec![p(0.0, 0.0), p(1.0, 0.0)]);
        let out = MultiOffset::new(line, vec![1.0])
            .with_normal(Vector3::z())
            .execute()
            .unwrap();
        let moved = &out.levels[0].polylines[0];
        assert!(!moved.closed);
        assert_relative_eq!(moved.points[0], p(0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(moved.points[1], p(1.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn hairpin_gets_a_square_cap() {
        let hairpin = Polyline::open(vec![p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0)]);
        let out = MultiOffset::new(hairpin, vec![0.5])
            .with_normal(Vector3::z())
            .execute()
            .unwrap();
        let capped = &out.levels[0].polylines[0];
        let expected = [p(0.0, -0.5), p(2.5, -0.5), p(2.5, 0.5), p(1.0, 0.5)];
        assert_eq!(capped.vertex_count(), expected.len());
        for (got, want) in capped.points.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-9);
        }
    }

    #[test]
    fn straight_open_curve_needs_a_normal() {
        let line = Polyline::open(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]);
        let err = MultiOffset::new(line, vec![1.0]).execute().unwrap_err();
        assert!(matches!(
            err,
            KernelError::Operation(OperationError::NormalUndetermined)
        ));
    }

    #[test]
    fn iteration_cap_reports_a_warning() {
        let options = OffsetOptions {
            max_iterations: 1,
            ..OffsetOptions::default()
        };
        let out = MultiOffset::new(unit_square(), vec![0.1])
            .with_options(options)
            .execute()
            .unwrap();
        assert!(matches!(out.warnings[0], Warning::IterationLimit { .. }));
        assert_eq!(counts(&out), vec![1]);
    }

    #[test]
    fn tilted_square_is_offset_in_its_own_plane() {
        let tilted = Polyline::closed(
            unit_square()
                .points
                .iter()
                .map(|q| Point3::new(q.x, q.y, q.x))
                .collect(),
        );
        let out = MultiOffset::new(tilted, vec![0.1]).execute().unwrap();
        let grown = &out.levels[0].polylines[0];
        for q in &grown.points {
            assert_relative_eq!(q.z, q.x, epsilon = 1e-9);
        }
    }
}

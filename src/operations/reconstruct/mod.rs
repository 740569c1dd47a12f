//! Reconstruction of nested polygon regions from an unordered segment soup.
//!
//! The soup is merged and split at crossings, grouped into connected
//! components, and every component is flattened into its own frame. Outer
//! boundaries are traced repeatedly, each pass removing the traced edges
//! and pruning what dangles, so loops hanging off chords are recovered as
//! well. The loops are finally nested by containment.

mod prepare;
mod trace;

use tracing::{debug, warn};

use crate::error::{Result, Warning};
use crate::geometry::{Plane, Polyline, Segment};
use crate::math::polygon_3d::fit_plane;
use crate::math::{Point3, Tolerance, Vector3};
use crate::operations::cluster::cluster_segments;
use crate::topology::{nest_loops, LineGraph};

use prepare::prepare_segments;
use trace::trace_outer;

/// A closed outline with the holes directly inside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// Counter-clockwise about the frame normal of its component.
    pub boundary: Polyline,
    /// Clockwise about the same normal.
    pub holes: Vec<Polyline>,
}

/// Result of a [`ReconstructOutlines`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconstructOutput {
    pub regions: Vec<Region>,
    pub warnings: Vec<Warning>,
}

impl ReconstructOutput {
    /// Every boundary followed by its holes.
    #[must_use]
    pub fn into_polylines(self) -> Vec<Polyline> {
        self.regions
            .into_iter()
            .flat_map(|r| std::iter::once(r.boundary).chain(r.holes))
            .collect()
    }
}

/// Rebuilds closed regions from line segments given in any order and
/// orientation.
#[derive(Debug, Clone)]
pub struct ReconstructOutlines {
    segments: Vec<Segment>,
    tolerance: Tolerance,
}

impl ReconstructOutlines {
    /// Creates a new reconstruction over `segments`.
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            tolerance: Tolerance::default(),
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the reconstruction.
    ///
    /// Components that enclose nothing are dropped; components that are not
    /// planar are skipped with a [`Warning::NonCoplanarCluster`].
    ///
    /// # Errors
    ///
    /// Returns an error if a component's frame cannot be built.
    pub fn execute(&self) -> Result<ReconstructOutput> {
        let tol = self.tolerance;
        let mut output = ReconstructOutput::default();

        let prepared = prepare_segments(&self.segments, &tol);
        let clusters = cluster_segments(&prepared, &tol);
        debug!(segments = prepared.len(), clusters = clusters.len(), "reconstructing outlines");

        // Loops of coplanar clusters are nested together, in the frame of the
        // first cluster of their plane.
        let mut planes: Vec<(Plane, Vec<Vec<Point3>>)> = Vec::new();
        for (index, cluster) in clusters.iter().enumerate() {
            let Some((frame, loops)) = trace_cluster(index, cluster, &tol, &mut output.warnings)? else {
                continue;
            };
            match planes.iter_mut().find(|(plane, _)| coplanar(plane, &frame, &tol)) {
                Some((plane, group)) => group.extend(
                    loops
                        .into_iter()
                        .map(|l| plane.flatten(&frame.unflatten(&l))),
                ),
                None => planes.push((frame, loops)),
            }
        }

        for (frame, loops) in planes {
            let outline = |points: Vec<Point3>| {
                Polyline::closed(frame.unflatten(&points)).without_collinear_vertices(&tol)
            };
            output.regions.extend(
                nest_loops(loops, tol.distance)
                    .into_iter()
                    .map(|nested| Region {
                        boundary: outline(nested.boundary),
                        holes: nested.holes.into_iter().map(outline).collect(),
                    })
                    .filter(|r| r.boundary.vertex_count() >= 3),
            );
        }
        Ok(output)
    }
}

fn coplanar(a: &Plane, b: &Plane, tol: &Tolerance) -> bool {
    a.plane_normal().cross(b.plane_normal()).norm() <= tol.angle
        && a.signed_distance(b.origin()).abs() <= tol.distance
}

/// Traces every loop of one connected cluster, returned in the cluster's
/// own frame.
fn trace_cluster(
    index: usize,
    segments: &[Segment],
    tol: &Tolerance,
    warnings: &mut Vec<Warning>,
) -> Result<Option<(Plane, Vec<Vec<Point3>>)>> {
    let mut graph = LineGraph::from_segments(segments, tol.distance);
    let pruned = graph.prune_dangling();
    if graph.is_empty() {
        debug!(cluster = index, pruned, "cluster encloses nothing");
        return Ok(None);
    }

    let points: Vec<Point3> = graph.nodes().map(|(_, n)| n.point).collect();
    let Some(fitted) = fit_plane(&points, tol.distance) else {
        return Ok(None);
    };
    if fitted.deviation > tol.distance {
        warn!(cluster = index, deviation = fitted.deviation, "skipping non-coplanar cluster");
        warnings.push(Warning::NonCoplanarCluster {
            cluster: index,
            deviation: fitted.deviation,
        });
        return Ok(None);
    }
    if fitted.deviation > tol.fine {
        warn!(cluster = index, deviation = fitted.deviation, "cluster projected onto its plane");
        warnings.push(Warning::ProjectedToPlane {
            deviation: fitted.deviation,
        });
    }

    let Some(frame) = cluster_frame(&graph, tol)? else {
        return Ok(None);
    };
    graph.map_points(|p| {
        let local = frame.to_local(p);
        Point3::new(local.x, local.y, 0.0)
    });

    let mut loops = Vec::new();
    while !graph.is_empty() {
        let Some(traced) = trace_outer(&graph) else {
            debug!(cluster = index, remaining = graph.edge_count(), "outer trace did not close");
            break;
        };
        for edge in &traced.edges {
            graph.remove_edge(*edge);
        }
        graph.prune_dangling();
        loops.push(traced.points);
    }
    debug!(cluster = index, loops = loops.len(), "cluster traced");
    Ok(Some((frame, loops)))
}

/// Frame spanned by the first two non-parallel edge directions of the graph,
/// with its normal turned towards the positive side of its dominant axis.
fn cluster_frame(graph: &LineGraph, tol: &Tolerance) -> Result<Option<Plane>> {
    let directions: Vec<Vector3> = graph
        .segments()
        .iter()
        .filter_map(Segment::direction)
        .collect();
    let Some(&u) = directions.first() else {
        return Ok(None);
    };
    let Some(&v) = directions.iter().find(|&&d| u.cross(&d).norm() > tol.angle) else {
        return Ok(None);
    };
    let normal = u.cross(&v);
    let dominant = normal.iter().copied().max_by(|a, b| a.abs().total_cmp(&b.abs())).unwrap_or(0.0);
    let v = if dominant < 0.0 { -v } else { v };
    let origin = graph.nodes().next().map_or_else(Point3::origin, |(_, n)| n.point);
    Plane::new(origin, u, v).map(Some)
}

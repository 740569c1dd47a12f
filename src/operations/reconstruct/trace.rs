//! Outer-boundary tracing on a flattened line graph.

use std::f64::consts::TAU;

use crate::math::{Point3, Vector3};
use crate::topology::{EdgeId, LineGraph, NodeId};

/// A closed walk around the outside of one connected part of the graph.
#[derive(Debug, Clone)]
pub(super) struct TracedLoop {
    pub points: Vec<Point3>,
    pub edges: Vec<EdgeId>,
}

/// Traces the outer boundary of the graph's leftmost component.
///
/// The walk starts at the node with minimum X (then minimum Y), leaves along
/// the edge turned furthest counter-clockwise from straight up and then keeps
/// taking the sharpest left turn, never reversing along the edge it arrived
/// on. Returns `None` if the walk cannot close, which only happens on graphs
/// that still carry dangling edges.
pub(super) fn trace_outer(graph: &LineGraph) -> Option<TracedLoop> {
    let (start, _) = graph
        .nodes()
        .filter(|(_, n)| n.edges.len() >= 2)
        .min_by(|(_, a), (_, b)| {
            a.point
                .x
                .total_cmp(&b.point.x)
                .then(a.point.y.total_cmp(&b.point.y))
        })?;

    let first = graph
        .node(start)?
        .edges
        .iter()
        .copied()
        .max_by(|&a, &b| {
            angle_from_up(&direction(graph, start, a)).total_cmp(&angle_from_up(&direction(graph, start, b)))
        })?;

    let mut points = vec![graph.point(start)];
    let mut edges = vec![first];
    let mut previous = start;
    let mut arrived_by = first;
    let mut current = graph.edge(first)?.other(start);

    while current != start {
        if edges.len() > graph.edge_count() {
            return None;
        }
        points.push(graph.point(current));
        let incoming = graph.point(current) - graph.point(previous);
        let next = graph
            .node(current)?
            .edges
            .iter()
            .copied()
            .filter(|&e| e != arrived_by)
            .max_by(|&a, &b| {
                left_turn(&incoming, &direction(graph, current, a))
                    .total_cmp(&left_turn(&incoming, &direction(graph, current, b)))
            })?;
        previous = current;
        arrived_by = next;
        current = graph.edge(next)?.other(current);
        edges.push(next);
    }
    Some(TracedLoop { points, edges })
}

fn direction(graph: &LineGraph, from: NodeId, edge: EdgeId) -> Vector3 {
    graph
        .edge(edge)
        .map_or_else(Vector3::zeros, |e| graph.point(e.other(from)) - graph.point(from))
}

/// Counter-clockwise angle from +Y, in `(0, 2pi]`.
fn angle_from_up(d: &Vector3) -> f64 {
    let a = (-d.x).atan2(d.y);
    if a <= 0.0 {
        a + TAU
    } else {
        a
    }
}

/// Signed turn from `incoming` to `outgoing` in `(-pi, pi]`; left is positive.
fn left_turn(incoming: &Vector3, outgoing: &Vector3) -> f64 {
    let cross = incoming.x * outgoing.y - incoming.y * outgoing.x;
    cross.atan2(incoming.dot(outgoing))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Segment;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn ring(points: &[Point3]) -> Vec<Segment> {
        (0..points.len())
            .map(|i| Segment::new(points[i], points[(i + 1) % points.len()]))
            .collect()
    }

    #[test]
    fn angles_from_up() {
        assert_relative_eq!(angle_from_up(&Vector3::y()), TAU);
        assert_relative_eq!(angle_from_up(&-Vector3::x()), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(angle_from_up(&Vector3::x()), 1.5 * std::f64::consts::PI);
    }

    #[test]
    fn rectangle_is_walked_from_its_lower_left_corner() {
        let graph = LineGraph::from_segments(
            &ring(&[p(0.0, 0.0), p(2.0, 0.0), p(2.0, 3.0), p(0.0, 3.0)]),
            1e-9,
        );
        let traced = trace_outer(&graph).unwrap();
        assert_eq!(traced.points, vec![p(0.0, 0.0), p(0.0, 3.0), p(2.0, 3.0), p(2.0, 0.0)]);
        assert_eq!(traced.edges.len(), 4);
    }

    #[test]
    fn interior_chord_is_not_traced() {
        let mut segments = ring(&[p(0.0, 0.0), p(2.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(2.0, 2.0), p(0.0, 2.0)]);
        segments.push(Segment::new(p(2.0, 0.0), p(2.0, 2.0)));
        let graph = LineGraph::from_segments(&segments, 1e-9);
        let traced = trace_outer(&graph).unwrap();
        assert_eq!(traced.edges.len(), 6);
    }
}

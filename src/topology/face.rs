use slotmap::SecondaryMap;

use crate::math::polygon_2d::signed_area_2d;
use crate::math::Point3;

use super::graph::{EdgeId, LineGraph, NodeId};

/// A directed traversal of an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HalfEdge {
    edge: EdgeId,
    from: NodeId,
    to: NodeId,
    forward: bool,
}

/// Extracts every bounded face of a planar straight-line graph.
///
/// The graph is read in its XY plane (Z ignored). Outgoing half-edges are
/// sorted by angle at every node; arriving along `u -> v`, the walk continues
/// with the outgoing half-edge at `v` that precedes `v -> u` in
/// counter-clockwise order, i.e. the next one clockwise. This keeps the traced face on the left, so bounded faces come out
/// counter-clockwise with positive area and the unbounded face of each
/// component comes out clockwise and is dropped.
///
/// Faces with area no larger than `min_area` are discarded.
#[must_use]
pub fn bounded_faces(graph: &LineGraph, min_area: f64) -> Vec<Vec<Point3>> {
    let fan = outgoing_fans(graph);
    let mut used: SecondaryMap<EdgeId, [bool; 2]> = SecondaryMap::new();
    for (id, _) in graph.edges() {
        used.insert(id, [false; 2]);
    }

    let mut faces = Vec::new();
    let limit = graph.edge_count() * 2 + 1;

    for (id, edge) in graph.edges() {
        for forward in [true, false] {
            let (from, to) = if forward {
                (edge.start, edge.end)
            } else {
                (edge.end, edge.start)
            };
            let first = HalfEdge {
                edge: id,
                from,
                to,
                forward,
            };
            if is_used(&used, first) {
                continue;
            }

            let mut loop_points = Vec::new();
            let mut current = first;
            let mut closed = false;
            for _ in 0..limit {
                mark_used(&mut used, current);
                loop_points.push(graph.point(current.from));
                let Some(next) = next_half_edge(&fan, current) else {
                    break;
                };
                if next == first {
                    closed = true;
                    break;
                }
                if is_used(&used, next) {
                    break;
                }
                current = next;
            }

            if closed && loop_points.len() >= 3 && signed_area_2d(&loop_points) > min_area {
                faces.push(loop_points);
            }
        }
    }
    faces
}

/// Outgoing half-edges of each node sorted by counter-clockwise angle.
fn outgoing_fans(graph: &LineGraph) -> SecondaryMap<NodeId, Vec<HalfEdge>> {
    let mut fans: SecondaryMap<NodeId, Vec<(f64, HalfEdge)>> = SecondaryMap::new();
    for (id, node) in graph.nodes() {
        let mut fan = Vec::with_capacity(node.edges.len());
        for &e in &node.edges {
            let Some(edge) = graph.edge(e) else { continue };
            let to = edge.other(id);
            let d = graph.point(to) - node.point;
            fan.push((
                d.y.atan2(d.x),
                HalfEdge {
                    edge: e,
                    from: id,
                    to,
                    forward: edge.start == id,
                },
            ));
        }
        fan.sort_by(|a, b| a.0.total_cmp(&b.0));
        fans.insert(id, fan);
    }
    let mut sorted = SecondaryMap::new();
    for (id, fan) in fans {
        sorted.insert(id, fan.into_iter().map(|(_, h)| h).collect());
    }
    sorted
}

fn next_half_edge(fans: &SecondaryMap<NodeId, Vec<HalfEdge>>, current: HalfEdge) -> Option<HalfEdge> {
    let fan = fans.get(current.to)?;
    let back = fan.iter().position(|h| h.edge == current.edge)?;
    fan.get((back + fan.len() - 1) % fan.len()).copied()
}

fn is_used(used: &SecondaryMap<EdgeId, [bool; 2]>, h: HalfEdge) -> bool {
    used.get(h.edge).is_some_and(|u| u[usize::from(!h.forward)])
}

fn mark_used(used: &mut SecondaryMap<EdgeId, [bool; 2]>, h: HalfEdge) {
    if let Some(u) = used.get_mut(h.edge) {
        u[usize::from(!h.forward)] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Segment;
    use approx::assert_relative_eq;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point3::new(x0, y0, 0.0), Point3::new(x1, y1, 0.0))
    }

    #[test]
    fn square_has_one_bounded_face() {
        let segs = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 1.0, 1.0, 0.0),
            seg(1.0, 1.0, 0.0, 1.0),
            seg(0.0, 0.0, 0.0, 1.0),
        ];
        let graph = LineGraph::from_segments(&segs, 1e-6);
        let faces = bounded_faces(&graph, 1e-9);
        assert_eq!(faces.len(), 1);
        assert_relative_eq!(signed_area_2d(&faces[0]), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn chord_splits_square_into_two_faces() {
        let segs = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 2.0, 0.0),
            seg(2.0, 0.0, 2.0, 1.0),
            seg(2.0, 1.0, 1.0, 1.0),
            seg(1.0, 1.0, 0.0, 1.0),
            seg(0.0, 1.0, 0.0, 0.0),
            seg(1.0, 0.0, 1.0, 1.0),
        ];
        let graph = LineGraph::from_segments(&segs, 1e-6);
        let faces = bounded_faces(&graph, 1e-9);
        assert_eq!(faces.len(), 2);
        for face in &faces {
            assert_eq!(face.len(), 4);
            assert_relative_eq!(signed_area_2d(face), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn t_junction_gives_three_faces() {
        let segs = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 2.0, 0.0),
            seg(2.0, 0.0, 2.0, 1.0),
            seg(2.0, 1.0, 2.0, 2.0),
            seg(2.0, 2.0, 1.0, 2.0),
            seg(1.0, 2.0, 0.0, 2.0),
            seg(0.0, 2.0, 0.0, 0.0),
            seg(1.0, 0.0, 1.0, 1.0),
            seg(1.0, 1.0, 1.0, 2.0),
            seg(1.0, 1.0, 2.0, 1.0),
        ];
        let graph = LineGraph::from_segments(&segs, 1e-6);
        let faces = bounded_faces(&graph, 1e-9);
        assert_eq!(faces.len(), 3);
        let mut areas: Vec<f64> = faces.iter().map(|f| signed_area_2d(f)).collect();
        areas.sort_by(f64::total_cmp);
        assert_relative_eq!(areas[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(areas[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(areas[2], 2.0, epsilon = 1e-12);
        assert!(faces.iter().any(|f| f.len() == 5));
    }

    #[test]
    fn open_path_has_no_faces() {
        let segs = vec![seg(0.0, 0.0, 1.0, 0.0), seg(1.0, 0.0, 1.0, 1.0)];
        let graph = LineGraph::from_segments(&segs, 1e-6);
        assert!(bounded_faces(&graph, 1e-9).is_empty());
    }
}

use slotmap::SlotMap;

use crate::geometry::Segment;
use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a node in a [`LineGraph`].
    pub struct NodeId;
}

slotmap::new_key_type! {
    /// Unique identifier for an edge in a [`LineGraph`].
    pub struct EdgeId;
}

/// A graph vertex: a position and its incident edges.
#[derive(Debug, Clone)]
pub struct Node {
    pub point: Point3,
    pub edges: Vec<EdgeId>,
}

/// An undirected straight edge between two nodes.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub start: NodeId,
    pub end: NodeId,
}

impl Edge {
    /// Returns the node at the other end of this edge.
    #[must_use]
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }
}

/// Arena that owns the nodes and edges of a line graph.
///
/// Nodes are snapped: inserting a point within tolerance of an existing node
/// reuses that node. Entities reference each other via generational keys, so
/// removal during pruning never invalidates the remaining keys.
#[derive(Debug, Clone)]
pub struct LineGraph {
    nodes: SlotMap<NodeId, Node>,
    edges: SlotMap<EdgeId, Edge>,
    tol_sq: f64,
}

impl LineGraph {
    /// Creates an empty graph snapping nodes within `tol`.
    #[must_use]
    pub fn new(tol: f64) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            tol_sq: tol * tol,
        }
    }

    /// Builds a graph from segments, snapping shared endpoints.
    #[must_use]
    pub fn from_segments(segments: &[Segment], tol: f64) -> Self {
        let mut graph = Self::new(tol);
        for seg in segments {
            let a = graph.ensure_node(seg.start);
            let b = graph.ensure_node(seg.end);
            graph.add_edge(a, b);
        }
        graph
    }

    /// Finds or inserts the node at `point`, returning its ID.
    pub fn ensure_node(&mut self, point: Point3) -> NodeId {
        if let Some((id, _)) = self
            .nodes
            .iter()
            .find(|(_, n)| (n.point - point).norm_squared() <= self.tol_sq)
        {
            return id;
        }
        self.nodes.insert(Node {
            point,
            edges: Vec::new(),
        })
    }

    /// Inserts an edge between two distinct nodes.
    ///
    /// Returns `None` for self-loops and for edges duplicating an existing one.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        if a == b || self.edge_between(a, b).is_some() {
            return None;
        }
        let id = self.edges.insert(Edge { start: a, end: b });
        for n in [a, b] {
            if let Some(node) = self.nodes.get_mut(n) {
                node.edges.push(id);
            }
        }
        Some(id)
    }

    /// Returns the edge joining `a` and `b`, if any.
    #[must_use]
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let node = self.nodes.get(a)?;
        node.edges.iter().copied().find(|&e| {
            self.edges
                .get(e)
                .is_some_and(|edge| edge.other(a) == b)
        })
    }

    /// Removes an edge and detaches it from both nodes.
    pub fn remove_edge(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.remove(id) else {
            return;
        };
        for n in [edge.start, edge.end] {
            if let Some(node) = self.nodes.get_mut(n) {
                node.edges.retain(|&e| e != id);
            }
        }
    }

    /// Returns the node data.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns the edge data.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Returns the position of a node (origin for unknown IDs).
    #[must_use]
    pub fn point(&self, id: NodeId) -> Point3 {
        self.nodes.get(id).map_or_else(Point3::origin, |n| n.point)
    }

    /// Number of edges incident to `id`.
    #[must_use]
    pub fn valence(&self, id: NodeId) -> usize {
        self.nodes.get(id).map_or(0, |n| n.edges.len())
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` when the graph has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the edge as a segment.
    #[must_use]
    pub fn segment(&self, id: EdgeId) -> Option<Segment> {
        let edge = self.edges.get(id)?;
        Some(Segment::new(self.point(edge.start), self.point(edge.end)))
    }

    /// Returns every edge as a segment.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        self.edges
            .keys()
            .filter_map(|id| self.segment(id))
            .collect()
    }

    /// Repeatedly strips nodes of valence 0 or 1 together with their sole
    /// incident edge until every remaining node has valence 2 or more.
    ///
    /// Returns the number of edges removed.
    pub fn prune_dangling(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let dangling: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|(_, n)| n.edges.len() <= 1)
                .map(|(id, _)| id)
                .collect();
            if dangling.is_empty() {
                break;
            }
            for id in dangling {
                let Some(node) = self.nodes.remove(id) else {
                    continue;
                };
                for e in node.edges {
                    if let Some(edge) = self.edges.remove(e) {
                        removed += 1;
                        if let Some(other) = self.nodes.get_mut(edge.other(id)) {
                            other.edges.retain(|&x| x != e);
                        }
                    }
                }
            }
        }
        removed
    }

    /// Maps every node position through `f`.
    pub fn map_points<F>(&mut self, f: F)
    where
        F: Fn(&Point3) -> Point3,
    {
        for node in self.nodes.values_mut() {
            node.point = f(&node.point);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point3::new(x0, y0, 0.0), Point3::new(x1, y1, 0.0))
    }

    fn square_with_tail() -> Vec<Segment> {
        vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 1.0, 1.0),
            seg(1.0, 1.0, 0.0, 1.0),
            seg(0.0, 1.0, 0.0, 0.0),
            // Dangling two-segment tail off (1,1).
            seg(1.0, 1.0, 2.0, 2.0),
            seg(2.0, 2.0, 3.0, 2.0),
        ]
    }

    #[test]
    fn endpoints_are_snapped() {
        let segs = vec![seg(0.0, 0.0, 1.0, 0.0), seg(1.0 + 1e-9, 0.0, 1.0, 1.0)];
        let graph = LineGraph::from_segments(&segs, 1e-6);
        assert_eq!(graph.nodes().count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let segs = vec![seg(0.0, 0.0, 1.0, 0.0), seg(1.0, 0.0, 0.0, 0.0)];
        let graph = LineGraph::from_segments(&segs, 1e-6);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn prune_removes_tails_to_fixed_point() {
        let mut graph = LineGraph::from_segments(&square_with_tail(), 1e-6);
        assert_eq!(graph.edge_count(), 6);
        let removed = graph.prune_dangling();
        assert_eq!(removed, 2);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.nodes().all(|(id, _)| graph.valence(id) == 2));
    }

    #[test]
    fn prune_removes_open_chains_entirely() {
        let segs = vec![seg(0.0, 0.0, 1.0, 0.0), seg(1.0, 0.0, 2.0, 1.0)];
        let mut graph = LineGraph::from_segments(&segs, 1e-6);
        graph.prune_dangling();
        assert!(graph.is_empty());
    }

    #[test]
    fn remove_edge_updates_valence() {
        let mut graph = LineGraph::from_segments(&square_with_tail(), 1e-6);
        let a = graph.ensure_node(Point3::new(1.0, 1.0, 0.0));
        assert_eq!(graph.valence(a), 3);
        let b = graph.ensure_node(Point3::new(2.0, 2.0, 0.0));
        let e = graph.edge_between(a, b).unwrap();
        graph.remove_edge(e);
        assert_eq!(graph.valence(a), 2);
    }
}

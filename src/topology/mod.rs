pub mod face;
pub mod graph;
pub mod nest;

pub use face::bounded_faces;
pub use graph::{Edge, EdgeId, LineGraph, Node, NodeId};
pub use nest::{nest_loops, NestedLoop};

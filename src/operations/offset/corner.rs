//! Repair of anti-parallel corners, where a chain doubles back on itself.

use tracing::debug;

use crate::math::{Tolerance, Vector3};

use super::chain::{OffsetChain, OffsetVertex, SegmentKey, VertexKey};

/// How a doubled-back corner behaves as the offset grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CornerKind {
    /// The arms separate; a cap segment bridges them.
    Outward,
    /// The arms close onto each other; the fold is removed.
    Inward,
}

/// Repairs every anti-parallel corner of the chain. Returns the number of
/// corners repaired.
pub(super) fn repair_parallel_corners(chain: &mut OffsetChain, tol: &Tolerance) -> usize {
    let mut repaired = 0;
    // Every repair removes or splits a corner; the bound stops a pathological loop.
    let limit = chain.vertices.len() * 2 + 1;
    while repaired < limit {
        let Some(tip) = find_antiparallel_corner(chain, tol) else {
            break;
        };
        let kind = classify_corner(chain, tip, tol);
        debug!(?kind, "repairing anti-parallel corner");
        match kind {
            CornerKind::Outward => insert_cap(chain, tip),
            CornerKind::Inward => remove_fold(chain, tip, tol),
        }
        repaired += 1;
        if chain.is_collapsed(tol) {
            break;
        }
    }
    repaired
}

fn arms(chain: &OffsetChain, tip: VertexKey) -> Option<(SegmentKey, SegmentKey)> {
    let v = chain.vertices.get(tip)?;
    Some((v.prev?, v.next?))
}

fn find_antiparallel_corner(chain: &OffsetChain, tol: &Tolerance) -> Option<VertexKey> {
    chain.vertices.keys().find(|&k| {
        arms(chain, k).is_some_and(|(a, b)| {
            match (chain.segments.get(a), chain.segments.get(b)) {
                (Some(a), Some(b)) => {
                    a.length > tol.distance
                        && b.length > tol.distance
                        && (a.tangent + b.tangent).norm() <= tol.angle
                }
                _ => false,
            }
        })
    })
}

fn is_parallel(a: &Vector3, b: &Vector3, tol: &Tolerance) -> bool {
    a.cross(b).norm() <= tol.angle
}

/// Classifies the corner from the first non-parallel neighbour beyond the
/// shorter arm: the fold opens outward when it points along that neighbour's
/// offset direction. Without such a neighbour the corner opens outward.
fn classify_corner(chain: &OffsetChain, tip: VertexKey, tol: &Tolerance) -> CornerKind {
    let Some((incoming, outgoing)) = arms(chain, tip) else {
        return CornerKind::Outward;
    };
    let (Some(a), Some(b)) = (chain.segments.get(incoming), chain.segments.get(outgoing)) else {
        return CornerKind::Outward;
    };
    let t_in = a.tangent;
    let backwards = a.length <= b.length;

    let mut current = if backwards { incoming } else { outgoing };
    let mut visited = 0;
    while visited < chain.segments.len() {
        visited += 1;
        let Some(seg) = chain.segments.get(current) else {
            break;
        };
        let vertex = if backwards { seg.start } else { seg.end };
        let Some(neighbour) = chain
            .vertices
            .get(vertex)
            .and_then(|v| if backwards { v.prev } else { v.next })
        else {
            break;
        };
        if neighbour == incoming || neighbour == outgoing {
            break;
        }
        let Some(n) = chain.segments.get(neighbour) else {
            break;
        };
        if !is_parallel(&n.tangent, &t_in, tol) {
            return if t_in.dot(&n.orthogonal) < 0.0 {
                CornerKind::Inward
            } else {
                CornerKind::Outward
            };
        }
        current = neighbour;
    }
    CornerKind::Outward
}

/// Splits the tip into two coincident vertices joined by a zero-length cap
/// whose tangent is fixed so that it advances along the incoming arm.
fn insert_cap(chain: &mut OffsetChain, tip: VertexKey) {
    let Some((incoming, outgoing)) = arms(chain, tip) else {
        return;
    };
    let Some(t_in) = chain.segments.get(incoming).map(|s| s.tangent) else {
        return;
    };
    let position = chain.position(tip);
    let twin = chain.vertices.insert(OffsetVertex {
        position,
        direction: Vector3::zeros(),
        speed: 0.0,
        prev: None,
        next: Some(outgoing),
        dirty: true,
    });
    if let Some(seg) = chain.segments.get_mut(outgoing) {
        seg.start = twin;
        seg.dirty = true;
    }
    let cap_tangent = chain.normal.cross(&t_in) * chain.side;
    chain.connect(tip, twin, Some(cap_tangent));
    if let Some(seg) = chain.segments.get_mut(incoming) {
        seg.dirty = true;
    }
}

/// Removes the fold at `tip`. The shorter arm disappears and the longer one
/// is cut back to the shorter arm's far vertex; arms of equal length vanish
/// together and their far vertices merge.
fn remove_fold(chain: &mut OffsetChain, tip: VertexKey, tol: &Tolerance) {
    let Some((incoming, outgoing)) = arms(chain, tip) else {
        return;
    };
    let (Some(a), Some(b)) = (chain.segments.get(incoming), chain.segments.get(outgoing)) else {
        return;
    };
    let (before, after) = (a.start, b.end);
    let (len_in, len_out) = (a.length, b.length);

    if (len_in - len_out).abs() <= tol.distance {
        chain.segments.remove(incoming);
        chain.segments.remove(outgoing);
        chain.vertices.remove(tip);
        if before == after {
            // The fold was the whole chain.
            chain.vertices.remove(before);
            chain.first = None;
            return;
        }
        let Some(far) = chain.vertices.remove(after) else {
            return;
        };
        let mid = nalgebra::center(&chain.position(before), &far.position);
        if let Some(seg) = far.next.and_then(|s| chain.segments.get_mut(s)) {
            seg.start = before;
        }
        if let Some(v) = chain.vertices.get_mut(before) {
            v.position = mid;
            v.next = far.next;
            v.dirty = true;
        }
        if chain.first == Some(tip) || chain.first == Some(after) {
            chain.first = Some(before);
        }
        chain.refresh_around(before, tol);
    } else if len_in > len_out {
        chain.segments.remove(outgoing);
        chain.vertices.remove(tip);
        if let Some(seg) = chain.segments.get_mut(incoming) {
            seg.end = after;
        }
        if let Some(v) = chain.vertices.get_mut(after) {
            v.prev = Some(incoming);
        }
        if chain.first == Some(tip) {
            chain.first = Some(after);
        }
        chain.refresh_around(after, tol);
    } else {
        chain.segments.remove(incoming);
        chain.vertices.remove(tip);
        if let Some(seg) = chain.segments.get_mut(outgoing) {
            seg.start = before;
        }
        if let Some(v) = chain.vertices.get_mut(before) {
            v.next = Some(outgoing);
        }
        if chain.first == Some(tip) {
            chain.first = Some(before);
        }
        chain.refresh_around(before, tol);
    }
}

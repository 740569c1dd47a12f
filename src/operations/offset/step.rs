//! Step limiting: how far the chain may advance before its topology changes.

use crate::math::{Tolerance, TOLERANCE};

use super::chain::{OffsetChain, SegmentKey, VertexKey};

/// What ends an offset step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum StepEvent {
    /// The requested offset is reached.
    Target,
    /// At least one shrinking segment reaches zero length.
    Local,
    /// A vertex strikes a non-adjacent segment.
    Global { vertex: VertexKey, segment: SegmentKey },
}

/// Returns the step to take and the event that ends it.
///
/// Events landing within the fine tolerance of each other are resolved in
/// favour of local events.
pub(super) fn step_limit(
    chain: &OffsetChain,
    remaining: f64,
    local: bool,
    global: bool,
    tol: &Tolerance,
) -> (f64, StepEvent) {
    let mut step = remaining;
    let mut event = StepEvent::Target;

    if local {
        if let Some(t) = vanish_time(chain) {
            if t <= step {
                step = t.max(0.0);
                event = StepEvent::Local;
            }
        }
    }
    if global {
        if let Some((t, vertex, segment)) = first_collision(chain, step, tol) {
            if t < step - tol.fine || (event == StepEvent::Target && t <= step) {
                step = t;
                event = StepEvent::Global { vertex, segment };
            }
        }
    }
    (step, event)
}

/// Earliest time at which a shrinking segment reaches zero length.
fn vanish_time(chain: &OffsetChain) -> Option<f64> {
    chain
        .segments
        .values()
        .filter(|s| s.rate < -TOLERANCE)
        .map(|s| s.length / -s.rate)
        .min_by(f64::total_cmp)
}

/// Earliest strike of a vertex on a segment it is not attached to, within
/// `horizon`.
fn first_collision(
    chain: &OffsetChain,
    horizon: f64,
    tol: &Tolerance,
) -> Option<(f64, VertexKey, SegmentKey)> {
    let mut best: Option<(f64, VertexKey, SegmentKey)> = None;
    for (vk, v) in &chain.vertices {
        let w = v.velocity();
        let neighbours = [v.prev, v.next].map(|s| {
            s.and_then(|s| chain.segments.get(s))
                .map(|s| if s.start == vk { s.end } else { s.start })
        });
        for (sk, seg) in &chain.segments {
            if Some(sk) == v.prev || Some(sk) == v.next || seg.start == vk || seg.end == vk {
                continue;
            }
            let (Some(a), Some(b)) = (chain.vertices.get(seg.start), chain.vertices.get(seg.end)) else {
                continue;
            };
            // Signed distance of the vertex from the moving line of the segment.
            let s0 = (v.position - a.position).dot(&seg.orthogonal);
            if s0.abs() <= tol.distance {
                continue;
            }
            let closing = w.dot(&seg.orthogonal) - a.velocity().dot(&seg.orthogonal);
            if closing.abs() < TOLERANCE {
                continue;
            }
            let t = -s0 / closing;
            let limit = best.map_or(horizon, |(b, _, _)| b);
            if t < 0.0 || t > limit {
                continue;
            }

            let pa = a.position + a.velocity() * t;
            let pb = b.position + b.velocity() * t;
            let hit = v.position + w * t;
            let span = pb - pa;
            let len_sq = span.norm_squared();
            if len_sq <= tol.distance_sq() {
                continue;
            }
            let u = (hit - pa).dot(&span) / len_sq;
            let eps = tol.distance / len_sq.sqrt();
            if !(-eps..=1.0 + eps).contains(&u) {
                continue;
            }
            // Touching the far end of a neighbouring segment is a local event.
            let at_start = u <= eps && neighbours.contains(&Some(seg.start));
            let at_end = u >= 1.0 - eps && neighbours.contains(&Some(seg.end));
            if at_start || at_end {
                continue;
            }
            best = Some((t, vk, sk));
        }
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn notched(side: f64) -> OffsetChain {
        let pts = [
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 4.0),
            p(6.0, 4.0),
            p(5.0, 1.0),
            p(4.0, 4.0),
            p(0.0, 4.0),
        ];
        let mut chain =
            OffsetChain::from_points(&pts, true, Vector3::z(), side, 0.0, &Tolerance::default()).unwrap();
        chain.recompute_dirty();
        chain
    }

    #[test]
    fn unit_square_shrinks_to_a_point() {
        let pts = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        let mut chain =
            OffsetChain::from_points(&pts, true, Vector3::z(), -1.0, 0.0, &Tolerance::default()).unwrap();
        chain.recompute_dirty();
        let (step, event) = step_limit(&chain, 2.0, true, true, &Tolerance::default());
        assert_eq!(event, StepEvent::Local);
        assert_relative_eq!(step, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn notch_tip_strikes_the_bottom_edge() {
        let chain = notched(-1.0);
        let (step, event) = step_limit(&chain, 1.0, true, true, &Tolerance::default());
        let StepEvent::Global { vertex, .. } = event else {
            panic!("expected a global event, got {event:?}");
        };
        assert_relative_eq!(chain.vertices[vertex].position, p(5.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(step, 1.0 / (1.0 + 10f64.sqrt()), epsilon = 1e-9);
    }

    #[test]
    fn growing_notch_has_no_collision() {
        let chain = notched(1.0);
        let (step, event) = step_limit(&chain, 0.2, true, true, &Tolerance::default());
        assert_eq!(event, StepEvent::Target);
        assert_relative_eq!(step, 0.2);
    }
}

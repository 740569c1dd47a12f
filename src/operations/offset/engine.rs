//! The offset iteration and the per-level worklist of loops.

use tracing::{debug, trace, warn};

use crate::error::Warning;
use crate::geometry::Polyline;
use crate::math::Tolerance;

use super::chain::{OffsetChain, SegmentKey};
use super::corner::repair_parallel_corners;
use super::step::{step_limit, StepEvent};
use super::OffsetOptions;

/// Shared state of one offset run.
pub(super) struct Context<'a> {
    pub options: &'a OffsetOptions,
    pub tol: &'a Tolerance,
    pub iterations: usize,
    pub warnings: Vec<Warning>,
}

impl Context<'_> {
    fn exhausted(&self) -> bool {
        self.iterations >= self.options.max_iterations
    }
}

/// Result of advancing a chain towards one offset level.
enum Advance {
    Reached(OffsetChain),
    Split(Vec<OffsetChain>),
    Collapsed,
    Bailout(OffsetChain),
}

/// Offsets `source` through every magnitude of `targets` (ascending),
/// returning each emitted polyline tagged with its level index.
///
/// Loops split off by global events continue independently from the offset
/// at which they separated.
pub(super) fn run_group(
    source: OffsetChain,
    targets: &[(usize, f64)],
    ctx: &mut Context<'_>,
) -> Vec<(usize, Polyline)> {
    let clean = ctx.options.remove_short_segments;
    let mut emitted = Vec::new();
    let mut work = vec![(source, 0usize)];

    while let Some((chain, t)) = work.pop() {
        let Some(&(level, target)) = targets.get(t) else {
            continue;
        };
        match advance(chain, target, ctx) {
            Advance::Reached(chain) => {
                emitted.push((level, chain.to_polyline(clean, ctx.tol)));
                if t + 1 < targets.len() {
                    work.push((chain, t + 1));
                }
            }
            Advance::Split(children) => {
                let kept = if ctx.options.only_largest_per_step {
                    largest(children)
                } else {
                    children
                };
                work.extend(kept.into_iter().rev().map(|c| (c, t)));
            }
            Advance::Collapsed => {}
            Advance::Bailout(chain) => {
                emitted.push((level, chain.to_polyline(clean, ctx.tol)));
            }
        }
    }
    emitted
}

/// The piece to keep when only one survives a split: the largest loop of a
/// closed chain, or the piece carrying the original ends of an open one.
fn largest(children: Vec<OffsetChain>) -> Vec<OffsetChain> {
    if let Some(pos) = children.iter().position(|c| !c.closed) {
        return children.into_iter().nth(pos).into_iter().collect();
    }
    children
        .into_iter()
        .max_by(|a, b| {
            (a.signed_area() * a.area_sign).total_cmp(&(b.signed_area() * b.area_sign))
        })
        .into_iter()
        .collect()
}

fn advance(mut chain: OffsetChain, target: f64, ctx: &mut Context<'_>) -> Advance {
    let tol = *ctx.tol;
    let options = *ctx.options;

    loop {
        if ctx.exhausted() {
            let reached = chain.reached * chain.side;
            if !ctx.warnings.iter().any(|w| matches!(w, Warning::IterationLimit { .. })) {
                warn!(iterations = ctx.iterations, reached, "offset iteration limit reached");
                ctx.warnings.push(Warning::IterationLimit {
                    iterations: ctx.iterations,
                    reached,
                });
            }
            return Advance::Bailout(chain);
        }
        ctx.iterations += 1;

        if options.handle_parallel_segments
            && repair_parallel_corners(&mut chain, &tol) > 0
            && chain.is_collapsed(&tol)
        {
            return Advance::Collapsed;
        }
        chain.recompute_dirty();

        let remaining = target - chain.reached;
        if remaining <= tol.fine {
            return Advance::Reached(chain);
        }

        let (step, event) = step_limit(
            &chain,
            remaining,
            options.handle_local_self_intersections,
            options.handle_global_self_intersections,
            &tol,
        );
        trace!(step, ?event, reached = chain.reached, "offset step");
        chain.translate(step);

        match event {
            StepEvent::Target => {}
            StepEvent::Local => collapse_short(&mut chain, &tol),
            StepEvent::Global { vertex, segment } => {
                let children = chain.split_at(vertex, segment, &tol);
                debug!(
                    pieces = children.len(),
                    reached = chain.reached,
                    "chain split by a global self-intersection"
                );
                return Advance::Split(children);
            }
        }
        if options.remove_short_segments {
            collapse_short(&mut chain, &tol);
        }
        if chain.close_if_converged(&tol) {
            debug!(reached = chain.reached, "open chain closed onto itself");
        }
        if chain.is_collapsed(&tol) {
            debug!(reached = chain.reached, "chain collapsed");
            return Advance::Collapsed;
        }
    }
}

/// Merges every shrinking segment that has reached zero length.
fn collapse_short(chain: &mut OffsetChain, tol: &Tolerance) {
    while let Some(key) = next_vanished(chain, tol) {
        chain.merge_segment(key, tol);
        if chain.is_collapsed(tol) {
            return;
        }
    }
}

fn next_vanished(chain: &OffsetChain, tol: &Tolerance) -> Option<SegmentKey> {
    chain
        .segments
        .iter()
        .find(|(_, s)| s.length <= tol.distance && s.rate < 0.0 && s.start != s.end)
        .map(|(k, _)| k)
}

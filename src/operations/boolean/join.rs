use crate::geometry::Polyline;
use crate::math::{Point3, Tolerance};

/// Stitches arcs that share endpoints into continuous polylines.
///
/// Arcs are chained greedily in input order. At each open end a continuation
/// that keeps its own direction is preferred; an arc is reversed only when no
/// such continuation exists. A chain whose ends meet becomes closed.
/// Closed inputs pass through unchanged.
#[must_use]
pub fn join(arcs: &[Polyline], tol: &Tolerance) -> Vec<Polyline> {
    let mut result = Vec::new();
    let mut pool: Vec<Vec<Point3>> = Vec::with_capacity(arcs.len());
    for arc in arcs {
        let arc = arc.without_degenerate_segments(tol);
        if arc.closed {
            result.push(arc);
        } else if arc.points.len() >= 2 {
            pool.push(arc.points);
        }
    }
    pool.reverse();

    while let Some(mut chain) = pool.pop() {
        loop {
            if chain.len() > 3 && tol.same_point(&chain[0], &chain[chain.len() - 1]) {
                break;
            }
            if !extend_chain(&mut chain, &mut pool, tol) {
                break;
            }
        }
        result.push(Polyline::from_points(chain, tol));
    }
    result
}

fn extend_chain(chain: &mut Vec<Point3>, pool: &mut Vec<Vec<Point3>>, tol: &Tolerance) -> bool {
    let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
        return false;
    };
    if let Some(j) = position_where(pool, |a| a.first().is_some_and(|p| tol.same_point(p, &tail))) {
        let arc = pool.remove(j);
        chain.extend(arc.into_iter().skip(1));
        return true;
    }
    if let Some(j) = position_where(pool, |a| a.last().is_some_and(|p| tol.same_point(p, &head))) {
        let mut arc = pool.remove(j);
        arc.pop();
        arc.append(chain);
        *chain = arc;
        return true;
    }
    if let Some(j) = position_where(pool, |a| a.last().is_some_and(|p| tol.same_point(p, &tail))) {
        let arc = pool.remove(j);
        chain.extend(arc.into_iter().rev().skip(1));
        return true;
    }
    if let Some(j) = position_where(pool, |a| a.first().is_some_and(|p| tol.same_point(p, &head))) {
        let mut arc = pool.remove(j);
        arc.reverse();
        arc.pop();
        arc.append(chain);
        *chain = arc;
        return true;
    }
    false
}

/// Index of the matching arc, searching from the back so the earliest input
/// arc wins among equals.
fn position_where<F>(pool: &[Vec<Point3>], pred: F) -> Option<usize>
where
    F: Fn(&[Point3]) -> bool,
{
    pool.iter().rposition(|a| pred(a.as_slice()))
}

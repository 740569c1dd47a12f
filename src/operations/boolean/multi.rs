//! Booleans over sets of coplanar regions, reduced pairwise.

use tracing::{debug, warn};

use crate::error::Warning;
use crate::geometry::Polyline;
use crate::math::{Tolerance, Vector3};

use super::region::{
    is_region, region_difference, region_intersection, region_union, RegionOutput,
};

/// Union of every region in `regions`.
///
/// Each region absorbs every accumulated outer loop it merges with. Loops
/// enclosed by a merge are tracked as openings and trimmed by every input at
/// the end, since a later region may fill them. Stagnation (two accumulated
/// loops that still overlap) is reported as [`Warning::UnionStagnated`].
#[must_use]
pub fn regions_union(regions: &[Polyline], tol: &Tolerance) -> RegionOutput {
    let inputs = clean_inputs(regions, tol);
    let Some(normal) = shared_normal(&inputs, tol) else {
        return RegionOutput::combined(Vec::new());
    };

    let mut combined = true;
    let mut warnings = Vec::new();
    let mut outers: Vec<Polyline> = Vec::new();
    let mut openings: Vec<Polyline> = Vec::new();

    for region in &inputs {
        let mut current = oriented(region, &normal, false);
        let mut i = 0;
        while i < outers.len() {
            let out = region_union(&outers[i], &current, tol);
            if !out.combined {
                combined = false;
                i += 1;
                continue;
            }
            warnings.extend(out.warnings);
            let (mut merged, holes) = partition(out.regions, &normal);
            if merged.len() == 1 {
                current = merged.remove(0);
                openings.extend(holes.iter().map(Polyline::reversed));
                outers.remove(i);
                i = 0;
            } else {
                i += 1;
            }
        }
        outers.push(current);
    }

    let stalled = overlapping_pairs(&outers, tol);
    if stalled > 0 {
        warn!(remaining = outers.len(), stalled, "region union stopped making progress");
        warnings.push(Warning::UnionStagnated {
            remaining: outers.len(),
        });
    }

    // Trim openings by every input; regions that created an opening only
    // touch it, later ones may cover it.
    let mut trimmed = Vec::new();
    for opening in openings {
        let mut pieces = vec![opening];
        for region in &inputs {
            pieces = pieces
                .iter()
                .flat_map(|p| {
                    let out = region_difference(p, region, tol);
                    partition(out.regions, &normal).0
                })
                .collect();
        }
        trimmed.extend(pieces);
    }
    debug!(outers = outers.len(), holes = trimmed.len(), "region union done");

    RegionOutput {
        regions: assemble(outers, trimmed, &normal, tol),
        combined,
        warnings,
    }
}

/// Intersection of every region in `regions`, folded pairwise.
#[must_use]
pub fn regions_intersection(regions: &[Polyline], tol: &Tolerance) -> RegionOutput {
    let inputs = clean_inputs(regions, tol);
    let Some((first, rest)) = inputs.split_first() else {
        return RegionOutput::combined(Vec::new());
    };

    let mut combined = true;
    let mut warnings = Vec::new();
    let mut acc = vec![first.clone()];
    for region in rest {
        let mut next = Vec::new();
        for piece in &acc {
            let out = region_intersection(piece, region, tol);
            if out.combined {
                next.extend(out.regions);
                warnings.extend(out.warnings);
            } else {
                combined = false;
            }
        }
        acc = next;
        if acc.is_empty() {
            break;
        }
    }
    RegionOutput {
        regions: acc,
        combined,
        warnings,
    }
}

/// Difference of `subject` and every region of `cutters`.
///
/// The cutters are united first; their outer loops are then subtracted one
/// after another while enclosed cut-outs are collected as holes. Openings of
/// the cutter union give back the parts of `subject` they enclose.
#[must_use]
pub fn regions_difference(subject: &Polyline, cutters: &[Polyline], tol: &Tolerance) -> RegionOutput {
    let subject = subject.without_degenerate_segments(tol);
    if !is_region(&subject, tol) {
        return RegionOutput::combined(Vec::new());
    }
    let Some(normal) = shared_normal(std::slice::from_ref(&subject), tol) else {
        return RegionOutput::combined(Vec::new());
    };

    let cut = regions_union(cutters, tol);
    let mut combined = cut.combined;
    let mut warnings = cut.warnings;
    let (cut_outers, cut_holes) = partition(cut.regions, &normal);

    let mut pieces = vec![oriented(&subject, &normal, false)];
    let mut holes: Vec<Polyline> = Vec::new();
    for cutter in &cut_outers {
        let mut next = Vec::new();
        for piece in &pieces {
            let out = region_difference(piece, cutter, tol);
            if !out.combined {
                combined = false;
                next.push(piece.clone());
                continue;
            }
            warnings.extend(out.warnings);
            let (outer, inner) = partition(out.regions, &normal);
            next.extend(outer);
            holes.extend(inner.iter().map(Polyline::reversed));
        }
        pieces = next;
    }
    for opening in &cut_holes {
        let out = region_intersection(&subject, &opening.reversed(), tol);
        pieces.extend(partition(out.regions, &normal).0);
    }

    if holes.len() > 1 {
        let merged = regions_union(&holes, tol);
        holes = partition(merged.regions, &normal).0;
    }

    RegionOutput {
        regions: assemble(pieces, holes, &normal, tol),
        combined,
        warnings,
    }
}

fn clean_inputs(regions: &[Polyline], tol: &Tolerance) -> Vec<Polyline> {
    regions
        .iter()
        .map(|r| r.without_degenerate_segments(tol))
        .filter(|r| is_region(r, tol))
        .collect()
}

fn shared_normal(inputs: &[Polyline], tol: &Tolerance) -> Option<Vector3> {
    inputs
        .first()
        .and_then(|r| r.plane(tol))
        .map(|f| *f.plane.plane_normal())
}

/// Returns `region` wound counter-clockwise about `normal` (clockwise when
/// `clockwise` is set).
fn oriented(region: &Polyline, normal: &Vector3, clockwise: bool) -> Polyline {
    if region.is_clockwise(normal) == clockwise {
        region.clone()
    } else {
        region.reversed()
    }
}

/// Splits loops into outer (counter-clockwise) and hole (clockwise) loops.
fn partition(regions: Vec<Polyline>, normal: &Vector3) -> (Vec<Polyline>, Vec<Polyline>) {
    regions.into_iter().partition(|r| !r.is_clockwise(normal))
}

fn overlapping_pairs(outers: &[Polyline], tol: &Tolerance) -> usize {
    let mut count = 0;
    for (i, a) in outers.iter().enumerate() {
        for b in &outers[i + 1..] {
            let out = region_intersection(a, b, tol);
            if out.combined && out.regions.iter().any(|r| r.area() > tol.distance) {
                count += 1;
            }
        }
    }
    count
}

/// Lists every outer loop followed by the holes it encloses (clockwise).
fn assemble(outers: Vec<Polyline>, holes: Vec<Polyline>, normal: &Vector3, tol: &Tolerance) -> Vec<Polyline> {
    let mut holes: Vec<Option<Polyline>> = holes.into_iter().map(Some).collect();
    let mut result = Vec::new();
    for outer in outers {
        let outer = oriented(&outer, normal, false);
        let mut own = Vec::new();
        for slot in &mut holes {
            let inside = slot
                .as_ref()
                .is_some_and(|h| outer.contains_points(&[h.centroid()], false, tol));
            if inside {
                if let Some(h) = slot.take() {
                    own.push(oriented(&h, normal, true));
                }
            }
        }
        result.push(outer);
        result.extend(own);
    }
    result.extend(holes.into_iter().flatten().map(|h| oriented(&h, normal, true)));
    result
}
